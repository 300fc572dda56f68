use std::marker::PhantomData;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{request, StatusCode},
    RequestPartsExt as _,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tokio::task;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    api,
    db::{
        self,
        user::{Id, PasswordHash, Role},
        UserStore as _,
    },
    token::Claims,
    Error,
};

use super::{extract::Json, SharedAppState};

#[derive(Deserialize, ToSchema)]
pub struct RegisterInput {
    name: String,
    email: String,
    password: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    tag = "auth",
    request_body = RegisterInput,
    responses(
        (status = 201, description = "Registered",
            body = api::user::AccessToken),
        (status = 422, description = "Email already taken",
            body = api::ErrorResponse),
    ),
)]
pub async fn register(
    State(state): State<SharedAppState>,
    Json(RegisterInput {
        name,
        email,
        password,
    }): Json<RegisterInput>,
) -> Result<(StatusCode, Json<api::user::AccessToken>), Error> {
    use Error as E;

    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty()
    {
        return Err(E::Validation(
            "name, email and password must not be empty".to_owned(),
        ));
    }
    if state.db.get_user_by_email(&email).await?.is_some() {
        return Err(E::EmailAlreadyTaken(email));
    }

    let cost = state.bcrypt_cost;
    let password_hash =
        task::spawn_blocking(move || PasswordHash::new(&password, cost))
            .await??;

    let user = db::User {
        id: Id::new(),
        name,
        email,
        image: None,
        role: Role::Customer,
        password_hash,
        created_at: OffsetDateTime::now_utc(),
    };
    match state.db.insert_user(&user).await {
        Ok(()) => {}
        Err(db::Error::Duplicate) => {
            return Err(E::EmailAlreadyTaken(user.email));
        }
        Err(e) => return Err(e.into()),
    }
    info!(user_id = %user.id, email = %user.email, "user registered");

    let access_token = state.keys.sign(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(api::user::AccessToken { access_token }),
    ))
}

#[derive(Deserialize, ToSchema)]
pub struct LoginInput {
    email: String,
    password: String,
}

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "auth",
    request_body = LoginInput,
    responses(
        (status = 201, description = "Logged in",
            body = api::user::AccessToken),
        (status = 401, description = "Wrong password",
            body = api::ErrorResponse),
        (status = 404, description = "Email not registered",
            body = api::ErrorResponse),
    ),
)]
pub async fn login(
    State(state): State<SharedAppState>,
    Json(LoginInput { email, password }): Json<LoginInput>,
) -> Result<(StatusCode, Json<api::user::AccessToken>), Error> {
    use Error as E;

    let Some(user) = state.db.get_user_by_email(&email).await? else {
        return Err(E::EmailNotRegistered(email));
    };

    let password_hash = user.password_hash.clone();
    let is_valid =
        task::spawn_blocking(move || password_hash.verify(&password)).await?;
    if !is_valid {
        warn!(user_id = %user.id, "wrong password");
        return Err(E::WrongPassword);
    }
    info!(user_id = %user.id, "user logged in");

    let access_token = state.keys.sign(&user)?;
    Ok((
        StatusCode::CREATED,
        Json(api::user::AccessToken { access_token }),
    ))
}

#[utoipa::path(
    get,
    path = "/v1/auth/whoami",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Current user", body = api::User),
        (status = 401, description = "Missing or invalid token",
            body = api::ErrorResponse),
        (status = 404, description = "User no longer exists",
            body = api::ErrorResponse),
    ),
)]
pub async fn whoami(
    State(state): State<SharedAppState>,
    claims: Claims,
) -> Result<Json<api::User>, Error> {
    let user = state
        .db
        .get_user_by_id(claims.id)
        .await?
        .ok_or(Error::RecordNotFound(claims.name))?;

    Ok(Json(user.into()))
}

#[async_trait]
impl FromRequestParts<SharedAppState> for Claims {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| Error::InvalidToken(e.to_string()))?;

        state.keys.verify(bearer.token()).map_err(|e| {
            warn!(error = %e, "rejected access token");
            Error::InvalidToken(e.to_string())
        })
    }
}

/// Role a route demands from its caller.
pub trait RequiredRole {
    const ROLE: Role;
}

pub struct Admin;

impl RequiredRole for Admin {
    const ROLE: Role = Role::Admin;
}

pub struct Customer;

impl RequiredRole for Customer {
    const ROLE: Role = Role::Customer;
}

/// Claims of a caller whose token carries the role `R`.
pub struct Authorized<R> {
    pub claims: Claims,
    role: PhantomData<R>,
}

#[async_trait]
impl<R> FromRequestParts<SharedAppState> for Authorized<R>
where
    R: RequiredRole + Send + Sync + 'static,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = Claims::from_request_parts(parts, state)
            .await?
            .authorize(R::ROLE)
            .inspect_err(|e| {
                warn!(error = %e, required = %R::ROLE, "access denied");
            })?;

        Ok(Self {
            claims,
            role: PhantomData,
        })
    }
}
