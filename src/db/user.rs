use std::error::Error as StdError;

use async_trait::async_trait;
use derive_more::Display;
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config;

use super::{Client, Error};

#[derive(Clone, Debug)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: Role,
    pub password_hash: PasswordHash,
    pub created_at: OffsetDateTime,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    ToSchema,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl FromSql<'_> for Id {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for Id {
    accepts!(UUID);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

/// Permission level embedded into every access token.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    TryFromRepr,
    PartialEq,
    Serialize,
    ToSchema,
)]
#[repr(u8)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Default role of self-registered users; may rent cars.
    #[display("CUSTOMER")]
    Customer = 1,

    /// Manages the car catalog.
    #[display("ADMIN")]
    Admin = 2,
}

impl Role {
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl FromSql<'_> for Role {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let role = Self::try_from(repr).map_err(|_| "invalid role")?;
        Ok(role)
    }
}

impl ToSql for Role {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

/// bcrypt digest of a user's password.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(secret: &str, cost: u32) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(secret, cost).map(Self)
    }

    /// Malformed digests never match.
    pub fn verify(&self, secret: &str) -> bool {
        bcrypt::verify(secret, &self.0).unwrap_or(false)
    }
}

impl FromSql<'_> for PasswordHash {
    accepts!(TEXT);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        String::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for PasswordHash {
    accepts!(TEXT);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error>;

    async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error>;

    /// Fails with [`Error::Duplicate`] if the email is already registered.
    async fn insert_user(&self, user: &User) -> Result<(), Error>;
}

/// Creates the configured administrator unless its email is taken.
pub async fn ensure_admin<S: UserStore + ?Sized>(
    store: &S,
    admin: &config::Admin,
    bcrypt_cost: u32,
) -> Result<(), Box<dyn StdError + Send + Sync>> {
    if store.get_user_by_email(&admin.email).await?.is_some() {
        return Ok(());
    }

    let user = User {
        id: Id::new(),
        name: admin.name.clone(),
        email: admin.email.clone(),
        image: None,
        role: Role::Admin,
        password_hash: PasswordHash::new(&admin.password, bcrypt_cost)?,
        created_at: OffsetDateTime::now_utc(),
    };
    match store.insert_user(&user).await {
        Ok(()) => info!(email = %user.email, "administrator account created"),
        Err(Error::Duplicate) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        image: row.get("image"),
        role: row.get("role"),
        password_hash: row.get("password_hash"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl UserStore for Client {
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, name, email, image, role, \
                                  password_hash, created_at \
                           FROM users \
                           WHERE email = $1 \
                           LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&email]).await?.as_ref().map(from_row))
    }

    async fn get_user_by_id(&self, id: Id) -> Result<Option<User>, Error> {
        const SQL: &str = "SELECT id, name, email, image, role, \
                                  password_hash, created_at \
                           FROM users \
                           WHERE id = $1 \
                           LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO users (id, name, email, image, role, \
                               password_hash, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7)";

        self.0
            .execute(
                SQL,
                &[
                    &user.id,
                    &user.name,
                    &user.email,
                    &user.image,
                    &user.role,
                    &user.password_hash,
                    &user.created_at,
                ],
            )
            .await
            .map(drop)
            .map_err(Error::from_postgres)
    }
}
