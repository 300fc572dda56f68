//! Signed access tokens.
//!
//! Tokens are stateless: a verified token is trusted as-is, including its
//! embedded role, until it expires.

use std::time::Duration;

use jsonwebtoken::{
    decode, encode, errors::Error, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    api::user::{Id, Role, RoleRef},
    db,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Claims {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: RoleRef,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// Fails if the expiry lies beyond the representable date range.
    pub fn new(
        user: &db::User,
        issued_at: OffsetDateTime,
        expiration_time: Duration,
    ) -> Result<Self, crate::Error> {
        let expires_at = time::Duration::try_from(expiration_time)
            .ok()
            .and_then(|ttl| issued_at.checked_add(ttl))
            .ok_or_else(|| {
                crate::Error::Internal(format!(
                    "access token lifetime {expiration_time:?} is out of range",
                ))
            })?;

        Ok(Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            image: user.image.clone(),
            role: user.role.into(),
            iat: issued_at.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
        })
    }

    /// Lets the claims through only if they carry the `required` role.
    pub fn authorize(self, required: Role) -> Result<Self, crate::Error> {
        if self.role.name == required {
            Ok(self)
        } else {
            Err(crate::Error::InsufficientAccess(self.role.name))
        }
    }
}

#[derive(Clone)]
pub struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiration_time: Duration,
}

impl Keys {
    pub fn new(secret: &[u8], expiration_time: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiration_time,
        }
    }

    pub fn sign(&self, user: &db::User) -> Result<String, crate::Error> {
        let claims =
            Claims::new(user, OffsetDateTime::now_utc(), self.expiration_time)?;
        Ok(self.sign_claims(&claims)?)
    }

    pub fn sign_claims(&self, claims: &Claims) -> Result<String, Error> {
        encode(&Header::default(), claims, &self.encoding)
    }

    /// Checks signature and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, Error> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
    }
}
