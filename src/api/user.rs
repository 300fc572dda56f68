use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db;

pub use crate::db::user::{Id, Role};

/// Current user as reported by `whoami`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ToSchema)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    pub image: Option<String>,
    pub role: RoleRef,
}

impl From<db::User> for User {
    fn from(user: db::User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            image: user.image,
            role: user.role.into(),
        }
    }
}

/// Role as it appears in responses and access token claims.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize, ToSchema,
)]
pub struct RoleRef {
    pub id: u8,
    pub name: Role,
}

impl From<Role> for RoleRef {
    fn from(role: Role) -> Self {
        Self {
            id: role.id(),
            name: role,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}
