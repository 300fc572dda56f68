use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{api, db};

pub use crate::db::rental::Id;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rental {
    pub id: Id,
    pub user_id: api::user::Id,
    pub car_id: api::car::Id,
    #[serde(with = "time::serde::rfc3339")]
    pub rent_started_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub rent_ended_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<db::Rental> for Rental {
    fn from(rental: db::Rental) -> Self {
        Self {
            id: rental.id,
            user_id: rental.user_id,
            car_id: rental.car_id,
            rent_started_at: rental.rent_started_at,
            rent_ended_at: rental.rent_ended_at,
            created_at: rental.created_at,
        }
    }
}
