use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::{api, db, pagination::Pagination};

pub use crate::db::car::{Id, Size};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Id,
    pub name: String,
    pub price: i64,
    pub size: Size,
    pub image: Option<String>,
    pub is_currently_rented: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Rental still holding the car, filled in by listings only.
    pub user_car: Option<api::Rental>,
}

impl From<db::Car> for Car {
    fn from(car: db::Car) -> Self {
        Self {
            id: car.id,
            name: car.name,
            price: car.price,
            size: car.size,
            image: car.image,
            is_currently_rented: car.is_currently_rented,
            created_at: car.created_at,
            updated_at: car.updated_at,
            user_car: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct List {
    pub cars: Vec<Car>,
    pub meta: Meta,
}

#[derive(Clone, Debug, Deserialize, Serialize, ToSchema)]
pub struct Meta {
    pub pagination: Pagination,
}
