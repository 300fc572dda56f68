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
use utoipa::ToSchema;
use uuid::Uuid;

use super::{Client, Error};

#[derive(Clone, Debug)]
pub struct Car {
    pub id: Id,
    pub name: String,
    pub price: i64,
    pub size: Size,
    pub image: Option<String>,
    pub is_currently_rented: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
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
        Id(Uuid::new_v4())
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

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    TryFromRepr,
    PartialEq,
    Serialize,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Size {
    Small = 1,
    Medium = 2,
    Large = 3,
}

impl FromSql<'_> for Size {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let size = Self::try_from(repr).map_err(|_| "invalid size")?;
        Ok(size)
    }
}

impl ToSql for Size {
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

/// Narrows a car listing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter {
    pub size: Option<Size>,

    /// Excludes cars with any rental ending at or after this instant.
    pub available_at: Option<OffsetDateTime>,
}

impl Filter {
    pub(super) fn matches<'a>(
        &self,
        car: &Car,
        mut rentals: impl Iterator<Item = &'a super::Rental>,
    ) -> bool {
        if self.size.is_some_and(|size| size != car.size) {
            return false;
        }
        match self.available_at {
            Some(at) => !rentals
                .any(|r| r.car_id == car.id && r.rent_ended_at >= at),
            None => true,
        }
    }
}

#[async_trait]
pub trait CarStore: Send + Sync {
    async fn get_car_by_id(&self, id: Id) -> Result<Option<Car>, Error>;

    /// Newest cars first.
    async fn get_cars_page(
        &self,
        filter: &Filter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Car>, Error>;

    async fn get_cars_count(&self, filter: &Filter) -> Result<usize, Error>;

    /// Inserts the car or overwrites the one with the same id.
    async fn write_car(&self, car: &Car) -> Result<(), Error>;

    /// Returns whether a car was actually removed. Its rentals go with it.
    async fn delete_car(&self, id: Id) -> Result<bool, Error>;
}

fn from_row(row: &Row) -> Car {
    Car {
        id: row.get("id"),
        name: row.get("name"),
        price: row.get("price"),
        size: row.get("size"),
        image: row.get("image"),
        is_currently_rented: row.get("is_currently_rented"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

// Both listing queries share this predicate; `$1` is the size and `$2` the
// availability instant, either of which may be NULL.
const FILTER_SQL: &str = "\
    ($1::SMALLINT IS NULL OR cars.size = $1) \
    AND ($2::TIMESTAMPTZ IS NULL OR NOT EXISTS ( \
        SELECT 1 FROM rentals \
        WHERE rentals.car_id = cars.id \
          AND rentals.rent_ended_at >= $2))";

#[async_trait]
impl CarStore for Client {
    async fn get_car_by_id(&self, id: Id) -> Result<Option<Car>, Error> {
        const SQL: &str = "\
            SELECT id, name, price, size, image, is_currently_rented, \
                   created_at, updated_at \
            FROM cars \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn get_cars_page(
        &self,
        filter: &Filter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Car>, Error> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sql = format!(
            "SELECT id, name, price, size, image, is_currently_rented, \
                    created_at, updated_at \
             FROM cars \
             WHERE {FILTER_SQL} \
             ORDER BY created_at DESC, \
                      id DESC \
             OFFSET $3 LIMIT $4"
        );
        Ok(self
            .0
            .query(
                &sql,
                &[&filter.size, &filter.available_at, &offset, &limit],
            )
            .await?
            .iter()
            .map(from_row)
            .collect())
    }

    async fn get_cars_count(&self, filter: &Filter) -> Result<usize, Error> {
        let sql = format!("SELECT COUNT(*) FROM cars WHERE {FILTER_SQL}");
        let count = self
            .0
            .query_one(&sql, &[&filter.size, &filter.available_at])
            .await?
            .get::<_, i64>(0);
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn write_car(&self, car: &Car) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO cars (id, name, price, size, image, \
                              is_currently_rented, created_at, updated_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
            ON CONFLICT (id) DO UPDATE \
            SET name = EXCLUDED.name, \
                price = EXCLUDED.price, \
                size = EXCLUDED.size, \
                image = EXCLUDED.image, \
                is_currently_rented = EXCLUDED.is_currently_rented, \
                updated_at = EXCLUDED.updated_at";

        self.0
            .execute(
                SQL,
                &[
                    &car.id,
                    &car.name,
                    &car.price,
                    &car.size,
                    &car.image,
                    &car.is_currently_rented,
                    &car.created_at,
                    &car.updated_at,
                ],
            )
            .await
            .map(drop)
            .map_err(Error::from_postgres)
    }

    async fn delete_car(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM cars WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
