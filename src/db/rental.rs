use std::error::Error as StdError;

use async_trait::async_trait;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    error::SqlState,
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{car, user, Client, Error};

/// A car booked by a user over `[rent_started_at, rent_ended_at)`.
#[derive(Clone, Debug)]
pub struct Rental {
    pub id: Id,
    pub user_id: user::Id,
    pub car_id: car::Id,
    pub rent_started_at: OffsetDateTime,
    pub rent_ended_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl Rental {
    /// Whether both rentals hold the same car at some common instant.
    pub fn conflicts_with(&self, other: &Rental) -> bool {
        self.car_id == other.car_id
            && self.rent_started_at < other.rent_ended_at
            && other.rent_started_at < self.rent_ended_at
    }
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
    PartialEq,
    Serialize,
    ToSchema,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
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

/// Outcome of [`RentalStore::try_reserve`].
#[derive(Clone, Debug)]
pub enum Reservation {
    Reserved(Rental),

    /// Another rental of the same car overlaps the requested interval.
    Conflict,

    /// The car was deleted before the rental could be recorded.
    CarMissing,
}

#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Checks for overlapping rentals and records the new one as a single
    /// atomic step, so concurrent bookings of one car cannot both succeed.
    async fn try_reserve(&self, rental: Rental) -> Result<Reservation, Error>;

    /// Rentals of the given cars that end at or after `at`, earliest start
    /// first.
    async fn get_open_rentals(
        &self,
        car_ids: &[car::Id],
        at: OffsetDateTime,
    ) -> Result<Vec<Rental>, Error>;
}

fn from_row(row: &Row) -> Rental {
    Rental {
        id: row.get("id"),
        user_id: row.get("user_id"),
        car_id: row.get("car_id"),
        rent_started_at: row.get("rent_started_at"),
        rent_ended_at: row.get("rent_ended_at"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl RentalStore for Client {
    // Overlaps are rejected by the `rentals_no_overlap` exclusion
    // constraint, see `schema.sql`.
    async fn try_reserve(&self, rental: Rental) -> Result<Reservation, Error> {
        const SQL: &str = "\
            INSERT INTO rentals (id, user_id, car_id, rent_started_at, \
                                 rent_ended_at, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6)";

        let res = self
            .0
            .execute(
                SQL,
                &[
                    &rental.id,
                    &rental.user_id,
                    &rental.car_id,
                    &rental.rent_started_at,
                    &rental.rent_ended_at,
                    &rental.created_at,
                ],
            )
            .await;
        match res {
            Ok(_) => Ok(Reservation::Reserved(rental)),
            Err(e) if e.code() == Some(&SqlState::EXCLUSION_VIOLATION) => {
                Ok(Reservation::Conflict)
            }
            // Users are never deleted, so only the car reference can dangle.
            Err(e) if e.code() == Some(&SqlState::FOREIGN_KEY_VIOLATION) => {
                Ok(Reservation::CarMissing)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_open_rentals(
        &self,
        car_ids: &[car::Id],
        at: OffsetDateTime,
    ) -> Result<Vec<Rental>, Error> {
        const SQL: &str = "\
            SELECT id, user_id, car_id, rent_started_at, rent_ended_at, \
                   created_at \
            FROM rentals \
            WHERE car_id = ANY($1) \
              AND rent_ended_at >= $2 \
            ORDER BY rent_started_at";
        Ok(self
            .0
            .query(SQL, &[&car_ids, &at])
            .await?
            .iter()
            .map(from_row)
            .collect())
    }
}
