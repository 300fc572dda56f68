//! Process-local store, for running without Postgres and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use itertools::Itertools as _;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    car::{self, Car, CarStore, Filter},
    rental::{Rental, RentalStore, Reservation},
    user::{self, User, UserStore},
    Error,
};

#[derive(Default)]
pub struct Memory(RwLock<Tables>);

#[derive(Default)]
struct Tables {
    users: HashMap<user::Id, User>,
    cars: HashMap<car::Id, Car>,
    rentals: Vec<Rental>,
}

impl Tables {
    fn filtered<'a>(
        &'a self,
        filter: &'a Filter,
    ) -> impl Iterator<Item = &'a Car> + 'a {
        self.cars
            .values()
            .filter(move |car| filter.matches(car, self.rentals.iter()))
    }
}

#[async_trait]
impl UserStore for Memory {
    async fn get_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, Error> {
        let tables = self.0.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_id(
        &self,
        id: user::Id,
    ) -> Result<Option<User>, Error> {
        Ok(self.0.read().await.users.get(&id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), Error> {
        let mut tables = self.0.write().await;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(Error::Duplicate);
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }
}

#[async_trait]
impl CarStore for Memory {
    async fn get_car_by_id(&self, id: car::Id) -> Result<Option<Car>, Error> {
        Ok(self.0.read().await.cars.get(&id).cloned())
    }

    async fn get_cars_page(
        &self,
        filter: &Filter,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Car>, Error> {
        let tables = self.0.read().await;
        Ok(tables
            .filtered(filter)
            .sorted_by(|a, b| {
                (b.created_at, b.id).cmp(&(a.created_at, a.id))
            })
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_cars_count(&self, filter: &Filter) -> Result<usize, Error> {
        Ok(self.0.read().await.filtered(filter).count())
    }

    async fn write_car(&self, car: &Car) -> Result<(), Error> {
        let mut tables = self.0.write().await;
        let created_at = tables
            .cars
            .get(&car.id)
            .map_or(car.created_at, |existing| existing.created_at);
        tables.cars.insert(
            car.id,
            Car {
                created_at,
                ..car.clone()
            },
        );
        Ok(())
    }

    async fn delete_car(&self, id: car::Id) -> Result<bool, Error> {
        let mut tables = self.0.write().await;
        tables.rentals.retain(|r| r.car_id != id);
        Ok(tables.cars.remove(&id).is_some())
    }
}

#[async_trait]
impl RentalStore for Memory {
    async fn try_reserve(&self, rental: Rental) -> Result<Reservation, Error> {
        let mut tables = self.0.write().await;
        if !tables.cars.contains_key(&rental.car_id) {
            return Ok(Reservation::CarMissing);
        }
        if tables.rentals.iter().any(|r| r.conflicts_with(&rental)) {
            return Ok(Reservation::Conflict);
        }
        tables.rentals.push(rental.clone());
        Ok(Reservation::Reserved(rental))
    }

    async fn get_open_rentals(
        &self,
        car_ids: &[car::Id],
        at: OffsetDateTime,
    ) -> Result<Vec<Rental>, Error> {
        let tables = self.0.read().await;
        Ok(tables
            .rentals
            .iter()
            .filter(|r| car_ids.contains(&r.car_id) && r.rent_ended_at >= at)
            .sorted_by_key(|r| r.rent_started_at)
            .cloned()
            .collect())
    }
}
