use axum::{extract::State, http::StatusCode};
use serde::Deserialize;
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{self, car::Size},
    db::{self, car, rental, CarStore as _, RentalStore as _, Reservation},
    pagination::{self, Pagination},
    Error,
};

use super::{
    auth::{Admin, Authorized, Customer},
    extract::{Json, Path, Query},
    SharedAppState,
};

/// Rental length assumed when `rentEndedAt` is omitted.
pub const DEFAULT_RENTAL_DURATION: Duration = Duration::DAY;

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListCarsInput {
    size: Option<Size>,

    /// Only cars without rentals ending at or after this instant. Listed
    /// cars carry their earliest rental ending at or after this instant, or
    /// after now when omitted, as `userCar`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[param(value_type = Option<String>, format = DateTime)]
    available_at: Option<OffsetDateTime>,
}

#[utoipa::path(
    get,
    path = "/v1/cars",
    tag = "cars",
    params(pagination::Params, ListCarsInput),
    responses(
        (status = 200, description = "Page of cars", body = api::car::List),
        (status = 422, description = "Malformed query",
            body = api::ErrorResponse),
    ),
)]
pub async fn list_cars(
    State(state): State<SharedAppState>,
    Query(params): Query<pagination::Params>,
    Query(ListCarsInput { size, available_at }): Query<ListCarsInput>,
) -> Result<Json<api::car::List>, Error> {
    let filter = car::Filter { size, available_at };
    let offset = usize::try_from(params.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(params.page_size()).unwrap_or(usize::MAX);

    let page_fut = state.db.get_cars_page(&filter, offset, limit);
    let count_fut = state.db.get_cars_count(&filter);
    let (page, count) = tokio::try_join!(page_fut, count_fut)?;

    let car_ids = page.iter().map(|car| car.id).collect::<Vec<_>>();
    let open_at = available_at.unwrap_or_else(OffsetDateTime::now_utc);
    let rentals = state.db.get_open_rentals(&car_ids, open_at).await?;

    let cars = page
        .into_iter()
        .map(|car| {
            let user_car = rentals.iter().find(|r| r.car_id == car.id).cloned();
            api::Car {
                user_car: user_car.map(Into::into),
                ..api::Car::from(car)
            }
        })
        .collect();

    Ok(Json(api::car::List {
        cars,
        meta: api::car::Meta {
            pagination: Pagination::new(
                params,
                u64::try_from(count).unwrap_or(u64::MAX),
            ),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/v1/cars/{id}",
    tag = "cars",
    params(("id" = api::car::Id, Path, description = "Car id")),
    responses(
        (status = 200, description = "The car", body = api::Car),
        (status = 404, description = "No such car", body = api::ErrorResponse),
    ),
)]
pub async fn get_car(
    State(state): State<SharedAppState>,
    Path(id): Path<car::Id>,
) -> Result<Json<api::Car>, Error> {
    let car = state
        .db
        .get_car_by_id(id)
        .await?
        .ok_or_else(|| Error::RecordNotFound(format!("Car {id}")))?;

    Ok(Json(car.into()))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCarInput {
    name: String,
    price: i64,
    size: Size,
    image: Option<String>,
    #[serde(default)]
    is_currently_rented: bool,
}

#[utoipa::path(
    post,
    path = "/v1/cars",
    tag = "cars",
    security(("bearer" = [])),
    request_body = CreateCarInput,
    responses(
        (status = 201, description = "Created car", body = api::Car),
        (status = 401, description = "Not an administrator",
            body = api::ErrorResponse),
        (status = 422, description = "Rejected attributes",
            body = api::ErrorResponse),
    ),
)]
pub async fn create_car(
    State(state): State<SharedAppState>,
    admin: Authorized<Admin>,
    Json(CreateCarInput {
        name,
        price,
        size,
        image,
        is_currently_rented,
    }): Json<CreateCarInput>,
) -> Result<(StatusCode, Json<api::Car>), Error> {
    let now = OffsetDateTime::now_utc();
    let car = db::Car {
        id: car::Id::new(),
        name,
        price,
        size,
        image,
        is_currently_rented,
        created_at: now,
        updated_at: now,
    };
    validate(&car)?;

    state.db.write_car(&car).await.map_err(rejected)?;
    info!(car_id = %car.id, admin_id = %admin.claims.id, "car created");

    Ok((StatusCode::CREATED, Json(car.into())))
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCarInput {
    name: Option<String>,
    price: Option<i64>,
    size: Option<Size>,
    image: Option<String>,
    is_currently_rented: Option<bool>,
}

/// Omitted attributes keep their current value.
#[utoipa::path(
    put,
    path = "/v1/cars/{id}",
    tag = "cars",
    security(("bearer" = [])),
    params(("id" = api::car::Id, Path, description = "Car id")),
    request_body = UpdateCarInput,
    responses(
        (status = 200, description = "Updated car", body = api::Car),
        (status = 401, description = "Not an administrator",
            body = api::ErrorResponse),
        (status = 422, description = "Rejected attributes or absent car",
            body = api::ErrorResponse),
    ),
)]
pub async fn update_car(
    State(state): State<SharedAppState>,
    admin: Authorized<Admin>,
    Path(id): Path<car::Id>,
    Json(input): Json<UpdateCarInput>,
) -> Result<Json<api::Car>, Error> {
    let Some(mut car) = state.db.get_car_by_id(id).await.map_err(rejected)?
    else {
        return Err(Error::Validation(format!("Car {id} does not exist")));
    };

    if let Some(name) = input.name {
        car.name = name;
    }
    if let Some(price) = input.price {
        car.price = price;
    }
    if let Some(size) = input.size {
        car.size = size;
    }
    if let Some(image) = input.image {
        car.image = Some(image);
    }
    if let Some(is_currently_rented) = input.is_currently_rented {
        car.is_currently_rented = is_currently_rented;
    }
    car.updated_at = OffsetDateTime::now_utc();
    validate(&car)?;

    state.db.write_car(&car).await.map_err(rejected)?;
    info!(car_id = %car.id, admin_id = %admin.claims.id, "car updated");

    Ok(Json(car.into()))
}

/// Succeeds whether or not the car existed.
#[utoipa::path(
    delete,
    path = "/v1/cars/{id}",
    tag = "cars",
    security(("bearer" = [])),
    params(("id" = api::car::Id, Path, description = "Car id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Not an administrator",
            body = api::ErrorResponse),
    ),
)]
pub async fn delete_car(
    State(state): State<SharedAppState>,
    admin: Authorized<Admin>,
    Path(id): Path<car::Id>,
) -> Result<StatusCode, Error> {
    let removed = state.db.delete_car(id).await?;
    info!(car_id = %id, admin_id = %admin.claims.id, removed, "car deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentCarInput {
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    rent_started_at: OffsetDateTime,

    /// Defaults to one day after `rentStartedAt`.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    rent_ended_at: Option<OffsetDateTime>,
}

#[utoipa::path(
    post,
    path = "/v1/cars/{id}/rent",
    tag = "cars",
    security(("bearer" = [])),
    params(("id" = api::car::Id, Path, description = "Car id")),
    request_body = RentCarInput,
    responses(
        (status = 201, description = "Car reserved", body = api::Rental),
        (status = 401, description = "Not a customer",
            body = api::ErrorResponse),
        (status = 404, description = "No such car", body = api::ErrorResponse),
        (status = 422, description = "Car already rented or bad interval",
            body = api::ErrorResponse),
    ),
)]
pub async fn rent_car(
    State(state): State<SharedAppState>,
    customer: Authorized<Customer>,
    Path(id): Path<car::Id>,
    Json(RentCarInput {
        rent_started_at,
        rent_ended_at,
    }): Json<RentCarInput>,
) -> Result<(StatusCode, Json<api::Rental>), Error> {
    use Error as E;

    let car = state
        .db
        .get_car_by_id(id)
        .await?
        .ok_or_else(|| E::RecordNotFound(format!("Car {id}")))?;

    let rent_ended_at = match rent_ended_at {
        Some(at) => at,
        None => rent_started_at
            .checked_add(DEFAULT_RENTAL_DURATION)
            .ok_or_else(|| {
                E::Validation(
                    "rentStartedAt leaves no room for the default rental"
                        .to_owned(),
                )
            })?,
    };
    if rent_ended_at <= rent_started_at {
        return Err(E::InvalidRentalInterval {
            started_at: rent_started_at,
            ended_at: rent_ended_at,
        });
    }

    let rental = db::Rental {
        id: rental::Id::new(),
        user_id: customer.claims.id,
        car_id: car.id,
        rent_started_at,
        rent_ended_at,
        created_at: OffsetDateTime::now_utc(),
    };
    match state.db.try_reserve(rental).await? {
        Reservation::Reserved(rental) => {
            info!(
                rental_id = %rental.id,
                car_id = %rental.car_id,
                user_id = %rental.user_id,
                "car rented"
            );
            Ok((StatusCode::CREATED, Json(rental.into())))
        }
        Reservation::Conflict => {
            warn!(
                car_id = %car.id,
                user_id = %customer.claims.id,
                "car already rented"
            );
            Err(E::CarAlreadyRented(Box::new(car.into())))
        }
        Reservation::CarMissing => {
            Err(E::RecordNotFound(format!("Car {}", car.id)))
        }
    }
}

fn validate(car: &db::Car) -> Result<(), Error> {
    if car.name.trim().is_empty() {
        return Err(Error::Validation("name must not be empty".to_owned()));
    }
    if car.price < 0 {
        return Err(Error::Validation("price must not be negative".to_owned()));
    }
    Ok(())
}

/// Persistence failures on create and update are reported as 422.
fn rejected(e: db::Error) -> Error {
    warn!(error = %e, "car write rejected");
    Error::Validation(e.to_string())
}
