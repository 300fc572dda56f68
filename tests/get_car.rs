pub mod common;

use car_rental::api;
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn anyone_gets_car() {
    let client = common::Client::spawn().await;
    let car = client.as_admin().await.add_car("Toyota GT86", "SMALL").await;

    let found = client.get_car(car.id).await.unwrap();
    assert_eq!(found, car);
}

#[tokio::test]
async fn absent_car_is_not_found() {
    let client = common::Client::spawn().await;
    let id = api::car::Id::from(42);

    let err = client.get_car(id).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
    assert_eq!(err.error.name, "RecordNotFoundError");
    assert_eq!(err.error.message, format!("Car {id} is not found!"));
    assert_eq!(err.error.details, json!({}));
}

#[tokio::test]
async fn malformed_id_is_rejected() {
    let client = common::Client::spawn().await;

    let (status, body) = client.get("/v1/cars/not-a-uuid").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["name"], "ValidationError");
}
