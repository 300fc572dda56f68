pub mod common;

use car_rental::api;
use reqwest::StatusCode;

#[tokio::test]
async fn deletes_car() {
    let client = common::Client::spawn().await.as_admin().await;
    let car = client.add_car("Toyota GT86", "SMALL").await;

    let status = client.delete_car(car.id).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = client.get_car(car.id).await.unwrap_err();
    assert_eq!(err.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_absent_car_succeeds() {
    let client = common::Client::spawn().await.as_admin().await;

    let status = client.delete_car(api::car::Id::from(42)).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn customer_may_not_delete_car() {
    let client = common::Client::spawn().await;
    let car = client.as_admin().await.add_car("Toyota GT86", "SMALL").await;
    let customer = client.as_customer("johndoe@mail.com").await;

    let err = customer.delete_car(car.id).await.unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    assert_eq!(err.error.name, "InsufficientAccessError");

    assert!(client.get_car(car.id).await.is_ok());
}
