pub mod common;

use car_rental::pagination::Pagination;
use serde_json::json;

#[tokio::test]
async fn pages_newest_first() {
    let client = common::Client::spawn().await.as_admin().await;
    client.add_car("Car 1", "SMALL").await;
    client.add_car("Car 2", "MEDIUM").await;
    client.add_car("Car 3", "LARGE").await;

    let list = client.list_cars("page=1&pageSize=2").await.unwrap();
    let names = list.cars.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Car 3", "Car 2"]);
    assert_eq!(
        list.meta.pagination,
        Pagination {
            page: 1,
            page_count: 2,
            page_size: 2,
            count: 3,
        },
    );

    let list = client.list_cars("page=2&pageSize=2").await.unwrap();
    let names = list.cars.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Car 1"]);
    assert_eq!(list.meta.pagination.page, 2);
}

#[tokio::test]
async fn defaults_pagination() {
    let client = common::Client::spawn().await;

    let list = client.list_cars("").await.unwrap();
    assert!(list.cars.is_empty());
    assert_eq!(
        list.meta.pagination,
        Pagination {
            page: 1,
            page_count: 0,
            page_size: 10,
            count: 0,
        },
    );
}

#[tokio::test]
async fn filters_by_size() {
    let client = common::Client::spawn().await.as_admin().await;
    client.add_car("Small", "SMALL").await;
    client.add_car("Large", "LARGE").await;

    let list = client.list_cars("size=LARGE").await.unwrap();
    let names = list.cars.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Large"]);
    assert_eq!(list.meta.pagination.count, 1);
}

#[tokio::test]
async fn filters_by_availability() {
    let client = common::Client::spawn().await;
    let admin = client.as_admin().await;
    let customer = client.as_customer("johndoe@mail.com").await;
    let rented = admin.add_car("Rented", "SMALL").await;
    admin.add_car("Free", "SMALL").await;

    customer
        .rent_car(
            rented.id,
            json!({
                "rentStartedAt": "2030-01-01T00:00:00Z",
                "rentEndedAt": "2030-01-02T00:00:00Z",
            }),
        )
        .await
        .unwrap();

    let list = client
        .list_cars("availableAt=2030-01-01T12:00:00Z")
        .await
        .unwrap();
    let names = list.cars.iter().map(|c| c.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, ["Free"]);

    let list = client
        .list_cars("availableAt=2030-01-03T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(list.meta.pagination.count, 2);
}

#[tokio::test]
async fn rejects_malformed_query() {
    let client = common::Client::spawn().await;

    let err = client.list_cars("size=HUGE").await.unwrap_err();
    assert_eq!(err.status, reqwest::StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(err.error.name, "ValidationError");
}

#[tokio::test]
async fn embeds_open_rental() {
    let client = common::Client::spawn().await;
    let admin = client.as_admin().await;
    let customer = client.as_customer("johndoe@mail.com").await;
    let rented = admin.add_car("Rented", "SMALL").await;
    admin.add_car("Free", "SMALL").await;

    let rental = customer
        .rent_car(
            rented.id,
            json!({
                "rentStartedAt": "2030-01-01T00:00:00Z",
                "rentEndedAt": "2030-01-02T00:00:00Z",
            }),
        )
        .await
        .unwrap();

    let list = client.list_cars("").await.unwrap();
    for car in &list.cars {
        match car.name.as_str() {
            "Rented" => assert_eq!(car.user_car.as_ref(), Some(&rental)),
            _ => assert_eq!(car.user_car, None),
        }
    }

    let list = client
        .list_cars("availableAt=2030-01-03T00:00:00Z")
        .await
        .unwrap();
    assert_eq!(list.meta.pagination.count, 2);
    assert!(list.cars.iter().all(|car| car.user_car.is_none()));
}
