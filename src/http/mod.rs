pub mod auth;
pub mod car;
pub mod docs;
pub mod extract;

use std::{any::Any, sync::Arc};

use axum::{
    http::{Method, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};
use tracing::error;
use utoipa::ToSchema;

use crate::{db, token, Error};

use self::extract::Json;

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    pub db: Arc<dyn db::Store>,

    pub keys: token::Keys,

    pub bcrypt_cost: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/documentation.json", get(docs::documentation))
        .route("/v1/auth/register", post(auth::register))
        .route("/v1/auth/login", post(auth::login))
        .route("/v1/auth/whoami", get(auth::whoami))
        .route("/v1/cars", get(car::list_cars).post(car::create_car))
        .route(
            "/v1/cars/:id",
            get(car::get_car).put(car::update_car).delete(car::delete_car),
        )
        .route("/v1/cars/:id/rent", post(car::rent_car))
        .fallback(not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Status {
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = Status)),
)]
pub async fn root() -> Json<Status> {
    Json(Status {
        status: "OK".to_owned(),
        message: "BCR API is up and running!".to_owned(),
    })
}

async fn not_found(method: Method, uri: Uri) -> Error {
    Error::NotFound {
        method,
        url: uri.to_string(),
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "handler panicked".to_owned()
    };
    error!(%message, "handler panicked");

    Error::Internal(message).into_response()
}
