use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::{auth, car};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Car Rental API",
        description = "Car catalog and rental bookings."
    ),
    paths(
        super::root,
        auth::register,
        auth::login,
        auth::whoami,
        car::list_cars,
        car::get_car,
        car::create_car,
        car::update_car,
        car::delete_car,
        car::rent_car,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Registration and access tokens"),
        (name = "cars", description = "Car catalog and rentals"),
    ),
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi
            .components
            .get_or_insert_with(Default::default)
            .add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
    }
}

pub async fn documentation() -> axum::Json<utoipa::openapi::OpenApi> {
    axum::Json(ApiDoc::openapi())
}
