pub mod car;
pub mod error;
pub mod rental;
pub mod user;

pub use self::{car::Car, error::ErrorResponse, rental::Rental, user::User};
