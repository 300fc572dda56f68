pub mod api;
pub mod config;
pub mod db;
mod error;
pub mod http;
pub mod pagination;
pub mod token;

pub use self::{config::Config, error::Error};
