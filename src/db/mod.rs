pub mod car;
pub mod memory;
pub mod rental;
pub mod user;

use std::error::Error as StdError;

use derive_more::{Display, From};
use tokio_postgres::{error::SqlState, tls::NoTlsStream, NoTls, Socket};

pub use self::{
    car::{Car, CarStore},
    memory::Memory,
    rental::{Rental, RentalStore, Reservation},
    user::{User, UserStore},
};

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

pub async fn connect(url: &str) -> Result<(Client, Connection), Error> {
    Ok(tokio_postgres::connect(url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))?)
}

pub struct Client(tokio_postgres::Client);

/// Everything the HTTP layer needs from persistence.
pub trait Store: UserStore + CarStore + RentalStore {}

impl<T: UserStore + CarStore + RentalStore> Store for T {}

#[derive(Debug, Display, From)]
pub enum Error {
    #[display("database error: {_0}")]
    #[from]
    Postgres(tokio_postgres::Error),

    /// A uniqueness constraint rejected the write.
    #[display("record already exists")]
    Duplicate,
}

impl Error {
    fn from_postgres(e: tokio_postgres::Error) -> Self {
        if e.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            Self::Duplicate
        } else {
            Self::Postgres(e)
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Postgres(e) => Some(e),
            Self::Duplicate => None,
        }
    }
}
