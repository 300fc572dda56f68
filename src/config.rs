use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    pub db: Db,
    pub http: Http,
    pub jwt: Jwt,
    #[serde(default)]
    pub auth: Auth,
    pub admin: Option<Admin>,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase", tag = "driver")]
pub enum Db {
    Postgres { url: String },
    Memory,
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    pub secret: String,
    #[serde(with = "humantime_serde")]
    pub expiration_time: time::Duration,
}

#[derive(Clone, Copy, Deserialize)]
pub struct Auth {
    /// Work factor handed to bcrypt when hashing new passwords.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Administrator account ensured at startup.
#[derive(Deserialize)]
pub struct Admin {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_memory_config() {
        let config = toml::from_str::<Config>(
            r#"
            [db]
            driver = "memory"

            [http.server]
            addr = "127.0.0.1:3000"

            [http.cors]
            allowed_origins = []

            [jwt]
            secret = "secret"
            expiration_time = "1day"
            "#,
        )
        .unwrap();

        assert!(matches!(config.db, Db::Memory));
        assert_eq!(config.auth.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(
            config.jwt.expiration_time,
            time::Duration::from_secs(24 * 60 * 60),
        );
        assert!(config.admin.is_none());
    }

    #[test]
    fn parses_postgres_config() {
        let config = toml::from_str::<Config>(
            r#"
            [db]
            driver = "postgres"
            url = "postgres://localhost/cars"

            [http.server]
            addr = "0.0.0.0:8000"

            [http.cors]
            allowed_origins = ["http://localhost:5173"]

            [jwt]
            secret = "secret"
            expiration_time = "2h"

            [auth]
            bcrypt_cost = 4

            [admin]
            name = "Admin"
            email = "admin@mail.com"
            password = "password"
            "#,
        )
        .unwrap();

        match config.db {
            Db::Postgres { url } => {
                assert_eq!(url, "postgres://localhost/cars");
            }
            Db::Memory => panic!("expected postgres driver"),
        }
        assert_eq!(config.auth.bcrypt_cost, 4);
        assert_eq!(config.admin.unwrap().email, "admin@mail.com");
    }
}
