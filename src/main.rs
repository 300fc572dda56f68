use std::{env, error::Error, sync::Arc};

use axum::http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use tokio::{fs, net, task};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

use car_rental::{config, db, http, token, Config};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .init();

    let path = env::args().nth(1).unwrap_or_else(|| "config.toml".to_owned());
    let config = fs::read_to_string(&path).await?;
    let config = toml::from_str::<Config>(&config)?;

    let store: Arc<dyn db::Store> = match config.db {
        config::Db::Postgres { url } => {
            let (db_client, db_connection) = db::connect(&url).await?;
            task::spawn(async move {
                if let Err(e) = db_connection.await {
                    panic!("database connection failed: {e}");
                }
            });
            Arc::new(db_client)
        }
        config::Db::Memory => Arc::new(db::Memory::default()),
    };

    if let Some(admin) = &config.admin {
        db::user::ensure_admin(&*store, admin, config.auth.bcrypt_cost).await?;
    }

    let mut cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);
    for origin in &config.http.cors.allowed_origins {
        cors = cors.allow_origin(origin.parse::<HeaderValue>()?);
    }

    let app = http::router(http::AppState {
        db: store,
        keys: token::Keys::new(
            config.jwt.secret.as_bytes(),
            config.jwt.expiration_time,
        ),
        bcrypt_cost: config.auth.bcrypt_cost,
    })
    .layer(cors);

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
