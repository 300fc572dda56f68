use std::{sync::Arc, time::Duration};

use car_rental::{api, config, db, http, token};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const ADMIN_EMAIL: &str = "admin@mail.com";
pub const ADMIN_PASSWORD: &str = "password";
pub const CUSTOMER_PASSWORD: &str = "password";
pub const JWT_SECRET: &[u8] = b"secret";

/// Error response of a failed request.
#[derive(Debug)]
pub struct Failure {
    pub status: StatusCode,
    pub error: api::error::ErrorBody,
}

pub type Response<T> = Result<T, Failure>;

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    /// Starts a fresh server backed by an in-memory store with a single
    /// administrator account.
    pub async fn spawn() -> Self {
        let store = db::Memory::default();
        db::user::ensure_admin(
            &store,
            &config::Admin {
                name: String::from("Admin"),
                email: String::from(ADMIN_EMAIL),
                password: String::from(ADMIN_PASSWORD),
            },
            4,
        )
        .await
        .expect("failed to seed an administrator");

        let app = http::router(http::AppState {
            db: Arc::new(store),
            keys: token::Keys::new(JWT_SECRET, Duration::from_secs(60 * 60)),
            bcrypt_cost: 4,
        });
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind a listener");
        let addr = listener.local_addr().expect("no local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        Self {
            inner: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            auth_token: None,
        }
    }

    /// Same server, no credentials.
    pub fn anonymous(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            base_url: self.base_url.clone(),
            auth_token: None,
        }
    }

    pub fn with_token(&self, access_token: String) -> Self {
        Self {
            auth_token: Some(access_token),
            ..self.anonymous()
        }
    }

    pub async fn as_admin(&self) -> Self {
        let token = self
            .login(ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .expect("failed to log in as administrator");
        self.with_token(token.access_token)
    }

    pub async fn as_customer(&self, email: &str) -> Self {
        let token = self
            .register("John Doe", email, CUSTOMER_PASSWORD)
            .await
            .expect("failed to register a customer");
        self.with_token(token.access_token)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Response<api::user::AccessToken> {
        let req = self.inner.post(self.url("/v1/auth/register")).json(&json!({
            "name": name,
            "email": email,
            "password": password,
        }));
        json_body(self.send(req).await?).await
    }

    pub async fn login(
        &self,
        email: &str,
        password: &str,
    ) -> Response<api::user::AccessToken> {
        let req = self.inner.post(self.url("/v1/auth/login")).json(&json!({
            "email": email,
            "password": password,
        }));
        json_body(self.send(req).await?).await
    }

    pub async fn whoami(&self) -> Response<api::User> {
        let req = self.inner.get(self.url("/v1/auth/whoami"));
        json_body(self.send(req).await?).await
    }

    pub async fn list_cars(&self, query: &str) -> Response<api::car::List> {
        let req = self.inner.get(self.url(&format!("/v1/cars?{query}")));
        json_body(self.send(req).await?).await
    }

    pub async fn get_car(&self, id: api::car::Id) -> Response<api::Car> {
        let req = self.inner.get(self.url(&format!("/v1/cars/{id}")));
        json_body(self.send(req).await?).await
    }

    pub async fn create_car(&self, body: Value) -> Response<api::Car> {
        let req = self.inner.post(self.url("/v1/cars")).json(&body);
        json_body(self.send(req).await?).await
    }

    pub async fn add_car(&self, name: &str, size: &str) -> api::Car {
        self.create_car(json!({
            "name": name,
            "price": 300_000,
            "size": size,
        }))
        .await
        .expect("failed to create a car")
    }

    pub async fn update_car(
        &self,
        id: api::car::Id,
        body: Value,
    ) -> Response<api::Car> {
        let req = self
            .inner
            .put(self.url(&format!("/v1/cars/{id}")))
            .json(&body);
        json_body(self.send(req).await?).await
    }

    pub async fn delete_car(&self, id: api::car::Id) -> Response<StatusCode> {
        let req = self.inner.delete(self.url(&format!("/v1/cars/{id}")));
        Ok(self.send(req).await?.status())
    }

    pub async fn rent_car(
        &self,
        id: api::car::Id,
        body: Value,
    ) -> Response<api::Rental> {
        let req = self
            .inner
            .post(self.url(&format!("/v1/cars/{id}/rent")))
            .json(&body);
        json_body(self.send(req).await?).await
    }

    /// Untyped request for routes outside the versioned API.
    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .inner
            .get(self.url(path))
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        let body = res.json::<Value>().await.expect("failed to get a response");
        (status, body)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send(
        &self,
        mut req: RequestBuilder,
    ) -> Response<reqwest::Response> {
        if let Some(token) = &self.auth_token {
            req = req.bearer_auth(token);
        }
        let res = req.send().await.expect("failed to send a request");
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res
            .json::<api::ErrorResponse>()
            .await
            .expect("failed to get an error response");
        Err(Failure {
            status,
            error: body.error,
        })
    }
}

async fn json_body<T: DeserializeOwned>(res: reqwest::Response) -> Response<T> {
    Ok(res.json::<T>().await.expect("failed to get a response"))
}
