//! Shared infrastructure for the router tests
//!
//! Every test gets a fresh in-memory store behind the real router, so the
//! full middleware stack runs without a database.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tasktrack_api::app::{build_router, AppState};
use tasktrack_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LoggingConfig};
use tasktrack_shared::store::{memory::MemoryStore, Store};
use tower::Service as _;
use uuid::Uuid;

pub const PASSWORD: &str = "Senha2025";

/// Test context: router plus direct access to its store
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: "router-test-secret-at-least-32-bytes".to_string(),
        },
        logging: LoggingConfig::default(),
    }
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let state = AppState::new(store.clone() as Arc<dyn Store>, config.clone());

        Self {
            store,
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and returns the status plus the JSON body (`Null` if empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn register(&self, email: &str, company: &str) -> (StatusCode, Value) {
        let name = email.split('@').next().unwrap_or(email);
        self.send(
            Method::POST,
            "/v1/auth/register",
            None,
            Some(json!({
                "email": email,
                "password": PASSWORD,
                "name": name,
                "company": company,
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            "/v1/auth/login",
            None,
            Some(json!({ "email": email, "password": PASSWORD })),
        )
        .await
    }

    /// Registers the first member of a company and returns their access token
    pub async fn bootstrap_admin(&self, email: &str, company: &str) -> String {
        let (status, body) = self.register(email, company).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        body["access_token"].as_str().unwrap().to_string()
    }

    /// Registers, approves through the API, and logs in a seller
    pub async fn approved_seller(
        &self,
        approver_token: &str,
        email: &str,
        company: &str,
    ) -> (Uuid, String) {
        let (status, body) = self.register(email, company).await;
        assert_eq!(status, StatusCode::ACCEPTED, "{}", body);
        let user_id: Uuid = body["user_id"].as_str().unwrap().parse().unwrap();

        let (status, body) = self
            .post(
                &format!("/v1/users/pending/{}/approve", user_id),
                approver_token,
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        let (status, body) = self.login(email).await;
        assert_eq!(status, StatusCode::OK, "{}", body);

        (user_id, body["access_token"].as_str().unwrap().to_string())
    }
}

/// Reads a UUID field out of a JSON value
pub fn uuid_at(value: &Value, field: &str) -> Uuid {
    value[field].as_str().unwrap().parse().unwrap()
}
