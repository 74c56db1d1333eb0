#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tower::ServiceExt;

use tms_backend::app::create_router;
use tms_backend::app_state::AppState;
use tms_backend::config::{AppConfig, Config, DatabaseConfig, Environment, ServerConfig};
use tms_backend::db;

pub struct TestApp {
    pub router: Router,
    pub ws_tx: Arc<Mutex<broadcast::Sender<String>>>,
}

/// Full application over a fresh in-memory database (one connection, so all
/// statements share it).
pub async fn spawn_app() -> TestApp {
    let pool = db::connect_pool("sqlite::memory:", 1, 1).await.unwrap();
    let (tx, _) = broadcast::channel(16);
    let ws_tx = Arc::new(Mutex::new(tx));
    let state = AppState::new(pool, test_config(), ws_tx.clone());
    TestApp {
        router: create_router(state),
        ws_tx,
    }
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
        },
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: Some(1),
            min_connections: Some(1),
        },
        mail: None,
        app: AppConfig {
            name: "tms-backend-tests".to_string(),
            environment: Environment::Development,
            frontend_origin: None,
            session_ttl_hours: 24,
        },
    }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(value) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(value.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Response<Body> {
        self.request("GET", path, cookie, None).await
    }

    pub async fn post(&self, path: &str, cookie: Option<&str>, body: Value) -> Response<Body> {
        self.request("POST", path, cookie, Some(body)).await
    }
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn register_user(app: &TestApp, email: &str, password: &str, role: &str) -> Value {
    let mut payload = json!({
        "email": email,
        "password": password,
        "first_name": "Pat",
        "last_name": "Example",
        "role": role,
    });
    if role == "TRAINER" {
        payload["specialization"] = json!("Rust");
    }
    let response = app.post("/api/register", None, payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

/// Logs in and returns the session cookie pair (`tms_session=<token>`).
pub async fn login(app: &TestApp, email: &str, password: &str) -> String {
    let response = app
        .post(
            "/api/login",
            None,
            json!({"email": email, "password": password}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login sets the session cookie")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

pub async fn register_and_login(app: &TestApp, email: &str, role: &str) -> String {
    register_user(app, email, "secret123", role).await;
    login(app, email, "secret123").await
}

/// A well-formed ONLINE batch payload with future dates.
pub fn online_batch(name: &str) -> Value {
    json!({
        "name": name,
        "training_mode": "ONLINE",
        "start_date": "2099-04-06",
        "end_date": "2099-04-10",
        "meeting_link": "https://meet.example.com/rust",
    })
}
