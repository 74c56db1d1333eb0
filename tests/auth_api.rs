mod common;

use axum::http::{header, StatusCode};
use serde_json::json;

use common::{json_body, login, register_and_login, register_user, spawn_app};

#[tokio::test]
async fn hello_and_health_respond() {
    let app = spawn_app().await;

    let response = app.get("/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["services"]["database"], "healthy");
}

#[tokio::test]
async fn register_login_me_logout_roundtrip() {
    let app = spawn_app().await;

    let user = register_user(&app, "ada@example.com", "secret123", "ADMIN").await;
    assert_eq!(user["email"], "ada@example.com");
    assert_eq!(user["role"], "ADMIN");
    assert!(user.get("password_hash").is_none());

    let cookie = login(&app, "ada@example.com", "secret123").await;

    let response = app.get("/api/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let me = json_body(response).await;
    assert_eq!(me["id"], user["id"]);

    let response = app.request("POST", "/api/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let clear = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(clear.contains("Max-Age=0"));

    // The old token is gone server-side.
    let response = app.get("/api/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn email_addresses_are_unique_and_case_insensitive() {
    let app = spawn_app().await;
    register_user(&app, "ada@example.com", "secret123", "ADMIN").await;

    let response = app
        .post(
            "/api/register",
            None,
            json!({
                "email": "ADA@example.com",
                "password": "secret123",
                "first_name": "Ada",
                "last_name": "Again",
                "role": "TRAINEE",
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = spawn_app().await;
    register_user(&app, "ada@example.com", "secret123", "ADMIN").await;

    let response = app
        .post(
            "/api/login",
            None,
            json!({"email": "ada@example.com", "password": "nope"}),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = spawn_app().await;

    let response = app.get("/api/me", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/api/batches", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .get("/api/me", Some("tms_session=not-a-token"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_listing_is_admin_only() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;
    let trainee = register_and_login(&app, "trainee@example.com", "TRAINEE").await;

    let response = app.get("/api/users", Some(&admin)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let users = json_body(response).await;
    assert_eq!(users.as_array().unwrap().len(), 2);

    let response = app.get("/api/users", Some(&trainee)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn trainer_directory_is_for_schedulers() {
    let app = spawn_app().await;
    register_and_login(&app, "trainer@example.com", "TRAINER").await;
    let ops = register_and_login(&app, "ops@example.com", "OPERATIONS").await;
    let accounts = register_and_login(&app, "accounts@example.com", "ACCOUNTS").await;

    let response = app.get("/api/trainers", Some(&ops)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let trainers = json_body(response).await;
    assert_eq!(trainers.as_array().unwrap().len(), 1);
    assert_eq!(trainers[0]["role"], "TRAINER");

    let response = app.get("/api/trainers", Some(&accounts)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_trainer_endpoint_mints_working_credentials() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;

    let response = app
        .request("POST", "/api/test-trainer", Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let minted = json_body(response).await;
    assert_eq!(minted["user"]["role"], "TRAINER");

    let email = minted["user"]["email"].as_str().unwrap();
    let password = minted["password"].as_str().unwrap();
    let cookie = login(&app, email, password).await;

    let response = app.get("/api/me", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
}
