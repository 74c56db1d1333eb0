mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{json_body, online_batch, register_and_login, register_user, spawn_app};

#[tokio::test]
async fn batches_without_purchase_orders_raise_a_notification_once() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;
    let mut feed = app.ws_tx.lock().unwrap().subscribe();

    let response = app
        .post("/api/batches", Some(&admin), online_batch("Unfunded"))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let batch = json_body(response).await;
    let id = batch["id"].as_str().unwrap();

    let response = app.get("/api/notifications", Some(&admin)).await;
    let notifications = json_body(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    assert_eq!(notifications[0]["notification_type"], "PURCHASE_ORDER_NEEDED");
    assert_eq!(notifications[0]["batch_id"], batch["id"]);
    assert_eq!(notifications[0]["is_read"], false);

    // The admin feed saw it too.
    let pushed: Value = serde_json::from_str(&feed.try_recv().unwrap()).unwrap();
    assert_eq!(pushed["notification_type"], "PURCHASE_ORDER_NEEDED");
    assert_eq!(pushed["batch_id"], batch["id"]);

    // Editing the batch while the reminder is unread does not stack another.
    let response = app
        .request(
            "PUT",
            &format!("/api/batches/{id}"),
            Some(&admin),
            Some(online_batch("Unfunded")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/notifications", Some(&admin)).await;
    let notifications = json_body(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);

    // Once it is read, the next edit may remind again.
    let nid = notifications[0]["id"].as_str().unwrap();
    let response = app
        .request(
            "POST",
            &format!("/api/notifications/{nid}/read"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .request(
            "PUT",
            &format!("/api/batches/{id}"),
            Some(&admin),
            Some(online_batch("Unfunded")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/notifications", Some(&admin)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn funded_batches_stay_quiet() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;

    let response = app
        .post(
            "/api/purchase-orders",
            Some(&admin),
            json!({"client_name": "Acme", "po_number": "PO-1", "amount": 100.0}),
        )
        .await;
    let po = json_body(response).await;

    let mut payload = online_batch("Funded");
    payload["purchase_order_id"] = po["id"].clone();
    let response = app.post("/api/batches", Some(&admin), payload).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.get("/api/notifications", Some(&admin)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn declines_notify_with_the_trainer_and_batch() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;
    let trainer = register_user(&app, "t@example.com", "secret123", "TRAINER").await;
    let cookie_t = common::login(&app, "t@example.com", "secret123").await;

    let response = app
        .post(
            "/api/purchase-orders",
            Some(&admin),
            json!({"client_name": "Acme", "po_number": "PO-1", "amount": 100.0}),
        )
        .await;
    let po = json_body(response).await;

    let mut payload = online_batch("Declined Cohort");
    payload["trainer_id"] = trainer["id"].clone();
    payload["purchase_order_id"] = po["id"].clone();
    let response = app.post("/api/batches", Some(&admin), payload).await;
    let batch = json_body(response).await;
    let id = batch["id"].as_str().unwrap();

    let mut feed = app.ws_tx.lock().unwrap().subscribe();
    let response = app
        .request(
            "POST",
            &format!("/api/batches/{id}/assignment/decline"),
            Some(&cookie_t),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["assignment_status"], "REJECTED");

    let response = app.get("/api/notifications?unread_only=true", Some(&admin)).await;
    let notifications = json_body(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 1);
    let note = &notifications[0];
    assert_eq!(note["notification_type"], "TRAINING_DECLINED");
    assert_eq!(note["batch_id"], batch["id"]);
    assert_eq!(note["trainer_id"], trainer["id"]);
    let message = note["message"].as_str().unwrap();
    assert!(message.contains("Pat Example"));
    assert!(message.contains("Declined Cohort"));

    let pushed: Value = serde_json::from_str(&feed.try_recv().unwrap()).unwrap();
    assert_eq!(pushed["notification_type"], "TRAINING_DECLINED");

    // Declining is final; a second try conflicts and adds nothing.
    let response = app
        .request(
            "POST",
            &format!("/api/batches/{id}/assignment/decline"),
            Some(&cookie_t),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let response = app.get("/api/notifications", Some(&admin)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn reading_and_deleting_notifications() {
    let app = spawn_app().await;
    let admin = register_and_login(&app, "admin@example.com", "ADMIN").await;

    app.post("/api/batches", Some(&admin), online_batch("First")).await;
    app.post("/api/batches", Some(&admin), online_batch("Second")).await;

    let response = app.get("/api/notifications", Some(&admin)).await;
    let notifications = json_body(response).await;
    assert_eq!(notifications.as_array().unwrap().len(), 2);
    let first = notifications[0]["id"].as_str().unwrap().to_string();

    let response = app
        .request("POST", &format!("/api/notifications/{first}/read"), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let read = json_body(response).await;
    assert_eq!(read["is_read"], true);
    assert!(read["read_at"].is_string());

    let response = app
        .get("/api/notifications?unread_only=true", Some(&admin))
        .await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = app
        .request("DELETE", &format!("/api/notifications/{first}"), Some(&admin), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.get("/api/notifications", Some(&admin)).await;
    assert_eq!(json_body(response).await.as_array().unwrap().len(), 1);

    let response = app
        .request(
            "POST",
            "/api/notifications/00000000-0000-0000-0000-000000000009/read",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn the_feed_is_for_admin_and_operations() {
    let app = spawn_app().await;
    let ops = register_and_login(&app, "ops@example.com", "OPERATIONS").await;
    let accounts = register_and_login(&app, "accounts@example.com", "ACCOUNTS").await;
    let trainer = register_and_login(&app, "trainer@example.com", "TRAINER").await;

    let response = app.get("/api/notifications", Some(&ops)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("/api/notifications", Some(&accounts)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.get("/api/notifications", Some(&trainer)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
