use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::{middleware, routing::get, Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;

use crate::{
    app_state::AppState,
    middleware::auth::session_middleware,
    middleware::request_span::request_span_middleware,
    modules::{
        auth::routes::auth_routes, batches::routes::batch_routes,
        invoices::routes::invoice_routes, notifications::routes::notification_routes,
        purchase_orders::routes::purchase_order_routes, users::routes::user_routes,
    },
    websocket::websocket_routes,
};

pub fn create_router(state: AppState) -> Router {
    let ws_tx_cloned = state.ws_tx.clone();
    let ws_app = websocket_routes().with_state(ws_tx_cloned);

    let api = auth_routes()
        .merge(user_routes())
        .merge(batch_routes())
        .merge(purchase_order_routes())
        .merge(invoice_routes())
        .merge(notification_routes());

    let router = Router::new()
        .route("/", get(hello))
        .route("/health", get(health_check))
        .merge(ws_app)
        .nest("/api", api)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(middleware::from_fn(request_span_middleware));

    let router = match cors_layer(&state) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router.with_state(state)
}

/// CORS for the configured browser frontend. Credentials are allowed so the
/// session cookie survives cross-origin calls, which rules out wildcards.
fn cors_layer(state: &AppState) -> Option<CorsLayer> {
    let origin = state.env.app.frontend_origin.as_deref()?;
    match origin.parse::<HeaderValue>() {
        Ok(origin) => Some(
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE])
                .allow_credentials(true),
        ),
        Err(err) => {
            tracing::warn!("invalid FRONTEND_ORIGIN {origin:?}, CORS disabled: {err}");
            None
        }
    }
}

async fn hello() -> &'static str {
    "TMS Backend says hello!\n"
}

async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let db_result = sqlx::query("SELECT 1").execute(&state.db).await;

    let db_status = match db_result {
        Ok(_) => "healthy",
        Err(e) => {
            tracing::info!("Database health check failed: {}", e);
            "unhealthy"
        }
    };

    let timestamp = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default();

    Json(json!({
        "status": "ok",
        "timestamp": timestamp,
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "database": db_status
        }
    }))
}
