use std::sync::{Arc, Mutex};

use sqlx::SqlitePool;
use tokio::sync::broadcast;

use crate::config;
use crate::db::Notification;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub env: config::Config,
    pub ws_tx: Arc<Mutex<broadcast::Sender<String>>>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        env: config::Config,
        ws_tx: Arc<Mutex<broadcast::Sender<String>>>,
    ) -> Self {
        Self { db, env, ws_tx }
    }

    /// Pushes a committed notification onto the live feed. Fire and forget:
    /// a send with nobody listening is not an error.
    pub fn broadcast_notification(&self, notification: &Notification) {
        match serde_json::to_string(notification) {
            Ok(payload) => {
                if let Ok(tx) = self.ws_tx.lock() {
                    let _ = tx.send(payload);
                }
            }
            Err(err) => tracing::warn!("failed to serialize notification for the feed: {err}"),
        }
    }
}
