//! Backend for coordinating training operations: batch scheduling, trainer
//! assignment, purchase-order and invoice bookkeeping, trainee rosters,
//! attendance, and the back-office notification feed.

pub mod app;
pub mod app_state;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod modules;
pub mod websocket;
