pub mod auth;
pub mod batches;
pub mod invoices;
pub mod notifications;
pub mod purchase_orders;
pub mod users;
