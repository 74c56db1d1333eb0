pub mod auth;
pub mod request_span;
