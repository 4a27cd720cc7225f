//! HTTP request handlers

mod auth;
mod balance;
mod bulk;
mod consumption;
mod document_processing;
mod landholding;
mod opening_stock;
mod production;
mod reception;
mod sale;

pub use auth::*;
pub use balance::*;
pub use bulk::*;
pub use consumption::*;
pub use document_processing::*;
pub use landholding::*;
pub use opening_stock::*;
pub use production::*;
pub use reception::*;
pub use sale::*;

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}
