//! Business logic services

pub mod auth;
pub mod balance;
pub mod bulk;
pub mod consumption;
pub mod document_processing;
pub mod landholding;
pub mod opening_stock;
pub mod production;
pub mod reception;
pub mod sale;
