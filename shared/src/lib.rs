//! Shared types and domain logic for the TimberBalance platform
//!
//! This crate contains the product/certification catalog, the monthly
//! balance aggregator, and validation helpers shared between the backend
//! and any other component of the system. It performs no I/O.

pub mod balance;
pub mod export;
pub mod models;
pub mod types;
pub mod validation;

pub use balance::*;
pub use export::*;
pub use models::*;
pub use types::*;
pub use validation::*;
