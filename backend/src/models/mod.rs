//! Backend model re-exports

pub use shared::models::*;
