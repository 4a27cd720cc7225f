//! Domain models for the TimberBalance platform

mod catalog;
mod entries;

pub use catalog::*;
pub use entries::*;
