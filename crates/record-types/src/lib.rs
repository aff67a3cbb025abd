//! Core types and traits for the record approval workflow.
//!
//! Records carry their own edit history and per-level approval entries; stores
//! persist whole records with a version counter for compare-and-swap updates.

mod dto;
mod model;
mod traits;

pub use dto::*;
pub use model::*;
pub use traits::*;
