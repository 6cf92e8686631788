//! Core types and traits for the report service.
//!
//! Entities serialize with camelCase field names; the API layer returns them as-is.

mod dto;
mod entity;
mod traits;

pub use dto::*;
pub use entity::*;
pub use traits::*;
