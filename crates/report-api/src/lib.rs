//! Report service HTTP layer.

pub mod attachments;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
