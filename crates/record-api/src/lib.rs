//! REST API for the record approval workflow.

pub mod config;
pub mod server;
