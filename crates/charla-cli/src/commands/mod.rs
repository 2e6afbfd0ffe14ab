//! Command implementations

pub mod config;
pub mod ingest;
pub mod models;
pub mod session;
