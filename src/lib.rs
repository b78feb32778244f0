//! Gatehouse - account allocation gateway
//!
//! Gatehouse hands out exclusive account rows from a shared, slow,
//! rate-limited spreadsheet. Rows are cached per (store id, sheet), claimed
//! under a per-partition lock and written back through a debounced,
//! coalescing queue.

pub mod allocator;
pub mod auth;
pub mod cache;
pub mod config;
pub mod normalize;
pub mod queue;
pub mod record;
pub mod routes;
pub mod server;
pub mod service;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{GatehouseError, Result};
