//! Course Registry API Server module
//!
//! HTTP REST API over per-upload sessions.
//! Run with `course-registry-server`.

pub mod handlers;
pub mod server;
pub mod sessions;

pub use server::{router, run_api_server, ApiConfig, AppState};
pub use sessions::{SessionSlot, SessionStore, StoreError};
