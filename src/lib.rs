//! Room Rates Service
//!
//! Serves occupancy and nightly rate data for rooms over a single HTTP
//! route, `GET /api/room/{roomID}`. Every request must first be admitted by
//! a process-wide token bucket (5 requests per minute by default) before it
//! is routed to the handler.

pub mod config;
pub mod error;
pub mod handler;
pub mod limiter;
pub mod metrics;
pub mod router;
pub mod service;
pub mod source;
pub mod utils;

// Re-export main types
pub use config::ServiceConfig;
pub use error::{Result, RoomRatesError};
pub use limiter::{Admission, TokenBucket};
pub use service::{build_app, RoomRatesService};
pub use source::{RoomDataSource, RoomRecord};
