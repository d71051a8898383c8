//! HTTP API handlers for fcal-ba
//!
//! The HTTP surface is thin plumbing over the scheduler and store; all
//! processing logic lives in the services layer.

pub mod automation;
pub mod health;
pub mod sse;

pub use automation::automation_routes;
pub use health::health_routes;
pub use sse::event_stream;
