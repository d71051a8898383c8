//! # FCAL Common Library
//!
//! Shared code for the FCAL services:
//! - Error type used across crates
//! - Configuration loading and root folder resolution
//! - Event types (AutomationEvent enum) and EventBus

pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
