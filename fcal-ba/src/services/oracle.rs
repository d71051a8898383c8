//! Emissions oracle boundary
//!
//! The batch processor only depends on this trait; the production
//! implementation is `IcaoClient`. Every failure variant is a row failure —
//! no fallback computation is ever substituted for a failed call.

use crate::models::TripParams;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Emissions oracle errors
///
/// Variants keep their distinct reason text; the batch report retains them
/// per row for later export.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    #[error("ICAO API timeout")]
    Timeout,

    #[error("ICAO API connection error: {0}")]
    Connection(String),

    #[error("ICAO API returned status {0}")]
    Status(u16),

    #[error("ICAO API returned malformed response: {0}")]
    MalformedResponse(String),

    #[error("ICAO API returned no usable result")]
    NoResult,
}

/// Result of one emissions computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionsEstimate {
    /// Fuel mass allocated to the requested passengers, kg
    pub fuel_burn_kg: f64,
    /// Total CO₂ for the requested passengers, kg
    pub total_co2_kg: f64,
    /// CO₂ per passenger, kg
    pub co2_per_passenger_kg: f64,
    /// Total CO₂, tonnes
    pub co2_tonnes: f64,
    /// Trip distance, km
    pub distance_km: f64,
    /// Trip distance, miles
    pub distance_miles: f64,
    /// Where the numbers came from (e.g. "ICAO_API")
    pub data_source: String,
}

/// Stateless computation service: one route plus trip parameters in, one
/// estimate or failure out.
#[async_trait]
pub trait EmissionsOracle: Send + Sync {
    async fn estimate(
        &self,
        departure: &str,
        destination: &str,
        params: &TripParams,
    ) -> Result<EmissionsEstimate, OracleError>;
}
