//! Trip parameters applied to every row of a batch
//!
//! The parameter triple (passengers, cabin class, round trip) comes from the
//! trigger that started the pass, never from the CSV rows themselves. Rows
//! may carry their own trip columns; those are informational only.

use serde::{Deserialize, Serialize};

/// Cabin class accepted by the emissions service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CabinClass {
    Economy,
    PremiumEconomy,
    Business,
    First,
}

impl CabinClass {
    /// Numeric cabin class code used by the ICAO compute API
    /// (0 = Economy, 1 = Premium Economy, 2 = Business, 3 = First)
    pub fn icao_code(&self) -> u8 {
        match self {
            CabinClass::Economy => 0,
            CabinClass::PremiumEconomy => 1,
            CabinClass::Business => 2,
            CabinClass::First => 3,
        }
    }

    /// Title-cased display name ("Premium Economy")
    pub fn display_name(&self) -> &'static str {
        match self {
            CabinClass::Economy => "Economy",
            CabinClass::PremiumEconomy => "Premium Economy",
            CabinClass::Business => "Business",
            CabinClass::First => "First",
        }
    }

    /// Snake-cased identifier as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            CabinClass::Economy => "economy",
            CabinClass::PremiumEconomy => "premium_economy",
            CabinClass::Business => "business",
            CabinClass::First => "first",
        }
    }
}

impl Default for CabinClass {
    fn default() -> Self {
        CabinClass::Economy
    }
}

/// Trip parameter override applied to every row of a pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripParams {
    /// Passenger count (>= 1)
    #[serde(default = "default_passengers")]
    pub passengers: u32,

    /// Cabin class
    #[serde(default)]
    pub cabin_class: CabinClass,

    /// Round trip flag
    #[serde(default)]
    pub round_trip: bool,
}

fn default_passengers() -> u32 {
    1
}

impl Default for TripParams {
    fn default() -> Self {
        Self {
            passengers: 1,
            cabin_class: CabinClass::Economy,
            round_trip: false,
        }
    }
}

impl TripParams {
    /// Clamp invalid passenger counts up to the minimum of 1
    pub fn sanitized(self) -> Self {
        Self {
            passengers: self.passengers.max(1),
            ..self
        }
    }
}
