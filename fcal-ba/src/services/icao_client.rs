//! ICAO carbon calculator API client
//!
//! Production implementation of the `EmissionsOracle` trait against the
//! ICAO ICEC passenger-compute endpoint. Strict mode: any failure path
//! (timeout, transport, bad status, HTML or malformed payload, empty
//! result) surfaces as an `OracleError`; no local approximation is
//! computed in its place.

use crate::models::TripParams;
use crate::services::oracle::{EmissionsEstimate, EmissionsOracle, OracleError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const ICAO_API_URL: &str = "https://icec.icao.int/Home/PassengerCompute";
const USER_AGENT: &str = "fcal-ba/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Factor converting fuel mass (kg) to CO₂ mass (kg)
const CO2_PER_KG_FUEL: f64 = 3.16;
/// Kilometres to miles
const KM_TO_MILES: f64 = 0.621371;

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Compute request payload in the shape the ICEC endpoint expects
#[derive(Debug, Serialize)]
struct ComputeRequest {
    #[serde(rename = "AirportCodeDeparture")]
    airport_code_departure: String,
    #[serde(rename = "AirportCodeDestination")]
    airport_code_destination: Vec<String>,
    #[serde(rename = "CabinClass")]
    cabin_class: u8,
    #[serde(rename = "Departure")]
    departure: String,
    #[serde(rename = "Destination")]
    destination: Vec<String>,
    #[serde(rename = "IsRoundTrip")]
    is_round_trip: bool,
    #[serde(rename = "NumberOfPassenger")]
    number_of_passenger: u32,
}

/// Top-level compute response
#[derive(Debug, Deserialize)]
struct ComputeResponse {
    #[serde(rename = "resultSummary", default)]
    result_summary: Vec<ResultSummary>,
}

/// Per-cabin-class result block
#[derive(Debug, Deserialize)]
struct ResultSummary {
    #[serde(rename = "cabinClass", default)]
    cabin_class: i64,
    #[serde(rename = "isClassFound", default)]
    is_class_found: bool,
    #[serde(default)]
    details: Vec<LegDetail>,
}

/// Per-leg figures; CO₂ is already per passenger
#[derive(Debug, Deserialize)]
struct LegDetail {
    #[serde(default)]
    co2: f64,
    #[serde(rename = "tripDistance", default)]
    trip_distance: f64,
}

/// ICAO emissions API client
pub struct IcaoClient {
    http_client: reqwest::Client,
    endpoint: String,
}

impl IcaoClient {
    /// Create a client against the default ICEC endpoint, or an override
    /// (used by configuration and tests).
    pub fn new(endpoint: Option<String>) -> Result<Self, OracleError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| OracleError::Connection(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: endpoint.unwrap_or_else(|| ICAO_API_URL.to_string()),
        })
    }

    fn build_payload(departure: &str, destination: &str, params: &TripParams) -> ComputeRequest {
        ComputeRequest {
            airport_code_departure: departure.to_uppercase(),
            airport_code_destination: vec![destination.to_uppercase()],
            cabin_class: params.cabin_class.icao_code(),
            departure: format!("{} Airport", departure.to_uppercase()),
            destination: vec![format!("{} Airport", destination.to_uppercase())],
            is_round_trip: params.round_trip,
            number_of_passenger: params.passengers,
        }
    }

    /// Parse the compute response into an estimate.
    ///
    /// Picks the result block matching the requested cabin class, falling
    /// back to economy when the class was not found; sums CO₂, fuel and
    /// distance over the trip legs. Leg CO₂ is per passenger; totals scale
    /// by the passenger count, and fuel per passenger is derived from CO₂
    /// via the 3.16 factor.
    fn parse_response(
        response: &ComputeResponse,
        params: &TripParams,
    ) -> Result<EmissionsEstimate, OracleError> {
        let wanted = params.cabin_class.icao_code() as i64;

        let summary = response
            .result_summary
            .iter()
            .find(|s| s.cabin_class == wanted && s.is_class_found)
            .or_else(|| {
                response
                    .result_summary
                    .iter()
                    .find(|s| s.cabin_class == 0 && s.is_class_found)
            })
            .ok_or(OracleError::NoResult)?;

        if summary.details.is_empty() {
            return Err(OracleError::NoResult);
        }

        let mut co2_per_passenger = 0.0;
        let mut distance_km = 0.0;
        for leg in &summary.details {
            co2_per_passenger += leg.co2;
            distance_km += leg.trip_distance;
        }

        let passengers = params.passengers as f64;
        let total_co2 = co2_per_passenger * passengers;
        let fuel_per_passenger = co2_per_passenger / CO2_PER_KG_FUEL;
        let total_fuel = fuel_per_passenger * passengers;

        Ok(EmissionsEstimate {
            fuel_burn_kg: total_fuel.round(),
            total_co2_kg: total_co2.round(),
            co2_per_passenger_kg: co2_per_passenger.round(),
            co2_tonnes: round3(total_co2 / 1000.0),
            distance_km: distance_km.round(),
            distance_miles: (distance_km * KM_TO_MILES).round(),
            data_source: "ICAO_API".to_string(),
        })
    }
}

#[async_trait]
impl EmissionsOracle for IcaoClient {
    async fn estimate(
        &self,
        departure: &str,
        destination: &str,
        params: &TripParams,
    ) -> Result<EmissionsEstimate, OracleError> {
        let payload = Self::build_payload(departure, destination, params);

        tracing::debug!(
            departure = %departure,
            destination = %destination,
            cabin_class = payload.cabin_class,
            "Calling ICAO compute API"
        );

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    OracleError::Timeout
                } else {
                    OracleError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OracleError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| OracleError::Connection(e.to_string()))?;

        let trimmed = body.trim_start();
        if trimmed.starts_with("<!DOCTYPE html>") || trimmed.starts_with("<html") {
            return Err(OracleError::MalformedResponse(
                "HTML instead of JSON".to_string(),
            ));
        }

        let parsed: ComputeResponse = serde_json::from_str(&body)
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

        let estimate = Self::parse_response(&parsed, params)?;

        tracing::info!(
            departure = %departure,
            destination = %destination,
            distance_km = estimate.distance_km,
            total_co2_kg = estimate.total_co2_kg,
            "Retrieved emissions estimate"
        );

        Ok(estimate)
    }
}
