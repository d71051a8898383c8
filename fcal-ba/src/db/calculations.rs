//! Persisted flight calculations
//!
//! Inserts run against any SQLite executor so the batch processor can call
//! them inside a savepoint; reads go straight to the pool.

use crate::models::TripParams;
use crate::services::oracle::EmissionsEstimate;
use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

/// New calculation record built by the batch processor
#[derive(Debug, Clone)]
pub struct NewCalculation<'a> {
    pub departure: &'a str,
    pub destination: &'a str,
    pub departure_airport_id: Option<i64>,
    pub destination_airport_id: Option<i64>,
    pub params: &'a TripParams,
    pub estimate: &'a EmissionsEstimate,
    pub flight_info: &'a str,
}

/// Insert one calculation, returning the new row id
pub async fn insert<'e, E>(executor: E, calc: &NewCalculation<'_>) -> Result<i64, sqlx::Error>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO flight_calculations (
            departure_airport_id, destination_airport_id,
            departure, destination,
            passengers, round_trip, cabin_class,
            distance_km, distance_miles,
            fuel_burn_kg, total_co2_kg, co2_per_passenger_kg, co2_tonnes,
            calculation_method, flight_info
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(calc.departure_airport_id)
    .bind(calc.destination_airport_id)
    .bind(calc.departure)
    .bind(calc.destination)
    .bind(calc.params.passengers as i64)
    .bind(calc.params.round_trip)
    .bind(calc.params.cabin_class.as_str())
    .bind(calc.estimate.distance_km)
    .bind(calc.estimate.distance_miles)
    .bind(calc.estimate.fuel_burn_kg)
    .bind(calc.estimate.total_co2_kg)
    .bind(calc.estimate.co2_per_passenger_kg)
    .bind(calc.estimate.co2_tonnes)
    .bind(calc.estimate.data_source.as_str())
    .bind(calc.flight_info)
    .fetch_one(executor)
    .await
}

/// Persisted calculation row for the results surface
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CalculationRow {
    pub id: i64,
    pub departure: String,
    pub destination: String,
    pub passengers: i64,
    pub round_trip: bool,
    pub cabin_class: String,
    pub distance_km: f64,
    pub distance_miles: f64,
    pub fuel_burn_kg: f64,
    pub total_co2_kg: f64,
    pub co2_per_passenger_kg: f64,
    pub co2_tonnes: f64,
    pub calculation_method: String,
    pub flight_info: Option<String>,
    pub created_at: String,
}

/// Most recent calculations, newest first
pub async fn recent(pool: &SqlitePool, limit: i64) -> Result<Vec<CalculationRow>, sqlx::Error> {
    sqlx::query_as::<_, CalculationRow>(
        "SELECT id, departure, destination, passengers, round_trip, cabin_class, \
                distance_km, distance_miles, fuel_burn_kg, total_co2_kg, \
                co2_per_passenger_kg, co2_tonnes, calculation_method, flight_info, \
                created_at \
         FROM flight_calculations ORDER BY created_at DESC, id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Total persisted calculations
pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM flight_calculations")
        .fetch_one(pool)
        .await
}
