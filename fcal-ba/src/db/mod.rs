//! Database access for fcal-ba
//!
//! SQLite storage for the airports reference table and persisted
//! calculations.

pub mod airports;
pub mod calculations;

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
///
/// Opens (or creates) the database file and runs the table migrations.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Initialize fcal-ba tables
///
/// Creates airports and flight_calculations if they don't exist.
async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS airports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            iata_code TEXT NOT NULL UNIQUE,
            icao_code TEXT,
            name TEXT NOT NULL,
            city TEXT,
            country TEXT,
            latitude REAL,
            longitude REAL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS flight_calculations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            departure_airport_id INTEGER REFERENCES airports(id),
            destination_airport_id INTEGER REFERENCES airports(id),
            departure TEXT NOT NULL,
            destination TEXT NOT NULL,
            passengers INTEGER NOT NULL DEFAULT 1,
            round_trip INTEGER NOT NULL DEFAULT 0,
            cabin_class TEXT NOT NULL DEFAULT 'economy',
            distance_km REAL NOT NULL,
            distance_miles REAL NOT NULL,
            fuel_burn_kg REAL NOT NULL,
            total_co2_kg REAL NOT NULL,
            co2_per_passenger_kg REAL NOT NULL,
            co2_tonnes REAL NOT NULL,
            calculation_method TEXT NOT NULL DEFAULT 'ICAO_API',
            flight_info TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_calculations_created_at \
         ON flight_calculations(created_at)",
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized (airports, flight_calculations)");

    Ok(())
}
