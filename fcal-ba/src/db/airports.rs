//! Airports reference table
//!
//! Lookup-by-code resolver used to attach optional foreign keys to
//! persisted calculations. Absence of a code is not an error.

use sqlx::SqlitePool;

/// Resolve an IATA code to the airport's row id, if known
///
/// Executor-generic so the batch processor can look up inside its open
/// transaction.
pub async fn airport_id<'e, E>(executor: E, iata_code: &str) -> Result<Option<i64>, sqlx::Error>
where
    E: sqlx::SqliteExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>("SELECT id FROM airports WHERE iata_code = ?")
        .bind(iata_code)
        .fetch_optional(executor)
        .await
}

/// Insert an airport record, returning its id
///
/// Used by seeding and tests; the reference table is normally populated by
/// an external import.
pub async fn insert_airport(
    pool: &SqlitePool,
    iata_code: &str,
    name: &str,
    city: Option<&str>,
    country: Option<&str>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO airports (iata_code, name, city, country) \
         VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(iata_code)
    .bind(name)
    .bind(city)
    .bind(country)
    .fetch_one(pool)
    .await
}

/// Number of airports in the reference table
pub async fn airport_count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM airports")
        .fetch_one(pool)
        .await
}
