//! CSV row normalization
//!
//! Turns one raw CSV record into a canonical route row, or rejects it with a
//! taxonomy reason. Header names are case-folded and mapped onto canonical
//! field names through a fixed synonym table; unrecognized headers are kept
//! as-is and ignored downstream.

use crate::models::{RowError, TripParams};
use csv::StringRecord;

/// Canonical field name for the departure code column
pub const FIELD_DEPARTURE: &str = "departure_iata";
/// Canonical field name for the destination code column
pub const FIELD_DESTINATION: &str = "destination_iata";
/// Canonical field name for the passenger count column
pub const FIELD_PASSENGERS: &str = "passengers";
/// Canonical field name for the cabin class column
pub const FIELD_CABIN_CLASS: &str = "cabin_class";
/// Canonical field name for the round trip column
pub const FIELD_ROUND_TRIP: &str = "round_trip";

/// Normalized route row ready for the emissions call
///
/// Trip fields always come from the active override; any trip columns in the
/// CSV are informational only.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRow {
    pub departure: String,
    pub destination: String,
    pub passengers: u32,
    pub cabin_class: crate::models::CabinClass,
    pub round_trip: bool,
}

/// Header-derived field mapping for one file
#[derive(Debug, Clone)]
pub struct HeaderMap {
    fields: Vec<String>,
    departure_idx: Option<usize>,
    destination_idx: Option<usize>,
}

impl HeaderMap {
    /// Clean a raw header record and build the field mapping.
    ///
    /// Strips a UTF-8 BOM from the first field, case-folds every name and
    /// applies the synonym table.
    pub fn from_record(header: &StringRecord) -> Self {
        let mut fields = Vec::with_capacity(header.len());
        for (i, raw) in header.iter().enumerate() {
            let mut field = raw;
            if i == 0 {
                field = field.trim_start_matches('\u{feff}');
            }
            fields.push(alias_field(field.trim().to_lowercase().as_str()));
        }

        let departure_idx = fields.iter().position(|f| f == FIELD_DEPARTURE);
        let destination_idx = fields.iter().position(|f| f == FIELD_DESTINATION);

        Self {
            fields,
            departure_idx,
            destination_idx,
        }
    }

    /// Number of header columns
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Canonical field names in column order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    fn value<'r>(&self, record: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| record.get(i)).unwrap_or("")
    }
}

/// Map a case-folded header name onto its canonical field name
fn alias_field(field: &str) -> String {
    match field {
        "departure_iata" | "departure" | "from" | "origin" => FIELD_DEPARTURE.to_string(),
        "destination_iata" | "destination" | "to" | "arrival" => FIELD_DESTINATION.to_string(),
        "passengers" | "pax" => FIELD_PASSENGERS.to_string(),
        "cabin_class" | "cabin" | "class" => FIELD_CABIN_CLASS.to_string(),
        "round_trip" | "roundtrip" | "return" => FIELD_ROUND_TRIP.to_string(),
        other => other.to_string(),
    }
}

/// Validate and clean an airport code.
///
/// Trims, uppercases and strips non-alphabetic characters; exactly three
/// letters must remain. Format-only: the code is not checked against the
/// airports table.
pub fn validate_airport_code(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    if cleaned.len() == 3 {
        Some(cleaned)
    } else {
        None
    }
}

/// Normalize one data row against the header mapping.
///
/// Rejections, in check order: insufficient columns, invalid airport code
/// (either end), same airport. Trip fields are taken from `params`.
pub fn normalize_row(
    header: &HeaderMap,
    record: &StringRecord,
    params: &TripParams,
) -> Result<CanonicalRow, RowError> {
    if record.len() < header.len() {
        return Err(RowError::InsufficientColumns);
    }

    let departure_raw = header.value(record, header.departure_idx).trim();
    let destination_raw = header.value(record, header.destination_idx).trim();

    let departure = validate_airport_code(departure_raw);
    let destination = validate_airport_code(destination_raw);

    let (departure, destination) = match (departure, destination) {
        (Some(dep), Some(dest)) => (dep, dest),
        _ => {
            return Err(RowError::InvalidAirportCode {
                departure: departure_raw.to_uppercase(),
                destination: destination_raw.to_uppercase(),
            })
        }
    };

    if departure == destination {
        return Err(RowError::SameAirport { code: departure });
    }

    Ok(CanonicalRow {
        departure,
        destination,
        passengers: params.passengers,
        cabin_class: params.cabin_class,
        round_trip: params.round_trip,
    })
}
