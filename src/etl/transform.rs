/// Transform Module
///
/// Splits parsed records into load chunks and coerces records into typed rows.
use crate::error::{CoercionError, ConfigError};
use crate::models::{Chunk, Record, TransportRow};
use sqlx::types::BigDecimal;
use std::str::FromStr;

/// Split records into ordered chunks of at most `chunk_size`
///
/// Concatenating the chunks in ordinal order reproduces `records` exactly.
pub fn chunk_records(records: Vec<Record>, chunk_size: usize) -> Result<Vec<Chunk>, ConfigError> {
    if chunk_size == 0 {
        return Err(ConfigError::ZeroChunkSize);
    }

    let total = records.len().div_ceil(chunk_size);
    let mut chunks = Vec::with_capacity(total);
    let mut remaining = records.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<Record> = remaining.by_ref().take(chunk_size).collect();
        chunks.push(Chunk { ordinal: chunks.len() + 1, total, records: batch });
    }

    Ok(chunks)
}

impl TryFrom<&Record> for TransportRow {
    type Error = CoercionError;

    fn try_from(record: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_field(record, "id", "integer")?,
            name: text_field(record, "name")?,
            email: text_field(record, "email")?,
            age: parse_field(record, "age", "integer")?,
            city: text_field(record, "city")?,
            salary: parse_decimal(record, "salary")?,
        })
    }
}

fn text_field(record: &Record, field: &'static str) -> Result<String, CoercionError> {
    record.get(field).map(str::to_string).ok_or(CoercionError::MissingField(field))
}

fn parse_field<T: FromStr>(record: &Record, field: &'static str, expected: &'static str) -> Result<T, CoercionError> {
    let raw = record.get(field).ok_or(CoercionError::MissingField(field))?;
    raw.parse::<T>().map_err(|_| CoercionError::InvalidValue { field, expected, value: raw.to_string() })
}

fn parse_decimal(record: &Record, field: &'static str) -> Result<BigDecimal, CoercionError> {
    let raw = record.get(field).ok_or(CoercionError::MissingField(field))?;
    if raw.is_empty() {
        return Err(CoercionError::InvalidValue { field, expected: "decimal", value: String::new() });
    }
    BigDecimal::from_str(raw)
        .map_err(|_| CoercionError::InvalidValue { field, expected: "decimal", value: raw.to_string() })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<Record> {
        (0..n).map(|i| [("id", i.to_string())].into_iter().collect()).collect()
    }

    fn full_record(id: &str, age: &str, salary: &str) -> Record {
        [
            ("id", id),
            ("name", "Ada Lovelace"),
            ("email", "ada@example.com"),
            ("age", age),
            ("city", "London"),
            ("salary", salary),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_chunk_counts() {
        for (n, size, expected) in [(0, 100, 0), (3, 100, 1), (100, 100, 1), (101, 100, 2), (250, 100, 3), (7, 1, 7)] {
            let chunks = chunk_records(records(n), size).unwrap();
            assert_eq!(chunks.len(), expected, "n={} size={}", n, size);
            assert!(chunks.iter().all(|c| c.total == expected));
        }
    }

    #[test]
    fn test_chunks_concatenate_to_input() {
        let input = records(250);
        let chunks = chunk_records(input.clone(), 100).unwrap();

        let sizes: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3]);

        let rejoined: Vec<Record> = chunks.into_iter().flat_map(|c| c.records).collect();
        assert_eq!(rejoined, input);
    }

    #[test]
    fn test_zero_chunk_size() {
        assert_eq!(chunk_records(records(3), 0).unwrap_err(), ConfigError::ZeroChunkSize);
    }

    #[test]
    fn test_coerce_record() {
        let row = TransportRow::try_from(&full_record("42", "36", "72000.50")).unwrap();

        assert_eq!(row.id, 42);
        assert_eq!(row.age, 36);
        assert_eq!(row.city, "London");
        assert_eq!(row.salary, BigDecimal::from_str("72000.50").unwrap());
    }

    #[test]
    fn test_coerce_rejects_bad_integer() {
        let err = TransportRow::try_from(&full_record("4x2", "36", "1")).unwrap_err();
        assert_eq!(err, CoercionError::InvalidValue { field: "id", expected: "integer", value: "4x2".to_string() });
    }

    #[test]
    fn test_coerce_rejects_bad_decimal() {
        let err = TransportRow::try_from(&full_record("1", "36", "lots")).unwrap_err();
        assert!(matches!(err, CoercionError::InvalidValue { field: "salary", .. }));
    }

    #[test]
    fn test_coerce_reports_missing_field() {
        let record: Record = [("id", "1"), ("name", "Ada")].into_iter().collect();
        assert_eq!(TransportRow::try_from(&record).unwrap_err(), CoercionError::MissingField("email"));
    }
}
