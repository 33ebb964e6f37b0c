//! Storage encodings
//!
//! Habit rows keep the habit type in a single text column and timestamps as
//! ISO-8601 local date-times. Both encodings are pure and must round-trip
//! exactly: anything written here is read back unchanged.
//!
//! Habit type wire format:
//! - `BOOLEAN`
//! - `NUMERIC|<unit>|<target>|<prefix>|<suffix>`
//!
//! `prefix` and `suffix` were added after the first rows were written, so
//! decoding treats them as optional.

use chrono::NaiveDateTime;

use crate::error::TrackerError;
use crate::types::HabitType;

/// Separator between habit type fields
pub const FIELD_DELIMITER: char = '|';

const BOOLEAN_TAG: &str = "BOOLEAN";
const NUMERIC_TAG: &str = "NUMERIC";

/// Format used to write timestamps
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Legacy rows may omit seconds
const DATE_TIME_FORMAT_NO_SECONDS: &str = "%Y-%m-%dT%H:%M";

/// Codec between [`HabitType`] and its single-column text form
pub struct HabitTypeCodec;

impl HabitTypeCodec {
    /// Encode a habit type for storage
    pub fn encode(habit_type: &HabitType) -> String {
        match habit_type {
            HabitType::Boolean => BOOLEAN_TAG.to_string(),
            HabitType::Numeric {
                unit,
                target,
                prefix,
                suffix,
            } => {
                // Debug keeps the shortest round-trip text and always marks the
                // value as a float ("5.0", not "5")
                format!(
                    "{NUMERIC_TAG}{d}{unit}{d}{target:?}{d}{prefix}{d}{suffix}",
                    d = FIELD_DELIMITER
                )
            }
        }
    }

    /// Decode a stored habit type
    ///
    /// Fails with [`TrackerError::InvalidEncoding`] on an unknown tag, a
    /// missing unit or target, or a target that is not a number.
    ///
    /// Any text Rust parses as an `f64` is accepted as the target, including
    /// `inf` and `NaN` in any case. Such rows cannot be written back, since
    /// [`HabitType::validate`] rejects non-finite targets.
    pub fn decode(encoded: &str) -> Result<HabitType, TrackerError> {
        let fields: Vec<&str> = encoded.split(FIELD_DELIMITER).collect();

        match fields[0] {
            BOOLEAN_TAG => Ok(HabitType::Boolean),
            NUMERIC_TAG => {
                let unit = fields
                    .get(1)
                    .ok_or_else(|| TrackerError::invalid_encoding(encoded, "missing unit field"))?;
                let raw_target = fields.get(2).ok_or_else(|| {
                    TrackerError::invalid_encoding(encoded, "missing target field")
                })?;
                let target: f64 = raw_target.trim().parse().map_err(|_| {
                    TrackerError::invalid_encoding(
                        encoded,
                        format!("target {raw_target:?} is not a number"),
                    )
                })?;

                Ok(HabitType::Numeric {
                    unit: unit.to_string(),
                    target,
                    prefix: fields.get(3).map(|s| s.to_string()).unwrap_or_default(),
                    suffix: fields.get(4).map(|s| s.to_string()).unwrap_or_default(),
                })
            }
            tag => Err(TrackerError::invalid_encoding(
                encoded,
                format!("unknown habit type tag {tag:?}"),
            )),
        }
    }
}

/// Format a timestamp for storage
pub fn encode_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format(DATE_TIME_FORMAT).to_string()
}

/// Parse a stored timestamp
pub fn decode_date_time(text: &str) -> Result<NaiveDateTime, TrackerError> {
    NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(text, DATE_TIME_FORMAT_NO_SECONDS))
        .map_err(|e| TrackerError::DateParse(format!("{text:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn numeric(unit: &str, target: f64, prefix: &str, suffix: &str) -> HabitType {
        HabitType::Numeric {
            unit: unit.to_string(),
            target,
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    #[test]
    fn test_encode_boolean() {
        assert_eq!(HabitTypeCodec::encode(&HabitType::Boolean), "BOOLEAN");
    }

    #[test]
    fn test_encode_numeric() {
        let encoded = HabitTypeCodec::encode(&numeric("km", 5.0, "Today", "done"));
        assert_eq!(encoded, "NUMERIC|km|5.0|Today|done");

        let encoded = HabitTypeCodec::encode(&HabitType::numeric("page", 100.0));
        assert_eq!(encoded, "NUMERIC|page|100.0||");
    }

    #[test]
    fn test_round_trip() {
        let values = vec![
            HabitType::Boolean,
            numeric("km", 5.0, "", ""),
            numeric("km", 5.0, "Today", "done."),
            numeric("", 0.0, "", ""),
            numeric("glasses", 0.1, "", "of water"),
            numeric("steps", 12_345.678_9, "Walked", ""),
            numeric("ml", -3.5, " ", " "),
            numeric("big", 1e21, "a", "b"),
            numeric("tiny", 1e-9, "", ""),
        ];

        for value in values {
            let decoded = HabitTypeCodec::decode(&HabitTypeCodec::encode(&value)).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_decode_defaults_prefix_and_suffix() {
        let decoded = HabitTypeCodec::decode("NUMERIC|km|5.0").unwrap();
        assert_eq!(decoded, numeric("km", 5.0, "", ""));

        let decoded = HabitTypeCodec::decode("NUMERIC|km|5.0|Today").unwrap();
        assert_eq!(decoded, numeric("km", 5.0, "Today", ""));
    }

    #[test]
    fn test_decode_ignores_trailing_fields() {
        assert_eq!(
            HabitTypeCodec::decode("BOOLEAN|leftover").unwrap(),
            HabitType::Boolean
        );
        assert_eq!(
            HabitTypeCodec::decode("NUMERIC|km|2|a|b|c").unwrap(),
            numeric("km", 2.0, "a", "b")
        );
    }

    #[test]
    fn test_decode_unknown_tag() {
        let err = HabitTypeCodec::decode("WEIRD").unwrap_err();
        match err {
            TrackerError::InvalidEncoding { value, .. } => assert_eq!(value, "WEIRD"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(HabitTypeCodec::decode("").is_err());
        assert!(HabitTypeCodec::decode("boolean").is_err());
    }

    #[test]
    fn test_decode_missing_target() {
        let err = HabitTypeCodec::decode("NUMERIC|km").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidEncoding { .. }));
        assert!(err.to_string().contains("missing target"));

        assert!(HabitTypeCodec::decode("NUMERIC").is_err());
    }

    #[test]
    fn test_decode_bad_target() {
        let err = HabitTypeCodec::decode("NUMERIC|km|notanumber").unwrap_err();
        assert!(matches!(err, TrackerError::InvalidEncoding { .. }));
        assert!(err.is_corrupt_row());

        // Empty target must not silently become 0
        assert!(HabitTypeCodec::decode("NUMERIC|km||a|b").is_err());
    }

    #[test]
    fn test_decode_legacy_target_text() {
        // Integral targets and exponent forms written by older clients
        assert_eq!(
            HabitTypeCodec::decode("NUMERIC|km|5").unwrap(),
            numeric("km", 5.0, "", "")
        );
        assert_eq!(
            HabitTypeCodec::decode("NUMERIC|x|1.0E21||").unwrap(),
            numeric("x", 1e21, "", "")
        );
    }

    #[test]
    fn test_decode_non_finite_target() {
        let decoded = HabitTypeCodec::decode("NUMERIC|km|inf").unwrap();
        assert_eq!(decoded.target(), Some(f64::INFINITY));
        assert!(decoded.validate().is_err());

        let decoded = HabitTypeCodec::decode("NUMERIC|km|-Infinity").unwrap();
        assert_eq!(decoded.target(), Some(f64::NEG_INFINITY));

        let decoded = HabitTypeCodec::decode("NUMERIC|km|NaN").unwrap();
        assert!(decoded.target().is_some_and(f64::is_nan));
    }

    #[test]
    fn test_date_time_round_trip() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let values = [
            date.and_hms_opt(0, 0, 0).unwrap(),
            date.and_hms_opt(23, 59, 59).unwrap(),
            date.and_hms_micro_opt(8, 30, 5, 123_456).unwrap(),
            date.and_hms_nano_opt(8, 30, 5, 1).unwrap(),
        ];

        for value in values {
            let text = encode_date_time(&value);
            assert_eq!(decode_date_time(&text).unwrap(), value);
        }
    }

    #[test]
    fn test_date_time_format() {
        let value = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(encode_date_time(&value), "2024-03-15T08:30:00");

        let value = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_micro_opt(8, 30, 0, 250_000)
            .unwrap();
        assert_eq!(encode_date_time(&value), "2024-03-15T08:30:00.250");
    }

    #[test]
    fn test_decode_date_time_without_seconds() {
        let parsed = decode_date_time("2024-03-15T08:30").unwrap();
        assert_eq!(encode_date_time(&parsed), "2024-03-15T08:30:00");
    }

    #[test]
    fn test_decode_date_time_invalid() {
        let err = decode_date_time("yesterday").unwrap_err();
        assert!(matches!(err, TrackerError::DateParse(_)));
        assert!(decode_date_time("2024-03-15 08:30:00+02:00").is_err());
    }
}
