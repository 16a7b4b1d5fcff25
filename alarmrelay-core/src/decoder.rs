//! Raw descriptor decoding.
//!
//! A descriptor is one `|`-delimited line. Only a handful of positions are
//! consumed; the rest travel along unread.

use crate::codes;
use crate::error::DecodeError;
use crate::models::DecodedEvent;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

pub const DELIMITER: char = '|';

/// Positional contract of the descriptor (0-indexed).
pub mod field {
    pub const HOST_ID: usize = 1;
    pub const ELEMENT_ID: usize = 2;
    pub const PARAMETER_ID: usize = 3;
    pub const PARAMETER_INSTANCE: usize = 4;
    pub const SEVERITY: usize = 7;
    pub const TYPE: usize = 8;
    pub const VALUE: usize = 10;
    pub const TIMESTAMP: usize = 11;

    /// Minimum number of fields for a descriptor to be decodable.
    pub const REQUIRED: usize = TIMESTAMP + 1;
}

#[derive(Debug, Clone)]
pub struct EventDecoder {
    timestamp_formats: Vec<String>,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(crate::config::RelayConfig::default().timestamp_formats)
    }
}

impl EventDecoder {
    pub fn new(timestamp_formats: Vec<String>) -> Self {
        Self { timestamp_formats }
    }

    /// `Ok(None)` when the input carries no delimiter: not an event, nothing to do.
    /// Once the delimiter is present every contract violation is an error.
    pub fn decode(&self, raw: &str) -> Result<Option<DecodedEvent>, DecodeError> {
        if !raw.contains(DELIMITER) {
            return Ok(None);
        }

        let fields: Vec<&str> = raw.split(DELIMITER).collect();
        if fields.len() < field::REQUIRED {
            return Err(DecodeError::MissingFields {
                found: fields.len(),
                required: field::REQUIRED,
            });
        }

        let parameter_instance = Some(fields[field::PARAMETER_INSTANCE].trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Some(DecodedEvent {
            source_host_id: parse_int(&fields, field::HOST_ID, "host id")?,
            source_element_id: parse_int(&fields, field::ELEMENT_ID, "element id")?,
            parameter_id: parse_int(&fields, field::PARAMETER_ID, "parameter id")?,
            parameter_instance,
            severity_label: codes::resolve(parse_int(&fields, field::SEVERITY, "severity")?),
            type_label: codes::resolve(parse_int(&fields, field::TYPE, "type")?),
            alarm_value: fields[field::VALUE].to_string(),
            alarm_time: self.parse_timestamp(fields[field::TIMESTAMP])?,
        }))
    }

    fn parse_timestamp(&self, text: &str) -> Result<NaiveDateTime, DecodeError> {
        let text = text.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
            return Ok(dt.naive_local());
        }
        for fmt in &self.timestamp_formats {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                return Ok(dt);
            }
        }
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or_else(|| DecodeError::InvalidTimestamp {
                field: field::TIMESTAMP,
                value: text.to_string(),
            })
    }
}

fn parse_int(fields: &[&str], index: usize, name: &'static str) -> Result<i32, DecodeError> {
    let raw = fields[index];
    raw.trim().parse().map_err(|_| DecodeError::InvalidInteger {
        field: index,
        name,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "x|1|2|3||4|5|1|11|6|OK|2024-08-12T10:00:00";

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_decode_sample() {
        let event = EventDecoder::default().decode(SAMPLE).unwrap().unwrap();
        assert_eq!(event.source_host_id, 1);
        assert_eq!(event.source_element_id, 2);
        assert_eq!(event.parameter_id, 3);
        assert_eq!(event.parameter_instance, None);
        assert_eq!(event.severity_label, "Critical");
        assert_eq!(event.type_label, "Cleared");
        assert_eq!(event.alarm_value, "OK");
        assert_eq!(event.alarm_time, at(2024, 8, 12, 10, 0, 0));
    }

    #[test]
    fn test_decode_is_idempotent() {
        let decoder = EventDecoder::default();
        let first = decoder.decode(SAMPLE).unwrap();
        let second = decoder.decode(SAMPLE).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_delimiter_is_noop() {
        let decoder = EventDecoder::default();
        assert_eq!(decoder.decode("").unwrap(), None);
        assert_eq!(decoder.decode("just some text").unwrap(), None);
    }

    #[test]
    fn test_too_few_fields() {
        let err = EventDecoder::default().decode("x|1|2|3").unwrap_err();
        assert_eq!(err, DecodeError::MissingFields { found: 4, required: 12 });
    }

    #[test]
    fn test_extra_fields_ignored() {
        let raw = format!("{SAMPLE}|extra|more");
        assert!(EventDecoder::default().decode(&raw).unwrap().is_some());
    }

    #[test]
    fn test_instance_kept_when_not_blank() {
        let decoder = EventDecoder::default();
        let event = decoder
            .decode("x|1|2|3|Row 7|4|5|2|12|6|42|2024-08-12 10:00:00")
            .unwrap()
            .unwrap();
        assert_eq!(event.parameter_instance.as_deref(), Some("Row 7"));
        assert_eq!(event.severity_label, "Major");
        assert_eq!(event.type_label, "Open");

        let blank = decoder
            .decode("x|1|2|3|   |4|5|2|12|6|42|2024-08-12 10:00:00")
            .unwrap()
            .unwrap();
        assert_eq!(blank.parameter_instance, None);
    }

    #[test]
    fn test_unknown_codes_do_not_fail() {
        let event = EventDecoder::default()
            .decode("x|1|2|3||4|5|99|0|6|v|2024-08-12T10:00:00")
            .unwrap()
            .unwrap();
        assert_eq!(event.severity_label, "Unknown");
        assert_eq!(event.type_label, "Unknown");
    }

    #[test]
    fn test_bad_integer_is_error() {
        let err = EventDecoder::default()
            .decode("x|dma|2|3||4|5|1|11|6|OK|2024-08-12T10:00:00")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger { field: 1, .. }));

        let err = EventDecoder::default()
            .decode("x|1|2|3||4|5|sev|11|6|OK|2024-08-12T10:00:00")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidInteger { field: 7, .. }));
    }

    #[test]
    fn test_bad_timestamp_is_error() {
        let err = EventDecoder::default()
            .decode("x|1|2|3||4|5|1|11|6|OK|yesterday")
            .unwrap_err();
        assert!(matches!(err, DecodeError::InvalidTimestamp { field: 11, .. }));
    }

    #[test]
    fn test_timestamp_formats() {
        let decoder = EventDecoder::default();
        let cases = [
            ("2024-08-12T10:00:00+02:00", at(2024, 8, 12, 10, 0, 0)),
            ("2024-08-12 10:00:00", at(2024, 8, 12, 10, 0, 0)),
            ("13/08/2024 09:30:15", at(2024, 8, 13, 9, 30, 15)),
            ("08/13/2024 09:30:15", at(2024, 8, 13, 9, 30, 15)),
            ("2024-08-12", at(2024, 8, 12, 0, 0, 0)),
        ];
        for (text, expected) in cases {
            let raw = format!("x|1|2|3||4|5|1|11|6|OK| {text} ");
            let event = decoder.decode(&raw).unwrap().unwrap();
            assert_eq!(event.alarm_time, expected, "{}", text);
        }
    }
}
