//! Byte/text helpers shared by the event payloads and the processor

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

/// Decode body bytes as UTF-8 text; `None` when the bytes are not valid text
pub fn decode_content(raw: &[u8]) -> Option<String> {
    std::str::from_utf8(raw).ok().map(str::to_owned)
}

/// Convert the host's float epoch seconds into a UTC timestamp
///
/// Non-finite or out-of-range values fall back to the current time.
pub fn timestamp_to_utc(seconds: f64) -> DateTime<Utc> {
    if !seconds.is_finite() {
        return Utc::now();
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return Utc::now();
    }
    DateTime::from_timestamp_micros(micros as i64).unwrap_or_else(Utc::now)
}

pub(crate) fn base64_bytes<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let encoded = String::deserialize(deserializer)?;
    STANDARD.decode(encoded).map_err(serde::de::Error::custom)
}

pub(crate) fn base64_bytes_opt<'de, D>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)?
        .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_content() {
        assert_eq!(decode_content(b"hello"), Some("hello".to_string()));
        assert_eq!(decode_content(b""), Some(String::new()));
        assert_eq!(decode_content(&[0xff, 0xfe, 0x00]), None);
    }

    #[test]
    fn test_timestamp_to_utc() {
        let ts = timestamp_to_utc(1_700_000_000.25);
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_timestamp_nan_falls_back_to_now() {
        let before = Utc::now();
        let ts = timestamp_to_utc(f64::NAN);
        assert!(ts >= before);
    }
}
