//! Service health states
//!
//! Icinga reports service state as a number (`0.0`, `2.0`, ...). Only the
//! comparison against OK carries meaning; the numeric order does not.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Health of a monitored service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Health {
    Ok = 0,
    Warning = 1,
    Critical = 2,
    #[default]
    Unknown = 3,
}

impl Health {
    /// Map an Icinga state code; anything outside 0..=3 is UNKNOWN
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Health::Ok,
            1 => Health::Warning,
            2 => Health::Critical,
            _ => Health::Unknown,
        }
    }

    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Health::Ok)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Health::Ok => "OK",
            Health::Warning => "WARNING",
            Health::Critical => "CRITICAL",
            Health::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Health {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

struct HealthVisitor;

impl Visitor<'_> for HealthVisitor {
    type Value = Health;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an Icinga state code or state name")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Health, E> {
        Ok(Health::from_code(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Health, E> {
        Ok(i64::try_from(v).map_or(Health::Unknown, Health::from_code))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Health, E> {
        if v.fract() == 0.0 {
            Ok(Health::from_code(v as i64))
        } else {
            Ok(Health::Unknown)
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Health, E> {
        Ok(match v.to_ascii_uppercase().as_str() {
            "OK" => Health::Ok,
            "WARNING" => Health::Warning,
            "CRITICAL" => Health::Critical,
            _ => Health::Unknown,
        })
    }
}

impl<'de> Deserialize<'de> for Health {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(HealthVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        assert_eq!(Health::from_code(0), Health::Ok);
        assert_eq!(Health::from_code(1), Health::Warning);
        assert_eq!(Health::from_code(2), Health::Critical);
        assert_eq!(Health::from_code(3), Health::Unknown);
        assert_eq!(Health::from_code(99), Health::Unknown);
        assert_eq!(Health::from_code(-1), Health::Unknown);
    }

    #[test]
    fn test_display() {
        assert_eq!(Health::Ok.to_string(), "OK");
        assert_eq!(Health::Warning.to_string(), "WARNING");
        assert_eq!(Health::Critical.to_string(), "CRITICAL");
        assert_eq!(Health::Unknown.to_string(), "UNKNOWN");
    }

    #[test]
    fn test_deserialize_float_codes() {
        let health: Health = serde_json::from_str("2.0").unwrap();
        assert_eq!(health, Health::Critical);
        let health: Health = serde_json::from_str("0").unwrap();
        assert!(health.is_ok());
        let health: Health = serde_json::from_str("0.5").unwrap();
        assert_eq!(health, Health::Unknown);
    }

    #[test]
    fn test_serialize_as_name() {
        assert_eq!(
            serde_json::to_string(&Health::Warning).unwrap(),
            "\"WARNING\""
        );
    }

    #[test]
    fn test_default_is_unknown() {
        assert_eq!(Health::default(), Health::Unknown);
        assert_eq!(Health::default().code(), 3);
    }
}
