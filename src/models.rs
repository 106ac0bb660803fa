//! Data models for the dataset generator.
//!
//! This module contains the core data structures shared by the EDSM
//! aggregator, the spreadsheet exporter and the output writers.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// A named reference system with the radius to search around it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorSystem {
    /// EDSM system name.
    pub name: String,
    /// Search radius in light years.
    pub radius_ly: f64,
    /// Free-text description carried onto every system it claims.
    #[serde(default)]
    pub description: String,
}

/// Galactic coordinates in light years, as reported by EDSM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// One system returned by EDSM.
///
/// Only `name` is guaranteed; everything else the API returns is kept
/// verbatim in `attributes`, in response order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemRecord {
    pub name: String,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_description: Option<String>,
}

impl SystemRecord {
    /// Build a record from one element of a sphere-systems response.
    ///
    /// Returns `None` when the element is not an object or has no string `name`.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut attributes) = value else {
            return None;
        };

        let name = match attributes.shift_remove("name") {
            Some(Value::String(name)) => name,
            _ => return None,
        };

        // Attribution is assigned locally, never taken from the API.
        attributes.shift_remove("anchor_system");
        attributes.shift_remove("anchor_description");

        Some(Self {
            name,
            attributes,
            anchor_system: None,
            anchor_description: None,
        })
    }

    /// Attribute this record to an anchor.
    pub fn tag(&mut self, anchor: &AnchorSystem) {
        self.anchor_system = Some(anchor.name.clone());
        self.anchor_description = Some(anchor.description.clone());
    }
}

/// The persisted result of one aggregation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedDataset {
    #[serde(with = "timestamp")]
    pub last_updated: DateTime<Utc>,
    pub systems: Vec<SystemRecord>,
}

impl CombinedDataset {
    pub fn new(systems: Vec<SystemRecord>, last_updated: DateTime<Utc>) -> Self {
        Self {
            last_updated,
            systems,
        }
    }
}

/// Lenient ISO-8601 handling for `last_updated`.
///
/// Writes RFC 3339 in UTC. Reads RFC 3339 with any offset, or a naive
/// timestamp which is taken to be UTC.
pub mod timestamp {
    use super::*;

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&dt.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }
}

/// A single cleaned spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<CellValue>),
    Map(Vec<(String, CellValue)>),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Null => serializer.serialize_unit(),
            CellValue::Bool(b) => serializer.serialize_bool(*b),
            CellValue::Int(i) => serializer.serialize_i64(*i),
            // JSON has no NaN or infinity.
            CellValue::Float(f) if !f.is_finite() => serializer.serialize_unit(),
            CellValue::Float(f) => serializer.serialize_f64(*f),
            CellValue::String(s) => serializer.serialize_str(s),
            CellValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            CellValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}
