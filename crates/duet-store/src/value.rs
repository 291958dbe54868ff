//! Field value model: JSON-compatible scalars plus a server-assigned
//! timestamp sentinel resolved on write.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// A single document field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    /// Sentinel replaced with the store's clock when the write lands.
    ServerTimestamp,
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Ordered field map of a document.
pub type Fields = BTreeMap<String, Value>;

/// Replace every [`Value::ServerTimestamp`] sentinel with `now`.
///
/// Store implementations call this at write time with their notion of the
/// server clock.
pub fn resolve_server_timestamps(fields: Fields, now: DateTime<Utc>) -> Fields {
    fields
        .into_iter()
        .map(|(name, value)| match value {
            Value::ServerTimestamp => (name, Value::Timestamp(now)),
            other => (name, other),
        })
        .collect()
}
