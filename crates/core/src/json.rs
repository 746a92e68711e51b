// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Flat JSON objects for the wire: a bounded typed writer and a tolerant
//! typed reader.
//!
//! Payloads are always a single flat `{name: value}` object, UTF-8, no
//! arrays and no nesting. The reader ignores unknown keys and reports
//! missing keys as `None`, which is what lets receivers preserve fields a
//! delta publish did not mention.

use crate::error::SdsError;
use serde_json::{Map, Number, Value};

/// Key carrying the sender's schema version string, when present.
pub const VERSION_KEY: &str = "__version";

/// Incremental writer for one flat JSON object with a bounded encoded size.
#[derive(Debug)]
pub struct JsonWriter {
    map: Map<String, Value>,
    capacity: usize,
}

impl JsonWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { map: Map::new(), capacity }
    }

    pub fn add_bool(&mut self, name: &str, value: bool) {
        self.map.insert(name.to_string(), Value::Bool(value));
    }

    pub fn add_int(&mut self, name: &str, value: i64) {
        self.map.insert(name.to_string(), Value::Number(value.into()));
    }

    pub fn add_uint(&mut self, name: &str, value: u64) {
        self.map.insert(name.to_string(), Value::Number(value.into()));
    }

    /// Add a 32-bit float, formatted to its shortest representation that
    /// parses back to the same `f32`. Non-finite values encode as `null`
    /// (readers skip them, leaving the destination untouched).
    pub fn add_float(&mut self, name: &str, value: f32) {
        let json_value = if value.is_finite() {
            let mut buf = ryu::Buffer::new();
            buf.format_finite(value)
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map_or(Value::Null, Value::Number)
        } else {
            Value::Null
        };
        self.map.insert(name.to_string(), json_value);
    }

    pub fn add_string(&mut self, name: &str, value: &str) {
        self.map.insert(name.to_string(), Value::String(value.to_string()));
    }

    /// True when no field has been added yet.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Encode the object. Fails with `BufferFull` when the encoded form
    /// exceeds the writer's capacity.
    pub fn finish(self) -> Result<Vec<u8>, SdsError> {
        let bytes = serde_json::to_vec(&Value::Object(self.map))
            .map_err(|e| SdsError::Malformed(e.to_string()))?;
        if bytes.len() > self.capacity {
            return Err(SdsError::BufferFull);
        }
        Ok(bytes)
    }
}

/// Read-side view of one flat JSON object with typed field lookups.
#[derive(Debug)]
pub struct JsonReader {
    map: Map<String, Value>,
}

impl JsonReader {
    /// Parse a payload. Anything that is not a JSON object is `Malformed`.
    pub fn parse(bytes: &[u8]) -> Result<Self, SdsError> {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| SdsError::Malformed(e.to_string()))?;
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(SdsError::Malformed(format!(
                "expected an object, got {other}"
            ))),
        }
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.map.get(name)?.as_bool()
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.map.get(name)?.as_i64()
    }

    pub fn get_uint(&self, name: &str) -> Option<u64> {
        self.map.get(name)?.as_u64()
    }

    pub fn get_float(&self, name: &str) -> Option<f32> {
        self.map.get(name)?.as_f64().map(|f| f as f32)
    }

    pub fn get_string(&self, name: &str) -> Option<&str> {
        self.map.get(name)?.as_str()
    }

    /// The sender's schema version, when the payload carries one.
    pub fn version(&self) -> Option<&str> {
        self.get_string(VERSION_KEY)
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
