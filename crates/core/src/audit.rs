// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical audit-record encoding
//!
//! The audit payload is hashed into the commit chain, so two encodings of
//! the same logical record must be byte-identical across runs and
//! platforms. The encoder walks the value tree explicitly: object keys
//! sorted by UTF-8 byte sequence, no insignificant whitespace, plain
//! decimal number formatting (never scientific notation), negative zero
//! normalized to zero. Default serializer output is never used for the
//! hashed form.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur when encoding an audit record
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("metric {key:?} is not a finite number")]
    NonFiniteMetric { key: String },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The audit decision recorded alongside a coverage delta
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    /// Quality rules consulted for this checkpoint
    pub rule_ids: Vec<String>,
    /// Metric name to observed value at decision time
    pub metric_snapshot: BTreeMap<String, f64>,
    /// Digest of the decision path taken through the rule set
    pub decision_path_digest: String,
    /// Version of the threshold table in force
    pub threshold_version: String,
    /// Build identifier of the producing binary
    pub build_git_sha: String,
}

impl AuditRecord {
    /// Encode to canonical bytes suitable for hashing.
    pub fn encode_canonical(&self) -> Result<Vec<u8>, AuditError> {
        for (key, value) in &self.metric_snapshot {
            if !value.is_finite() {
                return Err(AuditError::NonFiniteMetric { key: key.clone() });
            }
        }
        let value = serde_json::to_value(self)?;
        canonical_json_bytes(&value)
    }

    /// Decode a canonical payload back into a record.
    pub fn decode(bytes: &[u8]) -> Result<Self, AuditError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Render a JSON value in canonical form.
pub fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>, AuditError> {
    let mut out = String::new();
    write_canonical(value, &mut out)?;
    Ok(out.into_bytes())
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), AuditError> {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(number) => write_number(number, out)?,
        Value::String(text) => write_string(text, out)?,
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable_by(|a, b| a.as_bytes().cmp(b.as_bytes()));
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(key, out)?;
                out.push(':');
                // Key came from the map, so the entry exists
                if let Some(entry) = map.get(key.as_str()) {
                    write_canonical(entry, out)?;
                }
            }
            out.push('}');
        }
    }
    Ok(())
}

fn write_number(number: &serde_json::Number, out: &mut String) -> Result<(), AuditError> {
    if let Some(value) = number.as_i64() {
        out.push_str(&value.to_string());
        return Ok(());
    }
    if let Some(value) = number.as_u64() {
        out.push_str(&value.to_string());
        return Ok(());
    }
    // serde_json numbers are never NaN or infinite, so as_f64 covers the rest
    let value = number.as_f64().unwrap_or(0.0);
    // Normalize negative zero before formatting
    let value = if value == 0.0 { 0.0 } else { value };
    if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
        // Integral doubles render as integers
        out.push_str(&(value as i64).to_string());
    } else {
        // Rust's Display for f64 is the shortest round-trip decimal form
        // and never emits an exponent
        out.push_str(&value.to_string());
    }
    Ok(())
}

fn write_string(text: &str, out: &mut String) -> Result<(), AuditError> {
    out.push_str(&serde_json::to_string(text)?);
    Ok(())
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
