// Peed - Rolling-baseline anomaly detection
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Sensor readings and their wire decoding.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Device identity used when a payload carries none.
pub const UNKNOWN_DEVICE: &str = "unknown";

/// Largest accepted temperature magnitude, in degrees Celsius.
///
/// Keeps window sums and squared deviations far from `f64` overflow.
pub const MAX_ABS_TEMPERATURE: f64 = 1.0e6;

/// One sensor observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Device identity.
    pub device_id: String,
    /// ISO-8601 UTC instant, forwarded verbatim.
    pub timestamp: String,
    /// Temperature in degrees Celsius.
    pub temperature: f64,
}

impl Reading {
    /// Create a new reading.
    pub fn new(device_id: impl Into<String>, timestamp: impl Into<String>, temperature: f64) -> Self {
        Self {
            device_id: device_id.into(),
            timestamp: timestamp.into(),
            temperature,
        }
    }

    /// Decode a transport payload (UTF-8 JSON object).
    ///
    /// A missing `device_id` falls back to [`UNKNOWN_DEVICE`] and a missing
    /// `timestamp` to an empty string. The temperature may be a JSON number
    /// or a numeric string; anything else is rejected, as is any top-level
    /// value other than an object.
    pub fn from_payload(payload: &[u8]) -> Result<Self, DecodeError> {
        let text =
            std::str::from_utf8(payload).map_err(|e| DecodeError::InvalidUtf8(e.to_string()))?;
        let value: Value =
            serde_json::from_str(text).map_err(|e| DecodeError::MalformedJson(e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(DecodeError::MalformedJson(
                "payload is not a JSON object".to_string(),
            ));
        };

        let temperature = match fields.get("temperature") {
            Some(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| DecodeError::MalformedJson(format!("temperature {}", n)))?,
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                DecodeError::MalformedJson(format!("temperature is not numeric: {:?}", s))
            })?,
            Some(other) => {
                return Err(DecodeError::MalformedJson(format!(
                    "temperature has unexpected type: {}",
                    other
                )))
            }
            None => return Err(DecodeError::MissingField("temperature")),
        };

        if !temperature.is_finite() {
            return Err(DecodeError::NonFiniteTemperature(temperature));
        }
        if temperature.abs() > MAX_ABS_TEMPERATURE {
            return Err(DecodeError::TemperatureOutOfRange(temperature));
        }

        Ok(Self {
            device_id: text_field(&fields, "device_id")?
                .unwrap_or_else(|| UNKNOWN_DEVICE.to_string()),
            timestamp: text_field(&fields, "timestamp")?.unwrap_or_default(),
            temperature,
        })
    }

    /// Encode as the JSON payload published by sensors.
    pub fn to_payload(&self) -> Vec<u8> {
        // Serializing a struct of String/String/f64 cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }
}

/// Optional string field; `null` counts as absent.
fn text_field(fields: &Map<String, Value>, name: &str) -> Result<Option<String>, DecodeError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(DecodeError::MalformedJson(format!(
            "{} has unexpected type: {}",
            name, other
        ))),
    }
}
