//! Sensor samples as served by the device's `/data` endpoint

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One reading from the blinds controller.
///
/// Only the outer shape of a response is enforced. A numeric field that is
/// missing or not a number becomes `None` and shows up as a gap in its chart
/// series; a non-string timestamp is kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(default, deserialize_with = "lenient_number")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub humidity: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub light: Option<f64>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub timestamp: String,
}

impl SensorSample {
    pub fn new(temperature: f64, humidity: f64, light: f64, timestamp: &str) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
            light: Some(light),
            timestamp: timestamp.to_string(),
        }
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_f64())
}

fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Decode a `/data` response body into a sample sequence
pub fn parse_samples(body: &str) -> crate::Result<Vec<SensorSample>> {
    serde_json::from_str(body)
        .map_err(|e| crate::DashboardError::Poll(format!("Unexpected /data body: {}", e)))
}
