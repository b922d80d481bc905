//! Prometheus text exposition.
//!
//! Subsystem crates register their metrics in the prometheus default
//! registry; this module renders whatever is registered there.

use crate::TelemetryError;
use prometheus::{Encoder, TextEncoder};

/// Encode all metrics in the default registry as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
