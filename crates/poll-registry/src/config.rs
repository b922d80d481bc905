//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Poll registry configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Capacity of the in-memory event bus channel
    pub event_bus_capacity: usize,
    /// Never let the service clock move backwards
    pub clamp_clock_regressions: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 1024,
            clamp_clock_regressions: true,
        }
    }
}
