// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module contains the configuration types that a [`CircuitTree`] is
//! built from.
//!
//! [`CircuitTree`]: crate::CircuitTree

use std::path::Path;

use serde::Deserialize;

use crate::Error;

/// Configuration of a single circuit and, recursively, its sub-circuits.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct CircuitConfig {
    /// Name of the circuit, unique across the whole site.
    pub name: String,

    /// The max current in amps that the circuit may carry.
    #[serde(alias = "maxCurrent")]
    pub max_current: f64,

    /// Reference to a meter measuring the circuit's phase currents.  If
    /// empty, the circuit's current is computed from its consumers.
    #[serde(default)]
    pub meter: Option<String>,

    /// Sub-circuits, in the order they are evaluated.
    #[serde(default)]
    pub circuits: Vec<CircuitConfig>,
}

impl CircuitConfig {
    /// Returns the meter reference, if a non-empty one is configured.
    pub fn meter_ref(&self) -> Option<&str> {
        self.meter.as_deref().filter(|m| !m.is_empty())
    }
}

/// Configuration options for the telemetry channel.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// Capacity of the bounded channel between the circuits and the cache.
    /// Values published while the channel is full are dropped.
    #[serde(alias = "channelCapacity")]
    pub channel_capacity: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}

/// Site-level circuit configuration.
///
/// The grid meter is part of the site's meter configuration and is looked up
/// through the [`ConfigProvider`][crate::ConfigProvider].
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Top-level circuits of the site.
    #[serde(default)]
    pub circuits: Vec<CircuitConfig>,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SiteConfig {
    /// Parses a site configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        toml::from_str(s)
            .map_err(|e| Error::invalid_config(format!("Failed decoding circuit configuration: {e}")))
    }

    /// Reads and parses a site configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::invalid_config(format!("Can't read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&contents)
    }
}
