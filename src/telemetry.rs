// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Telemetry records published by circuits, and the sinks they are published
//! to.

use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::config::TelemetryConfig;

/// The scope a telemetry value belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    /// A site-wide value.
    Site,
    /// A value belonging to the load point with the given index.
    LoadPoint(usize),
    /// A value belonging to the circuit with the given name.
    Circuit(String),
}

/// A single telemetry observation.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub scope: Scope,
    pub key: String,
    pub val: Value,
}

impl Param {
    pub fn new(scope: Scope, key: impl Into<String>, val: impl Into<Value>) -> Self {
        Self {
            scope,
            key: key.into(),
            val: val.into(),
        }
    }

    /// Returns the key namespaced by the param's scope.  The cache keeps the
    /// last value for each unique id.
    pub fn unique_id(&self) -> String {
        match &self.scope {
            Scope::Site => self.key.clone(),
            Scope::LoadPoint(index) => format!("{}.{}", index, self.key),
            Scope::Circuit(name) => format!("{}.{}", name, self.key),
        }
    }
}

/// A one-way destination for telemetry values.
///
/// Publishing must not block: a slow or missing reader is never allowed to
/// stall an allocation query.
pub trait TelemetrySink: Send + Sync {
    fn publish(&self, param: Param);
}

impl TelemetrySink for mpsc::Sender<Param> {
    fn publish(&self, param: Param) {
        match self.try_send(param) {
            Ok(()) => {}
            Err(TrySendError::Full(param)) => {
                tracing::warn!(
                    "Telemetry channel full, dropping {} = {}",
                    param.unique_id(),
                    param.val
                );
            }
            Err(TrySendError::Closed(param)) => {
                tracing::trace!("Telemetry channel closed, dropping {}", param.unique_id());
            }
        }
    }
}

/// Creates the bounded channel between the publishers and the cache.
pub fn channel(config: &TelemetryConfig) -> (mpsc::Sender<Param>, mpsc::Receiver<Param>) {
    mpsc::channel(config.channel_capacity.max(1))
}
