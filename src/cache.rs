// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A concurrent last-write-wins store for telemetry values, and the
//! aggregated state view built from it.

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::telemetry::{Param, Scope, TelemetrySink};

/// Load point indices at or above this are left out of the state view.
pub const MAX_LOADPOINTS: usize = 1024;

/// Keeps the latest [`Param`] for every unique id.
///
/// A single lock guards the backing map, for inserts as well as for
/// snapshots, so that a snapshot never observes a partial update.
#[derive(Debug, Default)]
pub struct Cache {
    val: Mutex<HashMap<String, Param>>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds values received on the channel to the cache, until all senders
    /// are dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<Param>) {
        while let Some(param) = rx.recv().await {
            tracing::trace!("{}: {}", param.unique_id(), param.val);
            self.add(param);
        }
        tracing::debug!("Telemetry channel closed, cache stopped.");
    }

    /// Inserts a param, replacing any earlier value with the same unique id.
    pub fn add(&self, param: Param) {
        self.val.lock().insert(param.unique_id(), param);
    }

    /// Returns the param with the given unique id, if present.
    pub fn get(&self, unique_id: &str) -> Option<Param> {
        self.val.lock().get(unique_id).cloned()
    }

    /// Returns a copy of all cached values.
    pub fn all(&self) -> Vec<Param> {
        self.val.lock().values().cloned().collect()
    }

    /// Returns a structured copy of the cached values.
    ///
    /// Site values are top-level keys.  Load point values are collected into
    /// a `loadpoints` array, ordered by load point index, and circuit values
    /// into a `circuits` array, ordered by circuit name.
    pub fn state(&self) -> Value {
        let mut res = Map::new();
        let mut loadpoints: BTreeMap<usize, Map<String, Value>> = BTreeMap::new();
        let mut circuits: BTreeMap<String, Map<String, Value>> = BTreeMap::new();

        {
            let val = self.val.lock();
            for param in val.values() {
                let entry = match &param.scope {
                    Scope::Site => &mut res,
                    Scope::LoadPoint(index) if *index >= MAX_LOADPOINTS => {
                        tracing::warn!(
                            "{}: load point index out of range, skipped",
                            param.unique_id()
                        );
                        continue;
                    }
                    Scope::LoadPoint(index) => loadpoints.entry(*index).or_default(),
                    Scope::Circuit(name) => circuits.entry(name.clone()).or_default(),
                };
                entry.insert(param.key.clone(), param.val.clone());
            }
        }

        let len = loadpoints.keys().next_back().map_or(0, |max| max + 1);
        let mut lps = vec![Value::Object(Map::new()); len];
        for (index, lp) in loadpoints {
            lps[index] = Value::Object(lp);
        }
        res.insert("loadpoints".to_string(), Value::Array(lps));

        res.insert(
            "circuits".to_string(),
            Value::Array(circuits.into_values().map(Value::Object).collect()),
        );

        Value::Object(res)
    }
}

impl TelemetrySink for Cache {
    fn publish(&self, param: Param) {
        self.add(param);
    }
}
