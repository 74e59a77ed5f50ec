// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A tree representation of the electrical circuits of a site, and the
//! current budgets attached to them.

mod allocation;
mod creation;
mod dump;
mod prepare;
mod retrieval;
mod virtual_meter;

pub mod iterators;

#[cfg(test)]
mod test_utils;

pub use creation::LoadPointRef;
pub use virtual_meter::VirtualMeter;

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::telemetry::{Param, Scope, TelemetrySink};
use crate::{Consumer, MeterCurrent};

/// `Circuit`s stored in a `DiGraph` instance can be addressed with
/// `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for every circuit name,
/// so that circuits in the `DiGraph` can be retrieved by name.
pub(crate) type NodeIndexMap = HashMap<String, NodeIndex>;

/// Where a circuit gets its present current from.
pub(crate) enum CurrentSource {
    /// A hardware meter.  Its readings take priority over any registered
    /// consumers.
    Physical(Arc<dyn MeterCurrent>),
    /// Sum of the registered consumers, including sub-circuits.
    Virtual(VirtualMeter),
}

/// A node in the circuit tree.
pub struct Circuit {
    name: String,
    max_current: f64,
    meter_ref: Option<String>,
    source: CurrentSource,
    /// Load points registered with this circuit.
    consumers: Vec<Arc<dyn Consumer>>,
}

impl Circuit {
    pub(crate) fn new(
        name: String,
        max_current: f64,
        meter_ref: Option<String>,
        meter: Option<Arc<dyn MeterCurrent>>,
    ) -> Self {
        let source = match meter {
            Some(meter) => CurrentSource::Physical(meter),
            None => CurrentSource::Virtual(VirtualMeter::new(&name)),
        };
        Self {
            name,
            max_current,
            meter_ref,
            source,
            consumers: vec![],
        }
    }

    /// Returns the name of the circuit.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the max current in amps the circuit may carry.
    pub fn max_current(&self) -> f64 {
        self.max_current
    }

    /// Returns the configured meter reference, if any.
    pub fn meter_ref(&self) -> Option<&str> {
        self.meter_ref.as_deref()
    }

    /// Returns true if the circuit's current is computed from its consumers.
    pub fn is_virtual(&self) -> bool {
        matches!(self.source, CurrentSource::Virtual(_))
    }

    /// Returns the virtual meter of the circuit, if it doesn't have a
    /// physical meter.
    pub fn virtual_meter(&self) -> Option<&VirtualMeter> {
        match &self.source {
            CurrentSource::Virtual(vm) => Some(vm),
            CurrentSource::Physical(_) => None,
        }
    }

    /// Returns the number of load points registered with the circuit.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }
}

impl std::fmt::Debug for Circuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Circuit")
            .field("name", &self.name)
            .field("max_current", &self.max_current)
            .field("meter_ref", &self.meter_ref)
            .field("virtual", &self.is_virtual())
            .field("consumers", &self.consumers.len())
            .finish()
    }
}

/// A tree of circuits, each with a current budget, that determines how much
/// additional current can be drawn anywhere in the tree without exceeding
/// the limit of any circuit on the way to the root.
///
/// A site may have several top-level circuits, so strictly speaking this is a
/// forest.  Edges point from a parent circuit to its sub-circuits.
#[derive(Default)]
pub struct CircuitTree {
    graph: DiGraph<Circuit, ()>,
    node_indices: NodeIndexMap,
    roots: Vec<NodeIndex>,
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl CircuitTree {
    /// Sends a value to the telemetry sink, if one is set.
    pub(crate) fn publish(&self, scope: Scope, key: &str, val: impl Into<serde_json::Value>) {
        let Some(sink) = &self.sink else {
            return;
        };
        sink.publish(Param::new(scope, key, val));
    }

    pub(crate) fn publish_circuit(
        &self,
        index: NodeIndex,
        key: &str,
        val: impl Into<serde_json::Value>,
    ) {
        if self.sink.is_some() {
            self.publish(Scope::Circuit(self.graph[index].name.clone()), key, val);
        }
    }
}

impl std::fmt::Debug for CircuitTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitTree")
            .field("circuits", &self.graph.raw_nodes().len())
            .field("roots", &self.roots.len())
            .field("sink", &self.sink.is_some())
            .finish()
    }
}
