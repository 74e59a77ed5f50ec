// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Connecting a [`CircuitTree`] to a telemetry sink.

use std::sync::Arc;

use crate::telemetry::TelemetrySink;
use crate::CircuitTree;

impl CircuitTree {
    /// Sets the sink that circuits publish their values to.
    ///
    /// Without a sink, publishing is a no-op.
    pub fn set_sink(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.sink = Some(sink);
    }

    /// Sets the sink and publishes the static values of all circuits to it.
    pub fn prepare(&mut self, sink: Arc<dyn TelemetrySink>) {
        self.set_sink(sink);

        for index in self.graph.node_indices() {
            let circuit = &self.graph[index];
            self.publish_circuit(index, "name", circuit.name.as_str());
            self.publish_circuit(index, "maxCurrent", circuit.max_current);
            self.publish_circuit(index, "virtualMeter", circuit.is_virtual());
            if circuit.is_virtual() {
                self.publish_circuit(index, "consumers", circuit.consumers.len());
            }
        }
    }
}
