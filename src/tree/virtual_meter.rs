// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A meter that computes the current of a circuit from its consumers, for
//! circuits without a physical meter.

use std::sync::Arc;

use petgraph::graph::NodeIndex;

use crate::telemetry::Scope;
use crate::{CircuitTree, Consumer, Error};

/// A consumer registered with a [`VirtualMeter`].
#[derive(Clone)]
pub(crate) enum ConsumerRef {
    /// A load point.
    LoadPoint(Arc<dyn Consumer>),
    /// A sub-circuit, counted with its own total draw.
    Circuit(NodeIndex),
}

/// Sums up the current of all registered consumers.
///
/// Sub-circuits are registered as a single consumer each, so a sub-circuit's
/// load points are counted once through the sub-circuit and never directly.
pub struct VirtualMeter {
    name: String,
    consumers: Vec<ConsumerRef>,
}

impl VirtualMeter {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            consumers: vec![],
        }
    }

    pub(crate) fn add_consumer(&mut self, consumer: ConsumerRef) {
        self.consumers.push(consumer);
    }

    /// Returns the name of the circuit the meter belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of consumers, sub-circuits included.
    pub fn consumer_count(&self) -> usize {
        self.consumers.len()
    }

    /// Returns the sum of all consumer currents, for each of the three
    /// phases.
    ///
    /// Consumers only report a single value, so all phases carry the same
    /// total.  If any consumer fails to report, the whole sum fails: a partial
    /// sum could hide an overload.
    pub(crate) fn currents(&self, tree: &CircuitTree) -> Result<(f64, f64, f64), Error> {
        tracing::trace!(
            "{}: get current from {} consumers",
            self.name,
            self.consumers.len()
        );
        let scope = || Scope::Circuit(self.name.clone());
        tree.publish(scope(), "virtualConsumers", self.consumers.len());

        let mut total = 0.0;
        for consumer in &self.consumers {
            let current = match consumer {
                ConsumerRef::LoadPoint(lp) => lp.get_current(),
                ConsumerRef::Circuit(index) => tree.as_consumer(*index).get_current(),
            }?;
            tracing::trace!("{}: add {:.1}A current from consumer", self.name, current);
            total += current;
        }

        tree.publish(scope(), "virtualCurrent", total);
        Ok((total, total, total))
    }
}

impl std::fmt::Debug for VirtualMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtualMeter")
            .field("name", &self.name)
            .field("consumers", &self.consumers.len())
            .finish()
    }
}
