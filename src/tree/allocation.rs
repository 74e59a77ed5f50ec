// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for determining the present current of a circuit and how much
//! current is still available to it.

use petgraph::graph::NodeIndex;

use crate::{CircuitTree, Consumer, Error};

use super::CurrentSource;

/// A circuit seen as a consumer of its parent circuit.
///
/// Reports the circuit's own total draw, so that a parent without a physical
/// meter can roll up the current of its sub-circuits.
#[derive(Clone, Copy)]
pub(crate) struct CircuitConsumer<'a> {
    tree: &'a CircuitTree,
    index: NodeIndex,
}

impl Consumer for CircuitConsumer<'_> {
    fn get_current(&self) -> Result<f64, Error> {
        self.tree.current_at(self.index)
    }
}

/// Current accounting.
impl CircuitTree {
    /// Returns the present current drawn by the circuit with the given name.
    ///
    /// This is the max current over all phases.  A physical meter is read
    /// directly, otherwise the currents of the registered consumers are
    /// summed up.
    pub fn current(&self, name: &str) -> Result<f64, Error> {
        self.current_at(self.index_of(name)?)
    }

    /// Returns the current that can still be drawn by the circuit with the
    /// given name, without exceeding its own limit or that of any of its
    /// parents.
    ///
    /// The result is negative if the circuit or one of its parents is
    /// overloaded.  An error is returned only if there is no circuit with the
    /// given name.
    pub fn remaining_current(&self, name: &str) -> Result<f64, Error> {
        Ok(self.remaining_current_at(self.index_of(name)?))
    }

    pub(crate) fn as_consumer(&self, index: NodeIndex) -> CircuitConsumer<'_> {
        CircuitConsumer { tree: self, index }
    }

    pub(crate) fn current_at(&self, index: NodeIndex) -> Result<f64, Error> {
        let circuit = &self.graph[index];

        let currents = match &circuit.source {
            CurrentSource::Physical(meter) => meter.currents(),
            CurrentSource::Virtual(vm) => vm.currents(self),
        };
        let (i1, i2, i3) = currents
            .and_then(|(i1, i2, i3)| {
                if [i1, i2, i3].iter().all(|i| i.is_finite()) {
                    Ok((i1, i2, i3))
                } else {
                    Err(Error::meter_read(format!(
                        "invalid phase currents: {i1}A {i2}A {i3}A"
                    )))
                }
            })
            .map_err(|e| {
                tracing::error!("{}: can't read meter currents: {}", circuit.name, e);
                e
            })?;

        tracing::debug!(
            "{}: meter currents: {:.3}A {:.3}A {:.3}A",
            circuit.name,
            i1,
            i2,
            i3
        );
        self.publish_circuit(index, "meterCurrents", vec![i1, i2, i3]);

        // Phases are not balanced individually; the most loaded phase counts.
        let current = i1.max(i2).max(i3);

        tracing::debug!("{}: actual current: {:.1}A", circuit.name, current);
        self.publish_circuit(index, "actualCurrent", current);

        Ok(current)
    }

    pub(crate) fn remaining_current_at(&self, index: NodeIndex) -> f64 {
        let circuit = &self.graph[index];
        tracing::trace!("{}: get available current", circuit.name);

        // A failed read counts as no draw for this cycle; the error has
        // already been logged.
        let current = self.current_at(index).unwrap_or(0.0);

        let mut available = circuit.max_current - current;
        if available < 0.0 {
            tracing::warn!(
                "{}: overload detected, current: {:.1}A, allowed max current: {:.1}A",
                circuit.name,
                current,
                circuit.max_current
            );
            self.publish_circuit(index, "overload", true);
        } else {
            self.publish_circuit(index, "overload", false);
        }

        if let Some(parent) = self.parent_index(index) {
            tracing::trace!(
                "{}: get available current from parent: {}",
                circuit.name,
                self.graph[parent].name
            );
            available = available.min(self.remaining_current_at(parent));
        }

        tracing::debug!(
            "{}: using {:.1}A, {:.1}A available",
            circuit.name,
            current,
            available
        );
        available
    }
}
