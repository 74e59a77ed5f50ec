// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`CircuitTree`] instances from configuration, and for
//! attaching load points to them.

use std::sync::Arc;

use petgraph::graph::NodeIndex;

use crate::config::CircuitConfig;
use crate::{CircuitTree, ConfigProvider, Consumer, Error, MeterCurrent};

use super::virtual_meter::ConsumerRef;
use super::{Circuit, CurrentSource};

/// A load point to be attached to a circuit.
pub struct LoadPointRef {
    /// Title of the load point, for error messages.
    pub title: String,
    /// Name of the circuit the load point is connected to, if any.
    pub circuit: Option<String>,
    pub consumer: Arc<dyn Consumer>,
}

/// State carried through the recursive construction of a tree.
///
/// Records which circuit has claimed the site's grid meter, so that a second
/// claim anywhere in the tree can be rejected.
struct BuildContext<'a> {
    provider: &'a dyn ConfigProvider,
    grid_meter_claimant: Option<String>,
}

impl BuildContext<'_> {
    fn resolve_meter(
        &mut self,
        config: &CircuitConfig,
    ) -> Result<Option<Arc<dyn MeterCurrent>>, Error> {
        let Some(meter_ref) = config.meter_ref() else {
            return Ok(None);
        };

        let meter = if self.provider.grid_meter_ref() == Some(meter_ref) {
            if let Some(claimant) = &self.grid_meter_claimant {
                return Err(Error::grid_meter_claimed(format!(
                    "Grid meter {} is already used by circuit {}, can't use it for circuit {}.",
                    meter_ref, claimant, config.name
                )));
            }
            self.grid_meter_claimant = Some(config.name.clone());
            tracing::trace!("{}: add grid meter from site: {}", config.name, meter_ref);
            self.provider.grid_meter()?
        } else {
            tracing::trace!("{}: add separate meter: {}", config.name, meter_ref);
            self.provider.meter(meter_ref)?
        };

        meter.as_meter_current().map(Some).ok_or_else(|| {
            Error::missing_capability(format!(
                "Circuit {} needs a meter with phase current support: {}",
                config.name, meter_ref
            ))
        })
    }
}

/// `CircuitTree` instantiation.
impl CircuitTree {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new [`CircuitTree`] from the given top-level circuit
    /// configurations, resolving meter references through `provider`.
    ///
    /// Returns an error if any circuit in any of the trees is invalid, in
    /// which case no tree is returned at all.
    pub fn try_new<'c>(
        circuits: impl IntoIterator<Item = &'c CircuitConfig>,
        provider: &dyn ConfigProvider,
    ) -> Result<Self, Error> {
        let mut tree = Self::new();
        let mut ctx = BuildContext {
            provider,
            grid_meter_claimant: None,
        };

        for config in circuits {
            tree.init_circuit(&mut ctx, config, None)?;
        }

        for line in tree.dump_config() {
            tracing::trace!("{}", line);
        }

        Ok(tree)
    }

    /// Adds a circuit to the tree, under the circuit named `parent`, or as a
    /// top-level circuit if `parent` is `None`.
    ///
    /// Without a `meter`, the circuit's current is computed from its
    /// consumers.  If the parent has no physical meter, the new circuit is
    /// registered as one of the parent's consumers.
    pub fn add_circuit(
        &mut self,
        parent: Option<&str>,
        name: &str,
        max_current: f64,
        meter: Option<Arc<dyn MeterCurrent>>,
    ) -> Result<(), Error> {
        let parent = parent.map(|p| self.index_of(p)).transpose()?;
        let index = self.insert_circuit(
            parent,
            Circuit::new(name.to_string(), max_current, None, meter),
        )?;
        if let Some(parent) = parent {
            self.add_child_consumer(parent, index);
        }
        Ok(())
    }

    /// Attaches a load point to the circuit with the given name.
    ///
    /// If the circuit has a physical meter, the meter's readings take
    /// priority and the load point is only counted as registered.
    pub fn register_consumer(
        &mut self,
        circuit: &str,
        consumer: Arc<dyn Consumer>,
    ) -> Result<(), Error> {
        let index = self.index_of(circuit)?;
        let circuit = &mut self.graph[index];
        if let CurrentSource::Virtual(vm) = &mut circuit.source {
            vm.add_consumer(ConsumerRef::LoadPoint(consumer.clone()));
        }
        circuit.consumers.push(consumer);
        Ok(())
    }

    /// Attaches each load point to the circuit it refers to.
    ///
    /// Fails if a load point refers to a circuit that doesn't exist.  All
    /// references are checked before any load point is attached, so a failed
    /// call leaves the tree unchanged.
    pub fn register_load_points(
        &mut self,
        load_points: impl IntoIterator<Item = LoadPointRef>,
    ) -> Result<(), Error> {
        let load_points = load_points
            .into_iter()
            .filter_map(|lp| {
                let circuit = lp.circuit.clone().filter(|c| !c.is_empty())?;
                Some((circuit, lp))
            })
            .collect::<Vec<_>>();

        for (circuit, lp) in &load_points {
            if self.roots.is_empty() {
                return Err(Error::invalid_config(format!(
                    "Loadpoint {} uses circuit(s), but no circuits are defined.",
                    lp.title
                )));
            }
            if !self.node_indices.contains_key(circuit) {
                return Err(Error::circuit_not_found(format!(
                    "Loadpoint {} uses undefined circuit: {}",
                    lp.title, circuit
                )));
            }
        }

        for (circuit, lp) in load_points {
            self.register_consumer(&circuit, lp.consumer)?;
            tracing::debug!("{}: connected to circuit {}", lp.title, circuit);
        }
        Ok(())
    }

    /// Changes the max current of the circuit with the given name.
    pub fn set_max_current(&mut self, name: &str, max_current: f64) -> Result<(), Error> {
        let index = self.index_of(name)?;
        self.graph[index].max_current = max_current;
        self.publish_circuit(index, "maxCurrent", max_current);
        Ok(())
    }

    /// Circuits are recursive, so their meters are also initialized
    /// recursively.  A circuit is added before its sub-circuits, so that
    /// they can be linked to it.
    fn init_circuit(
        &mut self,
        ctx: &mut BuildContext<'_>,
        config: &CircuitConfig,
        parent: Option<NodeIndex>,
    ) -> Result<NodeIndex, Error> {
        if config.name.is_empty() {
            return Err(Error::invalid_config("Circuit name must not be empty."));
        }

        let meter = ctx.resolve_meter(config)?;
        let index = self.insert_circuit(
            parent,
            Circuit::new(
                config.name.clone(),
                config.max_current,
                config.meter_ref().map(String::from),
                meter,
            ),
        )?;

        if config.circuits.is_empty() {
            tracing::trace!("{}: no sub circuits", config.name);
        }
        for sub in &config.circuits {
            tracing::trace!("{}: creating sub circuit {}", config.name, sub.name);
            let child = self.init_circuit(ctx, sub, Some(index))?;
            self.add_child_consumer(index, child);
        }

        tracing::info!(
            "initialized new circuit: {}, limit: {:.1}A",
            config.name,
            config.max_current
        );
        Ok(index)
    }

    fn insert_circuit(
        &mut self,
        parent: Option<NodeIndex>,
        circuit: Circuit,
    ) -> Result<NodeIndex, Error> {
        if circuit.name.is_empty() {
            return Err(Error::invalid_config("Circuit name must not be empty."));
        }
        if self.node_indices.contains_key(&circuit.name) {
            return Err(Error::invalid_config(format!(
                "Duplicate circuit name found: {}",
                circuit.name
            )));
        }

        let name = circuit.name.clone();
        let index = self.graph.add_node(circuit);
        self.node_indices.insert(name, index);
        match parent {
            Some(parent) => {
                self.graph.add_edge(parent, index, ());
            }
            None => self.roots.push(index),
        }
        Ok(index)
    }

    /// Rolls a sub-circuit's current up into its parent, if the parent has
    /// no physical meter.
    fn add_child_consumer(&mut self, parent: NodeIndex, child: NodeIndex) {
        if let CurrentSource::Virtual(vm) = &mut self.graph[parent].source {
            vm.add_consumer(ConsumerRef::Circuit(child));
        }
    }
}
