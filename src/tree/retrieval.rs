// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving circuits from a [`CircuitTree`].

use petgraph::graph::NodeIndex;
use petgraph::Direction;

use crate::iterators::{Children, Circuits};
use crate::{Circuit, CircuitTree, Error};

/// `Circuit` retrieval.
impl CircuitTree {
    /// Returns the circuit with the given name, if it exists.
    pub fn circuit(&self, name: &str) -> Result<&Circuit, Error> {
        self.index_of(name).map(|i| &self.graph[i])
    }

    /// Returns an iterator over all circuits in the tree.
    pub fn circuits(&self) -> Circuits<'_> {
        Circuits {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns an iterator over the top-level circuits, in configuration
    /// order.
    pub fn roots(&self) -> impl Iterator<Item = &Circuit> + '_ {
        self.roots.iter().map(|i| &self.graph[*i])
    }

    /// Returns the parent of the circuit with the given name, or `None` for a
    /// top-level circuit.
    ///
    /// Returns an error if the given circuit does not exist.
    pub fn parent(&self, name: &str) -> Result<Option<&Circuit>, Error> {
        Ok(self
            .parent_index(self.index_of(name)?)
            .map(|i| &self.graph[i]))
    }

    /// Returns an iterator over the sub-circuits of the circuit with the
    /// given name, in configuration order.
    ///
    /// Returns an error if the given circuit does not exist.
    pub fn children(&self, name: &str) -> Result<Children<'_>, Error> {
        let index = self.index_of(name)?;
        Ok(Children {
            graph: &self.graph,
            iter: self.child_indices(index).into_iter(),
        })
    }

    /// Searches the subtree starting at the circuit named `from`, depth
    /// first, for the circuit named `name`.
    ///
    /// Returns an error if `from` does not exist, and `None` if `name` is not
    /// part of its subtree.
    pub fn find_in_subtree(&self, from: &str, name: &str) -> Result<Option<&Circuit>, Error> {
        let mut stack = vec![self.index_of(from)?];

        while let Some(index) = stack.pop() {
            let circuit = &self.graph[index];
            tracing::trace!("searching for circuit {} in {}", name, circuit.name);
            if circuit.name == name {
                return Ok(Some(circuit));
            }
            stack.extend(self.child_indices(index).into_iter().rev());
        }

        tracing::debug!("could not find circuit {} below {}", name, from);
        Ok(None)
    }

    pub(crate) fn index_of(&self, name: &str) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::circuit_not_found(format!("Circuit {} not found.", name)))
    }

    pub(crate) fn parent_index(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
    }

    /// petgraph returns the most recently added edge first, so the neighbors
    /// are reversed to get configuration order.
    pub(crate) fn child_indices(&self, index: NodeIndex) -> Vec<NodeIndex> {
        let mut children = self
            .graph
            .neighbors_directed(index, Direction::Outgoing)
            .collect::<Vec<_>>();
        children.reverse();
        children
    }
}
