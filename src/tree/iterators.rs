// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over circuits in a `CircuitTree`.

use petgraph::graph::{DiGraph, NodeIndex};

use crate::Circuit;

/// An iterator over all circuits in a `CircuitTree`, in insertion order.
pub struct Circuits<'a> {
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<Circuit>>,
}

impl<'a> Iterator for Circuits<'a> {
    type Item = &'a Circuit;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }
}

/// An iterator over the sub-circuits of a circuit.
pub struct Children<'a> {
    pub(crate) graph: &'a DiGraph<Circuit, ()>,
    pub(crate) iter: std::vec::IntoIter<NodeIndex>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Circuit;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[i])
    }
}
