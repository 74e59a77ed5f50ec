// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A human-readable dump of a [`CircuitTree`]'s configuration.

use petgraph::graph::NodeIndex;

use crate::CircuitTree;

const NAME_COLUMN_WIDTH: usize = 15;

impl CircuitTree {
    /// Returns one line per circuit, with sub-circuits indented below their
    /// parent.
    pub fn dump_config(&self) -> Vec<String> {
        let mut lines = vec![];
        for root in &self.roots {
            self.dump_circuit(*root, 0, &mut lines);
        }
        lines
    }

    fn dump_circuit(&self, index: NodeIndex, indent: usize, lines: &mut Vec<String>) {
        let circuit = &self.graph[index];
        lines.push(format!(
            "{}{}:{} meter {} maxCurrent {:.1}A",
            " ".repeat(indent),
            circuit.name,
            " ".repeat(NAME_COLUMN_WIDTH.saturating_sub(circuit.name.len() + indent)),
            if circuit.is_virtual() {
                "virtual"
            } else {
                "physical"
            },
            circuit.max_current,
        ));
        for child in self.child_indices(index) {
            self.dump_circuit(child, indent + 2, lines);
        }
    }
}
