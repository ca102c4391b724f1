// SPDX-License-Identifier: MIT OR Apache-2.0
//! Edges between node ports.

use serde::{Deserialize, Serialize};

/// A port addressed by node and port name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PortRef {
    /// Node name
    pub node: String,
    /// Port name
    pub port: String,
}

impl PortRef {
    /// Create a port reference
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

/// A directed connection from an output port to an input port
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node name
    pub from_node: String,
    /// Source port name (usage Out)
    pub from_port: String,
    /// Target node name
    pub to_node: String,
    /// Target port name (usage In)
    pub to_port: String,
}

impl Edge {
    /// Create an edge
    pub fn new(
        from_node: impl Into<String>,
        from_port: impl Into<String>,
        to_node: impl Into<String>,
        to_port: impl Into<String>,
    ) -> Self {
        Self {
            from_node: from_node.into(),
            from_port: from_port.into(),
            to_node: to_node.into(),
            to_port: to_port.into(),
        }
    }

    /// Check if this edge involves a specific node
    pub fn involves_node(&self, node: &str) -> bool {
        self.from_node == node || self.to_node == node
    }

    /// Check if this edge ends at a specific input port
    pub fn targets(&self, node: &str, port: &str) -> bool {
        self.to_node == node && self.to_port == port
    }

    /// Source endpoint
    pub fn source(&self) -> PortRef {
        PortRef::new(&self.from_node, &self.from_port)
    }

    /// Target endpoint
    pub fn target(&self) -> PortRef {
        PortRef::new(&self.to_node, &self.to_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_endpoints() {
        let edge = Edge::new("Add2", "Out", "Add1", "In1");
        assert!(edge.involves_node("Add1"));
        assert!(edge.involves_node("Add2"));
        assert!(!edge.involves_node("Add3"));
        assert!(edge.targets("Add1", "In1"));
        assert!(!edge.targets("Add2", "Out"));
        assert_eq!(edge.source(), PortRef::new("Add2", "Out"));
        assert_eq!(edge.target(), PortRef::new("Add1", "In1"));
    }
}
