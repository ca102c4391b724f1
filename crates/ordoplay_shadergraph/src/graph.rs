// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph store: named node instances and the edges between their ports.
//!
//! [`GraphHandler`] is the only place graph structure changes. Structural
//! edits never concretize other nodes on their own; callers run
//! [`GraphHandler::reconcretize_node`] on whatever they changed, in
//! dependency order if the change should travel downstream.

use crate::concretize::{concretize, ConcretizeError, UpstreamPort};
use crate::connection::{Edge, PortRef};
use crate::field::{Field, FieldError, FromField};
use crate::key::RegistryKey;
use crate::node::{split_port_path, NodeInstance};
use crate::port::{PortInstance, Usage};
use crate::registry::{Registry, RegistryError};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A shader graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphHandler {
    /// Graph name
    pub name: String,
    /// Nodes by unique name
    nodes: IndexMap<String, NodeInstance>,
    /// Edges, at most one per input port
    edges: IndexSet<Edge>,
}

impl GraphHandler {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            edges: IndexSet::new(),
        }
    }

    /// Instantiate a registered node under a unique name.
    ///
    /// The new node selects its definition's default variant and is
    /// concretized with no connections, so every port holds its declared
    /// or intrinsic default.
    pub fn add_node(
        &mut self,
        key: &RegistryKey,
        name: impl Into<String>,
        registry: &Registry,
    ) -> Result<NodeWriter<'_>, GraphError> {
        let name = name.into();
        if self.nodes.contains_key(&name) {
            return Err(GraphError::DuplicateNodeName(name));
        }

        let definition = registry.node_definition(key)?;
        let mut node = NodeInstance::new(name.clone(), definition);
        node.ports = concretize(&node, definition, &[], registry)?;

        tracing::debug!("Added node {name} ({key}, variant {})", node.selected_variant);
        let node = self.nodes.entry(name).or_insert(node);
        Ok(NodeWriter { node })
    }

    /// Remove a node and every edge touching it
    pub fn remove_node(&mut self, name: &str) -> Result<NodeInstance, GraphError> {
        let node = self
            .nodes
            .shift_remove(name)
            .ok_or_else(|| GraphError::UnknownNode(name.to_string()))?;
        self.edges.retain(|e| !e.involves_node(name));
        tracing::debug!("Removed node {name}");
        Ok(node)
    }

    /// Read-only view of a node
    pub fn get_node_reader(&self, name: &str) -> Option<NodeReader<'_>> {
        self.nodes.get(name).map(|node| NodeReader { node })
    }

    /// Mutating view of a node
    pub fn get_node_writer(&mut self, name: &str) -> Option<NodeWriter<'_>> {
        self.nodes.get_mut(name).map(|node| NodeWriter { node })
    }

    /// Get a node by name
    pub fn node(&self, name: &str) -> Option<&NodeInstance> {
        self.nodes.get(name)
    }

    /// Get all nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeInstance> {
        self.nodes.values()
    }

    /// Get all node names, in insertion order
    pub fn node_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.keys().map(String::as_str)
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Connect an output port to an input port.
    ///
    /// An existing edge into the input port is replaced; it is returned.
    /// Nothing changes when the connection is rejected.
    pub fn connect(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
        registry: &Registry,
    ) -> Result<Option<Edge>, ConnectionError> {
        let source = self.port(from_node, from_port)?;
        let target = self.port(to_node, to_port)?;

        if !source.can_connect(target) {
            return Err(ConnectionError::UsageMismatch {
                from: source.usage,
                to: target.usage,
            });
        }

        let source_type = registry.type_definition(&source.type_key)?;
        let target_type = registry.type_definition(&target.type_key)?;
        if !target_type.accepts(source_type) {
            return Err(ConnectionError::IncompatiblePorts {
                from: source.type_key.clone(),
                to: target.type_key.clone(),
            });
        }

        if from_node == to_node {
            return Err(ConnectionError::SelfLoop);
        }

        let replaced = self
            .incoming_edge(to_node, to_port)
            .cloned()
            .filter(|previous| self.edges.shift_remove(previous));

        let edge = Edge::new(from_node, from_port, to_node, to_port);
        tracing::debug!("Connected {from_node}.{from_port} -> {to_node}.{to_port}");
        self.edges.insert(edge);
        Ok(replaced)
    }

    /// Connect two ports, reporting only whether it succeeded
    pub fn try_connect(
        &mut self,
        from_node: &str,
        from_port: &str,
        to_node: &str,
        to_port: &str,
        registry: &Registry,
    ) -> bool {
        match self.connect(from_node, from_port, to_node, to_port, registry) {
            Ok(_) => true,
            Err(err) => {
                tracing::debug!("Rejected {from_node}.{from_port} -> {to_node}.{to_port}: {err}");
                false
            }
        }
    }

    fn port(&self, node: &str, port: &str) -> Result<&PortInstance, ConnectionError> {
        self.nodes
            .get(node)
            .ok_or_else(|| ConnectionError::NodeNotFound(node.to_string()))?
            .port(port)
            .ok_or_else(|| ConnectionError::PortNotFound(PortRef::new(node, port)))
    }

    /// Remove one edge, returning what it touched
    pub fn delete_edge(&mut self, edge: &Edge) -> EdgeRemoval {
        self.delete_edges(std::slice::from_ref(edge))
    }

    /// Remove several edges, returning what they touched
    pub fn delete_edges(&mut self, edges: &[Edge]) -> EdgeRemoval {
        let mut removal = EdgeRemoval::default();
        for edge in edges {
            if self.edges.shift_remove(edge) {
                removal.affected_ports.insert(edge.source());
                removal.affected_ports.insert(edge.target());
                removal.removed.push(edge.clone());
            }
        }
        tracing::debug!("Deleted {} edge(s)", removal.removed.len());
        removal
    }

    /// Get all edges
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// The edge feeding an input port, if any
    pub fn incoming_edge(&self, node: &str, port: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.targets(node, port))
    }

    /// Get edges involving a node
    pub fn edges_for_node<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.involves_node(node))
    }

    /// Get the number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Recompute one node's ports from its definition, selected variant,
    /// incoming edges and pins. Other nodes are not touched.
    pub fn reconcretize_node(&mut self, name: &str, registry: &Registry) -> Result<(), GraphError> {
        let ports = {
            let node = self
                .nodes
                .get(name)
                .ok_or_else(|| GraphError::UnknownNode(name.to_string()))?;
            let definition = registry.node_definition(&node.definition_key)?;

            let upstream: Vec<UpstreamPort<'_>> = self
                .edges
                .iter()
                .filter(|e| e.to_node == name)
                .filter_map(|e| {
                    let source = self.nodes.get(&e.from_node)?.port(&e.from_port)?;
                    Some(UpstreamPort {
                        to_port: &e.to_port,
                        source,
                    })
                })
                .collect();

            concretize(node, definition, &upstream, registry)?
        };

        tracing::trace!("Reconcretized {name} ({} ports)", ports.len());
        if let Some(node) = self.nodes.get_mut(name) {
            node.ports = ports;
        }
        Ok(())
    }

    /// Reconcretize every node, upstream nodes first
    pub fn reconcretize_all(&mut self, registry: &Registry) -> Result<(), GraphError> {
        for name in self.topological_order()? {
            self.reconcretize_node(&name, registry)?;
        }
        Ok(())
    }

    /// Get node names in dependency order (sources first)
    pub fn topological_order(&self) -> Result<Vec<String>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for name in self.nodes.keys() {
            if !visited.contains(name.as_str()) {
                self.visit(name, &mut visited, &mut temp_mark, &mut order)?;
            }
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        visited: &mut HashSet<&'a str>,
        temp_mark: &mut HashSet<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(name) {
            return Err(CycleError);
        }
        if visited.contains(name) {
            return Ok(());
        }

        temp_mark.insert(name);

        // Visit all nodes that this node depends on
        for edge in self.edges.iter().filter(|e| e.to_node == name) {
            self.visit(&edge.from_node, visited, temp_mark, order)?;
        }

        temp_mark.remove(name);
        visited.insert(name);
        order.push(name.to_string());

        Ok(())
    }
}

impl Default for GraphHandler {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Read-only view of a node
#[derive(Debug, Clone, Copy)]
pub struct NodeReader<'a> {
    node: &'a NodeInstance,
}

impl<'a> NodeReader<'a> {
    /// Node name
    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    /// Definition key
    pub fn definition_key(&self) -> &'a RegistryKey {
        &self.node.definition_key
    }

    /// Selected variant id
    pub fn selected_variant(&self) -> &'a str {
        &self.node.selected_variant
    }

    /// Ports in declaration order
    pub fn ports(&self) -> &'a [PortInstance] {
        &self.node.ports
    }

    /// Get a port by name
    pub fn try_get_port(&self, name: &str) -> Option<&'a PortInstance> {
        self.node.port(name)
    }

    /// Read a value by `"<port>.TypeField.<path>"`
    pub fn try_get_field<T: FromField>(&self, path: &str) -> Option<T> {
        self.node.try_get_field(path)
    }

    /// The underlying node
    pub fn instance(&self) -> &'a NodeInstance {
        self.node
    }
}

/// Mutating view of a node
#[derive(Debug)]
pub struct NodeWriter<'a> {
    node: &'a mut NodeInstance,
}

impl NodeWriter<'_> {
    /// Read-only view of the same node
    pub fn reader(&self) -> NodeReader<'_> {
        NodeReader { node: &*self.node }
    }

    /// Write a sub-field of a port's value and pin the port
    pub fn set_port_field(
        &mut self,
        port: &str,
        path: &str,
        value: impl Into<Field>,
    ) -> Result<(), GraphError> {
        let node_name = &self.node.name;
        let target = self
            .node
            .ports
            .iter_mut()
            .find(|p| p.name == port)
            .ok_or_else(|| GraphError::UnknownPort(PortRef::new(node_name.as_str(), port)))?;

        target.field.set(path, value)?;
        target.pinned = true;
        Ok(())
    }

    /// Write by `"<port>.TypeField.<path>"` and pin the port
    pub fn set_field(&mut self, path: &str, value: impl Into<Field>) -> Result<(), GraphError> {
        let (port, field_path) = split_port_path(path)
            .ok_or_else(|| GraphError::Field(FieldError::InvalidPath(path.to_string())))?;
        self.set_port_field(port, field_path, value)
    }

    /// Unpin a port so the next concretization recomputes it
    pub fn clear_pin(&mut self, port: &str) -> Result<(), GraphError> {
        let node_name = &self.node.name;
        let target = self
            .node
            .ports
            .iter_mut()
            .find(|p| p.name == port)
            .ok_or_else(|| GraphError::UnknownPort(PortRef::new(node_name.as_str(), port)))?;
        target.pinned = false;
        Ok(())
    }

    /// Select a function variant; takes effect at the next reconcretization
    pub fn set_selected_variant(&mut self, id: impl Into<String>) {
        self.node.selected_variant = id.into();
    }
}

/// Edges removed by a deletion and the ports they touched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeRemoval {
    /// Edges that existed and were removed
    pub removed: Vec<Edge>,
    /// Both endpoints of every removed edge
    pub affected_ports: IndexSet<PortRef>,
}

impl EdgeRemoval {
    /// Nodes whose inputs lost a connection and should be reconcretized
    pub fn nodes_to_reconcretize(&self) -> IndexSet<&str> {
        self.removed.iter().map(|e| e.to_node.as_str()).collect()
    }
}

/// Error from a graph operation
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// Node name already used
    #[error("Duplicate node name: {0}")]
    DuplicateNodeName(String),

    /// Node not found
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// Port not found on a node
    #[error("Unknown port: {0:?}")]
    UnknownPort(PortRef),

    /// Selected variant not part of the definition
    #[error("Node {node} selects unknown variant '{variant}'")]
    UnknownVariant {
        /// Node name
        node: String,
        /// Variant id
        variant: String,
    },

    /// Field path could not be written
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Registry lookup failed
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Graph contains a cycle
    #[error(transparent)]
    Cycle(#[from] CycleError),
}

impl From<ConcretizeError> for GraphError {
    fn from(err: ConcretizeError) -> Self {
        match err {
            ConcretizeError::UnknownVariant { node, variant } => Self::UnknownVariant { node, variant },
            ConcretizeError::Registry(err) => Self::Registry(err),
        }
    }
}

/// Error when creating a connection
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// Port not found
    #[error("Port not found: {0:?}")]
    PortNotFound(PortRef),

    /// Not an output feeding an input
    #[error("Cannot connect {from:?} port to {to:?} port")]
    UsageMismatch {
        /// Source usage
        from: Usage,
        /// Target usage
        to: Usage,
    },

    /// Incompatible port types
    #[error("Incompatible port types: {from} -> {to}")]
    IncompatiblePorts {
        /// Source type
        from: RegistryKey,
        /// Target type
        to: RegistryKey,
    },

    /// Self-loop not allowed
    #[error("Self-loop not allowed")]
    SelfLoop,

    /// Port type missing from the registry
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Error when graph contains a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;
