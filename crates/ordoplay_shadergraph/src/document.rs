// SPDX-License-Identifier: MIT OR Apache-2.0
//! Persistent graph snapshot.
//!
//! A [`GraphDocument`] stores only what cannot be recomputed: node names,
//! definition keys, selected variants, pinned port values and edges.
//! Everything else is rebuilt by concretization when the document is
//! loaded against a registry.

use crate::connection::Edge;
use crate::field::Field;
use crate::graph::{ConnectionError, GraphError, GraphHandler};
use crate::key::RegistryKey;
use crate::registry::Registry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current graph document format version
pub const DOCUMENT_FORMAT_VERSION: u32 = 1;

/// A node as stored in a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node name
    pub name: String,
    /// Definition key
    pub definition: RegistryKey,
    /// Selected variant id
    pub variant: String,
    /// Values of pinned ports, by port name
    #[serde(default)]
    pub pinned: IndexMap<String, Field>,
}

/// Serialized graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Document format version
    pub version: u32,
    /// Graph name
    pub name: String,
    /// Nodes in insertion order
    pub nodes: Vec<NodeRecord>,
    /// Edges
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    /// Serialize to RON format
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }

    /// Deserialize from RON format
    pub fn from_ron(s: &str) -> Result<Self, DocumentError> {
        let document: GraphDocument = ron::from_str(s)?;
        if document.version > DOCUMENT_FORMAT_VERSION {
            return Err(DocumentError::UnsupportedVersion {
                found: document.version,
                supported: DOCUMENT_FORMAT_VERSION,
            });
        }
        Ok(document)
    }

    /// Save document to file
    pub fn save(&self, path: &Path) -> Result<(), DocumentError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Load document from file
    pub fn load(path: &Path) -> Result<Self, DocumentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }
}

impl GraphHandler {
    /// Snapshot the persistent state of the graph
    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .nodes()
            .map(|node| NodeRecord {
                name: node.name.clone(),
                definition: node.definition_key.clone(),
                variant: node.selected_variant.clone(),
                pinned: node
                    .ports
                    .iter()
                    .filter(|p| p.pinned)
                    .map(|p| (p.name.clone(), p.field.clone()))
                    .collect(),
            })
            .collect();

        GraphDocument {
            version: DOCUMENT_FORMAT_VERSION,
            name: self.name.clone(),
            nodes,
            edges: self.edges().cloned().collect(),
        }
    }

    /// Rebuild a graph from a document.
    ///
    /// Nodes are added and switched to their stored variant, pins are
    /// restored, edges reconnected, and every node is reconcretized in
    /// dependency order.
    pub fn from_document(document: &GraphDocument, registry: &Registry) -> Result<Self, DocumentError> {
        let mut graph = GraphHandler::new(document.name.clone());

        for record in &document.nodes {
            graph
                .add_node(&record.definition, record.name.clone(), registry)?
                .set_selected_variant(record.variant.clone());
            graph.reconcretize_node(&record.name, registry)?;

            if let Some(mut writer) = graph.get_node_writer(&record.name) {
                for (port, field) in &record.pinned {
                    writer.set_port_field(port, "", field.clone())?;
                }
            }
        }

        for edge in &document.edges {
            graph.connect(&edge.from_node, &edge.from_port, &edge.to_node, &edge.to_port, registry)?;
        }

        graph.reconcretize_all(registry)?;
        tracing::debug!(
            "Loaded graph {} ({} nodes, {} edges)",
            graph.name,
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }
}

/// Error loading or saving a graph document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// File could not be read or written
    #[error("Document I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Not a valid document
    #[error("Invalid document: {0}")]
    Ron(#[from] ron::error::SpannedError),

    /// Document could not be serialized
    #[error("Could not serialize document: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Document version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },

    /// Graph could not be rebuilt
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// A stored edge could not be reconnected
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}
