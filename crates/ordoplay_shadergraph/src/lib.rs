// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader graph type system for `OrdoPlay` Editor.
//!
//! This crate provides the core behind material/shader graphs:
//! - A [`Registry`] of pluggable port types and node definitions
//! - A [`GraphHandler`] holding named nodes and typed connections
//! - Concretization, which resolves each node's ports from declared
//!   defaults, incoming connections and pinned values
//! - Code assembly, which turns a concretized node into a source fragment
//!
//! ## Architecture
//!
//! Port values are [`Field`] trees addressed by dotted path
//! (`"In.TypeField.Length"`). Every port type implements
//! [`TypeDefinition`]; vectors and matrices whose size is left open are
//! sized by the graph. Graph edits never propagate on their own: callers
//! reconcretize the nodes they changed, or the whole graph in dependency
//! order with [`GraphHandler::reconcretize_all`].
//!
//! ```no_run
//! use ordoplay_shadergraph::{GraphHandler, Registry, register_standard_nodes, RegistryKey};
//!
//! let mut registry = Registry::with_builtin_types()?;
//! register_standard_nodes(&mut registry)?;
//!
//! let mut graph = GraphHandler::new("Example");
//! graph.add_node(&RegistryKey::new("Add", 1), "Add1", &registry)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assemble;
pub mod concretize;
pub mod connection;
pub mod document;
pub mod field;
pub mod graph;
pub mod key;
pub mod node;
pub mod port;
pub mod registry;
pub mod settings;
pub mod standard_nodes;
pub mod test_case;
pub mod types;

pub use assemble::{assemble, assemble_graph, AssemblyError, Declaration, SourceFragment};
pub use concretize::{concretize, ConcretizeError, UpstreamPort};
pub use connection::{Edge, PortRef};
pub use document::{DocumentError, GraphDocument, NodeRecord};
pub use field::{Field, FieldError, FromField};
pub use graph::{ConnectionError, CycleError, EdgeRemoval, GraphError, GraphHandler, NodeReader, NodeWriter};
pub use key::RegistryKey;
pub use node::{FunctionDescriptor, NodeDefinition, NodeDescriptor, NodeInstance, ParameterDescriptor};
pub use port::{PortInstance, Usage};
pub use registry::{Definition, Registry, RegistryError};
pub use settings::{AssemblySettings, SettingsError};
pub use standard_nodes::register_standard_nodes;
pub use test_case::{ImageComparisonSettings, MaterialTestCase};
pub use types::{DefaultValue, TypeDefinition};
