// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code assembly: turning concretized nodes into source fragments.
//!
//! A body template refers to parameters with `<sigil>Name`, optionally
//! followed by `.member`. Each reference becomes the identifier of the
//! matching port (`<node><separator><port>`). A bare reference to a
//! resource type expands to the type's default member, so `$Texture`
//! reads as `Node_Texture.tex`. A doubled sigil writes a literal sigil.

use crate::connection::PortRef;
use crate::graph::{CycleError, GraphHandler};
use crate::node::{FunctionDescriptor, NodeInstance};
use crate::port::Usage;
use crate::registry::{Registry, RegistryError};
use crate::settings::AssemblySettings;
use std::collections::HashMap;
use std::fmt::Write as _;

/// A port declaration in an assembled fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Generated identifier
    pub identifier: String,
    /// Shading-language type
    pub shader_type: String,
    /// Initializer expression; `None` for outputs
    pub initializer: Option<String>,
}

/// Assembled code for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFragment {
    /// Node name
    pub node: String,
    /// Variant the body came from
    pub variant: String,
    /// One declaration per port, in port order
    pub declarations: Vec<Declaration>,
    /// Body with every reference substituted
    pub body: String,
    /// Include files, in declaration order
    pub includes: Vec<String>,
}

impl SourceFragment {
    /// Render as text: includes, then declarations, then the body
    pub fn render(&self, settings: &AssemblySettings) -> String {
        let mut out = String::new();
        for include in &self.includes {
            let _ = writeln!(out, "{} \"{include}\"", settings.include_keyword);
        }
        let _ = writeln!(out, "// {} ({})", self.node, self.variant);

        if settings.emit_declarations {
            for declaration in &self.declarations {
                let _ = match &declaration.initializer {
                    Some(initializer) => writeln!(
                        out,
                        "{}{} {} = {initializer};",
                        settings.indent, declaration.shader_type, declaration.identifier
                    ),
                    None => writeln!(
                        out,
                        "{}{} {};",
                        settings.indent, declaration.shader_type, declaration.identifier
                    ),
                };
            }
        }

        for line in self.body.lines() {
            if line.trim().is_empty() {
                out.push('\n');
            } else {
                let _ = writeln!(out, "{}{line}", settings.indent);
            }
        }
        out
    }
}

/// Identifier generated for a port: `<node><separator><port>`, with any
/// character that cannot appear in an identifier replaced by `_`
pub fn port_identifier(node: &str, port: &str, settings: &AssemblySettings) -> String {
    let raw = format!("{node}{}{port}", settings.separator);
    let mut identifier: String = raw
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if identifier.starts_with(|c: char| c.is_ascii_digit()) {
        identifier.insert(0, '_');
    }
    identifier
}

/// Assemble one node on its own. Inputs are initialized from their inline
/// values; connections are not consulted.
pub fn assemble(
    node: &NodeInstance,
    registry: &Registry,
    settings: &AssemblySettings,
) -> Result<SourceFragment, AssemblyError> {
    let definition = registry.node_definition(&node.definition_key)?;
    let variant = definition
        .variant(&node.selected_variant)
        .ok_or_else(|| AssemblyError::UnknownVariant {
            node: node.name.clone(),
            variant: node.selected_variant.clone(),
        })?;

    let mut declarations = Vec::with_capacity(node.ports.len());
    for port in &node.ports {
        let type_definition = registry.type_definition(&port.type_key)?;
        let initializer = if port.usage.has_inline_value() {
            type_definition.literal(&port.field)
        } else {
            None
        };
        declarations.push(Declaration {
            identifier: port_identifier(&node.name, &port.name, settings),
            shader_type: type_definition.shader_type(&port.field),
            initializer,
        });
    }

    let body = substitute(node, variant, registry, settings)?;
    tracing::trace!("Assembled {} ({})", node.name, variant.id);

    Ok(SourceFragment {
        node: node.name.clone(),
        variant: variant.id.clone(),
        declarations,
        body,
        includes: variant.includes.clone(),
    })
}

/// Assemble every node in dependency order. A connected input is
/// initialized from the identifier of the output feeding it.
pub fn assemble_graph(
    graph: &GraphHandler,
    registry: &Registry,
    settings: &AssemblySettings,
) -> Result<Vec<SourceFragment>, AssemblyError> {
    let mut fragments = Vec::with_capacity(graph.node_count());
    let mut identifiers: HashMap<String, PortRef> = HashMap::new();
    for name in graph.topological_order()? {
        let Some(node) = graph.node(&name) else {
            continue;
        };
        let mut fragment = assemble(node, registry, settings)?;

        for (port, declaration) in node.ports.iter().zip(&mut fragment.declarations) {
            let owner = PortRef::new(node.name.as_str(), port.name.as_str());
            if let Some(first) = identifiers.insert(declaration.identifier.clone(), owner.clone()) {
                return Err(AssemblyError::DuplicateIdentifier {
                    identifier: declaration.identifier.clone(),
                    first,
                    second: owner,
                });
            }
            if port.usage != Usage::In {
                continue;
            }
            if let Some(edge) = graph.incoming_edge(&node.name, &port.name) {
                declaration.initializer = Some(port_identifier(&edge.from_node, &edge.from_port, settings));
            }
        }
        fragments.push(fragment);
    }

    tracing::debug!("Assembled {} fragment(s) for {}", fragments.len(), graph.name);
    Ok(fragments)
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn take_identifier(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if !is_identifier_char(c) {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn substitute(
    node: &NodeInstance,
    variant: &FunctionDescriptor,
    registry: &Registry,
    settings: &AssemblySettings,
) -> Result<String, AssemblyError> {
    let sigil = settings.sigil;
    let mut out = String::with_capacity(variant.body.len());
    let mut chars = variant.body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != sigil {
            out.push(c);
            continue;
        }
        if chars.peek() == Some(&sigil) {
            chars.next();
            out.push(sigil);
            continue;
        }

        let name = take_identifier(&mut chars);
        if name.is_empty() {
            out.push(sigil);
            continue;
        }

        let parameter = variant
            .parameter(&name)
            .ok_or_else(|| AssemblyError::UnresolvedParameterReference {
                node: node.name.clone(),
                variant: variant.id.clone(),
                name: name.clone(),
            })?;

        out.push_str(&port_identifier(&node.name, &parameter.name, settings));

        // `.member` after the name, as opposed to a trailing period
        let mut lookahead = chars.clone();
        let has_member = lookahead.next() == Some('.')
            && lookahead.peek().is_some_and(|c| c.is_ascii_alphabetic() || *c == '_');

        if !has_member {
            let type_definition = registry.type_definition(&parameter.type_key)?;
            if let Some(member) = type_definition.default_member() {
                out.push('.');
                out.push_str(member);
            }
        }
    }
    Ok(out)
}

/// Error during code assembly
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// Body references a name that is not a parameter of the variant
    #[error("Node {node} ({variant}) references unknown parameter '{name}'")]
    UnresolvedParameterReference {
        /// Node name
        node: String,
        /// Variant id
        variant: String,
        /// Referenced name
        name: String,
    },

    /// Selected variant is not part of the definition
    #[error("Node {node} selects unknown variant '{variant}'")]
    UnknownVariant {
        /// Node name
        node: String,
        /// Variant id
        variant: String,
    },

    /// Two ports sanitize to the same generated identifier
    #[error("Ports {first:?} and {second:?} both assemble to '{identifier}'")]
    DuplicateIdentifier {
        /// Shared identifier
        identifier: String,
        /// Port that claimed the identifier first
        first: PortRef,
        /// Port that collided with it
        second: PortRef,
    },

    /// Definition or type missing from the registry
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Graph has no dependency order
    #[error(transparent)]
    Cycle(#[from] CycleError),
}
