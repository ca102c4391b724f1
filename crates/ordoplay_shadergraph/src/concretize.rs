// SPDX-License-Identifier: MIT OR Apache-2.0
//! Concretization: resolving a node's ports and field values.
//!
//! [`concretize`] is a pure function of one node, its definition, the
//! upstream ports feeding its inputs and the registry. It runs in three
//! passes:
//!
//! 1. Build the port list of the selected variant. A pinned port with the
//!    same name, type and usage is reused (field and pin survive a variant
//!    switch) and normalized to its own shape. Every other port starts
//!    from its declared default, so unpinned values never depend on edits
//!    that are no longer in the graph.
//! 2. Replace every connected, unpinned input with the field adapted from
//!    its upstream port.
//! 3. Within each inference group (ports whose type has an inferable
//!    dimension), take the largest dimension fixed by a pin, a connection
//!    or a declared default, and resize every free member to it. A group
//!    with nothing fixed falls back to the type's intrinsic dimension.

use crate::node::{NodeDefinition, NodeInstance};
use crate::port::{PortInstance, Usage};
use crate::registry::{Registry, RegistryError};
use crate::types::TypeDefinition;
use indexmap::IndexMap;

/// An upstream port feeding one of the node's inputs
#[derive(Debug, Clone, Copy)]
pub struct UpstreamPort<'a> {
    /// Input port on the node being concretized
    pub to_port: &'a str,
    /// Current state of the connected output port
    pub source: &'a PortInstance,
}

struct Resolving<'r> {
    port: PortInstance,
    type_definition: &'r dyn TypeDefinition,
    declared_dimension: Option<u8>,
    connected: bool,
}

impl Resolving<'_> {
    fn is_free(&self) -> bool {
        !self.port.pinned && !self.connected
    }

    fn fixed_dimension(&self) -> Option<u8> {
        if self.port.pinned || self.connected {
            self.type_definition.dimension(&self.port.field)
        } else {
            self.declared_dimension
        }
    }
}

/// Resolve the ports of `node` for its selected variant
pub fn concretize(
    node: &NodeInstance,
    definition: &NodeDefinition,
    upstream: &[UpstreamPort<'_>],
    registry: &Registry,
) -> Result<Vec<PortInstance>, ConcretizeError> {
    let variant = definition
        .variant(&node.selected_variant)
        .ok_or_else(|| ConcretizeError::UnknownVariant {
            node: node.name.clone(),
            variant: node.selected_variant.clone(),
        })?;

    // Pass 1: port set
    let mut resolving = Vec::with_capacity(variant.parameters.len());
    for parameter in &variant.parameters {
        let type_definition = registry.type_definition(&parameter.type_key)?;
        let existing = node
            .ports
            .iter()
            .find(|p| p.has_signature(&parameter.name, &parameter.type_key, parameter.usage));

        let port = match existing {
            Some(port) if port.pinned => {
                let mut port = port.clone();
                type_definition.normalize(&mut port.field);
                port
            }
            _ => PortInstance::new(
                parameter.name.clone(),
                parameter.usage,
                parameter.type_key.clone(),
                type_definition.default_field(parameter.default.as_ref()),
            ),
        };
        let declared_dimension = parameter
            .default
            .as_ref()
            .and_then(|default| type_definition.dimension(&type_definition.default_field(Some(default))));

        resolving.push(Resolving {
            port,
            type_definition,
            declared_dimension,
            connected: false,
        });
    }

    // Pass 2: connections
    for entry in resolving.iter_mut().filter(|r| r.port.usage == Usage::In) {
        let Some(incoming) = upstream.iter().find(|u| u.to_port == entry.port.name) else {
            continue;
        };
        if entry.port.pinned {
            tracing::trace!("{}.{} is pinned; connection ignored", node.name, entry.port.name);
            continue;
        }

        let source_type = match registry.type_definition(&incoming.source.type_key) {
            Ok(source_type) => source_type,
            Err(err) => {
                tracing::warn!("Skipping connection into {}.{}: {err}", node.name, entry.port.name);
                continue;
            }
        };
        if !entry.type_definition.accepts(source_type) {
            tracing::warn!(
                "Skipping stale connection into {}.{}: {} does not accept {}",
                node.name,
                entry.port.name,
                entry.port.type_key,
                incoming.source.type_key
            );
            continue;
        }

        entry.port.field = source_type.adapt_field(&incoming.source.field, entry.type_definition);
        entry.connected = true;
    }

    // Pass 3: shared dimensions
    let mut groups: IndexMap<&'static str, Vec<usize>> = IndexMap::new();
    for (index, entry) in resolving.iter().enumerate() {
        if let Some(group) = entry.type_definition.shape_group() {
            groups.entry(group).or_default().push(index);
        }
    }

    for (group, members) in &groups {
        let effective = members
            .iter()
            .filter_map(|&i| resolving[i].fixed_dimension())
            .max()
            .unwrap_or_else(|| resolving[members[0]].type_definition.intrinsic_dimension());
        tracing::trace!("{}: {group} group resolves to dimension {effective}", node.name);

        for &i in members {
            let entry = &mut resolving[i];
            if entry.is_free() && entry.type_definition.dimension(&entry.port.field) != Some(effective) {
                entry.type_definition.resize(&mut entry.port.field, effective);
            }
        }
    }

    Ok(resolving.into_iter().map(|r| r.port).collect())
}

/// Error during concretization
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConcretizeError {
    /// Selected variant is not part of the definition
    #[error("Node {node} selects unknown variant '{variant}'")]
    UnknownVariant {
        /// Node name
        node: String,
        /// Selected variant id
        variant: String,
    },

    /// A parameter type is missing from the registry
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field;
    use crate::node::{FunctionDescriptor, NodeDescriptor, ParameterDescriptor};
    use crate::types::{ty, Length};

    fn add_node(registry: &mut Registry) -> NodeDefinition {
        let key = registry
            .register_function(FunctionDescriptor::new(
                "Add",
                "$Out = $In1 + $In2;",
                [
                    ParameterDescriptor::new("In1", ty::vector(), Usage::In),
                    ParameterDescriptor::new("In2", ty::vector(), Usage::In),
                    ParameterDescriptor::new("Out", ty::vector(), Usage::Out),
                ],
            ))
            .unwrap();
        registry.node_definition(&key).unwrap().clone()
    }

    fn length(ports: &[PortInstance], name: &str) -> Option<Length> {
        ports.iter().find(|p| p.name == name)?.try_get_field("Length")
    }

    fn vector_port(name: &str, values: &[f32], usage: Usage) -> PortInstance {
        let registry = Registry::with_builtin_types().unwrap();
        let vector = registry.type_definition(&ty::vector()).unwrap();
        let field = vector.default_field(Some(&values.to_vec().into()));
        PortInstance::new(name, usage, ty::vector(), field)
    }

    #[test]
    fn test_empty_edge_set_uses_intrinsic_dimension() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let node = NodeInstance::new("Add1", &definition);

        let ports = concretize(&node, &definition, &[], &registry).unwrap();
        let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["In1", "In2", "Out"]);
        for name in names {
            assert_eq!(length(&ports, name), Some(Length::One));
        }
    }

    #[test]
    fn test_pinned_port_drives_group() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        node.ports = concretize(&node, &definition, &[], &registry).unwrap();

        let in2 = node.port_mut("In2").unwrap();
        in2.field.set("Length", Length::Three).unwrap();
        in2.pinned = true;

        let ports = concretize(&node, &definition, &[], &registry).unwrap();
        assert_eq!(length(&ports, "In1"), Some(Length::Three));
        assert_eq!(length(&ports, "In2"), Some(Length::Three));
        assert_eq!(length(&ports, "Out"), Some(Length::Three));
        assert_eq!(ports.iter().find(|p| p.name == "Out").unwrap().field.get("c2"), Some(&Field::Float(0.0)));
    }

    #[test]
    fn test_connection_fixes_dimension_and_copies_values() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        node.ports = concretize(&node, &definition, &[], &registry).unwrap();

        let source = vector_port("Out", &[1.0, 2.0], Usage::Out);
        let upstream = [UpstreamPort { to_port: "In1", source: &source }];
        let ports = concretize(&node, &definition, &upstream, &registry).unwrap();

        assert_eq!(length(&ports, "In1"), Some(Length::Two));
        assert_eq!(length(&ports, "In2"), Some(Length::Two));
        assert_eq!(length(&ports, "Out"), Some(Length::Two));
        assert_eq!(ports[0].try_get_field::<f32>("c1"), Some(2.0));
        assert!(!ports[0].pinned);
    }

    #[test]
    fn test_largest_fixed_dimension_wins() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        node.ports = concretize(&node, &definition, &[], &registry).unwrap();
        let in2 = node.port_mut("In2").unwrap();
        in2.field.set("Length", Length::Two).unwrap();
        in2.pinned = true;

        let source = vector_port("Out", &[1.0, 2.0, 3.0, 4.0], Usage::Out);
        let upstream = [UpstreamPort { to_port: "In1", source: &source }];
        let ports = concretize(&node, &definition, &upstream, &registry).unwrap();

        assert_eq!(length(&ports, "In1"), Some(Length::Four));
        assert_eq!(length(&ports, "In2"), Some(Length::Two));
        assert_eq!(length(&ports, "Out"), Some(Length::Four));
    }

    #[test]
    fn test_incompatible_upstream_is_skipped() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let node = NodeInstance::new("Add1", &definition);

        let gradient = PortInstance::new("Out", Usage::Out, ty::gradient(), Field::composite());
        let upstream = [UpstreamPort { to_port: "In1", source: &gradient }];
        let ports = concretize(&node, &definition, &upstream, &registry).unwrap();
        assert_eq!(length(&ports, "In1"), Some(Length::One));
    }

    #[test]
    fn test_unknown_variant() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        node.selected_variant = "Missing".to_string();
        assert!(matches!(
            concretize(&node, &definition, &[], &registry),
            Err(ConcretizeError::UnknownVariant { .. })
        ));
    }

    #[test]
    fn test_variant_switch_keeps_shared_ports() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let key = registry
            .register_node(NodeDescriptor::new(
                1,
                "Switch",
                [
                    FunctionDescriptor::new(
                        "A",
                        "$Out = $Shared + $OnlyA;",
                        [
                            ParameterDescriptor::new("Shared", ty::vec4(), Usage::In),
                            ParameterDescriptor::new("OnlyA", ty::float(), Usage::In),
                            ParameterDescriptor::new("Out", ty::vec4(), Usage::Out),
                        ],
                    ),
                    FunctionDescriptor::new(
                        "B",
                        "$Out = $Shared * $OnlyB;",
                        [
                            ParameterDescriptor::new("Shared", ty::vec4(), Usage::In),
                            ParameterDescriptor::new("OnlyB", ty::float(), Usage::In).with_default([0.5]),
                            ParameterDescriptor::new("Out", ty::vec2(), Usage::Out),
                        ],
                    ),
                ],
            ))
            .unwrap();
        let definition = registry.node_definition(&key).unwrap().clone();
        let mut node = NodeInstance::new("S", &definition);
        node.ports = concretize(&node, &definition, &[], &registry).unwrap();

        let shared = node.port_mut("Shared").unwrap();
        shared.field.set("c2", 9.0).unwrap();
        shared.pinned = true;

        node.selected_variant = "B".to_string();
        let ports = concretize(&node, &definition, &[], &registry).unwrap();
        let names: Vec<_> = ports.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Shared", "OnlyB", "Out"]);
        assert!(ports[0].pinned);
        assert_eq!(ports[0].try_get_field::<f32>("c2"), Some(9.0));
        assert_eq!(ports[1].try_get_field::<f32>("c0"), Some(0.5));
        // Out changed type, so it was rebuilt
        assert_eq!(ports[2].type_key, ty::vec2());
    }

    #[test]
    fn test_idempotent() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        let source = vector_port("Out", &[1.0, 2.0, 3.0], Usage::Out);
        let upstream = [UpstreamPort { to_port: "In2", source: &source }];

        node.ports = concretize(&node, &definition, &upstream, &registry).unwrap();
        let again = concretize(&node, &definition, &upstream, &registry).unwrap();
        assert_eq!(node.ports, again);
    }

    #[test]
    fn test_unpinned_input_resets_when_upstream_goes_away() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        let source = vector_port("Out", &[5.0, 6.0], Usage::Out);
        let upstream = [UpstreamPort { to_port: "In1", source: &source }];

        node.ports = concretize(&node, &definition, &upstream, &registry).unwrap();
        assert_eq!(node.ports[0].try_get_field::<f32>("c0"), Some(5.0));

        node.ports = concretize(&node, &definition, &[], &registry).unwrap();
        let fresh = concretize(&NodeInstance::new("Add1", &definition), &definition, &[], &registry).unwrap();
        assert_eq!(node.ports, fresh);
        assert_eq!(node.ports[0].try_get_field::<f32>("c0"), Some(0.0));
        assert_eq!(length(&node.ports, "In1"), Some(Length::One));
    }

    #[test]
    fn test_pinned_shape_gets_its_components() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let definition = add_node(&mut registry);
        let mut node = NodeInstance::new("Add1", &definition);
        node.ports = concretize(&node, &definition, &[], &registry).unwrap();

        let in1 = node.port_mut("In1").unwrap();
        in1.field.set("c0", 7.0).unwrap();
        in1.field.set("Length", Length::Three).unwrap();
        in1.pinned = true;

        let ports = concretize(&node, &definition, &[], &registry).unwrap();
        assert_eq!(ports[0].try_get_field::<f32>("c0"), Some(7.0));
        assert_eq!(ports[0].try_get_field::<f32>("c1"), Some(0.0));
        assert_eq!(ports[0].try_get_field::<f32>("c2"), Some(0.0));
        assert_eq!(ports[0].field.get("c3"), None);
    }
}
