// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions and node instances.
//!
//! A [`NodeDefinition`] is built from a [`NodeDescriptor`]: one or more
//! [`FunctionDescriptor`] variants, each with its own parameter list and
//! body template. A [`NodeInstance`] is a named use of a definition in a
//! graph, carrying the ports of its selected variant.

use crate::field::FromField;
use crate::key::RegistryKey;
use crate::port::{PortInstance, Usage};
use crate::registry::RegistryError;
use crate::types::DefaultValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Declared parameter of a function variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    /// Parameter name, also the port name
    pub name: String,
    /// Type of the port
    pub type_key: RegistryKey,
    /// Port usage
    pub usage: Usage,
    /// Declared default payload
    pub default: Option<DefaultValue>,
}

impl ParameterDescriptor {
    /// Create a parameter without a declared default
    pub fn new(name: impl Into<String>, type_key: RegistryKey, usage: Usage) -> Self {
        Self {
            name: name.into(),
            type_key,
            usage,
            default: None,
        }
    }

    /// Set the declared default
    pub fn with_default(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Default to a named built-in reference (`UV0`, `ObjectSpacePosition`, ...)
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.default = Some(DefaultValue::Reference(reference.into()));
        self
    }
}

/// One selectable variant of a node: body template plus parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Variant id, unique within its node
    pub id: String,
    /// Human readable name
    pub display_name: String,
    /// Version used when registered on its own
    pub version: u32,
    /// Body template with parameter reference tokens
    pub body: String,
    /// Parameters in port declaration order
    pub parameters: Vec<ParameterDescriptor>,
    /// Files the body depends on, in order
    pub includes: Vec<String>,
}

impl FunctionDescriptor {
    /// Create a variant (version 1, display name equal to the id)
    pub fn new(
        id: impl Into<String>,
        body: impl Into<String>,
        parameters: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            version: 1,
            body: body.into(),
            parameters: parameters.into_iter().collect(),
            includes: Vec::new(),
        }
    }

    /// Set the display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Set the version
    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set the include list
    pub fn with_includes<S: Into<String>>(mut self, includes: impl IntoIterator<Item = S>) -> Self {
        self.includes = includes.into_iter().map(Into::into).collect();
        self
    }

    /// Find a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Multi-variant node description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDescriptor {
    /// Node version
    pub version: u32,
    /// Node name
    pub name: String,
    /// Selectable variants
    pub functions: Vec<FunctionDescriptor>,
    /// Variant selected on new instances
    pub main_function: String,
}

impl NodeDescriptor {
    /// Create a descriptor; the first function is the main one
    pub fn new(
        version: u32,
        name: impl Into<String>,
        functions: impl IntoIterator<Item = FunctionDescriptor>,
    ) -> Self {
        let functions: Vec<_> = functions.into_iter().collect();
        let main_function = functions.first().map(|f| f.id.clone()).unwrap_or_default();
        Self {
            version,
            name: name.into(),
            functions,
            main_function,
        }
    }

    /// Choose the variant selected on new instances
    pub fn with_main_function(mut self, id: impl Into<String>) -> Self {
        self.main_function = id.into();
        self
    }
}

/// Registered node definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDefinition {
    /// Registry identity
    pub key: RegistryKey,
    /// Variants, never empty
    pub variants: Vec<FunctionDescriptor>,
    /// Variant selected on new instances
    pub default_variant_id: String,
}

impl NodeDefinition {
    /// Build from a descriptor, checking its internal consistency
    pub fn from_descriptor(descriptor: NodeDescriptor) -> Result<Self, RegistryError> {
        let definition = Self {
            key: RegistryKey::new(descriptor.name, descriptor.version),
            variants: descriptor.functions,
            default_variant_id: descriptor.main_function,
        };
        definition.validate()?;
        Ok(definition)
    }

    /// Build a one-variant definition keyed by the function's id and version
    pub fn from_function(function: FunctionDescriptor) -> Result<Self, RegistryError> {
        let key = RegistryKey::new(function.id.clone(), function.version);
        let definition = Self {
            key,
            default_variant_id: function.id.clone(),
            variants: vec![function],
        };
        definition.validate()?;
        Ok(definition)
    }

    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidDefinition {
            key: self.key.clone(),
            reason,
        };

        if self.variants.is_empty() {
            return Err(invalid("node has no function variants".to_string()));
        }

        let mut ids = HashSet::new();
        for variant in &self.variants {
            if !ids.insert(variant.id.as_str()) {
                return Err(invalid(format!("duplicate variant id '{}'", variant.id)));
            }
            let mut names = HashSet::new();
            for parameter in &variant.parameters {
                if !names.insert(parameter.name.as_str()) {
                    return Err(invalid(format!(
                        "duplicate parameter '{}' in variant '{}'",
                        parameter.name, variant.id
                    )));
                }
            }
        }

        if !ids.contains(self.default_variant_id.as_str()) {
            return Err(invalid(format!(
                "default variant '{}' is not defined",
                self.default_variant_id
            )));
        }
        Ok(())
    }

    /// Find a variant by id
    pub fn variant(&self, id: &str) -> Option<&FunctionDescriptor> {
        self.variants.iter().find(|v| v.id == id)
    }

    /// The default variant, `None` only for a definition that failed validation
    pub fn default_variant(&self) -> Option<&FunctionDescriptor> {
        self.variant(&self.default_variant_id)
    }

    /// Whether the port set never changes
    pub fn is_fixed_shape(&self) -> bool {
        self.variants.len() == 1
    }
}

/// A node in a shader graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInstance {
    /// Name, unique within the graph
    pub name: String,
    /// Definition this node instantiates
    pub definition_key: RegistryKey,
    /// Selected function variant
    pub selected_variant: String,
    /// Ports as of the last concretization
    pub ports: Vec<PortInstance>,
}

impl NodeInstance {
    /// Create a node with no ports yet, selecting the default variant
    pub fn new(name: impl Into<String>, definition: &NodeDefinition) -> Self {
        Self {
            name: name.into(),
            definition_key: definition.key.clone(),
            selected_variant: definition.default_variant_id.clone(),
            ports: Vec::new(),
        }
    }

    /// Get a port by name
    pub fn port(&self, name: &str) -> Option<&PortInstance> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Get a mutable port by name
    pub fn port_mut(&mut self, name: &str) -> Option<&mut PortInstance> {
        self.ports.iter_mut().find(|p| p.name == name)
    }

    /// Input ports
    pub fn inputs(&self) -> impl Iterator<Item = &PortInstance> {
        self.ports.iter().filter(|p| p.usage == Usage::In)
    }

    /// Output ports
    pub fn outputs(&self) -> impl Iterator<Item = &PortInstance> {
        self.ports.iter().filter(|p| p.usage == Usage::Out)
    }

    /// Read a value by `"<port>.TypeField.<path>"`
    pub fn try_get_field<T: FromField>(&self, path: &str) -> Option<T> {
        let (port, field_path) = split_port_path(path)?;
        self.port(port)?.try_get_field(field_path)
    }
}

/// Segment that separates a port name from a path into its value
pub const TYPE_FIELD: &str = "TypeField";

/// Split `"In.TypeField.Length"` into `("In", "Length")`.
///
/// `"In.TypeField"` addresses the whole value and yields an empty path.
pub fn split_port_path(path: &str) -> Option<(&str, &str)> {
    let (port, rest) = path.split_once('.')?;
    let rest = rest.strip_prefix(TYPE_FIELD)?;
    if rest.is_empty() {
        return Some((port, ""));
    }
    rest.strip_prefix('.').map(|field_path| (port, field_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ty;

    fn passthrough() -> FunctionDescriptor {
        FunctionDescriptor::new(
            "Test",
            "$Out = $In;",
            [
                ParameterDescriptor::new("In", ty::vector(), Usage::In),
                ParameterDescriptor::new("Out", ty::vector(), Usage::Out),
            ],
        )
    }

    #[test]
    fn test_function_registers_as_single_variant() {
        let definition = NodeDefinition::from_function(passthrough()).unwrap();
        assert_eq!(definition.key, RegistryKey::new("Test", 1));
        assert!(definition.is_fixed_shape());
        assert_eq!(definition.default_variant().map(|v| v.id.as_str()), Some("Test"));
    }

    #[test]
    fn test_descriptor_main_function() {
        let a = FunctionDescriptor::new("A", "", []);
        let b = FunctionDescriptor::new("B", "", []);
        let descriptor = NodeDescriptor::new(2, "Switch", [a, b]).with_main_function("B");
        let definition = NodeDefinition::from_descriptor(descriptor).unwrap();
        assert_eq!(definition.key, RegistryKey::new("Switch", 2));
        assert_eq!(definition.default_variant().map(|v| v.id.as_str()), Some("B"));
        assert!(!definition.is_fixed_shape());
    }

    #[test]
    fn test_invalid_descriptors() {
        let empty = NodeDescriptor::new(1, "Empty", []);
        assert!(matches!(
            NodeDefinition::from_descriptor(empty),
            Err(RegistryError::InvalidDefinition { .. })
        ));

        let twice = NodeDescriptor::new(
            1,
            "Twice",
            [FunctionDescriptor::new("A", "", []), FunctionDescriptor::new("A", "", [])],
        );
        assert!(NodeDefinition::from_descriptor(twice).is_err());

        let missing_main = NodeDescriptor::new(1, "Main", [FunctionDescriptor::new("A", "", [])])
            .with_main_function("B");
        assert!(NodeDefinition::from_descriptor(missing_main).is_err());

        let duplicate_param = FunctionDescriptor::new(
            "Dup",
            "",
            [
                ParameterDescriptor::new("X", ty::float(), Usage::In),
                ParameterDescriptor::new("X", ty::float(), Usage::Out),
            ],
        );
        assert!(NodeDefinition::from_function(duplicate_param).is_err());
    }

    #[test]
    fn test_split_port_path() {
        assert_eq!(split_port_path("In.TypeField.Length"), Some(("In", "Length")));
        assert_eq!(split_port_path("In.TypeField.ColorKeys.0.r"), Some(("In", "ColorKeys.0.r")));
        assert_eq!(split_port_path("In.TypeField"), Some(("In", "")));
        assert_eq!(split_port_path("In.Length"), None);
        assert_eq!(split_port_path("In.TypeFieldLength"), None);
        assert_eq!(split_port_path("In"), None);
    }
}
