// SPDX-License-Identifier: MIT OR Apache-2.0
//! Catalog of type and node definitions.
//!
//! A [`Registry`] is populated once (built-in types, then node libraries)
//! and read by every later graph operation. Every graph method takes the
//! registry explicitly; there is no global instance.

use crate::key::RegistryKey;
use crate::node::{FunctionDescriptor, NodeDefinition, NodeDescriptor};
use crate::types::{self, TypeDefinition};
use indexmap::IndexMap;

/// A definition found in the registry
#[derive(Debug, Clone, Copy)]
pub enum Definition<'a> {
    /// Port data type
    Type(&'a dyn TypeDefinition),
    /// Node definition
    Node(&'a NodeDefinition),
}

/// Registry of type and node definitions
#[derive(Debug, Default)]
pub struct Registry {
    /// Types by key
    types: IndexMap<RegistryKey, Box<dyn TypeDefinition>>,
    /// Nodes by key
    nodes: IndexMap<RegistryKey, NodeDefinition>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in type
    pub fn with_builtin_types() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        types::register_builtin_types(&mut registry)?;
        Ok(registry)
    }

    /// Register a type definition
    pub fn register_type(
        &mut self,
        definition: impl TypeDefinition + 'static,
    ) -> Result<RegistryKey, RegistryError> {
        let key = definition.key();
        if self.contains(&key) {
            return Err(RegistryError::DuplicateKey(key));
        }
        tracing::debug!("Registered type {key}");
        self.types.insert(key.clone(), Box::new(definition));
        Ok(key)
    }

    /// Register a multi-variant node
    pub fn register_node(&mut self, descriptor: NodeDescriptor) -> Result<RegistryKey, RegistryError> {
        self.register_definition(NodeDefinition::from_descriptor(descriptor)?)
    }

    /// Register a single function as a one-variant node
    pub fn register_function(
        &mut self,
        function: FunctionDescriptor,
    ) -> Result<RegistryKey, RegistryError> {
        self.register_definition(NodeDefinition::from_function(function)?)
    }

    /// Register a prepared node definition.
    ///
    /// Registering a definition equal to the one already stored under its
    /// key is accepted and changes nothing.
    pub fn register_definition(
        &mut self,
        definition: NodeDefinition,
    ) -> Result<RegistryKey, RegistryError> {
        definition.validate()?;
        let key = definition.key.clone();
        match self.nodes.get(&key) {
            Some(existing) if *existing == definition => return Ok(key),
            Some(_) => return Err(RegistryError::DuplicateKey(key)),
            None if self.types.contains_key(&key) => return Err(RegistryError::DuplicateKey(key)),
            None => {}
        }

        for variant in &definition.variants {
            for parameter in &variant.parameters {
                if !self.types.contains_key(&parameter.type_key) {
                    return Err(RegistryError::InvalidDefinition {
                        key,
                        reason: format!(
                            "parameter '{}' of variant '{}' uses unregistered type {}",
                            parameter.name, variant.id, parameter.type_key
                        ),
                    });
                }
            }
        }

        tracing::debug!(
            "Registered node {key} with {} variant(s)",
            definition.variants.len()
        );
        self.nodes.insert(key.clone(), definition);
        Ok(key)
    }

    /// Look up any definition
    pub fn lookup(&self, key: &RegistryKey) -> Result<Definition<'_>, RegistryError> {
        if let Some(definition) = self.types.get(key) {
            return Ok(Definition::Type(definition.as_ref()));
        }
        self.nodes
            .get(key)
            .map(Definition::Node)
            .ok_or_else(|| RegistryError::UnknownKey(key.clone()))
    }

    /// Look up a type definition
    pub fn type_definition(&self, key: &RegistryKey) -> Result<&dyn TypeDefinition, RegistryError> {
        self.types
            .get(key)
            .map(|definition| definition.as_ref())
            .ok_or_else(|| RegistryError::UnknownKey(key.clone()))
    }

    /// Look up a node definition
    pub fn node_definition(&self, key: &RegistryKey) -> Result<&NodeDefinition, RegistryError> {
        self.nodes
            .get(key)
            .ok_or_else(|| RegistryError::UnknownKey(key.clone()))
    }

    /// Whether any definition uses this key
    pub fn contains(&self, key: &RegistryKey) -> bool {
        self.types.contains_key(key) || self.nodes.contains_key(key)
    }

    /// Registered type keys, in registration order
    pub fn type_keys(&self) -> impl Iterator<Item = &RegistryKey> {
        self.types.keys()
    }

    /// Registered node definitions, in registration order
    pub fn node_definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.nodes.values()
    }
}

/// Error from registering or looking up definitions
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    /// Key already registered with a different definition
    #[error("Duplicate registry key: {0}")]
    DuplicateKey(RegistryKey),

    /// Key not registered
    #[error("Unknown registry key: {0}")]
    UnknownKey(RegistryKey),

    /// Definition is internally inconsistent
    #[error("Invalid definition {key}: {reason}")]
    InvalidDefinition {
        /// Key of the rejected definition
        key: RegistryKey,
        /// What is wrong with it
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ParameterDescriptor;
    use crate::port::Usage;
    use crate::types::{ty, GradientType};

    fn passthrough(body: &str) -> FunctionDescriptor {
        FunctionDescriptor::new(
            "Test",
            body,
            [
                ParameterDescriptor::new("In", ty::vector(), Usage::In),
                ParameterDescriptor::new("Out", ty::vector(), Usage::Out),
            ],
        )
    }

    #[test]
    fn test_register_function_descriptor() {
        let mut registry = Registry::with_builtin_types().unwrap();
        let key = registry.register_function(passthrough("$Out = $In;")).unwrap();
        assert_eq!(key, RegistryKey::new("Test", 1));
        assert!(matches!(registry.lookup(&key), Ok(Definition::Node(_))));
        assert!(matches!(registry.lookup(&ty::vec4()), Ok(Definition::Type(_))));
    }

    #[test]
    fn test_duplicate_keys() {
        let mut registry = Registry::with_builtin_types().unwrap();
        registry.register_function(passthrough("$Out = $In;")).unwrap();

        // Same definition again is harmless
        assert!(registry.register_function(passthrough("$Out = $In;")).is_ok());
        assert_eq!(
            registry.register_function(passthrough("$Out = $In * 2;")),
            Err(RegistryError::DuplicateKey(RegistryKey::new("Test", 1)))
        );
        assert_eq!(
            registry.register_type(GradientType),
            Err(RegistryError::DuplicateKey(ty::gradient()))
        );

        // Types and nodes share one key space
        let clash = FunctionDescriptor::new("Vec4", "", []);
        assert!(matches!(
            registry.register_function(clash),
            Err(RegistryError::DuplicateKey(_))
        ));
    }

    #[test]
    fn test_unknown_keys() {
        let registry = Registry::new();
        let key = RegistryKey::new("Nope", 3);
        assert_eq!(registry.node_definition(&key).err(), Some(RegistryError::UnknownKey(key.clone())));
        assert!(registry.type_definition(&key).is_err());
        assert!(registry.lookup(&key).is_err());
    }

    #[test]
    fn test_parameter_types_must_be_registered() {
        let mut registry = Registry::new();
        let result = registry.register_function(passthrough("$Out = $In;"));
        assert!(matches!(result, Err(RegistryError::InvalidDefinition { .. })));
        assert_eq!(registry.node_definitions().count(), 0);
    }

    #[test]
    fn test_hand_built_definition_is_validated() {
        let mut registry = Registry::with_builtin_types().unwrap();

        let empty = NodeDefinition {
            key: RegistryKey::new("Empty", 1),
            variants: vec![],
            default_variant_id: "X".to_string(),
        };
        assert!(matches!(
            registry.register_definition(empty),
            Err(RegistryError::InvalidDefinition { .. })
        ));

        let dangling = NodeDefinition {
            key: RegistryKey::new("Dangling", 1),
            variants: vec![passthrough("$Out = $In;")],
            default_variant_id: "Missing".to_string(),
        };
        assert!(matches!(
            registry.register_definition(dangling),
            Err(RegistryError::InvalidDefinition { .. })
        ));
        assert_eq!(registry.node_definitions().count(), 0);
    }
}
