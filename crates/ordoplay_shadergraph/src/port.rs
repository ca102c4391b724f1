// SPDX-License-Identifier: MIT OR Apache-2.0
//! Port instances on shader graph nodes.

use crate::field::{Field, FromField};
use crate::key::RegistryKey;
use serde::{Deserialize, Serialize};

/// Port usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Usage {
    /// Input port, accepts at most one connection
    In,
    /// Output port
    Out,
    /// Inline value that cannot be connected
    Static,
}

impl Usage {
    /// Whether this usage can feed `other` through a connection
    pub fn can_feed(self, other: Usage) -> bool {
        self == Usage::Out && other == Usage::In
    }

    /// Whether a port of this usage carries an inline value
    pub fn has_inline_value(self) -> bool {
        matches!(self, Usage::In | Usage::Static)
    }
}

/// A concrete port on a node instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortInstance {
    /// Port name, unique within its node
    pub name: String,
    /// Port usage
    pub usage: Usage,
    /// Type of the port
    pub type_key: RegistryKey,
    /// Current value, owned by this port alone
    pub field: Field,
    /// Set when a caller wrote a sub-field explicitly
    pub pinned: bool,
}

impl PortInstance {
    /// Create an unpinned port
    pub fn new(name: impl Into<String>, usage: Usage, type_key: RegistryKey, field: Field) -> Self {
        Self {
            name: name.into(),
            usage,
            type_key,
            field,
            pinned: false,
        }
    }

    /// Whether name, type and usage all match
    pub fn has_signature(&self, name: &str, type_key: &RegistryKey, usage: Usage) -> bool {
        self.name == name && self.type_key == *type_key && self.usage == usage
    }

    /// Check whether this port can feed `other` through a connection
    pub fn can_connect(&self, other: &PortInstance) -> bool {
        self.usage.can_feed(other.usage)
    }

    /// Read a sub-field of the port value
    pub fn try_get_field<T: FromField>(&self, path: &str) -> Option<T> {
        self.field.try_get(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_direction() {
        assert!(Usage::Out.can_feed(Usage::In));
        assert!(!Usage::In.can_feed(Usage::Out));
        assert!(!Usage::Out.can_feed(Usage::Static));
        assert!(!Usage::Out.can_feed(Usage::Out));
        assert!(Usage::Static.has_inline_value());
        assert!(!Usage::Out.has_inline_value());
    }

    #[test]
    fn test_signature_match() {
        let key = RegistryKey::new("Vector", 1);
        let port = PortInstance::new("In", Usage::In, key.clone(), Field::composite());
        assert!(port.has_signature("In", &key, Usage::In));
        assert!(!port.has_signature("In", &key, Usage::Static));
        assert!(!port.has_signature("In", &RegistryKey::new("Vec4", 1), Usage::In));
        assert!(!port.pinned);
    }
}
