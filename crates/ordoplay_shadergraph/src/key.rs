// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry keys: the lookup handle for every registered type and node.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a registered type or node definition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistryKey {
    /// Definition name
    pub name: String,
    /// Definition version
    pub version: u32,
}

impl RegistryKey {
    /// Create a new key
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.v{}", self.name, self.version)
    }
}
