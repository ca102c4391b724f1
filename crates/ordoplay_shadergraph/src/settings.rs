// SPDX-License-Identifier: MIT OR Apache-2.0
//! Code assembly settings.
//!
//! Stored as a RON file next to the graph. Every field has a default, so a
//! settings file only needs the values it changes.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current settings format version
pub const SETTINGS_FORMAT_VERSION: u32 = 1;

/// Settings used by the code assembler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    /// Settings format version
    pub version: u32,
    /// Character that starts a parameter reference in a body template
    pub sigil: char,
    /// Separator between node and port names in generated identifiers
    pub separator: String,
    /// Directive written before each include path
    pub include_keyword: String,
    /// Prefix for every declaration and body line
    pub indent: String,
    /// Whether port declarations are written before the body
    pub emit_declarations: bool,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_FORMAT_VERSION,
            sigil: '$',
            separator: "_".to_string(),
            include_keyword: "#include".to_string(),
            indent: "    ".to_string(),
            emit_declarations: true,
        }
    }
}

impl AssemblySettings {
    /// Parse settings from RON, rejecting newer format versions
    pub fn from_ron(s: &str) -> Result<Self, SettingsError> {
        let settings: AssemblySettings = ron::from_str(s)?;

        if settings.version > SETTINGS_FORMAT_VERSION {
            return Err(SettingsError::UnsupportedVersion {
                found: settings.version,
                supported: SETTINGS_FORMAT_VERSION,
            });
        }
        Ok(settings)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load settings from a file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save settings to a file
    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

/// Error loading or saving settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read or written
    #[error("Settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid settings RON
    #[error("Invalid settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Settings could not be serialized
    #[error("Could not serialize settings: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Settings version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest supported version
        supported: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AssemblySettings::default();
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
        assert_eq!(settings.sigil, '$');
        assert_eq!(settings.separator, "_");
        assert!(settings.emit_declarations);
    }

    #[test]
    fn test_serialization() {
        let settings = AssemblySettings {
            sigil: '@',
            emit_declarations: false,
            ..AssemblySettings::default()
        };
        let ron_str = settings.to_ron().unwrap();
        assert_eq!(AssemblySettings::from_ron(&ron_str).unwrap(), settings);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = AssemblySettings::from_ron("(separator: \"__\")").unwrap();
        assert_eq!(settings.separator, "__");
        assert_eq!(settings.include_keyword, "#include");
        assert_eq!(settings.version, SETTINGS_FORMAT_VERSION);
    }

    #[test]
    fn test_newer_version_rejected() {
        let result = AssemblySettings::from_ron("(version: 99)");
        assert!(matches!(
            result,
            Err(SettingsError::UnsupportedVersion { found: 99, .. })
        ));
        assert!(matches!(AssemblySettings::from_ron("(sigil: 5)"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("shadergraph_settings_{}.ron", std::process::id()));
        let settings = AssemblySettings {
            indent: "\t".to_string(),
            ..AssemblySettings::default()
        };
        settings.save(&path).unwrap();
        let loaded = AssemblySettings::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }
}
