//! Configuration for locating and loading Fusion files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DebuggerError, Result};

/// Placeholder replaced by the package key in path patterns.
pub const PACKAGE_PLACEHOLDER: &str = "@package";

/// Where packages live and how their Fusion files are found.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebuggerConfig {
    #[serde(default = "default_packages_root")]
    pub packages_root: PathBuf,
    #[serde(default = "default_file_path_patterns")]
    pub file_path_patterns: Vec<String>,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    #[serde(default)]
    pub frozen_packages: Vec<String>,
}

fn default_packages_root() -> PathBuf {
    PathBuf::from("Packages")
}
fn default_file_path_patterns() -> Vec<String> {
    vec![format!("{PACKAGE_PLACEHOLDER}/Resources/Private/Fusion")]
}
fn default_file_extension() -> String {
    ".fusion.json".to_string()
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            packages_root: default_packages_root(),
            file_path_patterns: default_file_path_patterns(),
            file_extension: default_file_extension(),
            frozen_packages: Vec::new(),
        }
    }
}

impl DebuggerConfig {
    /// Load a configuration file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let config_error = |message: String| DebuggerError::Config {
            path: path.display().to_string(),
            message,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| config_error(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| config_error(e.to_string()))
    }

    /// Base directories of a package, one per configured pattern.
    pub fn package_base_paths(&self, package_key: &str) -> Vec<PathBuf> {
        self.file_path_patterns
            .iter()
            .map(|pattern| {
                self.packages_root
                    .join(pattern.replace(PACKAGE_PLACEHOLDER, package_key))
            })
            .collect()
    }

    pub fn is_frozen(&self, package_key: &str) -> bool {
        self.frozen_packages.iter().any(|p| p == package_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn debugger_config_defaults() {
        let cfg = DebuggerConfig::default();
        assert_eq!(cfg.packages_root, PathBuf::from("Packages"));
        assert_eq!(cfg.file_path_patterns, vec!["@package/Resources/Private/Fusion"]);
        assert_eq!(cfg.file_extension, ".fusion.json");
        assert!(cfg.frozen_packages.is_empty());
    }

    #[test]
    fn base_paths_substitute_package_key() {
        let cfg = DebuggerConfig {
            packages_root: PathBuf::from("/srv/site"),
            ..Default::default()
        };
        assert_eq!(
            cfg.package_base_paths("Vendor.Site"),
            vec![PathBuf::from("/srv/site/Vendor.Site/Resources/Private/Fusion")]
        );
    }

    #[test]
    fn partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"frozen_packages": ["Neos.Flow"]}}"#).unwrap();

        let cfg = DebuggerConfig::from_json_file(file.path()).unwrap();
        assert!(cfg.is_frozen("Neos.Flow"));
        assert_eq!(cfg.file_extension, ".fusion.json");
    }

    #[test]
    fn invalid_file_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = DebuggerConfig::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, DebuggerError::Config { .. }));
    }
}
