//! Discovery of Fusion files across packages.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use walkdir::WalkDir;

use crate::config::DebuggerConfig;
use crate::error::{DebuggerError, Result};

/// Cache key for discovery across all packages.
const ALL_PACKAGES: &str = "*";

/// A Fusion source file belonging to a package. Contents are read on first access.
#[derive(Debug, Clone)]
pub struct FusionFile {
    package_key: String,
    full_path: PathBuf,
    relative_path: String,
    contents: OnceCell<String>,
}

impl FusionFile {
    pub fn new(package_key: &str, base_path: &Path, full_path: PathBuf) -> Self {
        let relative_path = full_path
            .strip_prefix(base_path)
            .unwrap_or(&full_path)
            .to_string_lossy()
            .replace('\\', "/");
        Self {
            package_key: package_key.to_string(),
            full_path,
            relative_path,
            contents: OnceCell::new(),
        }
    }

    pub fn package_key(&self) -> &str {
        &self.package_key
    }

    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Path relative to the package's Fusion directory.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Label handed to the parser for diagnostics.
    pub fn path_label(&self) -> String {
        self.full_path.display().to_string()
    }

    pub fn contents(&self) -> Result<&str> {
        if let Some(contents) = self.contents.get() {
            return Ok(contents.as_str());
        }
        let contents = std::fs::read_to_string(&self.full_path).map_err(|source| {
            DebuggerError::FusionFileUnreadable {
                path: self.path_label(),
                source,
            }
        })?;
        Ok(self.contents.get_or_init(|| contents).as_str())
    }
}

/// Enumerates Fusion files per package and remembers the results per scope.
pub struct FusionFiles {
    config: DebuggerConfig,
    cache: HashMap<String, Vec<FusionFile>>,
}

impl FusionFiles {
    pub fn new(config: DebuggerConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
        }
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    /// Package keys: the directory names directly below the packages root, sorted.
    pub fn package_keys(&self) -> Vec<String> {
        let root = &self.config.packages_root;
        if !root.is_dir() {
            warn!("Packages root {} is not a directory", root.display());
            return Vec::new();
        }
        WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect()
    }

    /// Forget discovered files and their loaded contents.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Files of one package, or of every active package when the key is absent,
    /// unknown or frozen.
    pub fn load(&mut self, package_key: Option<&str>) -> &[FusionFile] {
        let available = self.package_keys();
        let scope = match package_key {
            Some(key) if available.iter().any(|k| k == key) && !self.config.is_frozen(key) => {
                Some(key.to_string())
            }
            Some(key) => {
                warn!("Package {key} is not available, loading all packages instead");
                None
            }
            None => None,
        };
        let cache_key = scope.clone().unwrap_or_else(|| ALL_PACKAGES.to_string());
        let packages = scope.map(|key| vec![key]).unwrap_or(available);

        let config = &self.config;
        self.cache
            .entry(cache_key)
            .or_insert_with(|| discover(config, &packages))
            .as_slice()
    }
}

fn discover(config: &DebuggerConfig, packages: &[String]) -> Vec<FusionFile> {
    let mut found = Vec::new();

    for package_key in packages {
        if config.is_frozen(package_key) {
            // Frozen packages take no part in rendering
            debug!("Skipping frozen package {package_key}");
            continue;
        }

        for base_path in config.package_base_paths(package_key) {
            if !base_path.is_dir() {
                continue;
            }
            let files = WalkDir::new(&base_path)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| {
                    e.file_name()
                        .to_string_lossy()
                        .ends_with(config.file_extension.as_str())
                })
                .map(|e| FusionFile::new(package_key, &base_path, e.into_path()));
            found.extend(files);
        }
    }

    debug!(
        "Discovered {} fusion files in {} packages",
        found.len(),
        packages.len()
    );
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn sample_packages() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "B.Site/Resources/Private/Fusion/Root.fusion.json", "{}");
        write(dir.path(), "B.Site/Resources/Private/Fusion/Components/Card.fusion.json", "{}");
        write(dir.path(), "B.Site/Resources/Private/Fusion/notes.txt", "ignored");
        write(dir.path(), "A.Base/Resources/Private/Fusion/Root.fusion.json", "{}");
        write(dir.path(), "C.Frozen/Resources/Private/Fusion/Root.fusion.json", "{}");
        dir
    }

    fn files_for(dir: &Path) -> FusionFiles {
        FusionFiles::new(DebuggerConfig {
            packages_root: dir.to_path_buf(),
            frozen_packages: vec!["C.Frozen".to_string()],
            ..Default::default()
        })
    }

    #[test]
    fn discovers_all_active_packages_in_order() {
        let dir = sample_packages();
        let mut files = files_for(dir.path());
        let found: Vec<(String, String)> = files
            .load(None)
            .iter()
            .map(|f| (f.package_key().to_string(), f.relative_path().to_string()))
            .collect();
        assert_eq!(
            found,
            vec![
                ("A.Base".to_string(), "Root.fusion.json".to_string()),
                ("B.Site".to_string(), "Components/Card.fusion.json".to_string()),
                ("B.Site".to_string(), "Root.fusion.json".to_string()),
            ]
        );
    }

    #[test]
    fn restricts_to_known_package() {
        let dir = sample_packages();
        let mut files = files_for(dir.path());
        let found = files.load(Some("A.Base"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].package_key(), "A.Base");
    }

    #[test]
    fn unknown_or_frozen_package_falls_back_to_all() {
        let dir = sample_packages();
        let mut files = files_for(dir.path());
        assert_eq!(files.load(Some("Nope.Missing")).len(), 3);
        assert_eq!(files.load(Some("C.Frozen")).len(), 3);
    }

    #[test]
    fn contents_are_loaded_lazily() {
        let dir = sample_packages();
        let mut files = files_for(dir.path());
        let file = files.load(Some("A.Base"))[0].clone();
        assert_eq!(file.contents().unwrap(), "{}");

        fs::remove_file(file.full_path()).unwrap();
        // Already memoised
        assert_eq!(file.contents().unwrap(), "{}");
    }

    #[test]
    fn vanished_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let file = FusionFile::new("A.Base", dir.path(), dir.path().join("Gone.fusion.json"));
        let err = file.contents().unwrap_err();
        assert!(matches!(err, DebuggerError::FusionFileUnreadable { .. }));
    }
}
