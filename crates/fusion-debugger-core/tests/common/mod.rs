//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use fusion_debugger_core::config::DebuggerConfig;
use fusion_debugger_core::files::FusionFiles;
use fusion_debugger_core::parser::JsonTreeParser;
use fusion_debugger_core::tree::Branch;
use fusion_debugger_core::Debugger;

// ---------------------------------------------------------------------------
// Fixture path resolution
// ---------------------------------------------------------------------------

/// Resolve `tests/fixtures/{name}` relative to the workspace root.
pub fn fixture_path(name: &str) -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    Path::new(manifest_dir)
        .join("../../tests/fixtures")
        .join(name)
        .canonicalize()
        .unwrap_or_else(|_| {
            Path::new(manifest_dir)
                .join("../../tests/fixtures")
                .join(name)
        })
}

// ---------------------------------------------------------------------------
// Debugger construction
// ---------------------------------------------------------------------------

/// Configuration for a fixture packages root. `Vendor.Frozen` is always frozen.
pub fn fixture_config(name: &str) -> DebuggerConfig {
    DebuggerConfig {
        packages_root: fixture_path(name),
        frozen_packages: vec!["Vendor.Frozen".to_string()],
        ..Default::default()
    }
}

pub fn fixture_files(name: &str) -> FusionFiles {
    FusionFiles::new(fixture_config(name))
}

pub fn fixture_debugger(name: &str) -> Debugger<JsonTreeParser> {
    Debugger::new(fixture_files(name), JsonTreeParser::new())
}

/// Debugger over the `site` fixture: a base package, a site package and a frozen one.
pub fn site_debugger() -> Debugger<JsonTreeParser> {
    fixture_debugger("site")
}

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

pub fn keys(branch: &Branch) -> Vec<&str> {
    branch.keys().collect()
}
