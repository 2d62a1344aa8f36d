//! The debugger's command operations, writing to an injected output sink.
//!
//! Every command returns the process exit code it ends with.

use log::debug;

use crate::debugger::Debugger;
use crate::error::{DebuggerError, Result};
use crate::files::{FusionFile, FusionFiles};
use crate::output::OutputSink;
use crate::parser::{normalize_includes, FusionParser};
use crate::render::{colorize_tree, render_tree};
use crate::tree::{Branch, ObjectTree, PROTOTYPES_KEY};

/// Options of [`lint`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LintOptions {
    /// Report every file that passed.
    pub verbose: bool,
    /// Print nothing. Wins over `verbose`.
    pub quiet: bool,
}

/// Outcome of linting a set of files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LintReport {
    pub processed: usize,
    pub errors: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_clean() {
            0
        } else {
            1
        }
    }
}

/// How trees are displayed.
#[derive(Debug, Clone, Copy)]
pub struct DisplayOptions {
    pub color: bool,
    pub flatten: bool,
    /// Print the tree as JSON instead of drawing it.
    pub json: bool,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            color: true,
            flatten: true,
            json: false,
        }
    }
}

/// How prototype names are listed.
#[derive(Debug, Clone, Copy)]
pub struct ListOptions {
    pub format: bool,
    pub sort: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            format: true,
            sort: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Lint
// ---------------------------------------------------------------------------

/// Check every Fusion file of a package, or of all packages, on its own.
pub fn lint<P: FusionParser>(
    files: &mut FusionFiles,
    package_key: Option<&str>,
    parser: &P,
    options: LintOptions,
    sink: &mut dyn OutputSink,
) -> LintReport {
    let quiet = options.quiet;
    let verbose = options.verbose && !quiet;
    let files = files.load(package_key);
    let mut report = LintReport {
        processed: files.len(),
        errors: Vec::new(),
    };

    if !quiet && !verbose {
        sink.progress_start(files.len());
    }

    for file in files {
        match lint_file(file, parser) {
            Ok(()) if verbose => {
                sink.success(&format!("File {} contains no errors.", file.relative_path()));
            }
            Ok(()) => {
                if !quiet {
                    sink.progress_advance();
                }
            }
            Err(message) => {
                debug!("Lint failed for {}", file.path_label());
                report.errors.push(format!(
                    "Error in {} -> '{}': {message}",
                    file.package_key(),
                    file.relative_path()
                ));
                if !quiet && !verbose {
                    sink.progress_advance();
                }
            }
        }
    }

    if quiet {
        return report;
    }
    if !verbose {
        sink.progress_finish();
    }
    sink.newline();
    for error in &report.errors {
        sink.error(error);
    }
    sink.newline();

    if report.is_clean() {
        sink.success(&format!(
            "Processed {} files and found no syntax errors.",
            report.processed
        ));
    } else {
        sink.warning(&format!(
            "Processed {} files and encountered {} errors!",
            report.processed,
            report.errors.len()
        ));
        sink.warning("There may be additional output containing more information above.");
    }
    report
}

fn lint_file<P: FusionParser>(file: &FusionFile, parser: &P) -> std::result::Result<(), String> {
    let contents = file.contents().map_err(|e| e.to_string())?;
    parser
        .parse(
            &normalize_includes(contents),
            &file.path_label(),
            ObjectTree::new(),
        )
        .map(|_| ())
        .map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tree display
// ---------------------------------------------------------------------------

/// Show the merged object tree, optionally below a Fusion path.
pub fn show_object_tree<P: FusionParser>(
    debugger: &mut Debugger<P>,
    path: Option<&str>,
    options: DisplayOptions,
    sink: &mut dyn OutputSink,
) -> i32 {
    if path == Some(PROTOTYPES_KEY) {
        sink.warning("Please use the debug-prototype command to debug Fusion prototypes!");
        return 1;
    }

    let root_label = path.filter(|p| !p.is_empty()).unwrap_or(".");
    let shown = debugger
        .get_object_tree(path)
        .and_then(|tree| display(debugger, &tree, root_label, options, sink));
    finish(shown, sink)
}

/// Show the fully resolved definition of a prototype.
pub fn debug_prototype<P: FusionParser>(
    debugger: &mut Debugger<P>,
    name: &str,
    options: DisplayOptions,
    sink: &mut dyn OutputSink,
) -> i32 {
    let shown = debugger
        .resolve_prototype(name)
        .and_then(|definition| display(debugger, &definition, name, options, sink));
    finish(shown, sink)
}

/// List the names of all known prototypes.
pub fn list_prototypes<P: FusionParser>(
    debugger: &mut Debugger<P>,
    options: ListOptions,
    sink: &mut dyn OutputSink,
) -> i32 {
    let listed = debugger.list_prototype_names(options.sort).map(|names| {
        if options.format {
            sink.list(&names);
        } else {
            for name in &names {
                sink.write_line(name);
            }
        }
    });
    finish(listed, sink)
}

fn display<P: FusionParser>(
    debugger: &mut Debugger<P>,
    tree: &Branch,
    root_label: &str,
    options: DisplayOptions,
    sink: &mut dyn OutputSink,
) -> Result<()> {
    let flattened;
    let tree = if options.flatten {
        flattened = debugger.flatten(tree)?;
        &flattened
    } else {
        tree
    };

    if options.json {
        sink.write_line(&format!("{:#}", tree.to_json()));
        return Ok(());
    }

    let mut lines = render_tree(tree, root_label);
    if options.color {
        lines = colorize_tree(&lines);
    }
    for line in &lines {
        sink.write_line(line);
    }
    sink.newline();
    Ok(())
}

fn finish(outcome: Result<()>, sink: &mut dyn OutputSink) -> i32 {
    match outcome {
        Ok(()) => 0,
        Err(err) => report_error(&err, sink),
    }
}

fn report_error(err: &DebuggerError, sink: &mut dyn OutputSink) -> i32 {
    debug!("Command failed with code {}", err.code());
    sink.error(&err.to_string());
    err.exit_code()
}
