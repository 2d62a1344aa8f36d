//! Fusion Debugger CLI — Lint Fusion files and inspect prototypes and object trees.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

use fusion_debugger_core::commands::{self, DisplayOptions, LintOptions, ListOptions};
use fusion_debugger_core::config::DebuggerConfig;
use fusion_debugger_core::files::FusionFiles;
use fusion_debugger_core::output::OutputSink;
use fusion_debugger_core::parser::JsonTreeParser;
use fusion_debugger_core::Debugger;

#[derive(Parser)]
#[command(
    name = "fusion-debug",
    about = "Fusion Debugger - Lint Fusion code and resolve prototype definitions"
)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory containing the packages
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Fusion directory pattern inside a package, `@package` is replaced by the package key
    #[arg(long, global = true)]
    pattern: Vec<String>,

    /// Extension of Fusion files
    #[arg(long, global = true)]
    extension: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check all Fusion files individually for syntax errors
    Lint {
        /// Only lint the files of this package
        #[arg(short, long)]
        package: Option<String>,

        /// Report every file that contains no errors
        #[arg(long)]
        verbose: bool,

        /// Produce no output, overrules --verbose
        #[arg(long)]
        quiet: bool,
    },

    /// Show the merged Fusion object tree
    ShowObjectTree {
        /// Fusion path to show the object tree from
        path: Option<String>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Show the fully resolved definition of a prototype
    DebugPrototype {
        /// Name of the prototype, e.g. Neos.Neos:Page
        prototype: String,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// List the names of all known prototypes
    ListPrototypes {
        /// Print bare names instead of a list
        #[arg(long)]
        no_format: bool,

        /// Keep the prototype table order
        #[arg(long)]
        no_sort: bool,
    },
}

#[derive(clap::Args)]
struct DisplayArgs {
    /// Suppress colored output
    #[arg(long)]
    no_color: bool,

    /// Show the raw definition without flattening
    #[arg(long)]
    no_flatten: bool,

    /// Print the tree as JSON
    #[arg(long)]
    json: bool,
}

impl From<DisplayArgs> for DisplayOptions {
    fn from(args: DisplayArgs) -> Self {
        Self {
            color: !args.no_color && !args.json,
            flatten: !args.no_flatten,
            json: args.json,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Lint { verbose: true, .. });
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "debug" } else { "warn" }),
    )
    .init();

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            std::process::exit(e.exit_code());
        }
    };

    debug!(
        "Loading {} files from {}",
        config.file_extension,
        config.packages_root.display()
    );

    let mut sink = ConsoleSink::new();
    let code = match cli.command {
        Commands::Lint {
            package,
            verbose,
            quiet,
        } => {
            let mut files = FusionFiles::new(config);
            commands::lint(
                &mut files,
                package.as_deref(),
                &JsonTreeParser::new(),
                LintOptions { verbose, quiet },
                &mut sink,
            )
            .exit_code()
        }
        Commands::ShowObjectTree { path, display } => {
            let mut debugger = Debugger::new(FusionFiles::new(config), JsonTreeParser::new());
            commands::show_object_tree(&mut debugger, path.as_deref(), display.into(), &mut sink)
        }
        Commands::DebugPrototype { prototype, display } => {
            let mut debugger = Debugger::new(FusionFiles::new(config), JsonTreeParser::new());
            commands::debug_prototype(&mut debugger, &prototype, display.into(), &mut sink)
        }
        Commands::ListPrototypes { no_format, no_sort } => {
            let mut debugger = Debugger::new(FusionFiles::new(config), JsonTreeParser::new());
            let options = ListOptions {
                format: !no_format,
                sort: !no_sort,
            };
            commands::list_prototypes(&mut debugger, options, &mut sink)
        }
    };

    std::process::exit(code);
}

fn build_config(cli: &Cli) -> fusion_debugger_core::Result<DebuggerConfig> {
    let mut config = match &cli.config {
        Some(path) => DebuggerConfig::from_json_file(path)?,
        None => DebuggerConfig::default(),
    };
    if let Some(root) = &cli.root {
        config.packages_root = root.clone();
    }
    if !cli.pattern.is_empty() {
        config.file_path_patterns = cli.pattern.clone();
    }
    if let Some(extension) = &cli.extension {
        config.file_extension = extension.clone();
    }
    Ok(config)
}

/// Terminal output with styled levels and a progress bar.
struct ConsoleSink {
    progress: Option<ProgressBar>,
}

impl ConsoleSink {
    fn new() -> Self {
        Self { progress: None }
    }

    fn print(&self, line: String) {
        match &self.progress {
            Some(pb) => pb.println(line),
            None => println!("{line}"),
        }
    }
}

impl OutputSink for ConsoleSink {
    fn write_line(&mut self, line: &str) {
        self.print(line.to_string());
    }

    fn success(&mut self, message: &str) {
        self.print(format!("{} {message}", style("✓").green().bold()));
    }

    fn warning(&mut self, message: &str) {
        self.print(format!("{} {}", style("!").yellow().bold(), style(message).yellow()));
    }

    fn error(&mut self, message: &str) {
        self.print(format!("{} {}", style("✗").red().bold(), style(message).red()));
    }

    fn progress_start(&mut self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(bar_style) = ProgressStyle::with_template("{bar:40.blue} {pos}/{len} {msg}") {
            pb.set_style(bar_style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.progress = Some(pb);
    }

    fn progress_advance(&mut self) {
        if let Some(pb) = &self.progress {
            pb.inc(1);
        }
    }

    fn progress_finish(&mut self) {
        if let Some(pb) = self.progress.take() {
            pb.finish();
        }
    }
}
