//! Fusion Debugger Core — Prototype resolution and object tree inspection for Fusion.
//!
//! This crate contains the debugging engine: file discovery, the parser seam,
//! prototype chain resolution, definition merging, display flattening, tree
//! rendering and the command operations built on top of them.

pub mod cache;
pub mod commands;
pub mod config;
pub mod debugger;
pub mod error;
pub mod files;
pub mod output;
pub mod parser;
pub mod render;
pub mod sorting;
pub mod tree;

pub use debugger::Debugger;
pub use error::{DebuggerError, ParseError, Result};
