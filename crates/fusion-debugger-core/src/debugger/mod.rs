//! The debugger service: loads the object tree once and answers queries on it.

pub mod flatten;
pub mod merge;
pub mod resolver;

use log::debug;

use crate::cache::TreeCache;
use crate::error::{DebuggerError, Result};
use crate::files::FusionFiles;
use crate::parser::FusionParser;
use crate::sorting::natural_cmp;
use crate::tree::{Branch, Node, ObjectTree, PROTOTYPES_KEY};

pub use flatten::Flattener;
pub use merge::merge_definitions;
pub use resolver::PrototypeResolver;

/// Entry point for prototype resolution and object tree inspection.
pub struct Debugger<P: FusionParser> {
    files: FusionFiles,
    parser: P,
    cache: TreeCache,
}

impl<P: FusionParser> Debugger<P> {
    pub fn new(files: FusionFiles, parser: P) -> Self {
        Self {
            files,
            parser,
            cache: TreeCache::new(),
        }
    }

    pub fn files_mut(&mut self) -> &mut FusionFiles {
        &mut self.files
    }

    pub fn parser(&self) -> &P {
        &self.parser
    }

    /// Parse every Fusion file into one tree. Parsed once per debugger.
    pub fn load_tree(&mut self) -> Result<&ObjectTree> {
        let Self {
            files,
            parser,
            cache,
        } = self;
        cache.get_or_load(|| {
            let mut tree = ObjectTree::new();
            let sources = files.load(None);
            for file in sources {
                let label = file.path_label();
                tree = parser.parse(file.contents()?, &label, tree).map_err(|source| {
                    DebuggerError::FusionParseError {
                        path: label.clone(),
                        source,
                    }
                })?;
            }
            debug!(
                "Loaded object tree from {} files with {} prototypes",
                sources.len(),
                tree.prototypes().len()
            );
            Ok(tree)
        })
    }

    /// Drop the cached tree and discovered files; the next query reads and parses again.
    pub fn reset(&mut self) {
        self.cache.reset();
        self.files.clear();
    }

    pub fn is_prototype_known(&mut self, name: &str) -> Result<bool> {
        Ok(self.load_tree()?.prototypes().contains_key(name))
    }

    /// The fully merged definition of a prototype.
    pub fn resolve_prototype(&mut self, name: &str) -> Result<Branch> {
        let tree = self.load_tree()?;
        PrototypeResolver::new(tree.prototypes()).resolve(name)
    }

    /// Display form of a definition or subtree.
    pub fn flatten(&mut self, definition: &Branch) -> Result<Branch> {
        let tree = self.load_tree()?;
        Ok(Flattener::new(tree.prototypes()).flatten(definition))
    }

    /// The object tree below a dotted Fusion path, or the whole tree without
    /// its prototype table.
    pub fn get_object_tree(&mut self, path: Option<&str>) -> Result<Branch> {
        let root = self.load_tree()?.root();
        let Some(path) = path.filter(|p| !p.is_empty()) else {
            let mut tree = root.clone();
            tree.remove(PROTOTYPES_KEY);
            return Ok(tree);
        };

        let not_found = || DebuggerError::PathNotFound {
            path: path.to_string(),
        };
        let segments = split_path(path);
        let mut current = root;
        for (index, segment) in segments.iter().enumerate() {
            let node = lookup(current, segment).ok_or_else(not_found)?;
            let last = index + 1 == segments.len();
            match node {
                Node::Branch(branch) if !last => current = branch,
                Node::Branch(branch) => return Ok(branch.clone()),
                Node::Wrapper(_) | Node::Scalar(_) if last => {
                    let mut leaf = Branch::new();
                    leaf.insert(segment.as_str(), node.clone());
                    return Ok(leaf);
                }
                _ => return Err(not_found()),
            }
        }
        Err(not_found())
    }

    /// Names of all known prototypes in table order, or naturally sorted.
    pub fn list_prototype_names(&mut self, sort: bool) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .load_tree()?
            .prototypes()
            .keys()
            .map(String::from)
            .collect();
        if sort {
            names.sort_by(|a, b| natural_cmp(a, b));
        }
        Ok(names)
    }
}

fn lookup<'t>(branch: &'t Branch, segment: &str) -> Option<&'t Node> {
    match segment
        .strip_prefix("prototype(")
        .and_then(|s| s.strip_suffix(')'))
    {
        Some(name) => branch.get(PROTOTYPES_KEY)?.as_branch()?.get(name),
        None => branch.get(segment),
    }
}

/// Split a Fusion path at dots outside of parentheses.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for c in path.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '.' if depth == 0 => {
                segments.push(std::mem::take(&mut current));
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    segments.push(current);
    segments.retain(|s| !s.is_empty());
    segments
}
