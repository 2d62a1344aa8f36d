//! Load-once cache of the merged object tree.

use log::debug;

use crate::error::Result;
use crate::tree::ObjectTree;

/// Holds the object tree after the first successful load.
#[derive(Debug, Default)]
pub struct TreeCache {
    tree: Option<ObjectTree>,
}

impl TreeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached tree, running `loader` only while nothing is cached.
    /// A failing loader leaves the cache empty.
    pub fn get_or_load<F>(&mut self, loader: F) -> Result<&ObjectTree>
    where
        F: FnOnce() -> Result<ObjectTree>,
    {
        let tree = match self.tree.take() {
            Some(tree) => tree,
            None => {
                debug!("Object tree not cached, loading");
                loader()?
            }
        };
        Ok(self.tree.insert(tree))
    }

    pub fn is_loaded(&self) -> bool {
        self.tree.is_some()
    }

    pub fn reset(&mut self) {
        self.tree = None;
    }
}
