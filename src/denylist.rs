//! Composites that discovery must never enter
//!
//! Some tables are aliases of structures that are already traversed from the
//! root (`_G` itself, `package.loaded` which re-exposes every library), and
//! some hold functions the interpreter calls internally (`package.searchers`),
//! so wrapping them would change how Lua itself behaves.
//!
//! Each entry is a path from the global table. Paths are resolved again on
//! every check and compared by identity, so the policy follows the live
//! interpreter rather than a snapshot.

use crate::composite::same_reference;
use crate::path::Path;
use mlua::{Lua, Value};

/// Fixed set of global paths that discovery refuses to enter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denylist {
    paths: Vec<Path>,
}

impl Denylist {
    pub fn new(paths: Vec<Path>) -> Self {
        Self { paths }
    }

    /// A denylist that allows everything
    pub fn empty() -> Self {
        Self { paths: Vec::new() }
    }

    pub fn paths(&self) -> &[Path] {
        &self.paths
    }

    /// Should `candidate` be skipped when met as a nested value?
    pub fn do_not_search(&self, lua: &Lua, candidate: &Value) -> bool {
        if candidate.to_pointer().is_null() {
            return false;
        }
        let globals = lua.globals();
        self.paths.iter().any(|path| {
            path.resolve_raw(&globals)
                .is_some_and(|denied| same_reference(&denied, candidate))
        })
    }
}

impl Default for Denylist {
    fn default() -> Self {
        Self::new(vec![
            Path::from(["_G"]),
            Path::from(["package", "loaded"]),
            Path::from(["package", "searchers"]),
        ])
    }
}
