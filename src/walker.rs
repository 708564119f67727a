//! Composite graph walker
//!
//! Depth-first search for every function reachable from a root composite.
//! For each `(key, value)` pair of the composite being visited:
//!
//! 1. a value identical to its own parent is skipped (immediate self-loops)
//! 2. a value the [`Denylist`] refuses is skipped
//! 3. a protocol composite is entered through its own iteration protocol
//! 4. a plain table is entered with the key appended to the path
//! 5. a function is recorded as `(path + key, function, parent)`
//!
//! Everything else is ignored. Discovery is best-effort: an iterator that
//! fails part way is logged and abandoned, the functions found so far stay.
//!
//! Cycles through an ancestor further up than the immediate parent are not
//! detected; a table that contains its grandparent recurses without bound.
//! Break such cycles with the denylist.

use crate::composite::{key_segment, same_reference, Composite};
use crate::denylist::Denylist;
use crate::error::{Error, Result};
use crate::path::Path;
use mlua::{Function, Lua, Value};

/// A function found during discovery, with what is needed to rebind it
#[derive(Debug, Clone)]
pub struct DiscoveredFunction {
    /// Key sequence from the root to the function
    pub path: Path,
    /// Raw key of the binding inside `parent` (the last path segment, unrendered)
    pub key: Value,
    pub function: Function,
    /// Composite holding the binding
    pub parent: Composite,
}

/// Discover functions under `root` using the default denylist
pub fn discover(lua: &Lua, root: &Value) -> Result<Vec<DiscoveredFunction>> {
    discover_with(lua, root, &Denylist::default())
}

/// Discover functions under `root` with an explicit denylist
///
/// # Errors
///
/// Returns [`Error::InvalidRoot`] when `root` is neither a table nor a
/// protocol composite.
pub fn discover_with(lua: &Lua, root: &Value, denylist: &Denylist) -> Result<Vec<DiscoveredFunction>> {
    let composite = Composite::classify(root)?.ok_or_else(|| Error::InvalidRoot {
        kind: root.type_name().to_string(),
    })?;

    let walker = Walker { lua, denylist };
    let mut found = Vec::new();
    let mut path = Path::new();
    walker.visit(&composite, &mut path, &mut found);

    tracing::debug!("discovered {} functions", found.len());
    Ok(found)
}

struct Walker<'a> {
    lua: &'a Lua,
    denylist: &'a Denylist,
}

impl Walker<'_> {
    fn visit(&self, composite: &Composite, path: &mut Path, found: &mut Vec<DiscoveredFunction>) {
        let parent = composite.as_value();
        let pairs = match composite.iter() {
            Ok(pairs) => pairs,
            Err(e) => {
                tracing::warn!("cannot iterate composite at '{}': {}", path, e);
                return;
            }
        };

        for pair in pairs {
            let (key, value) = match pair {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::warn!("iteration of '{}' stopped early: {}", path, e);
                    break;
                }
            };

            if same_reference(&value, &parent) || self.denylist.do_not_search(self.lua, &value) {
                continue;
            }

            let Some(segment) = key_segment(&key) else {
                tracing::trace!("skipping {} key under '{}'", key.type_name(), path);
                continue;
            };

            match Composite::classify(&value) {
                Ok(Some(nested)) => {
                    path.push(segment);
                    self.visit(&nested, path, found);
                    path.pop();
                }
                Ok(None) => {
                    if let Value::Function(function) = value {
                        found.push(DiscoveredFunction {
                            path: path.child(segment),
                            key,
                            function,
                            parent: composite.clone(),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!("cannot inspect '{}.{}': {}", path, segment, e);
                }
            }
        }
    }
}
