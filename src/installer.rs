//! Swapping live bindings for instrumented wrappers, and back
//!
//! `install` discovers every function under the root, builds one wrapper per
//! discovery and writes it over the original binding, recording each swap in
//! a swap table. `uninstall` walks the swap table in the same order and
//! writes the originals back, so every binding ends up exactly as it was.
//!
//! Both operations are idempotent: installing while installed, or
//! uninstalling while idle, does nothing.
//!
//! The swap table holds `mlua` handles, which are anchored in the
//! interpreter's registry, so it stays valid across any amount of script
//! execution between install and uninstall.

use crate::composite::Composite;
use crate::denylist::Denylist;
use crate::error::Result;
use crate::instrument::{Instruments, Wrapper};
use crate::path::Path;
use crate::walker::discover_with;
use mlua::{Function, Lua, Value};
use std::rc::Rc;

/// One replaced binding
#[derive(Debug, Clone)]
pub struct SwapTableEntry {
    pub path: Path,
    pub key: Value,
    pub parent: Composite,
    pub original: Function,
    pub wrapper: Function,
}

/// Install/uninstall state machine: idle, or installed with a swap table
#[derive(Debug, Default)]
pub struct Installer {
    denylist: Denylist,
    swap_table: Option<Vec<SwapTableEntry>>,
}

impl Installer {
    pub fn new(denylist: Denylist) -> Self {
        Self {
            denylist,
            swap_table: None,
        }
    }

    pub fn denylist(&self) -> &Denylist {
        &self.denylist
    }

    pub fn is_installed(&self) -> bool {
        self.swap_table.is_some()
    }

    /// Current swap table (empty when idle)
    pub fn swap_table(&self) -> &[SwapTableEntry] {
        self.swap_table.as_deref().unwrap_or_default()
    }

    /// Wrap every function reachable from `root`
    ///
    /// Returns `false` without touching anything if already installed. If
    /// building or writing a wrapper fails, the swaps made so far are undone
    /// before the error is returned.
    pub fn install(&mut self, lua: &Lua, root: &Value, instruments: Rc<dyn Instruments>) -> Result<bool> {
        if self.is_installed() {
            tracing::debug!("instrumentation already installed, ignoring install");
            return Ok(false);
        }

        let discovered = discover_with(lua, root, &self.denylist)?;
        let mut swap_table = Vec::with_capacity(discovered.len());

        for found in discovered {
            let swapped = Wrapper::new(found.path.clone(), found.function.clone(), Rc::clone(&instruments))
                .into_function(lua)
                .and_then(|wrapper| {
                    found
                        .parent
                        .set(&found.key, Value::Function(wrapper.clone()))
                        .map(|()| wrapper)
                });

            match swapped {
                Ok(wrapper) => {
                    tracing::trace!("instrumented {}", found.path);
                    swap_table.push(SwapTableEntry {
                        path: found.path,
                        key: found.key,
                        parent: found.parent,
                        original: found.function,
                        wrapper,
                    });
                }
                Err(e) => {
                    tracing::warn!("failed to instrument {}: {}", found.path, e);
                    restore(&swap_table);
                    return Err(e.into());
                }
            }
        }

        tracing::debug!("installed {} wrappers", swap_table.len());
        self.swap_table = Some(swap_table);
        Ok(true)
    }

    /// Put every original binding back
    ///
    /// Returns the number of bindings restored; 0 when idle.
    pub fn uninstall(&mut self) -> usize {
        let Some(swap_table) = self.swap_table.take() else {
            return 0;
        };
        let restored = restore(&swap_table);
        tracing::debug!("restored {} of {} bindings", restored, swap_table.len());
        restored
    }
}

/// Write originals back in swap-table order, continuing past failures
fn restore(swap_table: &[SwapTableEntry]) -> usize {
    let mut restored = 0;
    for entry in swap_table {
        match entry
            .parent
            .set(&entry.key, Value::Function(entry.original.clone()))
        {
            Ok(()) => restored += 1,
            Err(e) => tracing::warn!("failed to restore {}: {}", entry.path, e),
        }
    }
    restored
}
