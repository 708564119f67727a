//! Engine facade: one profiler per Lua interpreter
//!
//! Ties together the installer, the default timing aggregator and the clock.
//! Typical use:
//!
//! ```
//! use moonwatch::{ManualClock, Path, Profiler};
//! use std::rc::Rc;
//!
//! # fn main() -> moonwatch::Result<()> {
//! let lua = mlua::Lua::new();
//! lua.load("function square(x) return x * x end").exec()?;
//!
//! let mut profiler = Profiler::new();
//! profiler.set_clock(Rc::new(ManualClock::new(0.0)));
//! profiler.install(&lua)?;
//! lua.load("square(3); square(4)").exec()?;
//! profiler.uninstall();
//!
//! let report = profiler.generate_report();
//! assert_eq!(report.get(&Path::from(["square"])).unwrap().num_calls, 2);
//! # Ok(())
//! # }
//! ```
//!
//! Each install with the default instruments opens a fresh statistics window;
//! the previous window's data is dropped at that point.

use crate::aggregator::TimingAggregator;
use crate::clock::Clock;
use crate::config::ProfilerConfig;
use crate::denylist::Denylist;
use crate::error::{Error, Result};
use crate::installer::{Installer, SwapTableEntry};
use crate::instrument::Instruments;
use crate::path::Path;
use crate::report::Report;
use crate::walker::{discover_with, DiscoveredFunction};
use mlua::{Lua, Value};
use std::rc::Rc;

/// Call-graph profiler for one Lua state
#[derive(Default)]
pub struct Profiler {
    installer: Installer,
    root: Path,
    clock: Option<Rc<dyn Clock>>,
    aggregator: Option<Rc<TimingAggregator>>,
}

impl Profiler {
    /// Profiler over the globals with the default denylist
    pub fn new() -> Self {
        Self::default()
    }

    /// Profiler over the configured root and denylist
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the configuration fails validation.
    pub fn with_config(config: &ProfilerConfig) -> Result<Self> {
        config.validate().map_err(Error::Config)?;
        Ok(Self {
            installer: Installer::new(config.build_denylist()),
            root: config.root_path(),
            ..Default::default()
        })
    }

    /// Set the clock the default instruments read; required before [`Self::install`]
    pub fn set_clock(&mut self, clock: Rc<dyn Clock>) {
        self.clock = Some(clock);
    }

    pub fn denylist(&self) -> &Denylist {
        self.installer.denylist()
    }

    pub fn is_installed(&self) -> bool {
        self.installer.is_installed()
    }

    pub fn swap_table(&self) -> &[SwapTableEntry] {
        self.installer.swap_table()
    }

    /// Instrument the configured root namespace with the default instruments
    pub fn install(&mut self, lua: &Lua) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let root = self.resolve_root(lua)?;
        self.install_at(lua, root)
    }

    /// Instrument `root` with the default instruments
    ///
    /// # Errors
    ///
    /// [`Error::ClockNotSet`] when no clock was given, [`Error::InvalidRoot`]
    /// when `root` is not a composite.
    pub fn install_at(&mut self, lua: &Lua, root: Value) -> Result<()> {
        if self.is_installed() {
            return Ok(());
        }
        let clock = self.clock.clone().ok_or(Error::ClockNotSet)?;
        let aggregator = Rc::new(TimingAggregator::new(clock));
        self.installer.install(lua, &root, aggregator.clone())?;
        self.aggregator = Some(aggregator);
        Ok(())
    }

    /// Instrument `root` with caller-supplied instruments
    ///
    /// The default report is left untouched; no clock is needed.
    pub fn install_with(&mut self, lua: &Lua, root: Value, instruments: Rc<dyn Instruments>) -> Result<()> {
        self.installer.install(lua, &root, instruments)?;
        Ok(())
    }

    /// Restore every instrumented binding; does nothing when idle
    pub fn uninstall(&mut self) {
        if !self.is_installed() {
            tracing::trace!("uninstall with nothing installed");
            return;
        }
        self.installer.uninstall();
        if let Some(aggregator) = &self.aggregator {
            aggregator.close_window();
        }
    }

    /// The context used by the default instruments, once installed
    pub fn default_context(&self) -> Option<Rc<TimingAggregator>> {
        self.aggregator.clone()
    }

    /// Copy of the statistics of the current window
    ///
    /// Empty when the default instruments were never installed.
    pub fn generate_report(&self) -> Report {
        self.aggregator
            .as_ref()
            .map(|aggregator| aggregator.report())
            .unwrap_or_default()
    }

    /// Discover functions under `root` with this profiler's denylist
    pub fn discover(&self, lua: &Lua, root: &Value) -> Result<Vec<DiscoveredFunction>> {
        discover_with(lua, root, self.denylist())
    }

    fn resolve_root(&self, lua: &Lua) -> Result<Value> {
        self.root
            .resolve_raw(&lua.globals())
            .filter(|value| !value.is_nil())
            .ok_or_else(|| Error::UnknownRoot {
                path: self.root.to_string(),
            })
    }
}
