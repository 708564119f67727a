//! Default timing aggregator
//!
//! Keeps a LIFO stack mirroring the live instrumented call stack. On entry the
//! caller→callee edge count and the callee's call count are bumped and a frame
//! is pushed with the current time; on exit the frame is popped, the elapsed
//! time is folded into the callee's min/max/total and added to the edge from
//! whatever frame is now on top.
//!
//! Recursion needs no special case: a function calling itself simply has two
//! frames with the same path, and the `foo -> foo` edge accumulates like any
//! other edge.
//!
//! The stack assumes strict call/return nesting. A coroutine that yields out
//! of an instrumented frame and lets other instrumented calls run before it
//! resumes breaks that ordering; the resulting mismatched exit is logged and
//! the top frame is popped anyway.

use crate::clock::Clock;
use crate::instrument::Instruments;
use crate::path::Path;
use crate::report::Report;
use mlua::Lua;
use std::cell::RefCell;
use std::rc::Rc;

/// One in-flight instrumented call
#[derive(Debug, Clone, PartialEq)]
pub struct CallStackFrame {
    pub start_time: f64,
    pub path: Path,
}

#[derive(Debug, Default)]
struct Window {
    call_stack: Vec<CallStackFrame>,
    report: Report,
    started: f64,
    stopped: Option<f64>,
}

/// Context of the default instruments: call stack, report and clock
pub struct TimingAggregator {
    clock: Rc<dyn Clock>,
    window: RefCell<Window>,
}

impl TimingAggregator {
    /// Create an aggregator whose statistics window opens now
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        let started = clock.now();
        Self {
            clock,
            window: RefCell::new(Window {
                started,
                ..Default::default()
            }),
        }
    }

    /// Close the statistics window; later calls keep the first close time
    pub fn close_window(&self) {
        let now = self.clock.now();
        let mut window = self.window.borrow_mut();
        if window.stopped.is_none() {
            window.stopped = Some(now);
        }
    }

    /// Number of instrumented calls currently in flight
    pub fn depth(&self) -> usize {
        self.window.borrow().call_stack.len()
    }

    /// Copy of the statistics collected so far
    pub fn report(&self) -> Report {
        let now = self.clock.now();
        let window = self.window.borrow();
        let end = window.stopped.unwrap_or(now);
        Report {
            function_info: window.report.function_info.clone(),
            total_time: end - window.started,
        }
    }

    /// Record entry into `path`
    pub fn enter(&self, path: &Path) {
        let now = self.clock.now();
        let mut window = self.window.borrow_mut();
        let Window {
            call_stack, report, ..
        } = &mut *window;

        if let Some(caller) = call_stack.last() {
            report
                .function_info
                .entry(caller.path.clone())
                .or_default()
                .calls
                .entry(path.clone())
                .or_default()
                .num_calls += 1;
        }
        report.function_info.entry(path.clone()).or_default().num_calls += 1;

        call_stack.push(CallStackFrame {
            start_time: now,
            path: path.clone(),
        });
    }

    /// Record exit from `path`
    pub fn exit(&self, path: &Path) {
        let now = self.clock.now();
        let mut window = self.window.borrow_mut();
        let Window {
            call_stack, report, ..
        } = &mut *window;

        let Some(frame) = call_stack.pop() else {
            tracing::warn!("exit from '{}' with no call in flight", path);
            return;
        };
        if frame.path != *path {
            tracing::warn!(
                "exit from '{}' while '{}' is on top of the call stack",
                path,
                frame.path
            );
        }

        let elapsed = now - frame.start_time;
        report
            .function_info
            .entry(path.clone())
            .or_default()
            .record_elapsed(elapsed);

        if let Some(caller) = call_stack.last() {
            report
                .function_info
                .entry(caller.path.clone())
                .or_default()
                .calls
                .entry(path.clone())
                .or_default()
                .total_time += elapsed;
        }
    }
}

impl Instruments for TimingAggregator {
    fn before(&self, _lua: &Lua, path: &Path) {
        self.enter(path);
    }

    fn after(&self, _lua: &Lua, path: &Path) {
        self.exit(path);
    }
}
