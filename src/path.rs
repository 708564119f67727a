//! Paths locating functions relative to a traversal root
//!
//! A [`Path`] is the ordered list of keys followed from the root to reach a
//! function, e.g. `["string", "format"]`. It identifies a function by
//! *location*: the same function reachable under two names produces two
//! different paths and two independent statistics buckets.

use mlua::{Table, Value};
use std::fmt;

/// Ordered key sequence; ordering and equality are lexicographic over the segments
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Path(Vec<String>);

impl Path {
    /// Create an empty path (the root itself)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dotted path such as `"package.loaded"`
    ///
    /// An empty string yields the empty path.
    pub fn parse_dotted(dotted: &str) -> Self {
        if dotted.is_empty() {
            return Self::new();
        }
        Self(dotted.split('.').map(str::to_string).collect())
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn into_segments(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment, i.e. the key of the binding inside its parent
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// Copy of this path extended by one segment
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(segment);
        child
    }

    /// Join the segments with a separator
    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    /// Follow this path from `root` using raw (metamethod-free) reads
    ///
    /// Returns `None` when an intermediate value is not a table. The empty
    /// path resolves to the root itself.
    pub fn resolve_raw(&self, root: &Table) -> Option<Value> {
        let mut current = Value::Table(root.clone());
        for segment in &self.0 {
            let Value::Table(table) = current else {
                return None;
            };
            current = table.raw_get::<Value>(segment.as_str()).ok()?;
        }
        Some(current)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.join("."))
    }
}

impl From<Vec<String>> for Path {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for Path {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Path {
    fn from(segments: [&str; N]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

impl FromIterator<String> for Path {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
