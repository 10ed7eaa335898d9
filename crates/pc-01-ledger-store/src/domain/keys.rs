//! Key namespaces.
//!
//! Both contracts share one ledger, so every key is prefixed with the
//! namespace of the contract that owns it, followed by a NUL separator.
//! Only the first separator after the prefix is significant, so identifiers
//! that contain NUL themselves (JSON `"\u0000"`) still round-trip.

use std::fmt;

const SEPARATOR: char = '\u{0}';
const RANGE_END: char = '\u{1}';

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Full substrate key for a record identifier.
    pub fn key(&self, id: &str) -> String {
        format!("{}{}{}", self.0, SEPARATOR, id)
    }

    /// Half-open `[start, end)` range covering every key of this namespace.
    pub fn range(&self) -> (String, String) {
        (
            format!("{}{}", self.0, SEPARATOR),
            format!("{}{}", self.0, RANGE_END),
        )
    }

    /// Recovers the record identifier from a substrate key, if it belongs here.
    pub fn strip<'k>(&self, key: &'k str) -> Option<&'k str> {
        key.strip_prefix(self.0.as_str())?.strip_prefix(SEPARATOR)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
