//! Value marks
//!
//! Marks record where a value came from. They travel with the value through
//! evaluation and are checked (ephemeral, deprecated) or preserved (sensitive)
//! before the value leaves the engine.

use crate::path::Path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Provenance mark on a value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Mark {
    /// Must never be persisted in a plan or state
    Ephemeral,
    /// Must be redacted when displayed
    Sensitive,
    /// Derived from something deprecated; carries the deprecation message
    Deprecated(String),
}

impl Mark {
    /// Whether this is a deprecation mark
    #[inline]
    #[must_use]
    pub fn is_deprecation(&self) -> bool {
        matches!(self, Self::Deprecated(_))
    }
}

impl Display for Mark {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => f.write_str("ephemeral"),
            Self::Sensitive => f.write_str("sensitive"),
            Self::Deprecated(_) => f.write_str("deprecated"),
        }
    }
}

/// Marks found at one path of a value tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMarks {
    /// Location within the value
    pub path: Path,
    /// Marks on the value at that location
    pub marks: BTreeSet<Mark>,
}
