//! Instance keys
//!
//! A repeated declaration is realized as one instance per key. `count` yields
//! integer keys, `for_each` yields string keys, and a single declaration has no key.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Key distinguishing one instance of a repeated declaration
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum InstanceKey {
    /// Declaration without `count` or `for_each`
    #[default]
    NoKey,
    /// `count` index
    Int(i64),
    /// `for_each` key
    Str(String),
}

impl InstanceKey {
    /// Whether this is the absent key
    #[inline]
    #[must_use]
    pub fn is_no_key(&self) -> bool {
        matches!(self, Self::NoKey)
    }
}

impl Display for InstanceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoKey => Ok(()),
            Self::Int(i) => write!(f, "[{i}]"),
            Self::Str(s) => {
                f.write_str("[\"")?;
                for ch in s.chars() {
                    match ch {
                        '"' => f.write_str("\\\"")?,
                        '\\' => f.write_str("\\\\")?,
                        '\n' => f.write_str("\\n")?,
                        c => write!(f, "{c}")?,
                    }
                }
                f.write_str("\"]")
            }
        }
    }
}

impl From<i64> for InstanceKey {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<&str> for InstanceKey {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for InstanceKey {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display() {
        assert_eq!(InstanceKey::NoKey.to_string(), "");
        assert_eq!(InstanceKey::Int(3).to_string(), "[3]");
        assert_eq!(InstanceKey::from("prod").to_string(), "[\"prod\"]");
    }

    #[test]
    fn key_display_escapes_quotes() {
        assert_eq!(InstanceKey::from("a\"b").to_string(), r#"["a\"b"]"#);
    }

    #[test]
    fn key_ordering_is_stable() {
        let mut keys = vec![
            InstanceKey::from("b"),
            InstanceKey::Int(2),
            InstanceKey::NoKey,
            InstanceKey::from("a"),
            InstanceKey::Int(1),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                InstanceKey::NoKey,
                InstanceKey::Int(1),
                InstanceKey::Int(2),
                InstanceKey::from("a"),
                InstanceKey::from("b"),
            ]
        );
    }
}
