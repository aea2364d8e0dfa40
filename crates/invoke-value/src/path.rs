//! Paths into value trees

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// One step into a nested value
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathStep {
    /// Object attribute
    Attr(String),
    /// Map key
    Key(String),
    /// List index
    Index(usize),
}

/// Location of a nested value, outermost step first
///
/// # Examples
/// - `[Attr("message")]` → `message`
/// - `[Attr("headers"), Key("x-env")]` → `headers["x-env"]`
/// - `[Attr("targets"), Index(0), Attr("url")]` → `targets[0].url`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Path(Vec<PathStep>);

impl Path {
    /// Empty path (the value itself)
    #[inline]
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Path extended by an attribute step
    #[inline]
    #[must_use]
    pub fn attr(&self, name: impl Into<String>) -> Self {
        self.push(PathStep::Attr(name.into()))
    }

    /// Path extended by a map key step
    #[inline]
    #[must_use]
    pub fn key(&self, key: impl Into<String>) -> Self {
        self.push(PathStep::Key(key.into()))
    }

    /// Path extended by a list index step
    #[inline]
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.push(PathStep::Index(index))
    }

    fn push(&self, step: PathStep) -> Self {
        let mut new = self.clone();
        new.0.push(step);
        new
    }

    /// Steps, outermost first
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.0
    }

    /// Whether this is the empty path
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Top-level attribute name, when the path starts with one
    #[inline]
    #[must_use]
    pub fn first_attr(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathStep::Attr(name)) => Some(name),
            _ => None,
        }
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attr(name) if i == 0 => f.write_str(name)?,
                PathStep::Attr(name) => write!(f, ".{name}")?,
                PathStep::Key(key) => write!(f, "[{key:?}]")?,
                PathStep::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        let path = Path::root().attr("targets").index(0).attr("headers").key("x-env");
        assert_eq!(path.to_string(), r#"targets[0].headers["x-env"]"#);
    }

    #[test]
    fn first_attr() {
        assert_eq!(Path::root().attr("message").first_attr(), Some("message"));
        assert_eq!(Path::root().index(1).first_attr(), None);
        assert!(Path::root().is_empty());
    }
}
