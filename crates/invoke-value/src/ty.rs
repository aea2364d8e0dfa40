//! Value types

use crate::value::{Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Type of a [`Value`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    /// `true` / `false`
    Bool,
    /// Numeric value
    Number,
    /// UTF-8 string
    String,
    /// Homogeneous list
    List(Box<Type>),
    /// Homogeneous map with string keys
    Map(Box<Type>),
    /// Fixed set of named attributes
    Object(BTreeMap<String, Type>),
    /// Any type; decided by the value
    Dynamic,
}

impl Type {
    /// List of `elem`
    #[inline]
    #[must_use]
    pub fn list(elem: Type) -> Self {
        Self::List(Box::new(elem))
    }

    /// Map of `elem`
    #[inline]
    #[must_use]
    pub fn map(elem: Type) -> Self {
        Self::Map(Box::new(elem))
    }

    /// Object with the given attribute types
    #[must_use]
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Type)>) -> Self {
        Self::Object(attrs.into_iter().map(|(k, t)| (k.into(), t)).collect())
    }

    /// Whether `value` can be used where this type is expected
    ///
    /// Null and unknown values conform to every type. Objects must not carry
    /// attributes the type does not declare.
    #[must_use]
    pub fn conforms(&self, value: &Value) -> bool {
        match (self, value.kind()) {
            (Self::Dynamic, _) | (_, ValueKind::Null(_) | ValueKind::Unknown(_)) => true,
            (Self::Bool, ValueKind::Bool(_))
            | (Self::Number, ValueKind::Number(_))
            | (Self::String, ValueKind::String(_)) => true,
            (Self::List(elem), ValueKind::List(items)) => items.iter().all(|v| elem.conforms(v)),
            (Self::Map(elem), ValueKind::Map(items) | ValueKind::Object(items)) => {
                items.values().all(|v| elem.conforms(v))
            }
            (Self::Object(attrs), ValueKind::Object(items) | ValueKind::Map(items)) => {
                items.iter().all(|(name, v)| {
                    attrs.get(name).is_some_and(|attr_ty| attr_ty.conforms(v))
                })
            }
            _ => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str("bool"),
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::List(elem) => write!(f, "list of {elem}"),
            Self::Map(elem) => write!(f, "map of {elem}"),
            Self::Object(_) => f.write_str("object"),
            Self::Dynamic => f.write_str("dynamic"),
        }
    }
}
