//! Block schemas
//!
//! A schema describes the attributes an action's configuration block accepts.
//! Providers publish one per action type.

use crate::ty::Type;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contract for one attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSchema {
    /// Expected type
    pub ty: Type,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Must be set
    #[serde(default)]
    pub required: bool,
    /// Value is redacted when displayed
    #[serde(default)]
    pub sensitive: bool,
    /// Setting it produces a deprecation warning
    #[serde(default)]
    pub deprecated: bool,
    /// Accepts ephemeral values; never persisted
    #[serde(default)]
    pub write_only: bool,
}

impl AttributeSchema {
    /// Required attribute of type `ty`
    #[inline]
    #[must_use]
    pub fn required(ty: Type) -> Self {
        Self {
            required: true,
            ..Self::optional(ty)
        }
    }

    /// Optional attribute of type `ty`
    #[inline]
    #[must_use]
    pub fn optional(ty: Type) -> Self {
        Self {
            ty,
            description: String::new(),
            required: false,
            sensitive: false,
            deprecated: false,
            write_only: false,
        }
    }

    /// Mark as sensitive
    #[inline]
    #[must_use]
    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    /// Mark as deprecated
    #[inline]
    #[must_use]
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    /// Mark as write-only
    #[inline]
    #[must_use]
    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }

    /// Attach a description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Contract for a configuration block
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockSchema {
    /// Attributes by name
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
}

impl BlockSchema {
    /// Empty schema
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, attr: AttributeSchema) -> Self {
        self.attributes.insert(name.into(), attr);
        self
    }

    /// Look up one attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    /// Object type a conforming block evaluates to
    #[must_use]
    pub fn implied_type(&self) -> Type {
        Type::Object(
            self.attributes
                .iter()
                .map(|(name, attr)| (name.clone(), attr.ty.clone()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implied_type_lists_all_attributes() {
        let schema = BlockSchema::new()
            .with_attribute("url", AttributeSchema::required(Type::String))
            .with_attribute("retries", AttributeSchema::optional(Type::Number));
        assert_eq!(
            schema.implied_type(),
            Type::object([("retries", Type::Number), ("url", Type::String)])
        );
    }

    #[test]
    fn builder_flags() {
        let attr = AttributeSchema::optional(Type::String).write_only().deprecated();
        assert!(attr.write_only && attr.deprecated && !attr.required);
    }

    #[test]
    fn schema_deserializes_with_defaults() {
        let schema: BlockSchema =
            serde_json::from_str(r#"{"attributes":{"url":{"ty":"String","required":true}}}"#)
                .unwrap();
        let url = schema.attribute("url").unwrap();
        assert!(url.required);
        assert!(!url.write_only);
    }
}
