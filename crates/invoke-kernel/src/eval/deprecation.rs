//! Deprecation tracking

use crate::diagnostics::{Diagnostic, Diagnostics};
use invoke_addrs::Module;
use invoke_value::{BlockSchema, Mark, Value};
use std::collections::HashSet;

/// Deprecation validation for evaluated configuration
///
/// Values derived from deprecated sources carry [`Mark::Deprecated`]; schema
/// attributes may themselves be deprecated. Both produce warnings, except in
/// modules whose warnings are suppressed.
#[derive(Debug, Clone, Default)]
pub struct Deprecations {
    suppressed: HashSet<Module>,
}

impl Deprecations {
    /// Report deprecations in every module
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop reporting deprecations in `module`
    #[must_use]
    pub fn suppress_module(mut self, module: Module) -> Self {
        self.suppressed.insert(module);
        self
    }

    /// Warn about deprecated values and arguments in `value`
    ///
    /// Returns `value` with every deprecation mark removed.
    #[must_use]
    pub fn validate_config(
        &self,
        value: Value,
        schema: &BlockSchema,
        module: &Module,
    ) -> (Value, Diagnostics) {
        let mut diags = Diagnostics::new();

        if !self.suppressed.contains(module) {
            for path in value.paths_with_mark(Mark::is_deprecation) {
                let message = value
                    .get_path(&path)
                    .and_then(|v| {
                        v.marks().iter().find_map(|m| match m {
                            Mark::Deprecated(msg) => Some(msg.clone()),
                            _ => None,
                        })
                    })
                    .unwrap_or_default();
                diags.push(
                    Diagnostic::warning("Deprecated value used", message).with_attribute_path(path),
                );
            }

            for (name, attr) in &schema.attributes {
                let set = value.get_attr(name).is_some_and(|v| !v.is_null());
                if attr.deprecated && set {
                    diags.push(
                        Diagnostic::warning(
                            "Argument is deprecated",
                            format!(
                                "The argument \"{name}\" is deprecated. Refer to the provider documentation for a replacement."
                            ),
                        )
                        .with_attribute_path(invoke_value::Path::root().attr(name.clone())),
                    );
                }
            }
        }

        (value.remove_marks_deep(&Mark::is_deprecation), diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_value::{AttributeSchema, Path, Type};

    fn schema() -> BlockSchema {
        BlockSchema::new()
            .with_attribute("url", AttributeSchema::optional(Type::String))
            .with_attribute("endpoint", AttributeSchema::optional(Type::String).deprecated())
    }

    #[test]
    fn warns_on_marked_values_and_strips_marks() {
        let value = Value::object([
            ("url", Value::string("u").with_mark(Mark::Deprecated("use v2 output".into()))),
            ("endpoint", Value::null(Type::String)),
        ]);
        let (cleaned, diags) = Deprecations::new().validate_config(value, &schema(), &Module::root());

        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.detail, "use v2 output");
        assert_eq!(diag.attribute_path, Some(Path::root().attr("url")));
        assert!(cleaned.paths_with_mark(Mark::is_deprecation).is_empty());
    }

    #[test]
    fn warns_on_deprecated_argument_when_set() {
        let value = Value::object([
            ("url", Value::null(Type::String)),
            ("endpoint", Value::string("e")),
        ]);
        let (_, diags) = Deprecations::new().validate_config(value, &schema(), &Module::root());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.iter().next().unwrap().summary, "Argument is deprecated");
        assert!(!diags.has_errors());
    }

    #[test]
    fn suppressed_module_is_quiet_but_still_stripped() {
        let module = Module::root().child("vendored");
        let value = Value::object([(
            "url",
            Value::string("u").with_mark(Mark::Deprecated("old".into())),
        )]);
        let (cleaned, diags) = Deprecations::new()
            .suppress_module(module.clone())
            .validate_config(value, &schema(), &module);
        assert!(diags.is_empty());
        assert!(cleaned.paths_with_mark(Mark::is_deprecation).is_empty());
    }
}
