//! Ephemeral value policy

use crate::diagnostics::{Diagnostic, Diagnostics};
use invoke_value::{BlockSchema, Mark, Value};

/// Reject ephemeral values outside write-only attributes
///
/// Returns one error per ephemeral-marked location. Diagnostics carry the
/// attribute path but no subject; anchor them with
/// [`Diagnostics::in_config_body`].
#[must_use]
pub fn validate_forbidden_ephemeral_values(value: &Value, schema: &BlockSchema) -> Diagnostics {
    value
        .paths_with_mark(|m| *m == Mark::Ephemeral)
        .into_iter()
        .filter(|path| {
            !path
                .first_attr()
                .and_then(|name| schema.attribute(name))
                .is_some_and(|attr| attr.write_only)
        })
        .map(|path| {
            let detail = if path.is_empty() {
                "Ephemeral values are not valid in action configuration, because it must be persisted to the plan.".to_string()
            } else {
                format!(
                    "Ephemeral values are not valid for \"{path}\", because it is not a write-only attribute and must be persisted to the plan."
                )
            };
            Diagnostic::error("Invalid use of ephemeral value", detail).with_attribute_path(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_value::{AttributeSchema, Path, Type};

    fn schema() -> BlockSchema {
        BlockSchema::new()
            .with_attribute("message", AttributeSchema::required(Type::String))
            .with_attribute("token", AttributeSchema::optional(Type::String).write_only())
    }

    #[test]
    fn ephemeral_in_regular_attribute_is_rejected() {
        let value = Value::object([
            ("message", Value::string("m").with_mark(Mark::Ephemeral)),
            ("token", Value::null(Type::String)),
        ]);
        let diags = validate_forbidden_ephemeral_values(&value, &schema());
        assert_eq!(diags.error_count(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.attribute_path, Some(Path::root().attr("message")));
        assert!(diag.detail.contains("\"message\""));
    }

    #[test]
    fn ephemeral_in_write_only_attribute_is_allowed() {
        let value = Value::object([
            ("message", Value::string("m")),
            ("token", Value::string("t").with_mark(Mark::Ephemeral)),
        ]);
        assert!(validate_forbidden_ephemeral_values(&value, &schema()).is_empty());
    }

    #[test]
    fn whole_value_ephemeral() {
        let value = Value::object([("message", Value::string("m"))]).with_mark(Mark::Ephemeral);
        let diags = validate_forbidden_ephemeral_values(&value, &schema());
        assert_eq!(diags.error_count(), 1);
    }
}
