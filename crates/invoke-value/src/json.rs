//! JSON rendering

use crate::error::ValueError;
use crate::mark::Mark;
use crate::path::Path;
use crate::value::{Value, ValueKind};
use serde_json::Value as Json;

/// Placeholder written in place of sensitive values
const REDACTED: &str = "(sensitive value)";

impl Value {
    /// Render as JSON, ignoring marks
    ///
    /// # Errors
    /// Fails when the tree contains an unknown value or a non-finite number.
    pub fn to_json(&self) -> Result<Json, ValueError> {
        self.render(&Path::root(), false)
    }

    /// Render as JSON with sensitive values replaced by a placeholder
    ///
    /// # Errors
    /// Same as [`Value::to_json`].
    pub fn to_json_redacted(&self) -> Result<Json, ValueError> {
        self.render(&Path::root(), true)
    }

    fn render(&self, path: &Path, redact: bool) -> Result<Json, ValueError> {
        if redact && self.has_mark(&Mark::Sensitive) {
            return Ok(Json::String(REDACTED.to_string()));
        }
        match self.kind() {
            ValueKind::Null(_) => Ok(Json::Null),
            ValueKind::Unknown(_) => Err(ValueError::Unknown(path.clone())),
            ValueKind::Bool(b) => Ok(Json::Bool(*b)),
            ValueKind::Number(n) => serde_json::Number::from_f64(*n)
                .map(Json::Number)
                .ok_or_else(|| ValueError::NonFiniteNumber(path.clone())),
            ValueKind::String(s) => Ok(Json::String(s.clone())),
            ValueKind::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| v.render(&path.index(i), redact))
                .collect::<Result<Vec<_>, _>>()
                .map(Json::Array),
            ValueKind::Map(items) => items
                .iter()
                .map(|(k, v)| Ok((k.clone(), v.render(&path.key(k.clone()), redact)?)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Json::Object),
            ValueKind::Object(items) => items
                .iter()
                .map(|(k, v)| Ok((k.clone(), v.render(&path.attr(k.clone()), redact)?)))
                .collect::<Result<serde_json::Map<_, _>, _>>()
                .map(Json::Object),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;
    use serde_json::json;

    #[test]
    fn renders_nested_object() {
        let value = Value::object([
            ("message", Value::string("hi")),
            ("retries", Value::number(2.0)),
            ("tags", Value::list(vec![Value::string("a")])),
            ("extra", Value::null(Type::String)),
        ]);
        assert_eq!(
            value.to_json().unwrap(),
            json!({"message": "hi", "retries": 2.0, "tags": ["a"], "extra": null})
        );
    }

    #[test]
    fn unknown_is_an_error_with_path() {
        let value = Value::object([("message", Value::unknown(Type::String))]);
        assert_eq!(
            value.to_json(),
            Err(ValueError::Unknown(Path::root().attr("message")))
        );
    }

    #[test]
    fn redaction_hides_sensitive_values() {
        let value = Value::object([("token", Value::string("t").with_mark(Mark::Sensitive))]);
        assert_eq!(
            value.to_json_redacted().unwrap(),
            json!({"token": "(sensitive value)"})
        );
        assert_eq!(value.to_json().unwrap(), json!({"token": "t"}));
    }
}
