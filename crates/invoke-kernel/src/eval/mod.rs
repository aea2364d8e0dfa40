//! Configuration evaluation
//!
//! Turns an action's unevaluated [`Body`] into a [`Value`] conforming to the
//! action schema. Repetition data supplies `each.*` and `count.index`; other
//! objects' values are read from a shared reference table.
//!
//! # Usage
//!
//! ```rust,ignore
//! let evaluator = ScopeEvaluator::new();
//! evaluator.set_value("data.secrets.token", Value::string("t").with_mark(Mark::Ephemeral));
//!
//! let (value, diags) = evaluator.evaluate_block(&body, &schema, &RepetitionData::default()).await;
//! ```

mod deprecation;
mod ephemeral;

pub use deprecation::Deprecations;
pub use ephemeral::validate_forbidden_ephemeral_values;

use crate::configs::{Body, Expr, SourceRange};
use crate::diagnostics::{Diagnostic, Diagnostics};
use invoke_addrs::Module;
use invoke_value::{BlockSchema, Path, Type, Value, ValueKind};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Key-scoped evaluation data for one instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepetitionData {
    /// `count.index`, when the declaration uses `count`
    pub count_index: Option<i64>,
    /// `each.key`, when the declaration uses `for_each`
    pub each_key: Option<String>,
    /// `each.value`, when the declaration uses `for_each`
    pub each_value: Option<Value>,
}

impl RepetitionData {
    /// Data for a `count` instance
    #[inline]
    #[must_use]
    pub fn count(index: i64) -> Self {
        Self {
            count_index: Some(index),
            ..Self::default()
        }
    }

    /// Data for a `for_each` instance
    #[inline]
    #[must_use]
    pub fn for_each(key: impl Into<String>, value: Value) -> Self {
        Self {
            each_key: Some(key.into()),
            each_value: Some(value),
            ..Self::default()
        }
    }
}

/// Evaluates configuration bodies
#[async_trait::async_trait]
pub trait BlockEvaluator: Send + Sync {
    /// Evaluate `body` against `schema`
    ///
    /// Always returns a value of the schema's implied type; when the returned
    /// diagnostics contain errors the value must not be used.
    async fn evaluate_block(
        &self,
        body: &Body,
        schema: &BlockSchema,
        repetition: &RepetitionData,
    ) -> (Value, Diagnostics);

    /// Report deprecated values and arguments, returning the value with
    /// deprecation marks removed
    fn validate_deprecations(
        &self,
        value: Value,
        schema: &BlockSchema,
        module: &Module,
    ) -> (Value, Diagnostics);
}

/// Evaluator reading references from an in-memory table
///
/// The table is filled by whoever resolved the referenced objects earlier in
/// the walk. Values keep their marks, so an ephemeral or deprecated source
/// stays visible in the evaluated configuration.
#[derive(Debug, Default)]
pub struct ScopeEvaluator {
    values: RwLock<HashMap<String, Value>>,
    deprecations: Deprecations,
}

impl ScopeEvaluator {
    /// Evaluator with an empty reference table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `deprecations` for the deprecation pass
    #[inline]
    #[must_use]
    pub fn with_deprecations(mut self, deprecations: Deprecations) -> Self {
        self.deprecations = deprecations;
        self
    }

    /// Make `value` available under `traversal`
    pub fn set_value(&self, traversal: impl Into<String>, value: Value) {
        self.values.write().insert(traversal.into(), value);
    }

    fn eval_expr(
        &self,
        expr: &Expr,
        repetition: &RepetitionData,
        path: &Path,
        range: &SourceRange,
        diags: &mut Diagnostics,
    ) -> Value {
        match expr {
            Expr::Literal(v) => v.clone(),
            Expr::Reference(traversal) => {
                if let Some(v) = self.values.read().get(traversal) {
                    return v.clone();
                }
                diags.push(
                    Diagnostic::error(
                        "Reference to undeclared value",
                        format!("There is no value named \"{traversal}\" available in this context."),
                    )
                    .with_subject(range.clone())
                    .with_attribute_path(path.clone()),
                );
                Value::unknown(Type::Dynamic)
            }
            Expr::EachKey => match &repetition.each_key {
                Some(key) => Value::string(key.clone()),
                None => {
                    diags.push(each_without_for_each(path, range));
                    Value::unknown(Type::String)
                }
            },
            Expr::EachValue => match &repetition.each_value {
                Some(v) => v.clone(),
                None => {
                    diags.push(each_without_for_each(path, range));
                    Value::unknown(Type::Dynamic)
                }
            },
            Expr::CountIndex => match repetition.count_index {
                #[allow(clippy::cast_precision_loss)]
                Some(index) => Value::number(index as f64),
                None => {
                    diags.push(
                        Diagnostic::error(
                            "Reference to \"count\" in context without count",
                            "The \"count\" object can be used only in blocks that set the \"count\" argument.",
                        )
                        .with_subject(range.clone())
                        .with_attribute_path(path.clone()),
                    );
                    Value::unknown(Type::Number)
                }
            },
            Expr::List(items) => Value::list(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.eval_expr(item, repetition, &path.index(i), range, diags))
                    .collect(),
            ),
            Expr::Object(attrs) => Value::object(
                attrs
                    .iter()
                    .map(|(k, item)| {
                        let v = self.eval_expr(item, repetition, &path.attr(k.clone()), range, diags);
                        (k.clone(), v)
                    })
                    .collect::<Vec<_>>(),
            ),
            Expr::Concat(parts) => {
                let values: Vec<Value> = parts
                    .iter()
                    .map(|part| self.eval_expr(part, repetition, path, range, diags))
                    .collect();
                concat(values, path, range, diags)
            }
        }
    }
}

fn each_without_for_each(path: &Path, range: &SourceRange) -> Diagnostic {
    Diagnostic::error(
        "Reference to \"each\" in context without for_each",
        "The \"each\" object can be used only in blocks that set the \"for_each\" argument.",
    )
    .with_subject(range.clone())
    .with_attribute_path(path.clone())
}

/// String interpolation; marks of every part carry over to the result
fn concat(parts: Vec<Value>, path: &Path, range: &SourceRange, diags: &mut Diagnostics) -> Value {
    let mut marks = BTreeSet::new();
    let mut out = String::new();
    let mut known = true;

    for part in parts {
        let (part, found) = part.unmark_deep_with_paths();
        marks.extend(found.into_iter().flat_map(|pm| pm.marks));
        if !part.is_wholly_known() {
            known = false;
            continue;
        }
        match part.kind() {
            ValueKind::String(s) => out.push_str(s),
            ValueKind::Number(n) => out.push_str(&format_number(*n)),
            ValueKind::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            ValueKind::Null(_) => {
                diags.push(invalid_interpolation(
                    "The expression result is null. Cannot include a null value in a string template.",
                    path,
                    range,
                ));
                known = false;
            }
            _ => {
                diags.push(invalid_interpolation(
                    "Cannot include the given value in a string template: string required.",
                    path,
                    range,
                ));
                known = false;
            }
        }
    }

    let result = if known {
        Value::string(out)
    } else {
        Value::unknown(Type::String)
    };
    result.with_marks(marks)
}

fn invalid_interpolation(detail: &str, path: &Path, range: &SourceRange) -> Diagnostic {
    Diagnostic::error("Invalid template interpolation value", detail)
        .with_subject(range.clone())
        .with_attribute_path(path.clone())
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

#[async_trait::async_trait]
impl BlockEvaluator for ScopeEvaluator {
    async fn evaluate_block(
        &self,
        body: &Body,
        schema: &BlockSchema,
        repetition: &RepetitionData,
    ) -> (Value, Diagnostics) {
        let mut diags = Diagnostics::new();

        for attr in body.attributes.values() {
            if schema.attribute(&attr.name).is_none() {
                diags.push(
                    Diagnostic::error(
                        "Unsupported argument",
                        format!("An argument named \"{}\" is not expected here.", attr.name),
                    )
                    .with_subject(attr.range.clone()),
                );
            }
        }

        let mut attrs = BTreeMap::new();
        for (name, attr_schema) in &schema.attributes {
            let value = match body.attribute(name) {
                Some(attr) => {
                    let path = Path::root().attr(name.clone());
                    let v = self.eval_expr(&attr.expr, repetition, &path, &attr.range, &mut diags);
                    if attr_schema.ty.conforms(&v) {
                        v
                    } else {
                        diags.push(
                            Diagnostic::error(
                                "Incorrect attribute value type",
                                format!(
                                    "Inappropriate value for attribute \"{name}\": {} required.",
                                    attr_schema.ty
                                ),
                            )
                            .with_subject(attr.range.clone())
                            .with_attribute_path(path),
                        );
                        Value::null(attr_schema.ty.clone())
                    }
                }
                None => {
                    if attr_schema.required {
                        diags.push(
                            Diagnostic::error(
                                "Missing required argument",
                                format!("The argument \"{name}\" is required, but no definition was found."),
                            )
                            .with_subject(body.range.clone()),
                        );
                    }
                    Value::null(attr_schema.ty.clone())
                }
            };
            attrs.insert(name.clone(), value);
        }

        tracing::trace!(attributes = attrs.len(), errors = diags.error_count(), "evaluated block");
        (Value::object(attrs), diags)
    }

    fn validate_deprecations(
        &self,
        value: Value,
        schema: &BlockSchema,
        module: &Module,
    ) -> (Value, Diagnostics) {
        self.deprecations.validate_config(value, schema, module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use invoke_value::{AttributeSchema, Mark};

    fn range(line: usize) -> SourceRange {
        SourceRange::new("main.tf", (line, 1), (line, 30))
    }

    fn schema() -> BlockSchema {
        BlockSchema::new()
            .with_attribute("message", AttributeSchema::required(Type::String))
            .with_attribute("retries", AttributeSchema::optional(Type::Number))
    }

    fn body(expr: Expr) -> Body {
        Body::new(range(1)).with_attribute("message", expr, range(2))
    }

    #[tokio::test]
    async fn evaluates_literals_and_fills_nulls() {
        let eval = ScopeEvaluator::new();
        let (value, diags) = eval
            .evaluate_block(&body(Expr::string("hi")), &schema(), &RepetitionData::default())
            .await;
        assert!(diags.is_empty());
        assert_eq!(value.get_attr("message").unwrap().as_str(), Some("hi"));
        assert_eq!(value.get_attr("retries"), Some(&Value::null(Type::Number)));
    }

    #[tokio::test]
    async fn each_key_and_count_index() {
        let eval = ScopeEvaluator::new();
        let expr = Expr::Concat(vec![Expr::string("deploy-"), Expr::EachKey]);
        let (value, diags) = eval
            .evaluate_block(&body(expr), &schema(), &RepetitionData::for_each("a", Value::string("x")))
            .await;
        assert!(diags.is_empty());
        assert_eq!(value.get_attr("message").unwrap().as_str(), Some("deploy-a"));

        let expr = Expr::Concat(vec![Expr::string("n"), Expr::CountIndex]);
        let (value, _) = eval
            .evaluate_block(&body(expr), &schema(), &RepetitionData::count(3))
            .await;
        assert_eq!(value.get_attr("message").unwrap().as_str(), Some("n3"));
    }

    #[tokio::test]
    async fn each_without_for_each_is_an_error() {
        let eval = ScopeEvaluator::new();
        let (_, diags) = eval
            .evaluate_block(&body(Expr::EachKey), &schema(), &RepetitionData::default())
            .await;
        assert_eq!(diags.error_count(), 1);
        assert!(diags.iter().next().unwrap().summary.contains("without for_each"));
    }

    #[tokio::test]
    async fn references_keep_marks() {
        let eval = ScopeEvaluator::new();
        eval.set_value("data.secrets.token", Value::string("t").with_mark(Mark::Ephemeral));
        let (value, diags) = eval
            .evaluate_block(&body(Expr::reference("data.secrets.token")), &schema(), &RepetitionData::default())
            .await;
        assert!(diags.is_empty());
        assert!(value.get_attr("message").unwrap().has_mark(&Mark::Ephemeral));
    }

    #[tokio::test]
    async fn concat_with_unknown_is_unknown_and_marked() {
        let eval = ScopeEvaluator::new();
        eval.set_value("aws_instance.web.id", Value::unknown(Type::String).with_mark(Mark::Sensitive));
        let expr = Expr::Concat(vec![Expr::string("id="), Expr::reference("aws_instance.web.id")]);
        let (value, diags) = eval
            .evaluate_block(&body(expr), &schema(), &RepetitionData::default())
            .await;
        assert!(diags.is_empty());
        let message = value.get_attr("message").unwrap();
        assert!(!message.is_known());
        assert!(message.has_mark(&Mark::Sensitive));
    }

    #[tokio::test]
    async fn undeclared_reference_and_unsupported_argument() {
        let eval = ScopeEvaluator::new();
        let body = body(Expr::reference("nope.value")).with_attribute("bogus", Expr::string("x"), range(3));
        let (_, diags) = eval
            .evaluate_block(&body, &schema(), &RepetitionData::default())
            .await;
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert!(summaries.contains(&"Unsupported argument"));
        assert!(summaries.contains(&"Reference to undeclared value"));
    }

    #[tokio::test]
    async fn missing_required_and_wrong_type() {
        let eval = ScopeEvaluator::new();
        let body = Body::new(range(1)).with_attribute("retries", Expr::string("many"), range(2));
        let (_, diags) = eval
            .evaluate_block(&body, &schema(), &RepetitionData::default())
            .await;
        let summaries: Vec<_> = diags.iter().map(|d| d.summary.as_str()).collect();
        assert_eq!(
            summaries,
            vec!["Missing required argument", "Incorrect attribute value type"]
        );
    }
}
