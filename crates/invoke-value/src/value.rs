//! Value trees

use crate::mark::{Mark, PathMarks};
use crate::path::{Path, PathStep};
use crate::ty::Type;
use std::collections::{BTreeMap, BTreeSet};

/// Shape of a value, without its marks
#[derive(Debug, Clone, PartialEq)]
pub enum ValueKind {
    /// Absent value of a known type
    Null(Type),
    /// Placeholder for a value not yet computed
    Unknown(Type),
    /// Boolean
    Bool(bool),
    /// Number
    Number(f64),
    /// String
    String(String),
    /// Ordered elements
    List(Vec<Value>),
    /// String-keyed elements of one type
    Map(BTreeMap<String, Value>),
    /// Named attributes
    Object(BTreeMap<String, Value>),
}

/// Configuration value with provenance marks
///
/// Marks sit on the node they were applied to; nested nodes keep their own.
/// Deep operations such as [`Value::unmark_deep_with_paths`] walk the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    kind: ValueKind,
    marks: BTreeSet<Mark>,
}

impl Value {
    fn from_kind(kind: ValueKind) -> Self {
        Self {
            kind,
            marks: BTreeSet::new(),
        }
    }

    /// Null of type `ty`
    #[inline]
    #[must_use]
    pub fn null(ty: Type) -> Self {
        Self::from_kind(ValueKind::Null(ty))
    }

    /// Unknown of type `ty`
    #[inline]
    #[must_use]
    pub fn unknown(ty: Type) -> Self {
        Self::from_kind(ValueKind::Unknown(ty))
    }

    /// Boolean value
    #[inline]
    #[must_use]
    pub fn bool(b: bool) -> Self {
        Self::from_kind(ValueKind::Bool(b))
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::from_kind(ValueKind::Number(n))
    }

    /// String value
    #[inline]
    #[must_use]
    pub fn string(s: impl Into<String>) -> Self {
        Self::from_kind(ValueKind::String(s.into()))
    }

    /// List value
    #[inline]
    #[must_use]
    pub fn list(items: Vec<Value>) -> Self {
        Self::from_kind(ValueKind::List(items))
    }

    /// Map value
    #[must_use]
    pub fn map<K: Into<String>>(items: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::from_kind(ValueKind::Map(
            items.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Object value
    #[must_use]
    pub fn object<K: Into<String>>(attrs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::from_kind(ValueKind::Object(
            attrs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Add a mark to this node
    #[inline]
    #[must_use]
    pub fn with_mark(mut self, mark: Mark) -> Self {
        self.marks.insert(mark);
        self
    }

    /// Add several marks to this node
    #[inline]
    #[must_use]
    pub fn with_marks(mut self, marks: impl IntoIterator<Item = Mark>) -> Self {
        self.marks.extend(marks);
        self
    }

    /// Shape of this value
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Marks on this node only
    #[inline]
    #[must_use]
    pub fn marks(&self) -> &BTreeSet<Mark> {
        &self.marks
    }

    /// Whether this node carries `mark`
    #[inline]
    #[must_use]
    pub fn has_mark(&self, mark: &Mark) -> bool {
        self.marks.contains(mark)
    }

    /// Type of this value, inferred from the contents for collections
    #[must_use]
    pub fn ty(&self) -> Type {
        match &self.kind {
            ValueKind::Null(ty) | ValueKind::Unknown(ty) => ty.clone(),
            ValueKind::Bool(_) => Type::Bool,
            ValueKind::Number(_) => Type::Number,
            ValueKind::String(_) => Type::String,
            ValueKind::List(items) => Type::list(items.first().map_or(Type::Dynamic, Value::ty)),
            ValueKind::Map(items) => Type::map(items.values().next().map_or(Type::Dynamic, Value::ty)),
            ValueKind::Object(attrs) => {
                Type::Object(attrs.iter().map(|(k, v)| (k.clone(), v.ty())).collect())
            }
        }
    }

    /// Whether this node is null
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null(_))
    }

    /// Whether this node is known (nested values may still be unknown)
    #[inline]
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self.kind, ValueKind::Unknown(_))
    }

    /// Whether no node anywhere in the tree is unknown
    #[must_use]
    pub fn is_wholly_known(&self) -> bool {
        match &self.kind {
            ValueKind::Unknown(_) => false,
            ValueKind::List(items) => items.iter().all(Value::is_wholly_known),
            ValueKind::Map(items) | ValueKind::Object(items) => {
                items.values().all(Value::is_wholly_known)
            }
            _ => true,
        }
    }

    /// String contents, if this is a string
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attribute of an object (or entry of a map)
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&Value> {
        match &self.kind {
            ValueKind::Object(items) | ValueKind::Map(items) => items.get(name),
            _ => None,
        }
    }

    /// Value at `path`, if present
    #[must_use]
    pub fn get_path(&self, path: &Path) -> Option<&Value> {
        path.steps().iter().try_fold(self, |current, step| match (step, &current.kind) {
            (PathStep::Attr(name) | PathStep::Key(name), ValueKind::Object(items) | ValueKind::Map(items)) => {
                items.get(name)
            }
            (PathStep::Index(idx), ValueKind::List(items)) => items.get(*idx),
            _ => None,
        })
    }

    fn get_path_mut(&mut self, path: &Path) -> Option<&mut Value> {
        path.steps().iter().try_fold(self, |current, step| match (step, &mut current.kind) {
            (PathStep::Attr(name) | PathStep::Key(name), ValueKind::Object(items) | ValueKind::Map(items)) => {
                items.get_mut(name)
            }
            (PathStep::Index(idx), ValueKind::List(items)) => items.get_mut(*idx),
            _ => None,
        })
    }

    /// Every path whose node carries a mark matching `pred`
    #[must_use]
    pub fn paths_with_mark(&self, pred: impl Fn(&Mark) -> bool) -> Vec<Path> {
        let mut out = Vec::new();
        self.collect_marked_paths(&Path::root(), &pred, &mut out);
        out
    }

    fn collect_marked_paths(&self, path: &Path, pred: &dyn Fn(&Mark) -> bool, out: &mut Vec<Path>) {
        if self.marks.iter().any(pred) {
            out.push(path.clone());
        }
        self.for_each_child(path, |child_path, child| {
            child.collect_marked_paths(&child_path, pred, out);
        });
    }

    fn for_each_child(&self, path: &Path, mut f: impl FnMut(Path, &Value)) {
        match &self.kind {
            ValueKind::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    f(path.index(i), item);
                }
            }
            ValueKind::Map(items) => {
                for (k, item) in items {
                    f(path.key(k.clone()), item);
                }
            }
            ValueKind::Object(items) => {
                for (k, item) in items {
                    f(path.attr(k.clone()), item);
                }
            }
            _ => {}
        }
    }

    /// Strip every mark in the tree, returning where each mark was
    #[must_use]
    pub fn unmark_deep_with_paths(self) -> (Value, Vec<PathMarks>) {
        let mut found = Vec::new();
        let value = self.unmark_into(&Path::root(), &mut found);
        (value, found)
    }

    fn unmark_into(self, path: &Path, found: &mut Vec<PathMarks>) -> Value {
        let Value { kind, marks } = self;
        if !marks.is_empty() {
            found.push(PathMarks {
                path: path.clone(),
                marks,
            });
        }
        let kind = match kind {
            ValueKind::List(items) => ValueKind::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| v.unmark_into(&path.index(i), found))
                    .collect(),
            ),
            ValueKind::Map(items) => ValueKind::Map(
                items
                    .into_iter()
                    .map(|(k, v)| {
                        let child = v.unmark_into(&path.key(k.clone()), found);
                        (k, child)
                    })
                    .collect(),
            ),
            ValueKind::Object(items) => ValueKind::Object(
                items
                    .into_iter()
                    .map(|(k, v)| {
                        let child = v.unmark_into(&path.attr(k.clone()), found);
                        (k, child)
                    })
                    .collect(),
            ),
            other => other,
        };
        Value::from_kind(kind)
    }

    /// Re-apply marks previously collected by [`Value::unmark_deep_with_paths`]
    ///
    /// Paths that no longer exist in the tree are skipped.
    #[must_use]
    pub fn mark_with_paths(mut self, path_marks: &[PathMarks]) -> Value {
        for pm in path_marks {
            if let Some(target) = self.get_path_mut(&pm.path) {
                target.marks.extend(pm.marks.iter().cloned());
            }
        }
        self
    }

    /// Remove every mark matching `pred` anywhere in the tree
    #[must_use]
    pub fn remove_marks_deep(self, pred: &dyn Fn(&Mark) -> bool) -> Value {
        self.map_deep(&mut |mut v| {
            v.marks.retain(|m| !pred(m));
            v
        })
    }

    /// Rebuild the tree bottom-up, applying `f` to every node after its children
    pub(crate) fn map_deep(self, f: &mut dyn FnMut(Value) -> Value) -> Value {
        let Value { kind, marks } = self;
        let kind = match kind {
            ValueKind::List(items) => ValueKind::List(items.into_iter().map(|v| v.map_deep(f)).collect()),
            ValueKind::Map(items) => {
                ValueKind::Map(items.into_iter().map(|(k, v)| (k, v.map_deep(f))).collect())
            }
            ValueKind::Object(items) => {
                ValueKind::Object(items.into_iter().map(|(k, v)| (k, v.map_deep(f))).collect())
            }
            other => other,
        };
        f(Value { kind, marks })
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::string(s)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Value {
        Value::object([
            ("url", Value::string("https://hooks.example")),
            (
                "headers",
                Value::map([("x-token", Value::string("abc").with_mark(Mark::Sensitive))]),
            ),
            (
                "targets",
                Value::list(vec![Value::string("a"), Value::unknown(Type::String)]),
            ),
        ])
    }

    #[test]
    fn wholly_known_looks_deep() {
        assert!(!sample().is_wholly_known());
        assert!(sample().is_known());
        assert!(Value::object([("a", Value::string("x"))]).is_wholly_known());
    }

    #[test]
    fn unmark_and_remark_roundtrip() {
        let marked = sample();
        let (unmarked, paths) = marked.clone().unmark_deep_with_paths();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].path, Path::root().attr("headers").key("x-token"));
        assert!(unmarked.paths_with_mark(|_| true).is_empty());
        assert_eq!(unmarked.mark_with_paths(&paths), marked);
    }

    #[test]
    fn paths_with_mark_filters_by_predicate() {
        let value = Value::object([
            ("a", Value::string("1").with_mark(Mark::Ephemeral)),
            ("b", Value::string("2").with_mark(Mark::Sensitive)),
        ]);
        assert_eq!(
            value.paths_with_mark(|m| *m == Mark::Ephemeral),
            vec![Path::root().attr("a")]
        );
    }

    #[test]
    fn remove_marks_deep_keeps_others() {
        let value = Value::object([(
            "a",
            Value::string("1").with_marks([Mark::Deprecated("old".into()), Mark::Sensitive]),
        )]);
        let cleaned = value.remove_marks_deep(&Mark::is_deprecation);
        let attr = cleaned.get_attr("a").unwrap();
        assert!(attr.has_mark(&Mark::Sensitive));
        assert_eq!(attr.marks().len(), 1);
    }

    #[test]
    fn get_path_walks_collections() {
        let value = sample();
        let got = value.get_path(&Path::root().attr("targets").index(0)).unwrap();
        assert_eq!(got.as_str(), Some("a"));
        assert!(value.get_path(&Path::root().attr("missing")).is_none());
    }

    #[test]
    fn type_of_object() {
        let value = Value::object([("n", Value::number(1.0)), ("s", Value::null(Type::String))]);
        assert_eq!(value.ty(), Type::object([("n", Type::Number), ("s", Type::String)]));
    }
}
