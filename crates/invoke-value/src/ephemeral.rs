//! Ephemeral value removal

use crate::mark::Mark;
use crate::value::Value;

/// Replace every ephemeral-marked node with a null of the same type
///
/// Other marks on the replaced node survive; the ephemeral mark does not. The
/// result is safe to persist in a plan.
#[must_use]
pub fn remove_ephemeral_values(value: Value) -> Value {
    value.map_deep(&mut |v| {
        if v.has_mark(&Mark::Ephemeral) {
            let kept = v.marks().iter().filter(|m| **m != Mark::Ephemeral).cloned().collect::<Vec<_>>();
            Value::null(v.ty()).with_marks(kept)
        } else {
            v
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Type;

    #[test]
    fn ephemeral_leaf_becomes_null() {
        let value = Value::object([
            ("token", Value::string("t").with_marks([Mark::Ephemeral, Mark::Sensitive])),
            ("url", Value::string("u")),
        ]);
        let cleaned = remove_ephemeral_values(value);

        let token = cleaned.get_attr("token").unwrap();
        assert_eq!(token, &Value::null(Type::String).with_mark(Mark::Sensitive));
        assert_eq!(cleaned.get_attr("url").unwrap().as_str(), Some("u"));
        assert!(cleaned.paths_with_mark(|m| *m == Mark::Ephemeral).is_empty());
    }

    #[test]
    fn ephemeral_collection_is_nulled_whole() {
        let value = Value::object([(
            "tags",
            Value::list(vec![Value::string("a")]).with_mark(Mark::Ephemeral),
        )]);
        let cleaned = remove_ephemeral_values(value);
        let tags = cleaned.get_attr("tags").unwrap();
        assert!(tags.is_null());
        assert_eq!(tags.ty(), Type::list(Type::String));
    }

    #[test]
    fn unmarked_value_is_unchanged() {
        let value = Value::object([("a", Value::number(1.0))]);
        assert_eq!(remove_ephemeral_values(value.clone()), value);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Value> {
            ("[a-z]{0,4}", any::<bool>(), any::<bool>()).prop_map(|(s, eph, sens)| {
                let mut v = Value::string(s);
                if eph {
                    v = v.with_mark(Mark::Ephemeral);
                }
                if sens {
                    v = v.with_mark(Mark::Sensitive);
                }
                v
            })
        }

        proptest! {
            #[test]
            fn prop_no_ephemeral_mark_survives(
                attrs in proptest::collection::btree_map("[a-z]{1,3}", leaf(), 0..6)
            ) {
                let sensitive_before = attrs.values().filter(|v| v.has_mark(&Mark::Sensitive)).count();
                let cleaned = remove_ephemeral_values(Value::object(attrs));

                prop_assert!(cleaned.paths_with_mark(|m| *m == Mark::Ephemeral).is_empty());
                prop_assert_eq!(
                    cleaned.paths_with_mark(|m| *m == Mark::Sensitive).len(),
                    sensitive_before
                );
            }
        }
    }
}
