//! Property-based tests for the manifest merge.
//!
//! These tests use proptest to generate manifests and verify that the merge
//! policy's ordering properties hold for all inputs.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::{merge, Manifest};
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::Bool),
            any::<i32>().prop_map(|n| Value::Number(n.into())),
            "[a-z^~0-9.]{0,8}".prop_map(Value::String),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
            ]
        })
    }

    /// Manifest whose keys all start with `prefix`
    fn manifest_with_prefix(prefix: &'static str) -> impl Strategy<Value = Manifest> {
        prop::collection::btree_map("[a-z]{1,6}", value(), 0..6).prop_map(move |m| {
            Manifest::from(
                m.into_iter()
                    .map(|(k, v)| (format!("{}{}", prefix, k), v))
                    .collect::<Map<_, _>>(),
            )
        })
    }

    proptest! {
        /// Property: fragments with disjoint keys merge the same in either order
        #[test]
        fn merge_is_commutative_for_disjoint_keys(
            a in manifest_with_prefix("a_"),
            b in manifest_with_prefix("b_"),
        ) {
            prop_assert_eq!(merge(&a, &b), merge(&b, &a));
        }

        /// Property: merging an empty fragment is the identity
        #[test]
        fn merge_with_empty_fragment_is_identity(a in manifest_with_prefix("k_")) {
            prop_assert_eq!(merge(&a, &Manifest::new()), a);
        }

        /// Property: merging into an empty base yields the fragment
        #[test]
        fn merge_into_empty_base_yields_fragment(a in manifest_with_prefix("k_")) {
            prop_assert_eq!(merge(&Manifest::new(), &a), a);
        }

        /// Property: sequences keep base items first, then fragment items
        #[test]
        fn sequences_concatenate_base_first(
            first in prop::collection::vec(scalar(), 0..5),
            second in prop::collection::vec(scalar(), 0..5),
        ) {
            let mut base = Manifest::new();
            base.insert("deps", Value::Array(first.clone()));
            let mut fragment = Manifest::new();
            fragment.insert("deps", Value::Array(second.clone()));

            let merged = merge(&base, &fragment);
            let mut expected = first;
            expected.extend(second);
            prop_assert_eq!(merged.get("deps"), Some(&Value::Array(expected)));
        }

        /// Property: merging is deterministic
        #[test]
        fn merge_is_deterministic(
            a in manifest_with_prefix("k_"),
            b in manifest_with_prefix("k_"),
        ) {
            prop_assert_eq!(merge(&a, &b), merge(&a, &b));
        }
    }
}
