//! Dotted key-path lookup into a state snapshot.
//!
//! The cache gate addresses previously stored results by a caller-specified
//! path like `"session.user"`. Resolution walks the snapshot one segment at
//! a time and treats any missing intermediate key as "entry absent" - it
//! never errors. Numeric segments index into arrays.

use serde_json::Value;

/// Resolve a dotted key path within a snapshot.
///
/// Returns `None` for an empty path, a missing key at any depth, or a
/// segment applied to a non-container value.
///
/// # Examples
///
/// ```
/// use netcache_core::path::resolve;
/// use serde_json::json;
///
/// let snapshot = json!({ "session": { "user": { "id": 7 } } });
/// assert_eq!(resolve(&snapshot, "session.user.id"), Some(&json!(7)));
/// assert_eq!(resolve(&snapshot, "session.missing.id"), None);
/// ```
#[must_use]
pub fn resolve<'a>(snapshot: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }

    path.split('.').try_fold(snapshot, |current, segment| {
        match current {
            Value::Object(fields) => fields.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn resolves_nested_keys() {
        let snapshot = json!({
            "session": {
                "user": { "fetching": false, "data": { "id": "USER" } }
            }
        });

        assert_eq!(
            resolve(&snapshot, "session.user.data"),
            Some(&json!({ "id": "USER" }))
        );
        assert_eq!(resolve(&snapshot, "session"), snapshot.get("session"));
    }

    #[test]
    fn missing_intermediate_keys_are_absent_not_errors() {
        let snapshot = json!({ "session": { "user": 1 } });

        assert_eq!(resolve(&snapshot, "session.missing.deep"), None);
        assert_eq!(resolve(&snapshot, "other"), None);
        assert_eq!(resolve(&snapshot, "session.user.further"), None);
        assert_eq!(resolve(&snapshot, ""), None);
    }

    #[test]
    fn numeric_segments_index_arrays() {
        let snapshot = json!({ "items": [{ "id": 1 }, { "id": 2 }] });

        assert_eq!(resolve(&snapshot, "items.1.id"), Some(&json!(2)));
        assert_eq!(resolve(&snapshot, "items.2.id"), None);
        assert_eq!(resolve(&snapshot, "items.not_a_number"), None);
    }

    proptest! {
        /// Any path built from the keys actually nested in the snapshot
        /// resolves to the planted leaf; breaking any one segment yields None.
        #[test]
        fn planted_leaves_resolve(
            segments in proptest::collection::vec("[a-z][a-z0-9_]{0,8}", 1..6),
            leaf in -1_000_000i64..1_000_000,
            break_at in 0usize..6,
        ) {
            let mut value = json!(leaf);
            for segment in segments.iter().rev() {
                value = json!({ segment.clone(): value });
            }

            let path = segments.join(".");
            prop_assert_eq!(resolve(&value, &path), Some(&json!(leaf)));

            if let Some(segment) = segments.get(break_at % segments.len()) {
                let broken: Vec<String> = segments
                    .iter()
                    .map(|s| {
                        if s == segment {
                            format!("{s}_missing")
                        } else {
                            s.clone()
                        }
                    })
                    .collect();
                prop_assert_eq!(resolve(&value, &broken.join(".")), None);
            }
        }
    }
}
