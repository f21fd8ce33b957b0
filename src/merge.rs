//! Tightening merge: bounds only ever become stricter.
//!
//! A lower bound keeps `max(current, candidate)`, an upper bound keeps
//! `min(current, candidate)`. Numeric bounds are compared together with
//! their exclusive flag, so `> 5` is tighter than `>= 5`.

use crate::schema::{ExclusiveBound, Schema, SchemaNode};

/// Merge a lower-bound candidate: the greater value wins.
pub fn new_min<T: PartialOrd>(current: Option<T>, candidate: T) -> T {
    match current {
        Some(current) if current >= candidate => current,
        _ => candidate,
    }
}

/// Merge an upper-bound candidate: the smaller value wins.
pub fn new_max<T: PartialOrd>(current: Option<T>, candidate: T) -> T {
    match current {
        Some(current) if current <= candidate => current,
        _ => candidate,
    }
}

/// Tighten `minLength`.
pub fn set_min_length(node: &mut SchemaNode, candidate: u64, clear_nullable: bool) {
    let merged = new_min(node.min_length, candidate);
    node.min_length = Some(merged);
    if clear_nullable && merged > 0 {
        node.clear_nullable();
    }
}

/// Tighten `maxLength`.
pub fn set_max_length(node: &mut SchemaNode, candidate: u64) {
    node.max_length = Some(new_max(node.max_length, candidate));
}

/// Tighten `minItems`.
pub fn set_min_items(node: &mut SchemaNode, candidate: u64, clear_nullable: bool) {
    let merged = new_min(node.min_items, candidate);
    node.min_items = Some(merged);
    if clear_nullable && merged > 0 {
        node.clear_nullable();
    }
}

/// Tighten `maxItems`.
pub fn set_max_items(node: &mut SchemaNode, candidate: u64) {
    node.max_items = Some(new_max(node.max_items, candidate));
}

/// Tighten `minimum` / `exclusiveMinimum`.
///
/// The candidate wins when it is greater than the effective lower bound, or
/// equal to it and exclusive. A losing candidate leaves both fields alone.
/// A node already using a numeric `exclusiveMinimum` keeps that form. When
/// `clear_nullable` is set and the resulting bound rules out zero, the node
/// stops being nullable.
pub fn set_minimum(node: &mut SchemaNode, candidate: f64, exclusive: bool, clear_nullable: bool) {
    let wins = match node.lower_bound() {
        None => true,
        Some((current, _)) => candidate > current || (candidate == current && exclusive),
    };

    if wins {
        if matches!(node.exclusive_minimum, Some(ExclusiveBound::Value(_))) && exclusive {
            node.minimum = None;
            node.exclusive_minimum = Some(ExclusiveBound::Value(candidate));
        } else {
            node.minimum = Some(candidate);
            node.exclusive_minimum = exclusive.then_some(ExclusiveBound::Flag(true));
        }
    }

    if clear_nullable {
        if let Some((minimum, exclusive)) = node.lower_bound() {
            if minimum > 0.0 || (minimum == 0.0 && exclusive) {
                node.clear_nullable();
            }
        }
    }
}

/// Tighten `maximum` / `exclusiveMaximum`.
///
/// Mirror of [`set_minimum`]: the smaller value wins, an exclusive bound
/// beats an inclusive one at the same value.
pub fn set_maximum(node: &mut SchemaNode, candidate: f64, exclusive: bool) {
    let wins = match node.upper_bound() {
        None => true,
        Some((current, _)) => candidate < current || (candidate == current && exclusive),
    };

    if wins {
        if matches!(node.exclusive_maximum, Some(ExclusiveBound::Value(_))) && exclusive {
            node.maximum = None;
            node.exclusive_maximum = Some(ExclusiveBound::Value(candidate));
        } else {
            node.maximum = Some(candidate);
            node.exclusive_maximum = exclusive.then_some(ExclusiveBound::Flag(true));
        }
    }
}

/// Merge a regex into the node.
///
/// Without `use_all_of`, the last pattern wins. With it, the first pattern
/// goes to `pattern`; once a second one arrives both move into `allOf`
/// sub-schemas and `pattern` is cleared. Further patterns are appended.
pub fn set_pattern(node: &mut SchemaNode, pattern: &str, use_all_of: bool) {
    if !use_all_of {
        node.pattern = Some(pattern.to_string());
        return;
    }

    let composed = node.all_of_patterns().next().is_some();
    if node.pattern.is_none() && !composed {
        node.pattern = Some(pattern.to_string());
        return;
    }

    if !composed {
        if let Some(first) = node.pattern.take() {
            node.all_of.push(pattern_schema(first));
        }
    }
    // a pattern set after composition started also moves into the list
    if let Some(stray) = node.pattern.take() {
        node.all_of.push(pattern_schema(stray));
    }
    node.all_of.push(pattern_schema(pattern.to_string()));
}

fn pattern_schema(pattern: String) -> Schema {
    Schema::Node(SchemaNode {
        pattern: Some(pattern),
        ..SchemaNode::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_override() {
        for (first, second, expected) in [
            (Some(1), Some(2), 1),
            (Some(2), Some(1), 1),
            (Some(1), None, 1),
            (None, Some(1), 1),
        ] {
            let mut node = SchemaNode::default();
            for value in [first, second].into_iter().flatten() {
                set_max_length(&mut node, value);
            }
            assert_eq!(node.max_length, Some(expected));
        }
    }

    #[test]
    fn min_override() {
        for (first, second, expected) in [
            (Some(1), Some(2), 2),
            (Some(2), Some(1), 2),
            (Some(1), None, 1),
            (None, Some(1), 1),
        ] {
            let mut node = SchemaNode::default();
            for value in [first, second].into_iter().flatten() {
                set_min_length(&mut node, value, false);
            }
            assert_eq!(node.min_length, Some(expected));
        }
    }

    #[test]
    fn merge_is_order_independent() {
        assert_eq!(new_min(Some(3), 7), new_min(Some(7), 3));
        assert_eq!(new_max(Some(3), 7), new_max(Some(7), 3));
        assert_eq!(new_min(Some(2.5), 2.5), 2.5);
    }

    #[test]
    fn min_length_clears_nullable_only_when_enabled() {
        let mut node = SchemaNode::of_type("string").nullable();
        set_min_length(&mut node, 1, false);
        assert!(node.nullable);

        set_min_length(&mut node, 1, true);
        assert!(!node.nullable);
    }

    #[test]
    fn min_length_zero_keeps_nullable() {
        let mut node = SchemaNode::of_type("string").nullable();
        set_min_length(&mut node, 0, true);
        assert!(node.nullable);
    }

    #[test]
    fn exclusive_minimum_beats_inclusive_at_same_value() {
        let mut node = SchemaNode::of_type("integer");
        set_minimum(&mut node, 5.0, false, false);
        set_minimum(&mut node, 5.0, true, false);
        assert_eq!(node.minimum, Some(5.0));
        assert_eq!(node.exclusive_minimum, Some(ExclusiveBound::Flag(true)));

        // inclusive at the same value is looser and loses
        set_minimum(&mut node, 5.0, false, false);
        assert_eq!(node.exclusive_minimum, Some(ExclusiveBound::Flag(true)));
    }

    #[test]
    fn inclusive_minimum_above_exclusive_resets_flag() {
        let mut node = SchemaNode::of_type("integer");
        set_minimum(&mut node, 5.0, true, false);
        set_minimum(&mut node, 7.0, false, false);
        assert_eq!(node.minimum, Some(7.0));
        assert_eq!(node.exclusive_minimum, None);
    }

    #[test]
    fn losing_candidate_changes_nothing() {
        let mut node = SchemaNode::of_type("integer");
        set_minimum(&mut node, 10.0, false, false);
        set_minimum(&mut node, 5.0, true, false);
        assert_eq!(node.minimum, Some(10.0));
        assert_eq!(node.exclusive_minimum, None);

        set_maximum(&mut node, 3.0, false);
        set_maximum(&mut node, 8.0, true);
        assert_eq!(node.maximum, Some(3.0));
        assert_eq!(node.exclusive_maximum, None);
    }

    #[test]
    fn minimum_nullable_clearing() {
        let mut node = SchemaNode::of_type("integer").nullable();
        set_minimum(&mut node, 0.0, false, true);
        assert!(node.nullable, ">= 0 still admits zero");

        let mut node = SchemaNode::of_type("integer").nullable();
        set_minimum(&mut node, 0.0, true, true);
        assert!(!node.nullable, "> 0 excludes zero");

        let mut node = SchemaNode::of_type("integer").nullable();
        set_minimum(&mut node, 1.0, false, false);
        assert!(node.nullable);
    }

    #[test]
    fn pattern_overwrites_without_all_of() {
        let mut node = SchemaNode::of_type("string");
        set_pattern(&mut node, "^a", false);
        set_pattern(&mut node, "b$", false);
        assert_eq!(node.pattern.as_deref(), Some("b$"));
        assert!(node.all_of.is_empty());
    }

    #[test]
    fn pattern_composes_with_all_of() {
        let mut node = SchemaNode::of_type("string");
        set_pattern(&mut node, "^a", true);
        assert_eq!(node.pattern.as_deref(), Some("^a"));
        assert!(node.all_of.is_empty());

        set_pattern(&mut node, "b$", true);
        assert_eq!(node.pattern, None);
        let patterns: Vec<&str> = node.all_of_patterns().collect();
        assert_eq!(patterns, ["^a", "b$"]);

        set_pattern(&mut node, "c", true);
        let patterns: Vec<&str> = node.all_of_patterns().collect();
        assert_eq!(patterns, ["^a", "b$", "c"]);
    }

    #[test]
    fn numeric_exclusive_minimum_keeps_its_form() {
        let mut node = SchemaNode {
            exclusive_minimum: Some(ExclusiveBound::Value(0.0)),
            ..SchemaNode::of_type("integer")
        };
        set_minimum(&mut node, 5.0, true, false);
        assert_eq!(node.minimum, None);
        assert_eq!(node.exclusive_minimum, Some(ExclusiveBound::Value(5.0)));

        // looser inclusive bound loses against the numeric one
        set_minimum(&mut node, 3.0, false, false);
        assert_eq!(node.lower_bound(), Some((5.0, true)));
    }

    #[test]
    fn inclusive_bound_replaces_looser_numeric_exclusive() {
        let mut node = SchemaNode {
            exclusive_maximum: Some(ExclusiveBound::Value(100.0)),
            ..SchemaNode::of_type("integer")
        };
        set_maximum(&mut node, 10.0, false);
        assert_eq!(node.maximum, Some(10.0));
        assert_eq!(node.exclusive_maximum, None);
    }

    #[test]
    fn numeric_exclusive_zero_clears_nullable_list() {
        let mut node: SchemaNode = serde_json::from_value(serde_json::json!({
            "type": ["integer", "null"],
            "exclusiveMinimum": 0
        }))
        .unwrap();
        set_minimum(&mut node, 0.0, false, true);
        assert!(!node.schema_type.as_ref().unwrap().includes("null"));
    }
}
