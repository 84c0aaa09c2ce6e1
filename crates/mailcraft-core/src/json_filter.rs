//! JSON tree filter for the catalog viewer
//!
//! [`filter_json`] prunes a JSON value down to the leaves and keys that
//! contain a search term (case-insensitive), keeping the ancestor chain of
//! every match. A key that matches keeps its whole original subtree.
//!
//! "No match" is [`FilterMatch::NotFound`], distinct from a matched JSON
//! `null`. Unchanged leaves and kept-whole subtrees are borrowed from the
//! input; arrays and objects rebuilt by pruning are owned.

use std::borrow::Cow;

use serde_json::{Map, Value};
use tracing::trace;

/// Outcome of filtering one JSON node
#[derive(Debug, Clone, PartialEq)]
pub enum FilterMatch<'a> {
    Found(Cow<'a, Value>),
    NotFound,
}

impl<'a> FilterMatch<'a> {
    /// Owned value, or `None` when nothing matched
    pub fn into_value(self) -> Option<Value> {
        match self {
            FilterMatch::Found(value) => Some(value.into_owned()),
            FilterMatch::NotFound => None,
        }
    }
}

/// Filter `value` down to the parts matching `term`
///
/// An empty term returns the input unchanged (borrowed, not copied).
pub fn filter_json<'a>(value: &'a Value, term: &str) -> FilterMatch<'a> {
    if term.is_empty() {
        return FilterMatch::Found(Cow::Borrowed(value));
    }
    filter_node(value, &term.to_lowercase(), "")
}

fn filter_node<'a>(value: &'a Value, term: &str, path: &str) -> FilterMatch<'a> {
    match value {
        Value::String(s) => leaf_match(value, s, term),
        Value::Number(n) => leaf_match(value, &number_text(n), term),
        Value::Bool(b) => leaf_match(value, if *b { "true" } else { "false" }, term),
        // Literal comparison against the text "null", not against the term
        Value::Null => {
            if "null".contains(term) {
                FilterMatch::Found(Cow::Borrowed(value))
            } else {
                FilterMatch::NotFound
            }
        }
        Value::Array(items) => {
            let kept: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| {
                    filter_node(item, term, &child_path(path, &index.to_string())).into_value()
                })
                .collect();

            if kept.is_empty() {
                FilterMatch::NotFound
            } else {
                FilterMatch::Found(Cow::Owned(Value::Array(kept)))
            }
        }
        Value::Object(entries) => {
            let mut kept = Map::new();
            for (key, child) in entries {
                let key_path = child_path(path, key);
                if key.to_lowercase().contains(term) {
                    trace!(path = %key_path, "Key matched, keeping subtree");
                    kept.insert(key.clone(), child.clone());
                } else if let Some(filtered) = filter_node(child, term, &key_path).into_value() {
                    kept.insert(key.clone(), filtered);
                }
            }

            if kept.is_empty() {
                FilterMatch::NotFound
            } else {
                FilterMatch::Found(Cow::Owned(Value::Object(kept)))
            }
        }
    }
}

fn leaf_match<'a>(value: &'a Value, text: &str, term: &str) -> FilterMatch<'a> {
    if text.to_lowercase().contains(term) {
        FilterMatch::Found(Cow::Borrowed(value))
    } else {
        FilterMatch::NotFound
    }
}

fn child_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", parent, segment)
    }
}

/// Display form of a number as the viewer renders it
///
/// `2.0` shows as `2`. Magnitudes below `1e-6` or from `1e21` up use
/// exponent form with an explicit sign (`1e-7`, `1.5e+21`).
fn number_text(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map(float_text).unwrap_or_default()
    }
}

fn float_text(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return f.to_string();
    }

    let text = format!("{:e}", f);
    match text.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{}e+{}", mantissa, exponent)
        }
        _ => text,
    }
}

/// Dotted paths of every node the search term highlights
///
/// A node matches when its path (rooted at `root_label`) or its primitive
/// value contains the term, case-insensitively. `null` values match by path
/// only. Paths are returned in document order; an empty term matches nothing.
pub fn highlight_paths(value: &Value, term: &str, root_label: &str) -> Vec<String> {
    let mut paths = Vec::new();
    if !term.is_empty() {
        collect_highlights(value, &term.to_lowercase(), root_label, &mut paths);
    }
    paths
}

fn collect_highlights(value: &Value, term: &str, path: &str, out: &mut Vec<String>) {
    let value_match = match value {
        Value::String(s) => s.to_lowercase().contains(term),
        Value::Number(n) => number_text(n).contains(term),
        Value::Bool(b) => b.to_string().contains(term),
        _ => false,
    };
    if value_match || path.to_lowercase().contains(term) {
        out.push(path.to_string());
    }

    match value {
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_highlights(item, term, &child_path(path, &index.to_string()), out);
            }
        }
        Value::Object(entries) => {
            for (key, child) in entries {
                collect_highlights(child, term, &child_path(path, key), out);
            }
        }
        _ => {}
    }
}
