//! Lookups over loosely shaped JSON payloads.

use serde_json::Value;

/// Drops a leading BOM and any `<!--` markers some AJAX endpoints prepend.
pub fn strip_comment_marker(text: &str) -> &str {
    let mut rest = text.trim_start_matches('\u{feff}').trim_start();
    while let Some(stripped) = rest.strip_prefix("<!--") {
        rest = stripped.trim_start();
    }
    rest
}

pub fn parse_tree(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(strip_comment_marker(text))
}

/// Collects `item[node_key]` objects from the array at `root[list_key]`.
///
/// Items may sit directly in that array or one list deeper; anything else
/// (scalars, maps without the key, non-object nodes) is skipped.
pub fn nodes_with_key<'a>(root: &'a Value, list_key: &str, node_key: &str) -> Vec<&'a Value> {
    let Some(items) = root.get(list_key).and_then(Value::as_array) else {
        return Vec::new();
    };

    let node_of = |item: &'a Value| item.get(node_key).filter(|node| node.is_object());

    items
        .iter()
        .flat_map(|item| match item {
            Value::Array(inner) => inner.iter().filter_map(node_of).collect::<Vec<_>>(),
            Value::Object(_) => node_of(item).into_iter().collect(),
            _ => Vec::new(),
        })
        .collect()
}

/// Returns the first non-empty string found at any of `pointers`, in order.
pub fn find_field<'a>(node: &'a Value, pointers: &[&str]) -> Option<&'a str> {
    pointers.iter().find_map(|pointer| {
        node.pointer(pointer)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_leading_comment_markers() {
        assert_eq!(strip_comment_marker("<!--{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_comment_marker("  <!-- <!--[]"), "[]");
        assert_eq!(strip_comment_marker("{}"), "{}");
        assert!(parse_tree("<!--not json").is_err());
    }

    #[test]
    fn finds_nodes_at_both_depths() {
        let tree = json!({
            "payload": [
                0,
                "text",
                {"player": {"id": "direct"}},
                [{"other": 1}, {"player": {"id": "nested"}}, {"player": "scalar"}],
            ]
        });

        let nodes = nodes_with_key(&tree, "payload", "player");
        let ids = nodes
            .iter()
            .filter_map(|n| n.get("id").and_then(Value::as_str))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["direct", "nested"]);

        assert!(nodes_with_key(&json!({"payload": {}}), "payload", "player").is_empty());
        assert!(nodes_with_key(&json!([]), "payload", "player").is_empty());
    }

    #[test]
    fn find_field_tolerates_shape_changes() {
        let node = json!({
            "params": {"0": "not a list"},
            "cache": {"data": {"dash": " "}},
            "hls": "x"
        });
        assert_eq!(
            find_field(&node, &["/params/0/hls", "/cache/data/dash", "/hls"]),
            Some("x")
        );
        assert_eq!(find_field(&node, &["/missing"]), None);
    }
}
