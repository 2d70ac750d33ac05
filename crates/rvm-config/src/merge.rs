//! Deep merge of TOML values.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from an overlay never overrides the base layer.

use std::collections::HashSet;

/// Dotted paths of every leaf value set by a file layer.
pub type SetFields = HashSet<String>;

/// Recursively deep-merge `overlay` into `base`.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
        },
    }
}

/// Record the dotted path of every leaf in `val` into `fields`.
pub fn collect_leaf_paths(val: &toml::Value, prefix: &str, fields: &mut SetFields) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{prefix}.{key}")
            };
            collect_leaf_paths(child, &path, fields);
        }
    } else if !prefix.is_empty() {
        fields.insert(prefix.to_owned());
    }
}

/// Set a string leaf at a dotted path, creating intermediate tables.
pub fn set_string_field(root: &mut toml::Value, path: &str, value: &str) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let toml::Value::Table(table) = current else {
            return;
        };
        if segments.peek().is_none() {
            table.insert(segment.to_owned(), toml::Value::String(value.to_owned()));
            return;
        }
        current = table
            .entry(segment.to_owned())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_scalar_replaces_base() {
        let mut base = parse("[control]\nsocket_path = \"/a\"\nmax_message_bytes = 10\n");
        let overlay = parse("[control]\nsocket_path = \"/b\"\n");
        deep_merge(&mut base, &overlay);

        assert_eq!(base["control"]["socket_path"].as_str(), Some("/b"));
        assert_eq!(base["control"]["max_message_bytes"].as_integer(), Some(10));
    }

    #[test]
    fn overlay_adds_missing_tables() {
        let mut base = parse("[control]\nsocket_path = \"/a\"\n");
        let overlay = parse("[runtime]\nlaunch = true\n");
        deep_merge(&mut base, &overlay);

        assert_eq!(base["runtime"]["launch"].as_bool(), Some(true));
        assert_eq!(base["control"]["socket_path"].as_str(), Some("/a"));
    }

    #[test]
    fn leaf_paths_are_dotted() {
        let val = parse("[runtime]\nlaunch = true\n[http]\nmax_redirects = 3\n");
        let mut fields = SetFields::new();
        collect_leaf_paths(&val, "", &mut fields);

        assert!(fields.contains("runtime.launch"));
        assert!(fields.contains("http.max_redirects"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn set_string_field_creates_tables() {
        let mut root = toml::Value::Table(toml::map::Map::new());
        set_string_field(&mut root, "logging.level", "debug");
        assert_eq!(root["logging"]["level"].as_str(), Some("debug"));
    }
}
