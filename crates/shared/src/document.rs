use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::LoadError;
use crate::models::{Composer, EntityStore, Studio};

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*//.*$").expect("line comment pattern is valid"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("block comment pattern is valid"));

/// Remove whole-line `//` comments and `/* ... */` blocks so hand-edited data
/// files parse as JSON.
pub fn strip_comments(text: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(text, "");
    BLOCK_COMMENT
        .replace_all(&without_lines, "")
        .trim()
        .to_string()
}

/// Parse the data document into an entity store.
///
/// Accepts either a bare array of composers, or an object with `studios` and
/// `composers` (falling back to `items`). Missing or non-array collections
/// are treated as empty.
pub fn parse_document(text: &str) -> Result<EntityStore, LoadError> {
    let parsed: Value = serde_json::from_str(&strip_comments(text))?;

    let store = match parsed {
        Value::Array(items) => EntityStore {
            composers: collect::<Composer>(items),
            studios: Vec::new(),
        },
        Value::Object(mut map) => {
            let studios = match map.remove("studios") {
                Some(Value::Array(items)) => collect::<Studio>(items),
                _ => Vec::new(),
            };
            let composers = match map.remove("composers") {
                Some(Value::Array(items)) => collect::<Composer>(items),
                _ => match map.remove("items") {
                    Some(Value::Array(items)) => collect::<Composer>(items),
                    _ => Vec::new(),
                },
            };
            EntityStore { composers, studios }
        }
        Value::Null => return Err(LoadError::Shape("null")),
        Value::Bool(_) => return Err(LoadError::Shape("a boolean")),
        Value::Number(_) => return Err(LoadError::Shape("a number")),
        Value::String(_) => return Err(LoadError::Shape("a string")),
    };

    tracing::info!(
        composers = store.composers.len(),
        studios = store.studios.len(),
        "Loaded atlas document"
    );
    Ok(store)
}

fn collect<T>(items: Vec<Value>) -> Vec<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    items
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_line_comments() {
        let text = "// header\n[\n  // inline note\n  {\"id\": \"a\"}\n]";
        let store = parse_document(text).unwrap();
        assert_eq!(store.composers.len(), 1);
    }

    #[test]
    fn test_strip_block_comments() {
        let stripped = strip_comments("[/* one\n two */ 1, /* three */ 2]");
        assert_eq!(stripped, "[ 1,  2]");
    }

    #[test]
    fn test_strip_comments_keeps_trailing_and_unclosed() {
        assert_eq!(strip_comments("   // indented\n[1] // trailing"), "[1] // trailing");
        assert_eq!(strip_comments("[1] /* never closed"), "[1] /* never closed");
    }

    #[test]
    fn test_urls_survive_comment_stripping() {
        let text = r#"[{"id": "a", "clips": [{"url": "https://example.com/a.mp3"}]}]"#;
        let store = parse_document(text).unwrap();
        assert_eq!(store.composers[0].clips[0].url, "https://example.com/a.mp3");
    }

    #[test]
    fn test_bare_array_has_no_studios() {
        let store = parse_document(r#"[{"id": "a"}, {"id": "b"}]"#).unwrap();
        assert_eq!(store.composers.len(), 2);
        assert!(store.studios.is_empty());
    }

    #[test]
    fn test_object_with_composers_and_studios() {
        let text = r#"{"studios": [{"id": "s1", "center": [-74.0, 40.7]}], "composers": [{"id": "a"}]}"#;
        let store = parse_document(text).unwrap();
        assert_eq!(store.composers.len(), 1);
        assert_eq!(store.studios.len(), 1);
        assert!(store.studios[0].center().is_some());
    }

    #[test]
    fn test_items_fallback_key() {
        let store = parse_document(r#"{"items": [{"id": "a"}]}"#).unwrap();
        assert_eq!(store.composers[0].id, "a");
    }

    #[test]
    fn test_object_without_composers() {
        let store = parse_document(r#"{"studios": []}"#).unwrap();
        assert!(store.composers.is_empty());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(parse_document("[{"), Err(LoadError::Parse(_))));
    }

    #[test]
    fn test_scalar_document_is_shape_error() {
        let err = parse_document("42").unwrap_err();
        assert!(err.to_string().contains("a number"));
    }
}
