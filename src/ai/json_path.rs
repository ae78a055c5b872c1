//! Dotted/bracket path expressions over JSON values.
//!
//! `choices[0].message.content` walks into `choices`, takes element 0,
//! descends into `message` and reads `content`. The same syntax is used to
//! write request fields, creating intermediate objects and arrays as needed.

use crate::error::{ClipwiseError, Result};
use serde_json::{Map, Value};

/// Largest array index a path may name. Writes pad arrays up to it.
pub const MAX_PATH_INDEX: usize = 64;

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Parse `a.b[0].c` into segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>> {
    let invalid = || ClipwiseError::ProviderMisconfigured(format!("invalid path expression '{path}'"));

    if path.trim().is_empty() {
        return Err(invalid());
    }

    let mut segments = Vec::new();
    for part in path.split('.') {
        let (name, mut rest) = match part.find('[') {
            Some(pos) => (&part[..pos], &part[pos..]),
            None => (part, ""),
        };

        if name.is_empty() && rest.is_empty() {
            return Err(invalid());
        }
        if !name.is_empty() {
            segments.push(PathSegment::Key(name.to_string()));
        }

        while !rest.is_empty() {
            let close = rest.find(']').ok_or_else(invalid)?;
            if !rest.starts_with('[') {
                return Err(invalid());
            }
            let index = rest[1..close].trim().parse::<usize>().map_err(|_| invalid())?;
            if index > MAX_PATH_INDEX {
                return Err(ClipwiseError::ProviderMisconfigured(format!(
                    "index {index} in path '{path}' exceeds {MAX_PATH_INDEX}"
                )));
            }
            segments.push(PathSegment::Index(index));
            rest = &rest[close + 1..];
        }
    }

    Ok(segments)
}

/// Value at `path`, if every step resolves.
pub fn get_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let segments = parse_path(path).ok()?;
    segments.iter().try_fold(value, |current, segment| match segment {
        PathSegment::Key(key) => current.as_object()?.get(key),
        PathSegment::Index(index) => current.as_array()?.get(*index),
    })
}

/// Text at `path`. Missing, null or structured values fail, naming the path.
pub fn extract_text(value: &Value, path: &str) -> Result<String> {
    let missing = || ClipwiseError::ContentExtraction {
        path: path.to_string(),
    };

    match get_path(value, path).ok_or_else(missing)? {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(missing()),
    }
}

/// Write `new_value` at `path`, merging into existing objects.
pub fn set_path(root: &mut Value, path: &str, new_value: Value) -> Result<()> {
    let segments = parse_path(path)?;
    set_segments(root, &segments, new_value, path)
}

fn set_segments(target: &mut Value, segments: &[PathSegment], new_value: Value, path: &str) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        *target = new_value;
        return Ok(());
    };

    let conflict = || {
        ClipwiseError::ProviderMisconfigured(format!(
            "path '{path}' conflicts with an existing value in the request body"
        ))
    };

    match first {
        PathSegment::Key(key) => {
            if target.is_null() {
                *target = Value::Object(Map::new());
            }
            let map = target.as_object_mut().ok_or_else(conflict)?;
            let slot = map.entry(key.clone()).or_insert(Value::Null);
            set_segments(slot, rest, new_value, path)
        }
        PathSegment::Index(index) => {
            if target.is_null() {
                *target = Value::Array(Vec::new());
            }
            let array = target.as_array_mut().ok_or_else(conflict)?;
            if array.len() <= *index {
                array.resize(*index + 1, Value::Null);
            }
            set_segments(&mut array[*index], rest, new_value, path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path() {
        assert_eq!(
            parse_path("choices[0].message.content").unwrap(),
            vec![
                PathSegment::Key("choices".into()),
                PathSegment::Index(0),
                PathSegment::Key("message".into()),
                PathSegment::Key("content".into()),
            ]
        );
        assert_eq!(
            parse_path("grid[1][2]").unwrap(),
            vec![
                PathSegment::Key("grid".into()),
                PathSegment::Index(1),
                PathSegment::Index(2),
            ]
        );
        assert!(parse_path("").is_err());
        assert!(parse_path("contents[64].text").is_ok());
        assert!(matches!(
            parse_path("contents[4000000000].text"),
            Err(ClipwiseError::ProviderMisconfigured(_))
        ));
        assert!(parse_path("a..b").is_err());
        assert!(parse_path("a[x]").is_err());
        assert!(parse_path("a[0").is_err());
    }

    #[test]
    fn test_extract_content() {
        let body = json!({"choices": [{"message": {"content": "hello"}}], "extra": 1});
        assert_eq!(extract_text(&body, "choices[0].message.content").unwrap(), "hello");
    }

    #[test]
    fn test_missing_path_names_the_path() {
        let body = json!({"choices": []});
        let err = extract_text(&body, "choices[0].message.content").unwrap_err();
        match err {
            ClipwiseError::ContentExtraction { path } => assert_eq!(path, "choices[0].message.content"),
            other => panic!("unexpected error: {other:?}"),
        }

        let null_content = json!({"choices": [{"message": {"content": null}}]});
        assert!(extract_text(&null_content, "choices[0].message.content").is_err());
    }

    #[test]
    fn test_set_path_nests_and_merges() {
        let mut body = json!({});
        set_path(&mut body, "generationConfig.temperature", json!(0.5)).unwrap();
        set_path(&mut body, "generationConfig.maxOutputTokens", json!(256)).unwrap();
        set_path(&mut body, "systemInstruction.parts[0].text", json!("be faithful")).unwrap();
        set_path(&mut body, "messages", json!([])).unwrap();

        assert_eq!(
            body,
            json!({
                "generationConfig": {"temperature": 0.5, "maxOutputTokens": 256},
                "systemInstruction": {"parts": [{"text": "be faithful"}]},
                "messages": []
            })
        );
    }

    #[test]
    fn test_set_path_conflict() {
        let mut body = json!({"generationConfig": 3});
        assert!(set_path(&mut body, "generationConfig.temperature", json!(0.1)).is_err());
    }
}
