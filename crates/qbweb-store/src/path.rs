//! Dotted/indexed paths (`a.b[0].c`) into the free-form UI state.

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Largest array index a path may address. Writing past the end pads with
/// `null`, so the bound also caps how much a single write can allocate.
pub const MAX_INDEX: usize = 4096;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

fn parse(path: &str) -> StoreResult<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut key = String::new();
    let mut chars = path.chars().peekable();
    // Set right after a `]`, where a key may only start after a `.`.
    let mut after_index = false;

    while let Some(ch) = chars.next() {
        match ch {
            '.' => {
                if key.is_empty() && !after_index {
                    return Err(StoreError::invalid_path(path, "empty_segment"));
                }
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                after_index = false;
                if chars.peek().is_none() {
                    return Err(StoreError::invalid_path(path, "trailing_dot"));
                }
            }
            '[' => {
                if !key.is_empty() {
                    segments.push(Segment::Key(std::mem::take(&mut key)));
                }
                let mut inner = String::new();
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == ']' {
                        closed = true;
                        break;
                    }
                    inner.push(next);
                }
                if !closed {
                    return Err(StoreError::invalid_path(path, "unclosed_bracket"));
                }
                segments.push(bracket_segment(path, &inner)?);
                after_index = true;
            }
            _ => {
                if after_index {
                    return Err(StoreError::invalid_path(path, "missing_dot"));
                }
                key.push(ch);
            }
        }
    }
    if !key.is_empty() {
        segments.push(Segment::Key(key));
    }
    Ok(segments)
}

fn bracket_segment(path: &str, inner: &str) -> StoreResult<Segment> {
    for quote in ['"', '\''] {
        if let Some(quoted) = inner
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return Ok(Segment::Key(quoted.to_string()));
        }
    }
    let index: usize = inner
        .trim()
        .parse()
        .map_err(|_| StoreError::invalid_path(path, "invalid_index"))?;
    if index > MAX_INDEX {
        return Err(StoreError::invalid_path(path, "index_out_of_range"));
    }
    Ok(Segment::Index(index))
}

/// Write `value` at `path` inside `target`, creating intermediate objects
/// (for keys) and arrays (for indices) as needed. Containers of the wrong
/// kind along the way are replaced. An empty path is a no-op.
///
/// The whole path is validated before `target` is touched, so a rejected path
/// leaves it unchanged.
///
/// # Errors
///
/// Returns [`StoreError::InvalidPath`] for malformed paths and for indices
/// above [`MAX_INDEX`].
pub fn set_path(target: &mut Value, path: &str, value: Value) -> StoreResult<()> {
    let segments = parse(path)?;
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut cursor = target;
    for segment in parents {
        cursor = child_mut(cursor, segment);
    }
    *child_mut(cursor, last) = value;
    Ok(())
}

fn child_mut<'a>(cursor: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => as_object(cursor).entry(key.clone()).or_insert(Value::Null),
        Segment::Index(index) => {
            let items = as_array(cursor);
            let index = (*index).min(MAX_INDEX);
            if items.len() <= index {
                items.resize(index.saturating_add(1), Value::Null);
            }
            &mut items[index]
        }
    }
}

fn as_object(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            *other = Value::Object(Map::new());
            as_object(other)
        }
    }
}

fn as_array(value: &mut Value) -> &mut Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => {
            *other = Value::Array(Vec::new());
            as_array(other)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn parses_keys_indices_and_quoted_keys() -> Result<()> {
        assert_eq!(
            parse(r#"a.b[0].c["d.e"]"#)?,
            vec![
                Segment::Key("a".into()),
                Segment::Key("b".into()),
                Segment::Index(0),
                Segment::Key("c".into()),
                Segment::Key("d.e".into()),
            ]
        );
        assert_eq!(
            parse("[2][3]")?,
            vec![Segment::Index(2), Segment::Index(3)]
        );
        assert!(parse("")?.is_empty());
        Ok(())
    }

    #[test]
    fn rejects_malformed_paths() {
        for path in ["a..b", ".a", "a.", "a[0", "a[x]", "a[0]b", "a[-1]"] {
            assert!(
                matches!(parse(path), Err(StoreError::InvalidPath { .. })),
                "{path:?} should be rejected"
            );
        }
    }

    #[test]
    fn set_path_creates_intermediate_containers() -> Result<()> {
        let mut state = json!({});
        set_path(&mut state, "addParams.urls[1]", json!("magnet:?xt=abc"))?;
        set_path(&mut state, "addParams.paused", json!(true))?;
        assert_eq!(
            state,
            json!({"addParams": {"urls": [null, "magnet:?xt=abc"], "paused": true}})
        );
        Ok(())
    }

    #[test]
    fn set_path_replaces_scalars_in_the_way() -> Result<()> {
        let mut state = json!({"a": 5});
        set_path(&mut state, "a.b", json!(1))?;
        assert_eq!(state, json!({"a": {"b": 1}}));
        Ok(())
    }

    #[test]
    fn oversized_indices_are_rejected_before_any_write() {
        for path in [
            "a.b[18446744073709551615]",
            "a.b[4000000000]",
            "a.b[99999999999999999999999]",
        ] {
            let mut state = json!({"a": 1});
            let result = set_path(&mut state, path, json!(1));
            assert!(
                matches!(
                    result,
                    Err(StoreError::InvalidPath {
                        reason: "index_out_of_range" | "invalid_index",
                        ..
                    })
                ),
                "{path:?} should be rejected"
            );
            assert_eq!(state, json!({"a": 1}));
        }
    }

    #[test]
    fn largest_allowed_index_pads_with_nulls() -> Result<()> {
        let mut state = json!({});
        set_path(&mut state, &format!("list[{MAX_INDEX}]"), json!("last"))?;
        let items = state["list"]
            .as_array()
            .map_or(0, Vec::len);
        assert_eq!(items, MAX_INDEX + 1);
        assert_eq!(state["list"][MAX_INDEX], json!("last"));
        Ok(())
    }

    #[test]
    fn empty_path_leaves_state_untouched() -> Result<()> {
        let mut state = json!({"a": 1});
        set_path(&mut state, "", json!(2))?;
        assert_eq!(state, json!({"a": 1}));
        Ok(())
    }
}
