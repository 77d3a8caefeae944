//! Stripe's form encoding.
//!
//! Stripe takes `application/x-www-form-urlencoded` bodies where nesting is
//! expressed with brackets: `metadata[plan]=pro`, `items[0][price]=price_1`.
//! [`flatten`] turns a JSON object into those pairs and [`unflatten`] reads
//! them back into JSON so form-encoded callers get the same treatment.

use serde_json::{Map, Value};

use crate::error::BillingError;

/// Deepest bracket nesting accepted in a form key, base name included.
pub const MAX_KEY_DEPTH: usize = 32;

/// Flatten a JSON object into bracket-notation form pairs.
///
/// `null` becomes an empty value (Stripe's way of unsetting a field). Empty
/// arrays and objects produce no pairs.
///
/// # Errors
/// Returns [`BillingError::InvalidRequest`] if `params` is not an object.
pub fn flatten(params: &Value) -> Result<Vec<(String, String)>, BillingError> {
    let Value::Object(map) = params else {
        return Err(BillingError::InvalidRequest(
            "request body must be a JSON object".to_owned(),
        ));
    };
    let mut pairs = Vec::new();
    for (key, value) in map {
        push_value(&mut pairs, key.clone(), value);
    }
    Ok(pairs)
}

fn push_value(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => pairs.push((key, String::new())),
        Value::Bool(b) => pairs.push((key, b.to_string())),
        Value::Number(n) => pairs.push((key, n.to_string())),
        Value::String(s) => pairs.push((key, s.clone())),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                push_value(pairs, format!("{key}[{i}]"), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                push_value(pairs, format!("{key}[{k}]"), v);
            }
        }
    }
}

/// Rebuild nested JSON from decoded form pairs.
///
/// Objects whose keys are exactly `0..n` become arrays. A later pair with the
/// same key replaces an earlier one.
///
/// # Errors
/// Returns [`BillingError::InvalidRequest`] if a key nests deeper than
/// [`MAX_KEY_DEPTH`] segments.
pub fn unflatten(pairs: &[(String, String)]) -> Result<Value, BillingError> {
    let mut root = Map::new();
    for (key, value) in pairs {
        let path = split_key(key).ok_or_else(|| {
            BillingError::InvalidRequest(format!(
                "form key nests deeper than {MAX_KEY_DEPTH} levels"
            ))
        })?;
        insert_path(&mut root, &path, value);
    }
    Ok(arrays_from_indices(Value::Object(root)))
}

/// `items[0][price]` → `["items", "0", "price"]`. Unbalanced brackets keep the
/// remainder as a literal segment. `None` past [`MAX_KEY_DEPTH`] segments.
fn split_key(key: &str) -> Option<Vec<&str>> {
    let Some(open) = key.find('[') else {
        return Some(vec![key]);
    };
    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        match stripped.find(']') {
            Some(close) => {
                segments.push(&stripped[..close]);
                rest = &stripped[close + 1..];
            }
            None => break,
        }
        if segments.len() > MAX_KEY_DEPTH {
            return None;
        }
    }
    if !rest.is_empty() {
        segments.push(rest);
    }
    (segments.len() <= MAX_KEY_DEPTH).then_some(segments)
}

fn insert_path(map: &mut Map<String, Value>, path: &[&str], value: &str) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };
    if tail.is_empty() {
        map.insert((*head).to_owned(), Value::String(value.to_owned()));
        return;
    }
    let slot = map
        .entry((*head).to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    if let Value::Object(child) = slot {
        insert_path(child, tail, value);
    }
}

fn arrays_from_indices(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let is_sequence = !map.is_empty()
                && (0..map.len()).all(|i| map.contains_key(&i.to_string()));
            if is_sequence {
                let mut map = map;
                let items = (0..map.len())
                    .filter_map(|i| map.remove(&i.to_string()))
                    .map(arrays_from_indices)
                    .collect();
                Value::Array(items)
            } else {
                Value::Object(
                    map.into_iter()
                        .map(|(k, v)| (k, arrays_from_indices(v)))
                        .collect(),
                )
            }
        }
        other => other,
    }
}
