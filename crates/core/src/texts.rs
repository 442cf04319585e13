//! Text-field ordering for batch payloads.
//!
//! JSONB does not keep object key order, so producers store the intended
//! order as an array under [`SORTED_KEY`] next to the fields themselves.

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::CoreError;

/// Key holding the ordered list of field names.
pub const SORTED_KEY: &str = "sorted";

/// Ordered text fields of one card face (e.g. name, title, phone).
pub type OrderedTexts = IndexMap<String, String>;

/// Rebuild the text fields of a batch in their original order.
///
/// Fields named in `sorted` come first, in that order. Fields present in the
/// object but missing from `sorted` follow in the store's key order. Names in
/// `sorted` with no matching field are skipped.
pub fn restore_order(texts: &Value) -> Result<OrderedTexts, CoreError> {
    let object = texts
        .as_object()
        .ok_or_else(|| CoreError::Validation("texts must be a JSON object".to_string()))?;

    let sorted: Vec<&str> = match object.get(SORTED_KEY) {
        None => Vec::new(),
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        Some(_) => {
            return Err(CoreError::Validation(format!(
                "texts.{SORTED_KEY} must be an array of field names"
            )))
        }
    };

    let mut ordered = OrderedTexts::with_capacity(object.len());
    let remaining = object.keys().map(String::as_str).filter(|k| *k != SORTED_KEY);

    for key in sorted.into_iter().chain(remaining) {
        if ordered.contains_key(key) {
            continue;
        }
        let Some(value) = object.get(key) else {
            continue;
        };
        let text = value.as_str().ok_or_else(|| {
            CoreError::Validation(format!("texts.{key} must be a string"))
        })?;
        ordered.insert(key.to_string(), text.to_string());
    }

    Ok(ordered)
}
