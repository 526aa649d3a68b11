//! Recursive merging of nested JSON mappings.

use serde_json::{Map, Value};

/// Recursively merges `update` into `dest` in place.
///
/// For every key of `update`:
/// - when both sides hold an object, the objects are merged recursively;
/// - otherwise the destination entry is replaced (or inserted) with a clone
///   of the update value.
///
/// Keys that only exist in `dest` are left untouched.
///
/// # Examples
///
/// ```ignore
/// let mut dest = json!({"a": {"x": 1, "y": 2}, "b": 1});
/// let update = json!({"a": {"y": 3}, "c": 4});
/// dict_update(dest.as_object_mut().unwrap(), update.as_object().unwrap());
/// assert_eq!(dest, json!({"a": {"x": 1, "y": 3}, "b": 1, "c": 4}));
/// ```
pub fn dict_update(dest: &mut Map<String, Value>, update: &Map<String, Value>) {
    for (key, value) in update {
        if let Value::Object(nested) = value
            && let Some(Value::Object(existing)) = dest.get_mut(key)
        {
            dict_update(existing, nested);
            continue;
        }
        dest.insert(key.clone(), value.clone());
    }
}

/// Same as [`dict_update`] for `Value` roots.
///
/// A non-object on either side replaces `dest` with `update` wholesale.
pub fn dict_update_value(dest: &mut Value, update: &Value) {
    match (dest, update) {
        (Value::Object(existing), Value::Object(nested)) => dict_update(existing, nested),
        (dest, update) => *dest = update.clone(),
    }
}
