use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// The six JSON value kinds, used for structural error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Null => "null",
            Kind::Bool => "a boolean",
            Kind::Number => "a number",
            Kind::String => "a string",
            Kind::Array => "an array",
            Kind::Object => "an object",
        };
        f.write_str(name)
    }
}

pub fn kind_of(value: &Value) -> Kind {
    match value {
        Value::Null => Kind::Null,
        Value::Bool(_) => Kind::Bool,
        Value::Number(_) => Kind::Number,
        Value::String(_) => Kind::String,
        Value::Array(_) => Kind::Array,
        Value::Object(_) => Kind::Object,
    }
}

#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("manifest root must be an object, found {found}")]
    RootNotObject { found: Kind },
    #[error("'{path}' must be {expected}, found {found}")]
    WrongKind {
        path: String,
        expected: Kind,
        found: Kind,
    },
}

/// View the document root as a mutable object, or fail describing what was
/// found instead.
pub fn root_object_mut(root: &mut Value) -> Result<&mut Map<String, Value>, StructuralError> {
    let found = kind_of(root);
    match root {
        Value::Object(map) => Ok(map),
        _ => Err(StructuralError::RootNotObject { found }),
    }
}

/// Get `obj[key]` as a mutable array, creating an empty one when the key is
/// absent or explicitly null. Returns the array and whether it was created.
///
/// An explicit null counts as absent: the manifest author left a placeholder,
/// not a value worth preserving. Any other kind is a structural error at
/// `path`.
pub fn ensure_array_entry<'a>(
    obj: &'a mut Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<(&'a mut Vec<Value>, bool), StructuralError> {
    let created = matches!(obj.get(key), None | Some(Value::Null));
    let slot = obj
        .entry(key.to_owned())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    match slot {
        Value::Array(items) => Ok((items, created)),
        other => Err(StructuralError::WrongKind {
            path: path.to_owned(),
            expected: Kind::Array,
            found: kind_of(other),
        }),
    }
}

/// Get `obj[key]` as a mutable object, creating an empty one when the key is
/// absent or explicitly null. Returns the object and whether it was created.
pub fn ensure_object_entry<'a>(
    obj: &'a mut Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<(&'a mut Map<String, Value>, bool), StructuralError> {
    let created = matches!(obj.get(key), None | Some(Value::Null));
    let slot = obj
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if slot.is_null() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => Ok((map, created)),
        other => Err(StructuralError::WrongKind {
            path: path.to_owned(),
            expected: Kind::Object,
            found: kind_of(other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn root_object_mut_accepts_object() {
        let mut root = json!({"a": 1});
        assert!(root_object_mut(&mut root).is_ok());
    }

    #[test]
    fn root_object_mut_rejects_non_object() {
        let mut root = json!([1, 2]);
        let err = root_object_mut(&mut root).unwrap_err();
        assert_eq!(
            err.to_string(),
            "manifest root must be an object, found an array"
        );
    }

    #[test]
    fn ensure_array_creates_when_absent() {
        let mut root = json!({});
        let obj = root.as_object_mut().unwrap();
        let (items, created) = ensure_array_entry(obj, "scopes", "scopes").unwrap();
        assert!(created);
        assert!(items.is_empty());
        assert!(root["scopes"].is_array());
    }

    #[test]
    fn ensure_array_replaces_explicit_null() {
        let mut root = json!({"scopes": null});
        let obj = root.as_object_mut().unwrap();
        let (_, created) = ensure_array_entry(obj, "scopes", "scopes").unwrap();
        assert!(created);
        assert!(root["scopes"].is_array());
    }

    #[test]
    fn ensure_array_keeps_existing_entries() {
        let mut root = json!({"scopes": ["com.example"]});
        let obj = root.as_object_mut().unwrap();
        let (items, created) = ensure_array_entry(obj, "scopes", "scopes").unwrap();
        assert!(!created);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn ensure_array_rejects_wrong_kind() {
        let mut root = json!({"scopes": "not-an-array"});
        let obj = root.as_object_mut().unwrap();
        let err = ensure_array_entry(obj, "scopes", "registry.scopes").unwrap_err();
        assert_eq!(
            err.to_string(),
            "'registry.scopes' must be an array, found a string"
        );
    }

    #[test]
    fn ensure_object_creates_and_rejects_like_array() {
        let mut root = json!({"dependencies": 7});
        let obj = root.as_object_mut().unwrap();
        assert!(ensure_object_entry(obj, "dependencies", "dependencies").is_err());

        let mut root = json!({});
        let obj = root.as_object_mut().unwrap();
        let (map, created) = ensure_object_entry(obj, "dependencies", "dependencies").unwrap();
        assert!(created);
        assert!(map.is_empty());
    }

    #[test]
    fn ensure_entry_preserves_key_position_when_repairing_null() {
        let mut root = json!({"first": 1, "scopes": null, "last": 2});
        let obj = root.as_object_mut().unwrap();
        ensure_array_entry(obj, "scopes", "scopes").unwrap();
        let keys: Vec<_> = root.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["first", "scopes", "last"]);
    }
}
