// ── Patch descriptors ──
//
// Declarative update descriptors in the `$set` / `$unset` / `$push` /
// `$unshift` / `$splice` / `$merge` notation. Applying a patch always
// derives a new value; the input is never mutated.

use std::str::FromStr;

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("{directive} at '{path}' needs an array target")]
    NotAnArray {
        directive: &'static str,
        path: String,
    },

    #[error("{directive} at '{path}' needs an object target")]
    NotAnObject {
        directive: &'static str,
        path: String,
    },

    #[error("index {index} out of range at '{path}' (length {len})")]
    IndexOutOfRange {
        path: String,
        index: String,
        len: usize,
    },

    #[error("nothing to update at '{path}'")]
    MissingTarget { path: String },

    #[error("invalid patch: {0}")]
    Invalid(String),

    #[error("entity does not fit the patched value: {0}")]
    Shape(String),
}

/// One `$splice` operation: remove `delete_count` items at `start`, then
/// insert `items` there.
#[derive(Debug, Clone, PartialEq)]
pub struct Splice {
    pub start: usize,
    pub delete_count: usize,
    pub items: Vec<Value>,
}

/// An update descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    /// Replace the target. Creates a missing object key.
    Set(Value),
    /// Remove keys from an object target.
    Unset(Vec<String>),
    /// Append to an array target.
    Push(Vec<Value>),
    /// Prepend to an array target.
    Unshift(Vec<Value>),
    /// Apply splices to an array target, in order.
    Splice(Vec<Splice>),
    /// Shallow-merge into an object target.
    Merge(Map<String, Value>),
    /// Descend into object members or array indices.
    Nested(IndexMap<String, Patch>),
    /// Apply patches one after another.
    Sequence(Vec<Patch>),
}

impl Patch {
    // ── Builders ─────────────────────────────────────────────────────

    /// `{"a": {"b": {"0": {"$set": value}}}}` from `"a.b.0"`.
    ///
    /// An empty path replaces the whole target.
    pub fn set_path(path: &str, value: Value) -> Self {
        wrap_path(path_segments(path), Self::Set(value))
    }

    /// `{"a": {"b": {"$unset": ["c"]}}}` from `"a.b.c"`.
    pub fn unset_path(path: &str) -> Self {
        let mut segments = path_segments(path);
        match segments.pop() {
            Some(last) => wrap_path(segments, Self::Unset(vec![last])),
            None => Self::Sequence(Vec::new()),
        }
    }

    /// Patch a single top-level field.
    pub fn field(name: impl Into<String>, patch: Patch) -> Self {
        let mut map = IndexMap::new();
        map.insert(name.into(), patch);
        Self::Nested(map)
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Patch) -> Self {
        let mut steps = match self {
            Self::Sequence(steps) => steps,
            other => vec![other],
        };
        match next {
            Self::Sequence(more) => steps.extend(more),
            other => steps.push(other),
        }
        Self::Sequence(steps)
    }

    // ── JSON notation ────────────────────────────────────────────────

    /// Parse the `$directive` notation. A JSON array is a sequence.
    pub fn from_json(value: &Value) -> Result<Self, PatchError> {
        match value {
            Value::Array(steps) => steps
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Sequence),
            Value::Object(map) => {
                let directives = map.keys().filter(|k| k.starts_with('$')).count();
                if directives == 0 {
                    map.iter()
                        .map(|(k, v)| Ok((k.clone(), Self::from_json(v)?)))
                        .collect::<Result<IndexMap<_, _>, PatchError>>()
                        .map(Self::Nested)
                } else if directives == map.len() {
                    let mut steps = map
                        .iter()
                        .map(|(k, v)| parse_directive(k, v))
                        .collect::<Result<Vec<_>, _>>()?;
                    if steps.len() == 1 {
                        Ok(steps.remove(0))
                    } else {
                        Ok(Self::Sequence(steps))
                    }
                } else {
                    Err(PatchError::Invalid(
                        "directives cannot be mixed with field names".into(),
                    ))
                }
            }
            other => Err(PatchError::Invalid(format!(
                "expected an object or array, got {other}"
            ))),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Set(v) => directive("$set", v.clone()),
            Self::Unset(keys) => directive("$unset", Value::from(keys.clone())),
            Self::Push(items) => directive("$push", Value::Array(items.clone())),
            Self::Unshift(items) => directive("$unshift", Value::Array(items.clone())),
            Self::Splice(ops) => directive(
                "$splice",
                Value::Array(
                    ops.iter()
                        .map(|op| {
                            let mut arr = vec![Value::from(op.start), Value::from(op.delete_count)];
                            arr.extend(op.items.iter().cloned());
                            Value::Array(arr)
                        })
                        .collect(),
                ),
            ),
            Self::Merge(map) => directive("$merge", Value::Object(map.clone())),
            Self::Nested(children) => Value::Object(
                children
                    .iter()
                    .map(|(k, p)| (k.clone(), p.to_json()))
                    .collect(),
            ),
            Self::Sequence(steps) => Value::Array(steps.iter().map(Self::to_json).collect()),
        }
    }

    // ── Application ──────────────────────────────────────────────────

    pub fn apply(&self, target: &Value) -> Result<Value, PatchError> {
        apply_at(self, target, "")
    }

    /// Apply to a typed entity by way of its JSON form.
    pub fn apply_to<T: Serialize + DeserializeOwned>(&self, entity: &T) -> Result<T, PatchError> {
        let value = serde_json::to_value(entity).map_err(|e| PatchError::Shape(e.to_string()))?;
        let patched = self.apply(&value)?;
        serde_json::from_value(patched).map_err(|e| PatchError::Shape(e.to_string()))
    }
}

impl FromStr for Patch {
    type Err = PatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: Value =
            serde_json::from_str(s).map_err(|e| PatchError::Invalid(e.to_string()))?;
        Self::from_json(&value)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────

fn path_segments(path: &str) -> Vec<String> {
    path.split('.')
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn wrap_path(segments: Vec<String>, leaf: Patch) -> Patch {
    segments
        .into_iter()
        .rev()
        .fold(leaf, |inner, key| Patch::field(key, inner))
}

fn directive(name: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(name.to_owned(), value);
    Value::Object(map)
}

fn parse_directive(name: &str, value: &Value) -> Result<Patch, PatchError> {
    let invalid = |what: &str| PatchError::Invalid(format!("{name} expects {what}"));
    match name {
        "$set" => Ok(Patch::Set(value.clone())),
        "$unset" => value
            .as_array()
            .ok_or_else(|| invalid("an array of keys"))?
            .iter()
            .map(|k| k.as_str().map(str::to_owned).ok_or_else(|| invalid("string keys")))
            .collect::<Result<Vec<_>, _>>()
            .map(Patch::Unset),
        "$push" => Ok(Patch::Push(
            value.as_array().ok_or_else(|| invalid("an array"))?.clone(),
        )),
        "$unshift" => Ok(Patch::Unshift(
            value.as_array().ok_or_else(|| invalid("an array"))?.clone(),
        )),
        "$merge" => Ok(Patch::Merge(
            value.as_object().ok_or_else(|| invalid("an object"))?.clone(),
        )),
        "$splice" => value
            .as_array()
            .ok_or_else(|| invalid("an array of [start, count, ...items]"))?
            .iter()
            .map(|op| {
                let arr = op
                    .as_array()
                    .ok_or_else(|| invalid("an array of [start, count, ...items]"))?;
                let start = arr
                    .first()
                    .and_then(Value::as_u64)
                    .ok_or_else(|| invalid("a non-negative start index"))?;
                let delete_count = arr.get(1).and_then(Value::as_u64).unwrap_or(0);
                Ok(Splice {
                    start: usize::try_from(start).unwrap_or(usize::MAX),
                    delete_count: usize::try_from(delete_count).unwrap_or(usize::MAX),
                    items: arr.iter().skip(2).cloned().collect(),
                })
            })
            .collect::<Result<Vec<_>, PatchError>>()
            .map(Patch::Splice),
        other => Err(PatchError::Invalid(format!("unknown directive {other}"))),
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_owned()
    } else {
        format!("{parent}.{key}")
    }
}

fn apply_at(patch: &Patch, target: &Value, path: &str) -> Result<Value, PatchError> {
    match patch {
        Patch::Set(v) => Ok(v.clone()),
        Patch::Unset(keys) => {
            let mut obj = target.as_object().cloned().ok_or_else(|| PatchError::NotAnObject {
                directive: "$unset",
                path: path.to_owned(),
            })?;
            for key in keys {
                obj.remove(key);
            }
            Ok(Value::Object(obj))
        }
        Patch::Push(items) => {
            let mut arr = array_target(target, "$push", path)?;
            arr.extend(items.iter().cloned());
            Ok(Value::Array(arr))
        }
        Patch::Unshift(items) => {
            let arr = array_target(target, "$unshift", path)?;
            Ok(Value::Array(items.iter().cloned().chain(arr).collect()))
        }
        Patch::Splice(ops) => {
            let mut arr = array_target(target, "$splice", path)?;
            for op in ops {
                let start = op.start.min(arr.len());
                let end = start.saturating_add(op.delete_count).min(arr.len());
                arr.splice(start..end, op.items.iter().cloned());
            }
            Ok(Value::Array(arr))
        }
        Patch::Merge(fields) => {
            let mut obj = target.as_object().cloned().ok_or_else(|| PatchError::NotAnObject {
                directive: "$merge",
                path: path.to_owned(),
            })?;
            for (k, v) in fields {
                obj.insert(k.clone(), v.clone());
            }
            Ok(Value::Object(obj))
        }
        Patch::Nested(children) => match target {
            Value::Object(obj) => {
                let mut next = obj.clone();
                for (key, child) in children {
                    let here = child_path(path, key);
                    let value = match (obj.get(key), child) {
                        (Some(current), _) => apply_at(child, current, &here)?,
                        (None, Patch::Set(v)) => v.clone(),
                        (None, _) => return Err(PatchError::MissingTarget { path: here }),
                    };
                    next.insert(key.clone(), value);
                }
                Ok(Value::Object(next))
            }
            Value::Array(arr) => {
                let mut next = arr.clone();
                for (key, child) in children {
                    let here = child_path(path, key);
                    let slot = key
                        .parse::<usize>()
                        .ok()
                        .and_then(|i| next.get_mut(i))
                        .ok_or_else(|| PatchError::IndexOutOfRange {
                            path: here.clone(),
                            index: key.clone(),
                            len: arr.len(),
                        })?;
                    *slot = apply_at(child, slot, &here)?;
                }
                Ok(Value::Array(next))
            }
            _ => Err(PatchError::MissingTarget {
                path: path.to_owned(),
            }),
        },
        Patch::Sequence(steps) => steps
            .iter()
            .try_fold(target.clone(), |acc, step| apply_at(step, &acc, path)),
    }
}

fn array_target(
    target: &Value,
    directive: &'static str,
    path: &str,
) -> Result<Vec<Value>, PatchError> {
    target
        .as_array()
        .cloned()
        .ok_or_else(|| PatchError::NotAnArray {
            directive,
            path: path.to_owned(),
        })
}
