// Copyright (c) 2025 Platform Engineering
// SPDX-License-Identifier: MIT

//! The JSON-Patch subset accepted from mutating admission webhooks:
//! `add`, `replace`, `remove`, with paths rooted at `/spec`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::PatchError;

/// One patch operation as returned by a mutating webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonPatchOp {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

/// Apply a sequence of patches to `spec` in order. `apply_patches(spec, [])`
/// returns `spec` unchanged.
pub fn apply_patches(spec: &Value, patches: &[JsonPatchOp]) -> Result<Value, PatchError> {
    let mut result = spec.clone();
    for patch in patches {
        apply_one(&mut result, patch)?;
    }
    Ok(result)
}

fn strip_prefix(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Err(PatchError::EmptyPath);
    }
    let trimmed = path.strip_prefix('/').ok_or(PatchError::EmptyPath)?;
    let trimmed = trimmed.strip_prefix("spec/").unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    Ok(trimmed.split('/').map(unescape_segment).collect())
}

fn unescape_segment(segment: &str) -> String {
    segment.replace("~1", "/").replace("~0", "~")
}

fn apply_one(root: &mut Value, patch: &JsonPatchOp) -> Result<(), PatchError> {
    let segments = strip_prefix(&patch.path)?;
    if segments.is_empty() {
        return Err(PatchError::EmptyPath);
    }
    match patch.op.as_str() {
        "add" | "replace" => {
            let value = patch.value.clone().unwrap_or(Value::Null);
            set_at(root, &segments, value)
        }
        "remove" => remove_at(root, &segments),
        other => Err(PatchError::UnsupportedOp(other.to_string())),
    }
}

/// Walk to the object that directly contains the final path segment,
/// rejecting array parents explicitly rather than guessing at index
/// semantics (see the open question in the design notes).
fn navigate_to_parent<'a>(
    root: &'a mut Value,
    segments: &[String],
) -> Result<&'a mut serde_json::Map<String, Value>, PatchError> {
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        current = match current {
            Value::Object(map) => map
                .get_mut(segment)
                .ok_or_else(|| PatchError::MissingIntermediateKey(segment.clone()))?,
            Value::Array(_) => return Err(PatchError::ArrayIndexUnsupported),
            _ => return Err(PatchError::MissingIntermediateKey(segment.clone())),
        };
    }
    match current {
        Value::Object(map) => Ok(map),
        Value::Array(_) => Err(PatchError::ArrayIndexUnsupported),
        _ => Err(PatchError::MissingIntermediateKey(
            segments[segments.len() - 2].clone(),
        )),
    }
}

fn set_at(root: &mut Value, segments: &[String], value: Value) -> Result<(), PatchError> {
    if matches!(root, Value::Null) {
        *root = Value::Object(serde_json::Map::new());
    }
    let last = segments.last().expect("non-empty segments");
    let parent = navigate_to_parent(root, segments)?;
    parent.insert(last.clone(), value);
    Ok(())
}

fn remove_at(root: &mut Value, segments: &[String]) -> Result<(), PatchError> {
    let last = segments.last().expect("non-empty segments");
    let parent = navigate_to_parent(root, segments)?;
    if parent.remove(last).is_none() {
        return Err(PatchError::RemoveMissingKey(last.clone()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod patch_tests;
