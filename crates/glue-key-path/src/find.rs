use serde_json::Value;

use crate::types::{format_segments, KeyPath, Reference, Segment};
use crate::KeyPathError;

/// Resolve a key path against a target.
///
/// Every intermediate node must exist; the final slot may be empty, in
/// which case `value` is `None`. For computed paths the container is the
/// node the property is derived from and `value` is the derived value.
pub fn find<'a>(target: &'a Value, path: &'a KeyPath) -> Result<Reference<'a>, KeyPathError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Ok(Reference {
            container: None,
            segment: None,
            value: Some(target.clone()),
        });
    };

    if let Segment::Computed(prop) = last {
        let node = walk(target, parents)?;
        return Ok(Reference {
            container: Some(node),
            segment: Some(last),
            value: prop.derive(node),
        });
    }

    let container = walk(target, parents)?;
    let value = match (last, container) {
        (Segment::Property(name), Value::Object(map)) => map.get(name).cloned(),
        (Segment::Index(idx), Value::Array(arr)) => arr.get(*idx).cloned(),
        (Segment::Wildcard, _) => {
            return Err(KeyPathError::syntax(path.to_string(), "`[]` cannot be resolved"))
        }
        (segment, node) => return Err(mismatch(segments, segment, node)),
    };

    Ok(Reference {
        container: Some(container),
        segment: Some(last),
        value,
    })
}

/// Mutable access to the node holding the final slot of `path`, together
/// with the final segment.
///
/// The container's kind is checked against the segment, so a caller that
/// receives `Ok` can write without further validation.
pub fn find_parent_mut<'a, 'p>(
    target: &'a mut Value,
    path: &'p KeyPath,
) -> Result<(&'a mut Value, &'p Segment), KeyPathError> {
    let segments = path.segments();
    let Some((last, parents)) = segments.split_last() else {
        return Err(KeyPathError::syntax("", "the root has no parent"));
    };
    if !last.is_descent() || path.has_wildcard() {
        return Err(KeyPathError::syntax(
            path.to_string(),
            "only property and index segments can be written",
        ));
    }

    let container = walk_mut(target, parents)?;
    let writable = matches!(
        (last, &*container),
        (Segment::Property(_), Value::Object(_)) | (Segment::Index(_), Value::Array(_))
    );
    if !writable {
        return Err(mismatch(segments, last, container));
    }
    Ok((container, last))
}

/// Mutable access to the node addressed by `segments`, which must exist.
pub fn find_mut<'a>(target: &'a mut Value, segments: &[Segment]) -> Result<&'a mut Value, KeyPathError> {
    walk_mut(target, segments)
}

/// Derived value of a computed path, `null` when the base node is missing
/// or has no such property.
pub fn computed_value(target: &Value, path: &KeyPath) -> Value {
    let Some(prop) = path.computed_property() else {
        return Value::Null;
    };
    crate::get(target, path.base())
        .and_then(|node| prop.derive(node))
        .unwrap_or(Value::Null)
}

pub(crate) fn walk<'a>(target: &'a Value, segments: &[Segment]) -> Result<&'a Value, KeyPathError> {
    let mut current = target;
    for (step, segment) in segments.iter().enumerate() {
        let next = match (segment, current) {
            (Segment::Property(name), Value::Object(map)) => map.get(name),
            (Segment::Index(idx), Value::Array(arr)) => arr.get(*idx),
            (segment, node) => return Err(mismatch(&segments[..=step], segment, node)),
        };
        current = next.ok_or_else(|| KeyPathError::MissingIntermediateNode {
            path: format_segments(&segments[..=step]),
        })?;
    }
    Ok(current)
}

fn walk_mut<'a>(target: &'a mut Value, segments: &[Segment]) -> Result<&'a mut Value, KeyPathError> {
    let mut current = target;
    for (step, segment) in segments.iter().enumerate() {
        let next = match (segment, current) {
            (Segment::Property(name), Value::Object(map)) => map.get_mut(name),
            (Segment::Index(idx), Value::Array(arr)) => arr.get_mut(*idx),
            (segment, node) => return Err(mismatch(&segments[..=step], segment, node)),
        };
        current = next.ok_or_else(|| KeyPathError::MissingIntermediateNode {
            path: format_segments(&segments[..=step]),
        })?;
    }
    Ok(current)
}

fn mismatch(path: &[Segment], segment: &Segment, node: &Value) -> KeyPathError {
    let expected = match segment {
        Segment::Index(_) | Segment::Wildcard => "array",
        _ => "object",
    };
    KeyPathError::TypeMismatch {
        path: format_segments(path),
        expected,
        found: kind_of(node),
    }
}

/// Name of a value's JSON kind, as used in error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
