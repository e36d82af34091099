use serde_json::Value;

use crate::types::Segment;

/// Get a value from a target by segments.
///
/// Returns `None` if the path doesn't exist or contains a marker segment.
pub fn get<'a>(val: &'a Value, segments: &[Segment]) -> Option<&'a Value> {
    let mut current = val;
    for segment in segments {
        current = match (segment, current) {
            (Segment::Property(name), Value::Object(map)) => map.get(name)?,
            (Segment::Index(idx), Value::Array(arr)) => arr.get(*idx)?,
            _ => return None,
        };
    }
    Some(current)
}

