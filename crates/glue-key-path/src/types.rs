//! Type definitions for key paths.

use std::fmt;

use serde_json::Value;

/// Derived properties that a key path may end in.
///
/// The set is closed: `length` of a sequence is the only one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComputedProperty {
    Length,
}

impl ComputedProperty {
    /// Look up a computed property by the name used after `#`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "length" => Some(ComputedProperty::Length),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ComputedProperty::Length => "length",
        }
    }

    /// Derive the property from `node`.
    ///
    /// Returns `None` when the node has no such property (e.g. the length of
    /// an object).
    pub fn derive(self, node: &Value) -> Option<Value> {
        match (self, node) {
            (ComputedProperty::Length, Value::Array(arr)) => Some(Value::from(arr.len())),
            _ => None,
        }
    }
}

/// A step in a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Descend into an object by name: `a`, `a.b`.
    Property(String),
    /// Descend into an array by position: `[0]`.
    Index(usize),
    /// Any index of the array reached so far: `[]`. Listener patterns only.
    Wildcard,
    /// Derived property of the node reached so far: `#length`.
    Computed(ComputedProperty),
}

impl Segment {
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_descent(&self) -> bool {
        matches!(self, Segment::Property(_) | Segment::Index(_))
    }
}

/// A parsed key path.
///
/// `Display` renders the canonical form, the same string that
/// [`normalize_keys`](crate::normalize_keys) produces for the key the path
/// was parsed from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<Segment>,
}

impl KeyPath {
    /// The empty path, addressing the root of the target.
    pub fn root() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Whether the path ends in a computed property.
    pub fn is_computed(&self) -> bool {
        matches!(self.last(), Some(Segment::Computed(_)))
    }

    /// Whether the path ends in the `[]` element marker.
    pub fn is_element_pattern(&self) -> bool {
        matches!(self.last(), Some(Segment::Wildcard))
    }

    pub fn computed_property(&self) -> Option<ComputedProperty> {
        match self.last() {
            Some(Segment::Computed(prop)) => Some(*prop),
            _ => None,
        }
    }

    /// Segments that walk the graph, i.e. everything except a trailing
    /// `[]` or `#computed` marker.
    pub fn base(&self) -> &[Segment] {
        match self.last() {
            Some(Segment::Computed(_)) | Some(Segment::Wildcard) => {
                &self.segments[..self.segments.len() - 1]
            }
            _ => &self.segments,
        }
    }

    /// All but the final segment. `None` for the root path.
    pub fn parent(&self) -> Option<&[Segment]> {
        if self.segments.is_empty() {
            return None;
        }
        Some(&self.segments[..self.segments.len() - 1])
    }

    /// Whether the path contains an element marker anywhere.
    pub fn has_wildcard(&self) -> bool {
        self.segments.iter().any(|s| matches!(s, Segment::Wildcard))
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl From<Vec<Segment>> for KeyPath {
    fn from(segments: Vec<Segment>) -> Self {
        Self::new(segments)
    }
}

impl From<&[Segment]> for KeyPath {
    fn from(segments: &[Segment]) -> Self {
        Self::new(segments.to_vec())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_segments(&self.segments))
    }
}

/// Render segments in canonical form: `a.b[0].c`, `[2]`, `arr[]`,
/// `arr.length`.
pub fn format_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Property(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            Segment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            Segment::Wildcard => out.push_str("[]"),
            Segment::Computed(prop) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(prop.name());
            }
        }
    }
    out
}

/// A listener pattern: either everything (`*`) or a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Pattern {
    Any,
    Path(KeyPath),
}

impl Pattern {
    pub fn as_path(&self) -> Option<&KeyPath> {
        match self {
            Pattern::Any => None,
            Pattern::Path(path) => Some(path),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Any => f.write_str("*"),
            Pattern::Path(path) => path.fmt(f),
        }
    }
}

/// The result of resolving a key path against a target.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference<'a> {
    /// The node holding the slot, or the node a computed property is
    /// derived from. `None` only for the root path.
    pub container: Option<&'a Value>,
    /// The final segment of the path. `None` only for the root path.
    pub segment: Option<&'a Segment>,
    /// The current value. `None` if the slot is empty.
    pub value: Option<Value>,
}

impl Reference<'_> {
    pub fn is_array_reference(&self) -> bool {
        matches!(self.container, Some(Value::Array(_)))
    }

    pub fn is_object_reference(&self) -> bool {
        matches!(self.container, Some(Value::Object(_)))
    }

    /// The index of the slot, if it is an array element.
    pub fn index(&self) -> Option<usize> {
        if !self.is_array_reference() {
            return None;
        }
        self.segment.and_then(Segment::as_index)
    }
}
