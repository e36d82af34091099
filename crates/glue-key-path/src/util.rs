use crate::types::Segment;

/// Check if `parent` is a strict prefix of `child`.
pub fn is_child(parent: &[Segment], child: &[Segment]) -> bool {
    parent.len() < child.len() && child.starts_with(parent)
}

/// Check if two paths lie on one branch: equal, or one a prefix of the
/// other.
pub fn is_related(a: &[Segment], b: &[Segment]) -> bool {
    a == b || is_child(a, b) || is_child(b, a)
}

