//! Key normalization.

/// The computed-property indicator.
pub const COMPUTED_INDICATOR: char = '#';

/// Separator between sub-keys of a multi-key.
pub const KEY_SEPARATOR: char = ',';

/// Result of [`normalize_keys`]: one canonical key, or the ordered list of
/// canonical sub-keys when the input was a comma-separated multi-key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedKeys {
    Single(String),
    Multi(Vec<String>),
}

impl NormalizedKeys {
    pub fn len(&self) -> usize {
        match self {
            NormalizedKeys::Single(_) => 1,
            NormalizedKeys::Multi(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, NormalizedKeys::Multi(_))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        match self {
            NormalizedKeys::Single(key) => std::slice::from_ref(key).iter(),
            NormalizedKeys::Multi(keys) => keys.iter(),
        }
    }

    pub fn into_vec(self) -> Vec<String> {
        match self {
            NormalizedKeys::Single(key) => vec![key],
            NormalizedKeys::Multi(keys) => keys,
        }
    }
}

impl PartialEq<&str> for NormalizedKeys {
    fn eq(&self, other: &&str) -> bool {
        matches!(self, NormalizedKeys::Single(key) if key == other)
    }
}

impl PartialEq<[&str; 2]> for NormalizedKeys {
    fn eq(&self, other: &[&str; 2]) -> bool {
        match self {
            NormalizedKeys::Multi(keys) => {
                keys.len() == other.len() && keys.iter().zip(other).all(|(k, o)| k == o)
            }
            NormalizedKeys::Single(_) => false,
        }
    }
}

/// Normalize a raw key (or comma-separated list of keys).
///
/// Whitespace is removed and the computed-property indicator is dropped,
/// keeping the property name it prefixes.
///
/// # Example
///
/// ```
/// use glue_key_path::{normalize_keys, NormalizedKeys};
///
/// assert_eq!(normalize_keys("fi.#fi.   fum()"), NormalizedKeys::Single("fi.fi.fum()".into()));
/// assert_eq!(
///     normalize_keys("fi.#fi, fum()"),
///     NormalizedKeys::Multi(vec!["fi.fi".into(), "fum()".into()])
/// );
/// assert_eq!(normalize_keys("arr#length"), NormalizedKeys::Single("arr.length".into()));
/// ```
pub fn normalize_keys(raw: &str) -> NormalizedKeys {
    let mut keys: Vec<String> = split_keys(raw).iter().map(|k| canonicalize_key(k)).collect();
    if keys.len() == 1 {
        NormalizedKeys::Single(keys.remove(0))
    } else {
        NormalizedKeys::Multi(keys)
    }
}

/// Split a raw key into whitespace-free sub-keys.
///
/// Unlike [`normalize_keys`] the computed indicator is kept, so each
/// sub-key can still be parsed.
pub fn split_keys(raw: &str) -> Vec<String> {
    strip_whitespace(raw)
        .split(KEY_SEPARATOR)
        .map(str::to_string)
        .collect()
}

/// Canonical form of a single key.
///
/// `#` is dropped at the start of the key or after a `.`, and replaced by
/// `.` anywhere else: `arr#length` and `arr.#length` both become
/// `arr.length`.
pub fn canonicalize_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        if c.is_whitespace() {
            continue;
        }
        if c == COMPUTED_INDICATOR {
            if !out.is_empty() && !out.ends_with('.') {
                out.push('.');
            }
            continue;
        }
        out.push(c);
    }
    out
}

pub(crate) fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}
