//! Key-path utilities for glue.
//!
//! A key path addresses a piece of a JSON target with a small grammar:
//!
//! - `name`, `a.b.c` - property access, nested with dots;
//! - `name[n]`, `a[0].b[2]` - array indexing;
//! - `*` - every key (listener patterns only);
//! - `[]`, `name[]` - any element of the root or named array;
//! - `name#length` - a computed property of the named node;
//! - `a, b, c` - several keys at once. Whitespace is ignored everywhere.
//!
//! # Example
//!
//! ```
//! use glue_key_path::{find, normalize_keys, KeyPathParser, Segment};
//!
//! assert_eq!(normalize_keys("v1, v2").into_vec(), vec!["v1", "v2"]);
//!
//! let path = KeyPathParser::parse("a[0].b").unwrap();
//! assert_eq!(path.segments()[1], Segment::Index(0));
//! assert_eq!(path.to_string(), "a[0].b");
//!
//! let doc = serde_json::json!({"a": [{"b": 42}]});
//! let found = find(&doc, &path).unwrap();
//! assert_eq!(found.value, Some(serde_json::json!(42)));
//! ```

use thiserror::Error;

pub mod types;
pub use types::{format_segments, ComputedProperty, KeyPath, Pattern, Reference, Segment};

mod normalize;
pub use normalize::{
    canonicalize_key, normalize_keys, split_keys, NormalizedKeys, COMPUTED_INDICATOR,
    KEY_SEPARATOR,
};

mod parser;
pub use parser::KeyPathParser;

mod find;
pub use find::{computed_value, find, find_mut, find_parent_mut, kind_of};

mod get;
pub use get::get;

mod util;
pub use util::{is_child, is_related};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyPathError {
    #[error("invalid key path `{key}`: {reason}")]
    InvalidSyntax { key: String, reason: &'static str },
    #[error("missing intermediate node `{path}`")]
    MissingIntermediateNode { path: String },
    #[error("type mismatch at `{path}`: expected {expected}, found {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl KeyPathError {
    pub fn syntax(key: impl Into<String>, reason: &'static str) -> Self {
        KeyPathError::InvalidSyntax {
            key: key.into(),
            reason,
        }
    }
}
