//! Last known values of computed paths.

use glue_key_path::{computed_value, is_related, KeyPath, Segment};
use indexmap::IndexMap;
use serde_json::Value;

use crate::message::ChangeMessage;

/// Cache of computed values, keyed by canonical path (`"arr.length"`).
///
/// Only paths with a registered listener get an entry. Entries are created
/// at registration and updated by every mutation on a related path.
#[derive(Debug, Default, Clone)]
pub struct ComputedCache {
    values: IndexMap<String, Value>,
}

/// A computed value captured before a mutation.
#[derive(Debug)]
pub(crate) struct Pending {
    key: String,
    path: KeyPath,
    before: Value,
}

/// A computed value that differs after a mutation.
#[derive(Debug)]
pub(crate) struct Change {
    pub(crate) key: String,
    pub(crate) message: ChangeMessage,
}

impl ComputedCache {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    /// Record the current value of `path` unless `key` is already known.
    pub(crate) fn baseline(&mut self, key: &str, path: &KeyPath, target: &Value) {
        if !self.values.contains_key(key) {
            self.values.insert(key.to_string(), computed_value(target, path));
        }
    }

    /// Recompute every known key against a new target.
    pub(crate) fn rebaseline<'a>(
        &mut self,
        paths: impl IntoIterator<Item = (&'a str, &'a KeyPath)>,
        target: &Value,
    ) {
        for (key, path) in paths {
            self.values.insert(key.to_string(), computed_value(target, path));
        }
    }

    /// Capture the values of computed paths that a mutation at `mutated`
    /// may change.
    pub(crate) fn capture<'a>(
        &self,
        paths: impl IntoIterator<Item = (&'a str, &'a KeyPath)>,
        mutated: &[Segment],
        target: &Value,
    ) -> Vec<Pending> {
        paths
            .into_iter()
            .filter(|(_, path)| is_related(path.base(), mutated))
            .map(|(key, path)| Pending {
                key: key.to_string(),
                path: path.clone(),
                before: self
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| computed_value(target, path)),
            })
            .collect()
    }

    /// Store post-mutation values and return those that changed.
    pub(crate) fn reconcile(&mut self, pending: Vec<Pending>, target: &Value) -> Vec<Change> {
        let mut changes = Vec::new();
        for Pending { key, path, before } in pending {
            let after = computed_value(target, &path);
            self.values.insert(key.clone(), after.clone());
            if after != before {
                changes.push(Change {
                    key,
                    message: ChangeMessage::update(before, after),
                });
            }
        }
        changes
    }
}
