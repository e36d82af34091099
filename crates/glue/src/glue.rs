use std::fmt;

use glue_key_path::{
    find, find_mut, find_parent_mut, format_segments, kind_of, normalize_keys, split_keys, KeyPath,
    KeyPathError, KeyPathParser, NormalizedKeys, Pattern, Segment,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::computed::{Change, ComputedCache, Pending};
use crate::error::GlueError;
use crate::listener::{Delivery, Hit, ListenerRegistry, Receiver, Registration};
use crate::message::ChangeMessage;
use crate::options::GlueOptions;

/// A JSON target together with the listeners observing it.
///
/// Every mutation goes through this type: it writes the target in place,
/// then synchronously notifies the matching listeners in registration
/// order.
pub struct Glue {
    target: Value,
    listeners: ListenerRegistry,
    computed: ComputedCache,
    options: GlueOptions,
    depth: usize,
}

impl Glue {
    pub fn new(target: Value) -> Self {
        Self::with_options(target, GlueOptions::default())
    }

    pub fn with_options(target: Value, options: GlueOptions) -> Self {
        Self {
            target,
            listeners: ListenerRegistry::default(),
            computed: ComputedCache::default(),
            options,
            depth: 0,
        }
    }

    /// See [`glue_key_path::normalize_keys`].
    pub fn normalize_keys(raw: &str) -> NormalizedKeys {
        normalize_keys(raw)
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    pub fn options(&self) -> &GlueOptions {
        &self.options
    }

    /// Swap in a new target without notifying anyone. Listeners stay
    /// registered and cached computed values are recomputed.
    pub fn replace_target(&mut self, target: Value) -> Value {
        debug!(kind = kind_of(&target), "replacing target");
        let old = std::mem::replace(&mut self.target, target);
        self.computed
            .rebaseline(self.listeners.computed_paths(), &self.target);
        old
    }

    pub fn into_target(self) -> Value {
        self.target
    }

    /// Last known value of a computed path, by canonical key
    /// (`"arr.length"`).
    pub fn computed_value(&self, key: &str) -> Option<&Value> {
        self.computed.get(key)
    }

    pub fn computed_cache(&self) -> &ComputedCache {
        &self.computed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ------------------------------------------------------------ listeners

    /// Register a listener. A multi-key pattern (`"v1, v2"`) registers one
    /// entry per sub-key, all sharing the scope and callback.
    pub fn add_listener(&mut self, registration: Registration) -> Result<&mut Self, GlueError> {
        let (raw, scope, callback) = registration.into_parts();
        let raw = raw.as_deref().unwrap_or("*");
        let patterns = split_keys(raw)
            .iter()
            .map(|key| KeyPathParser::parse_pattern(key))
            .collect::<Result<Vec<_>, _>>()?;

        for pattern in &patterns {
            if let Pattern::Path(path) = pattern {
                self.check_element_pattern(path)?;
            }
        }

        let count = patterns.len();
        for pattern in patterns {
            if let Pattern::Path(path) = &pattern {
                if path.is_computed() {
                    self.computed
                        .baseline(&path.to_string(), path, &self.target);
                }
            }
            self.listeners.add(pattern, scope.clone(), callback.clone());
        }
        debug!(pattern = raw, entries = count, "registered listener");
        Ok(self)
    }

    /// Alias of [`Glue::add_listener`].
    pub fn add_observer(&mut self, registration: Registration) -> Result<&mut Self, GlueError> {
        self.add_listener(registration)
    }

    /// Drop every listener and every cached computed value.
    pub fn reset_listeners(&mut self) -> &mut Self {
        debug!(entries = self.listeners.len(), "resetting listeners");
        self.listeners.clear();
        self.computed.clear();
        self
    }

    fn check_element_pattern(&self, path: &KeyPath) -> Result<(), GlueError> {
        if !path.is_element_pattern() {
            return Ok(());
        }
        match glue_key_path::get(&self.target, path.base()) {
            Some(node) if !node.is_array() => Err(KeyPathError::TypeMismatch {
                path: format_segments(path.base()),
                expected: "array",
                found: kind_of(node),
            }
            .into()),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------ mutations

    /// Write `value` at `key`. A multi-key writes the same value at every
    /// sub-key in order, each with its own dispatch round.
    pub fn set(&mut self, key: &str, value: Value) -> Result<&mut Self, GlueError> {
        self.check_depth()?;
        let paths = split_keys(key)
            .iter()
            .map(|k| writable_path(k))
            .collect::<Result<Vec<_>, _>>()?;
        for path in &paths {
            self.set_path(path, value.clone())?;
        }
        Ok(self)
    }

    fn set_path(&mut self, path: &KeyPath, value: Value) -> Result<(), GlueError> {
        trace!(key = %path, "set");
        let (old_value, index) = {
            let reference = find(&self.target, path)?;
            let index = reference.index();
            (reference.value, index)
        };
        let allowed_gap = self.options.allowed_gap();
        let pending = self.capture_computed(path.segments());

        let (container, last) = find_parent_mut(&mut self.target, path)?;
        match (container, last) {
            (Value::Object(map), Segment::Property(name)) => {
                map.insert(name.clone(), value.clone());
            }
            (Value::Array(arr), Segment::Index(idx)) => {
                let idx = *idx;
                if idx < arr.len() {
                    arr[idx] = value.clone();
                } else {
                    if idx - arr.len() > allowed_gap {
                        let mut gap = path.parent().unwrap_or_default().to_vec();
                        gap.push(Segment::Index(arr.len()));
                        return Err(KeyPathError::MissingIntermediateNode {
                            path: format_segments(&gap),
                        }
                        .into());
                    }
                    arr.resize(idx, Value::Null);
                    arr.push(value.clone());
                }
            }
            (node, _) => {
                return Err(KeyPathError::TypeMismatch {
                    path: path.to_string(),
                    expected: "object or array",
                    found: kind_of(node),
                }
                .into())
            }
        }

        let changes = self.reconcile_computed(pending);
        let sequence = index.and(path.parent());
        let message = ChangeMessage::set(old_value, value).with_index(index);
        let round = self.listeners.matching(path.segments(), sequence);
        self.deliver(round.into_iter().map(|d| (d, &message)));
        self.deliver_computed(changes);
        Ok(())
    }

    /// Append `value` to the root array.
    pub fn push(&mut self, value: Value) -> Result<&mut Self, GlueError> {
        self.check_depth()?;
        self.push_path(&KeyPath::root(), value)?;
        Ok(self)
    }

    /// Append `value` to the array at `key`.
    pub fn push_to(&mut self, key: &str, value: Value) -> Result<&mut Self, GlueError> {
        self.check_depth()?;
        let path = writable_path(key)?;
        self.push_path(&path, value)?;
        Ok(self)
    }

    fn push_path(&mut self, path: &KeyPath, value: Value) -> Result<(), GlueError> {
        trace!(key = %path, "push");
        let pending = self.capture_computed(path.segments());

        let arr = sequence_mut(&mut self.target, path)?;
        arr.push(value.clone());
        let index = arr.len() - 1;

        let changes = self.reconcile_computed(pending);
        let slot = path.child(Segment::Index(index));
        let round = self.listeners.matching(slot.segments(), Some(path.segments()));
        let element = ChangeMessage::push(value).with_index(Some(index));
        let collection = round
            .iter()
            .any(|d| d.hit == Hit::Collection)
            .then(|| ChangeMessage::push(self.node_at(path)));
        self.deliver(round.into_iter().map(|d| {
            let message = match (d.hit, &collection) {
                (Hit::Collection, Some(message)) => message,
                _ => &element,
            };
            (d, message)
        }));
        self.deliver_computed(changes);
        Ok(())
    }

    /// Remove the value at `key` and return it.
    ///
    /// Array elements are spliced out, object entries deleted. An empty
    /// slot is not an error: nothing is removed, listeners are still
    /// notified, and `None` is returned.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>, GlueError> {
        self.check_depth()?;
        let path = writable_path(key)?;
        trace!(key = %path, "remove");
        let (removed, index) = {
            let reference = find(&self.target, &path)?;
            let index = reference.index();
            (reference.value, index)
        };
        // Splicing shifts every later sibling, so computed paths anywhere
        // under the sequence may change.
        let affected = match index {
            Some(_) => path.parent().unwrap_or_default(),
            None => path.segments(),
        };
        let pending = self.capture_computed(affected);

        let (container, last) = find_parent_mut(&mut self.target, &path)?;
        match (container, last) {
            (Value::Object(map), Segment::Property(name)) => {
                map.shift_remove(name);
            }
            (Value::Array(arr), Segment::Index(idx)) => {
                if *idx < arr.len() {
                    arr.remove(*idx);
                }
            }
            (node, _) => {
                return Err(KeyPathError::TypeMismatch {
                    path: path.to_string(),
                    expected: "object or array",
                    found: kind_of(node),
                }
                .into())
            }
        }

        let changes = self.reconcile_computed(pending);
        let sequence = index.and(path.parent());
        let message = ChangeMessage::remove(removed.clone()).with_index(index);
        let round = self.listeners.matching(path.segments(), sequence);
        self.deliver(round.into_iter().map(|d| (d, &message)));
        self.deliver_computed(changes);
        Ok(removed)
    }

    /// Keep only the elements of the root array for which `predicate`
    /// returns `true`.
    pub fn filter<F>(&mut self, predicate: F) -> Result<&mut Self, GlueError>
    where
        F: FnMut(&Value) -> bool,
    {
        self.check_depth()?;
        self.filter_path(&KeyPath::root(), predicate)?;
        Ok(self)
    }

    /// Keep only the elements of the array at `key` for which `predicate`
    /// returns `true`.
    pub fn filter_at<F>(&mut self, key: &str, predicate: F) -> Result<&mut Self, GlueError>
    where
        F: FnMut(&Value) -> bool,
    {
        self.check_depth()?;
        let path = writable_path(key)?;
        self.filter_path(&path, predicate)?;
        Ok(self)
    }

    fn filter_path<F>(&mut self, path: &KeyPath, mut predicate: F) -> Result<(), GlueError>
    where
        F: FnMut(&Value) -> bool,
    {
        trace!(key = %path, "filter");
        let pending = self.capture_computed(path.segments());

        let arr = sequence_mut(&mut self.target, path)?;
        let before = arr.clone();
        let mut removed = Vec::new();
        let mut position = 0;
        arr.retain(|item| {
            let keep = predicate(item);
            if !keep {
                removed.push((position, item.clone()));
            }
            position += 1;
            keep
        });
        if removed.is_empty() {
            return Ok(());
        }

        let changes = self.reconcile_computed(pending);
        for (index, item) in removed {
            let slot = path.child(Segment::Index(index));
            let message = ChangeMessage::remove(Some(item)).with_index(Some(index));
            let round = self.listeners.matching(slot.segments(), Some(path.segments()));
            self.deliver(
                round
                    .into_iter()
                    .filter(|d| d.hit != Hit::Collection)
                    .map(|d| (d, &message)),
            );
        }

        let message = ChangeMessage::filter(Value::Array(before), self.node_at(path));
        let round = self.listeners.matching(path.segments(), None);
        self.deliver(
            round
                .into_iter()
                .filter(|d| d.hit == Hit::Exact)
                .map(|d| (d, &message)),
        );
        self.deliver_computed(changes);
        Ok(())
    }

    // ------------------------------------------------------------ dispatch

    fn check_depth(&self) -> Result<(), GlueError> {
        if self.depth > self.options.max_dispatch_depth {
            return Err(GlueError::ReentrancyLimit { depth: self.depth });
        }
        Ok(())
    }

    fn capture_computed(&self, mutated: &[Segment]) -> Vec<Pending> {
        self.computed
            .capture(self.listeners.computed_paths(), mutated, &self.target)
    }

    fn reconcile_computed(&mut self, pending: Vec<Pending>) -> Vec<Change> {
        self.computed.reconcile(pending, &self.target)
    }

    fn node_at(&self, path: &KeyPath) -> Value {
        glue_key_path::get(&self.target, path.segments())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn deliver<'m>(&mut self, round: impl IntoIterator<Item = (Delivery, &'m ChangeMessage)>) {
        let round: Vec<_> = round.into_iter().collect();
        trace!(
            operation = ?round.first().map(|(_, m)| m.operation),
            listeners = round.len(),
            "dispatching"
        );
        for (delivery, message) in round {
            let Ok(mut callback) = delivery.callback.try_borrow_mut() else {
                warn!(
                    operation = ?message.operation,
                    depth = self.depth,
                    "listener is already running; skipping nested notification"
                );
                continue;
            };
            self.depth += 1;
            let mut receiver = Receiver::new(self, delivery.scope);
            (&mut *callback)(&mut receiver, message);
            self.depth -= 1;
        }
    }

    fn deliver_computed(&mut self, changes: Vec<Change>) {
        for change in changes {
            let round = self.listeners.matching_computed(&change.key);
            self.deliver(round.into_iter().map(|d| (d, &change.message)));
        }
    }
}

impl fmt::Debug for Glue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Glue")
            .field("target", &self.target)
            .field("listeners", &self.listeners)
            .field("computed", &self.computed)
            .field("options", &self.options)
            .finish()
    }
}

/// Parse a key used for writing: no `*`, `[]` or computed suffix.
fn writable_path(key: &str) -> Result<KeyPath, KeyPathError> {
    let path = KeyPathParser::parse(key)?;
    if path.is_computed() || path.has_wildcard() {
        return Err(KeyPathError::syntax(
            path.to_string(),
            "only property and index segments can be written",
        ));
    }
    Ok(path)
}

fn sequence_mut<'a>(target: &'a mut Value, path: &KeyPath) -> Result<&'a mut Vec<Value>, KeyPathError> {
    match find_mut(target, path.segments())? {
        Value::Array(arr) => Ok(arr),
        node => Err(KeyPathError::TypeMismatch {
            path: path.to_string(),
            expected: "array",
            found: kind_of(node),
        }),
    }
}
