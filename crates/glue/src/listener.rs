//! Listener registration and matching.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use glue_key_path::{KeyPath, Pattern, Segment};
use serde_json::Value;

use crate::message::ChangeMessage;
use crate::Glue;

/// An explicit receiver object bound to a listener.
///
/// The caller keeps a clone of the handle to read what the callback wrote.
pub type Scope = Rc<RefCell<Value>>;

/// Listener callback. Invoked with the bound receiver and the message.
pub type Callback = dyn FnMut(&mut Receiver<'_>, &ChangeMessage);

pub(crate) type SharedCallback = Rc<RefCell<Callback>>;

/// The receiver a callback runs against.
///
/// Without an explicit scope the receiver is the target graph, the node
/// every key resolves against. The receiver also hands out the wrapper
/// itself, so a callback can issue further mutations; those dispatch
/// synchronously before the current round continues.
pub struct Receiver<'g> {
    glue: &'g mut Glue,
    scope: Option<Scope>,
}

impl<'g> Receiver<'g> {
    pub(crate) fn new(glue: &'g mut Glue, scope: Option<Scope>) -> Self {
        Self { glue, scope }
    }

    /// The target graph, after the mutation being reported.
    pub fn target(&self) -> &Value {
        self.glue.target()
    }

    /// The explicit scope, if one was bound at registration.
    pub fn scope(&self) -> Option<&Scope> {
        self.scope.as_ref()
    }

    /// Run `f` against the bound receiver: the explicit scope if there is
    /// one, the target graph otherwise.
    pub fn with_this<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match &self.scope {
            Some(scope) => f(&scope.borrow()),
            None => f(self.glue.target()),
        }
    }

    /// Mutable access to the wrapper, for re-entrant mutations.
    pub fn glue(&mut self) -> &mut Glue {
        self.glue
    }
}

/// One call to [`Glue::add_listener`], in one of its four shapes.
pub enum Registration {
    /// `(callback)`: every mutation, receiver is the target.
    Any { callback: SharedCallback },
    /// `(pattern, callback)`: receiver is the target.
    Key {
        pattern: String,
        callback: SharedCallback,
    },
    /// `(scope, callback)`: every mutation, receiver is `scope`.
    Scoped {
        scope: Scope,
        callback: SharedCallback,
    },
    /// `(pattern, scope, callback)`.
    KeyScoped {
        pattern: String,
        scope: Scope,
        callback: SharedCallback,
    },
}

impl Registration {
    pub fn any<F>(callback: F) -> Self
    where
        F: FnMut(&mut Receiver<'_>, &ChangeMessage) + 'static,
    {
        Registration::Any {
            callback: Rc::new(RefCell::new(callback)),
        }
    }

    pub fn key<F>(pattern: impl Into<String>, callback: F) -> Self
    where
        F: FnMut(&mut Receiver<'_>, &ChangeMessage) + 'static,
    {
        Registration::Key {
            pattern: pattern.into(),
            callback: Rc::new(RefCell::new(callback)),
        }
    }

    pub fn scoped<F>(scope: Scope, callback: F) -> Self
    where
        F: FnMut(&mut Receiver<'_>, &ChangeMessage) + 'static,
    {
        Registration::Scoped {
            scope,
            callback: Rc::new(RefCell::new(callback)),
        }
    }

    pub fn key_scoped<F>(pattern: impl Into<String>, scope: Scope, callback: F) -> Self
    where
        F: FnMut(&mut Receiver<'_>, &ChangeMessage) + 'static,
    {
        Registration::KeyScoped {
            pattern: pattern.into(),
            scope,
            callback: Rc::new(RefCell::new(callback)),
        }
    }

    /// The raw pattern, `None` for the match-all shapes.
    pub fn pattern(&self) -> Option<&str> {
        match self {
            Registration::Key { pattern, .. } | Registration::KeyScoped { pattern, .. } => {
                Some(pattern.as_str())
            }
            Registration::Any { .. } | Registration::Scoped { .. } => None,
        }
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Option<Scope>, SharedCallback) {
        match self {
            Registration::Any { callback } => (None, None, callback),
            Registration::Key { pattern, callback } => (Some(pattern), None, callback),
            Registration::Scoped { scope, callback } => (None, Some(scope), callback),
            Registration::KeyScoped {
                pattern,
                scope,
                callback,
            } => (Some(pattern), Some(scope), callback),
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scoped = matches!(
            self,
            Registration::Scoped { .. } | Registration::KeyScoped { .. }
        );
        f.debug_struct("Registration")
            .field("pattern", &self.pattern())
            .field("scoped", &scoped)
            .finish_non_exhaustive()
    }
}

/// How an entry matched a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hit {
    /// `*`.
    Any,
    /// The pattern is the mutated slot.
    Exact,
    /// The pattern is `seq[]` and the slot is an element of `seq`.
    Element,
    /// The pattern is the array owning the mutated slot.
    Collection,
}

pub(crate) struct Delivery {
    pub(crate) hit: Hit,
    pub(crate) callback: SharedCallback,
    pub(crate) scope: Option<Scope>,
}

struct ListenerEntry {
    pattern: Pattern,
    /// Canonical pattern string, the computed-cache key for computed
    /// patterns.
    key: String,
    scope: Option<Scope>,
    callback: SharedCallback,
}

impl ListenerEntry {
    fn deliver(&self, hit: Hit) -> Delivery {
        Delivery {
            hit,
            callback: Rc::clone(&self.callback),
            scope: self.scope.clone(),
        }
    }
}

/// Registered entries, kept in registration order.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    entries: Vec<ListenerEntry>,
}

impl ListenerRegistry {
    pub(crate) fn add(&mut self, pattern: Pattern, scope: Option<Scope>, callback: SharedCallback) {
        let key = pattern.to_string();
        self.entries.push(ListenerEntry {
            pattern,
            key,
            scope,
            callback,
        });
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries interested in a change to `slot`.
    ///
    /// `sequence` is the array owning the slot when the slot is one of its
    /// elements. Computed patterns never match here.
    pub(crate) fn matching(&self, slot: &[Segment], sequence: Option<&[Segment]>) -> Vec<Delivery> {
        self.entries
            .iter()
            .filter_map(|entry| {
                let path = match &entry.pattern {
                    Pattern::Any => return Some(entry.deliver(Hit::Any)),
                    Pattern::Path(path) => path,
                };
                if path.is_computed() {
                    None
                } else if path.is_element_pattern() {
                    (sequence == Some(path.base())).then(|| entry.deliver(Hit::Element))
                } else if path.segments() == slot {
                    Some(entry.deliver(Hit::Exact))
                } else if sequence == Some(path.segments()) {
                    Some(entry.deliver(Hit::Collection))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Entries registered on the computed path with canonical form `key`.
    pub(crate) fn matching_computed(&self, key: &str) -> Vec<Delivery> {
        self.entries
            .iter()
            .filter(|entry| entry.key == key && is_computed(&entry.pattern))
            .map(|entry| entry.deliver(Hit::Exact))
            .collect()
    }

    /// Distinct computed paths with at least one entry, by canonical key.
    pub(crate) fn computed_paths(&self) -> Vec<(&str, &KeyPath)> {
        let mut out: Vec<(&str, &KeyPath)> = Vec::new();
        for entry in &self.entries {
            let Pattern::Path(path) = &entry.pattern else {
                continue;
            };
            if path.is_computed() && !out.iter().any(|(key, _)| *key == entry.key) {
                out.push((entry.key.as_str(), path));
            }
        }
        out
    }
}

fn is_computed(pattern: &Pattern) -> bool {
    pattern.as_path().is_some_and(KeyPath::is_computed)
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|entry| &entry.key))
            .finish()
    }
}
