use serde::Serialize;
use serde_json::Value;

/// The kind of mutation a [`ChangeMessage`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Set,
    Push,
    Remove,
    Filter,
    /// A computed property changed as a side effect of another mutation.
    Update,
}

/// Payload delivered to a matching listener.
///
/// Fields that do not apply to an operation are `None` and are left out of
/// the serialized form entirely:
///
/// | operation | fields |
/// |---|---|
/// | `set` | `oldValue` (if the slot was occupied), `newValue`, `index`? |
/// | `push` | `value`, `index`? |
/// | `remove` | `value` (if the slot was occupied), `index`? |
/// | `filter` | `oldValue`, `newValue` |
/// | `update` | `oldValue`, `newValue` |
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeMessage {
    pub operation: Operation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl ChangeMessage {
    fn new(operation: Operation) -> Self {
        Self {
            operation,
            old_value: None,
            new_value: None,
            value: None,
            index: None,
        }
    }

    pub fn set(old_value: Option<Value>, new_value: Value) -> Self {
        Self {
            old_value,
            new_value: Some(new_value),
            ..Self::new(Operation::Set)
        }
    }

    pub fn push(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Self::new(Operation::Push)
        }
    }

    pub fn remove(value: Option<Value>) -> Self {
        Self {
            value,
            ..Self::new(Operation::Remove)
        }
    }

    pub fn filter(old_value: Value, new_value: Value) -> Self {
        Self {
            old_value: Some(old_value),
            new_value: Some(new_value),
            ..Self::new(Operation::Filter)
        }
    }

    pub fn update(old_value: Value, new_value: Value) -> Self {
        Self {
            old_value: Some(old_value),
            new_value: Some(new_value),
            ..Self::new(Operation::Update)
        }
    }

    pub fn with_index(mut self, index: Option<usize>) -> Self {
        self.index = index;
        self
    }

    /// The value that was replaced or taken out: `old_value` for `set`,
    /// `filter` and `update`, `value` for `remove`.
    pub fn old_value(&self) -> Option<&Value> {
        match self.operation {
            Operation::Remove => self.value.as_ref(),
            Operation::Push => None,
            _ => self.old_value.as_ref(),
        }
    }

    /// The value now in place: `new_value`, or `value` for `push`.
    pub fn new_value(&self) -> Option<&Value> {
        match self.operation {
            Operation::Push => self.value.as_ref(),
            Operation::Remove => None,
            _ => self.new_value.as_ref(),
        }
    }
}
