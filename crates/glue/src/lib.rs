//! Observe and mutate a JSON target through key paths.
//!
//! [`Glue`] wraps a [`serde_json::Value`]. Listeners register on key
//! patterns and are called synchronously, in registration order, after
//! every mutation that touches their path.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use glue::{Glue, Registration};
//! use serde_json::json;
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = Rc::clone(&seen);
//!
//! let mut glue = Glue::new(json!({"arr": []}));
//! glue.add_listener(Registration::key("arr#length", move |_, msg| {
//!     log.borrow_mut().push(msg.new_value().cloned());
//! }))
//! .unwrap();
//!
//! glue.push_to("arr", json!(1)).unwrap().push_to("arr", json!(2)).unwrap();
//!
//! assert_eq!(*seen.borrow(), vec![Some(json!(1)), Some(json!(2))]);
//! assert_eq!(glue.target(), &json!({"arr": [1, 2]}));
//! assert_eq!(glue.remove("arr[0]").unwrap(), Some(json!(1)));
//! ```

mod computed;
mod error;
mod glue;
mod listener;
mod message;
mod options;

pub use computed::ComputedCache;
pub use error::GlueError;
pub use glue::Glue;
pub use glue_key_path::{KeyPathError, NormalizedKeys};
pub use listener::{Callback, Receiver, Registration, Scope};
pub use message::{ChangeMessage, Operation};
pub use options::GlueOptions;

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
