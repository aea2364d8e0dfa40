//! Invoke Values
//!
//! Dynamic configuration values as produced by evaluating an action's
//! configuration body.
//!
//! # Core Concepts
//!
//! - [`Value`]: a typed value tree. Any node may be null, unknown (not yet
//!   computed) or carry [`Mark`]s recording provenance.
//! - [`Type`]: the type system values conform to; [`BlockSchema::implied_type`]
//!   derives an object type from a schema.
//! - [`Path`]: location of a nested value, used to report diagnostics against
//!   a specific attribute.
//! - [`remove_ephemeral_values`]: scrubs values that must never be persisted.
//!
//! # Example
//!
//! ```rust
//! use invoke_value::{Mark, Value, remove_ephemeral_values};
//!
//! let token = Value::string("s3cr3t").with_mark(Mark::Ephemeral);
//! let config = Value::object([("token", token), ("url", Value::string("https://example"))]);
//! assert!(!config.paths_with_mark(|m| *m == Mark::Ephemeral).is_empty());
//!
//! let persisted = remove_ephemeral_values(config);
//! assert!(persisted.get_attr("token").unwrap().is_null());
//! ```

mod ephemeral;
mod error;
mod json;
mod mark;
mod path;
mod schema;
mod ty;
mod value;

pub use ephemeral::remove_ephemeral_values;
pub use error::ValueError;
pub use mark::{Mark, PathMarks};
pub use path::{Path, PathStep};
pub use schema::{AttributeSchema, BlockSchema};
pub use ty::Type;
pub use value::{Value, ValueKind};
