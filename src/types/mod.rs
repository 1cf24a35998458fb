//! Element domains, field types and row-level values.

mod value;

pub use value::{EvalType, FieldType, Value};
