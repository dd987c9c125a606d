//! Core value types for replica.
//!
//! This crate holds everything that exists independently of cloning:
//! - `Value` - Scalar values and references to heap objects
//! - `Heap` and `ManagedObject` - Identity-bearing objects addressed by `ObjectId`
//! - `Pattern` - Text-matching pattern values
//! - `deep_equal` / `render` - Structural comparison and debug rendering of value graphs

pub mod equality;
pub mod gc;
pub mod heap;
pub mod pattern;
pub mod render;
pub mod value;

pub use equality::deep_equal;
pub use gc::ObjectId;
pub use heap::{
    Dictionary, Function, Handle, HandleKind, Heap, ManagedObject, ObjectKind, Record, Temporal,
    UniqueSet,
};
pub use pattern::{Pattern, PatternError};
pub use render::render;
pub use value::{RecordKey, Symbol, Value};
