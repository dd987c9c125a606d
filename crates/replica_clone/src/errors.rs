//! Clone errors.

use replica_core::{ObjectId, ObjectKind};
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CloneError>;

/// Which budget of [`CloneConfig`](crate::CloneConfig) ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Depth,
    Objects,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limit::Depth => f.write_str("depth"),
            Limit::Objects => f.write_str("object"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloneError {
    /// An opaque object met under [`OpaquePolicy::Reject`](crate::OpaquePolicy::Reject).
    #[error("cannot clone {kind} object {id}")]
    UnsupportedValueKind { kind: ObjectKind, id: ObjectId },

    #[error("clone exceeded the {limit} budget of {bound}")]
    ResourceExhausted { limit: Limit, bound: usize },

    /// The graph references a slot that was never allocated or has been collected.
    #[error("reference to missing object {0}")]
    DanglingReference(ObjectId),
}
