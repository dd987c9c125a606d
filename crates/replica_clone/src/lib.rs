//! Deep structural cloning of value graphs.
//!
//! The [`Cloner`] copies any [`Value`](replica_core::Value) held in a
//! [`Heap`](replica_core::Heap) into fresh heap objects, preserving cycles and
//! shared sub-structure. See [`cloner`] for the dispatch rules.

pub mod cloner;
pub mod config;
pub mod errors;

pub use cloner::{CloneSession, CloneStats, Cloner, deep_clone};
pub use config::{CloneConfig, OpaquePolicy};
pub use errors::{CloneError, Limit, Result};
