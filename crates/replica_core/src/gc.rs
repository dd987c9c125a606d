//! Object identity.

use std::fmt;

/// Handle to a heap-allocated object.
///
/// Two handles are the same object exactly when the ids are equal; contents
/// never take part in the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
