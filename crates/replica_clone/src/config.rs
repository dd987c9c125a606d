//! Cloner configuration.

/// What to do with objects that model identity rather than data
/// (functions and resource handles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OpaquePolicy {
    /// Return the same reference; the clone and the original share it.
    #[default]
    Share,
    /// Fail with [`CloneError::UnsupportedValueKind`](crate::CloneError::UnsupportedValueKind).
    Reject,
}

/// Cloner configuration options.
///
/// `max_depth` counts composite nesting below the root composite, which sits
/// at depth 0. `max_objects` counts every object one clone call allocates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CloneConfig {
    pub opaque: OpaquePolicy,
    pub max_depth: Option<usize>,
    pub max_objects: Option<usize>,
}

impl CloneConfig {
    pub fn with_opaque(mut self, opaque: OpaquePolicy) -> Self {
        self.opaque = opaque;
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_objects(mut self, objects: usize) -> Self {
        self.max_objects = Some(objects);
        self
    }
}
