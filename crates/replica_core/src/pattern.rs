//! Text-matching pattern values.

use regex::{Regex, RegexBuilder};
use std::fmt;
use thiserror::Error;

/// Every flag a pattern may carry, in canonical order.
pub const KNOWN_FLAGS: &str = "dgimsuvy";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("invalid pattern flags '{0}'")]
    InvalidFlags(String),
    #[error("invalid pattern source '{source_text}': {message}")]
    InvalidSource { source_text: String, message: String },
}

/// A compiled pattern together with the source and flags it was built from.
///
/// `last_index` is the only mutable state; it drives stepping through
/// successive matches when the `g` or `y` flag is set.
#[derive(Clone)]
pub struct Pattern {
    source: String,
    flags: String,
    matcher: Regex,
    pub last_index: usize,
}

impl Pattern {
    pub fn new(source: &str, flags: &str) -> Result<Self, PatternError> {
        let flags = canonical_flags(flags)?;
        let matcher = RegexBuilder::new(source)
            .case_insensitive(flags.contains('i'))
            .multi_line(flags.contains('m'))
            .dot_matches_new_line(flags.contains('s'))
            .build()
            .map_err(|e| PatternError::InvalidSource {
                source_text: source.to_string(),
                message: e.to_string(),
            })?;
        Ok(Self {
            source: source.to_string(),
            flags,
            matcher,
            last_index: 0,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> &str {
        &self.flags
    }

    pub fn is_global(&self) -> bool {
        self.flags.contains('g')
    }

    pub fn is_sticky(&self) -> bool {
        self.flags.contains('y')
    }

    /// A new pattern with the same source and flags and a reset `last_index`.
    /// The compiled matcher is shared rather than rebuilt.
    pub fn fresh_copy(&self) -> Self {
        Self {
            source: self.source.clone(),
            flags: self.flags.clone(),
            matcher: self.matcher.clone(),
            last_index: 0,
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }

    /// Find the next match as a byte range.
    ///
    /// Stateless unless `g` or `y` is set; then the search starts at
    /// `last_index`, which moves to the end of a hit and back to 0 on a miss.
    /// With `y` the match must start exactly at `last_index`.
    pub fn find_next(&mut self, text: &str) -> Option<(usize, usize)> {
        if !self.is_global() && !self.is_sticky() {
            return self.matcher.find(text).map(|m| (m.start(), m.end()));
        }
        let start = self.last_index;
        if start > text.len() || !text.is_char_boundary(start) {
            self.last_index = 0;
            return None;
        }
        let found = self
            .matcher
            .find_at(text, start)
            .filter(|m| !self.is_sticky() || m.start() == start);
        match found {
            Some(m) => {
                self.last_index = m.end();
                Some((m.start(), m.end()))
            }
            None => {
                self.last_index = 0;
                None
            }
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

fn canonical_flags(flags: &str) -> Result<String, PatternError> {
    let mut seen = [false; KNOWN_FLAGS.len()];
    for c in flags.chars() {
        let Some(pos) = KNOWN_FLAGS.find(c) else {
            return Err(PatternError::InvalidFlags(flags.to_string()));
        };
        if seen[pos] {
            return Err(PatternError::InvalidFlags(flags.to_string()));
        }
        seen[pos] = true;
    }
    // u and v select incompatible syntaxes
    if flags.contains('u') && flags.contains('v') {
        return Err(PatternError::InvalidFlags(flags.to_string()));
    }
    Ok(KNOWN_FLAGS
        .chars()
        .zip(seen)
        .filter_map(|(c, on)| on.then_some(c))
        .collect())
}
