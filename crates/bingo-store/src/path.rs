//! Hierarchical store paths, e.g. `rooms/K7QX2M/players/abc`.

use std::fmt;

use crate::StoreError;

/// Characters that can't appear inside a segment.
const RESERVED: &[char] = &['/', '.', '#', '$', '[', ']'];

/// A validated, `/`-separated location in the store.
///
/// The empty path is the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `"a/b/c"`. Leading and trailing slashes are ignored.
    ///
    /// # Errors
    /// [`StoreError::InvalidPath`] on empty or reserved segments.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let trimmed = raw.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let mut path = Self::root();
        for segment in trimmed.split('/') {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// Returns this path extended by one segment.
    ///
    /// # Errors
    /// [`StoreError::InvalidPath`] if `segment` is empty or contains a
    /// reserved character.
    pub fn child(&self, segment: &str) -> Result<Self, StoreError> {
        if segment.is_empty() || segment.contains(RESERVED) {
            return Err(StoreError::InvalidPath(format!(
                "bad segment {segment:?} under {self}"
            )));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_owned());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The path one level up. `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, rest) = self.segments.split_last()?;
        Some(Self {
            segments: rest.to_vec(),
        })
    }

    /// The first `depth` segments of this path (all of it if `depth` is
    /// larger).
    pub fn prefix(&self, depth: usize) -> Self {
        Self {
            segments: self.segments[..depth.min(self.segments.len())].to_vec(),
        }
    }

    /// Returns `true` if `self` is a strict prefix of `other`.
    pub fn is_ancestor_of(&self, other: &StorePath) -> bool {
        self.segments.len() < other.segments.len()
            && other.segments.starts_with(&self.segments)
    }

    /// Returns `true` if a change at one path can change the value seen
    /// at the other: same path, ancestor, or descendant.
    pub fn overlaps(&self, other: &StorePath) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        f.write_str(&self.segments.join("/"))
    }
}
