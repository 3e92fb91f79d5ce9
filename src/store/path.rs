use std::{cmp::Ordering, fmt, str::FromStr};

use crate::SwapError;

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']', '/'];

/// A validated, slash-separated location in the document tree.
///
/// The empty path is the root. Segments are never empty and never contain
/// characters the backend reserves for its own syntax.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct DocPath(Vec<String>);

impl DocPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub(super) fn collection(name: &'static str) -> Self {
        Self(vec![name.to_owned()])
    }

    pub fn parse(raw: &str) -> Result<Self, SwapError> {
        raw.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(Self::root(), |path, segment| path.child(segment))
    }

    pub fn child(mut self, segment: &str) -> Result<Self, SwapError> {
        validate_segment(segment)?;
        self.0.push(segment.to_owned());
        Ok(self)
    }

    pub fn join(&self, relative: &DocPath) -> DocPath {
        let mut segments = self.0.clone();
        segments.extend(relative.0.iter().cloned());
        DocPath(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn starts_with(&self, prefix: &DocPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// True when a write at one of the paths can change what is visible at the other.
    pub fn overlaps(&self, other: &DocPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

fn validate_segment(segment: &str) -> Result<(), SwapError> {
    if segment.is_empty() {
        return Err(SwapError::validation("path segments cannot be empty"));
    }
    if segment
        .chars()
        .any(|c| FORBIDDEN.contains(&c) || c.is_ascii_control())
    {
        return Err(SwapError::validation(format!(
            "invalid path segment {segment:?}"
        )));
    }
    Ok(())
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for DocPath {
    type Err = SwapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocPath::parse(s)
    }
}

/// Store ordering for sibling keys: 32-bit integer keys first in numeric
/// order, then everything else by bytes.
pub fn key_order(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Only the canonical spelling counts: no sign, padding or `-0`.
fn integer_key(key: &str) -> Option<i32> {
    key.parse::<i32>()
        .ok()
        .filter(|n| n.to_string() == key)
}
