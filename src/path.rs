//! Addressing nodes inside a tag tree.
//!
//! A path is a sequence of segments: compound keys and list indices. A lookup
//! that does not find its target returns `Ok(None)`, while a path that tries
//! to descend into a scalar or array, or uses the wrong kind of segment for a
//! container, is a `PathError`.
use crate::error::PathError;
use crate::tag::Tag;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum PathSegment {
    /// Name of a compound entry.
    Key(String),
    /// Position of a list item.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{:?}", key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

pub fn get<'a>(tag: &'a Tag, path: &[PathSegment]) -> Result<Option<&'a Tag>, PathError> {
    let mut current = tag;

    for (depth, segment) in path.iter().enumerate() {
        let next = match (current, segment) {
            (Tag::Compound(compound_tag), PathSegment::Key(key)) => compound_tag.get(key),
            (Tag::List(list_tag), PathSegment::Index(index)) => list_tag.get(*index),
            _ => {
                return Err(PathError::TypeMismatch {
                    depth,
                    tag_kind: current.kind(),
                })
            }
        };

        match next {
            Some(tag) => current = tag,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

pub fn get_mut<'a>(
    tag: &'a mut Tag,
    path: &[PathSegment],
) -> Result<Option<&'a mut Tag>, PathError> {
    let mut current = tag;

    for (depth, segment) in path.iter().enumerate() {
        let tag_kind = current.kind();

        let next = match (current, segment) {
            (Tag::Compound(compound_tag), PathSegment::Key(key)) => compound_tag.get_mut(key),
            (Tag::List(list_tag), PathSegment::Index(index)) => list_tag.get_mut(*index),
            _ => return Err(PathError::TypeMismatch { depth, tag_kind }),
        };

        match next {
            Some(tag) => current = tag,
            None => return Ok(None),
        }
    }

    Ok(Some(current))
}

impl Tag {
    /// See [`get`].
    pub fn get_path(&self, path: &[PathSegment]) -> Result<Option<&Tag>, PathError> {
        get(self, path)
    }

    /// See [`get_mut`].
    pub fn get_path_mut(&mut self, path: &[PathSegment]) -> Result<Option<&mut Tag>, PathError> {
        get_mut(self, path)
    }
}
