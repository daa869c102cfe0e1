use crate::error::{CompoundTagError, ListTagError};
use indexmap::IndexMap;
use num_enum::TryFromPrimitive;
use std::fmt::{self, Display};

/// Tag type ids as they appear on the wire.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, TryFromPrimitive)]
#[repr(u8)]
pub enum TagKind {
    End = 0,
    Byte = 1,
    Short = 2,
    Int = 3,
    Long = 4,
    Float = 5,
    Double = 6,
    ByteArray = 7,
    String = 8,
    List = 9,
    Compound = 10,
    IntArray = 11,
    LongArray = 12,
}

impl TagKind {
    /// Type id byte.
    pub fn id(self) -> u8 {
        self as u8
    }
}

impl Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TAG_{:?}", self)
    }
}

/// One node of a tag tree.
///
/// Containers own their children, so a tree is always acyclic and can be
/// freely moved between threads.
#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    End,
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(ListTag),
    Compound(CompoundTag),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::End => TagKind::End,
            Tag::Byte(_) => TagKind::Byte,
            Tag::Short(_) => TagKind::Short,
            Tag::Int(_) => TagKind::Int,
            Tag::Long(_) => TagKind::Long,
            Tag::Float(_) => TagKind::Float,
            Tag::Double(_) => TagKind::Double,
            Tag::ByteArray(_) => TagKind::ByteArray,
            Tag::String(_) => TagKind::String,
            Tag::List(_) => TagKind::List,
            Tag::Compound(_) => TagKind::Compound,
            Tag::IntArray(_) => TagKind::IntArray,
            Tag::LongArray(_) => TagKind::LongArray,
        }
    }

    /// Widens any numeric tag to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Tag::Byte(v) => Some(v as i64),
            Tag::Short(v) => Some(v as i64),
            Tag::Int(v) => Some(v as i64),
            Tag::Long(v) => Some(v),
            Tag::Float(v) => Some(v as i64),
            Tag::Double(v) => Some(v as i64),
            _ => None,
        }
    }

    /// Widens any numeric tag to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Tag::Byte(v) => Some(v as f64),
            Tag::Short(v) => Some(v as f64),
            Tag::Int(v) => Some(v as f64),
            Tag::Long(v) => Some(v as f64),
            Tag::Float(v) => Some(v as f64),
            Tag::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&CompoundTag> {
        match self {
            Tag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut CompoundTag> {
        match self {
            Tag::Compound(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListTag> {
        match self {
            Tag::List(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! from {
    ($type:ty, $variant:ident) => {
        impl From<$type> for Tag {
            fn from(value: $type) -> Self {
                Tag::$variant(value)
            }
        }
    };
}

from!(i8, Byte);
from!(i16, Short);
from!(i32, Int);
from!(i64, Long);
from!(f32, Float);
from!(f64, Double);
from!(String, String);
from!(Vec<i8>, ByteArray);
from!(Vec<i32>, IntArray);
from!(Vec<i64>, LongArray);
from!(ListTag, List);
from!(CompoundTag, Compound);

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Tag::String(value.to_owned())
    }
}

impl From<bool> for Tag {
    fn from(value: bool) -> Self {
        Tag::Byte(i8::from(value))
    }
}

/// Homogeneous list of unnamed tags.
///
/// The item kind of an empty list is kept as well, since it is written out on
/// encode. Lists that were never populated use `TagKind::End`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListTag {
    kind: TagKind,
    items: Vec<Tag>,
}

impl Default for ListTag {
    fn default() -> Self {
        ListTag::new()
    }
}

impl ListTag {
    pub fn new() -> Self {
        ListTag::with_kind(TagKind::End)
    }

    pub fn with_kind(kind: TagKind) -> Self {
        ListTag {
            kind,
            items: Vec::new(),
        }
    }

    /// Builds a list, checking that every item is of `kind`.
    pub fn from_items(kind: TagKind, items: Vec<Tag>) -> Result<Self, ListTagError> {
        if let Some(item) = items.iter().find(|item| item.kind() != kind) {
            return Err(ListTagError::TypeMismatch {
                expected: kind,
                actual: item.kind(),
            });
        }

        Ok(ListTag { kind, items })
    }

    /// Items are trusted to be of `kind`; used by the decoder.
    pub(crate) fn from_decoded(kind: TagKind, items: Vec<Tag>) -> Self {
        ListTag { kind, items }
    }

    /// Appends a tag. An empty `End` list takes the kind of its first item.
    pub fn push(&mut self, tag: impl Into<Tag>) -> Result<(), ListTagError> {
        let tag = tag.into();

        if self.items.is_empty() && self.kind == TagKind::End {
            self.kind = tag.kind();
        }

        if tag.kind() != self.kind {
            return Err(ListTagError::TypeMismatch {
                expected: self.kind,
                actual: tag.kind(),
            });
        }

        self.items.push(tag);
        Ok(())
    }

    pub fn kind(&self) -> TagKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Tag> {
        self.items.get(index)
    }

    /// Replacing an item with one of another kind makes the list fail to encode.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Tag> {
        self.items.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.items.iter()
    }

    pub fn items(&self) -> &[Tag] {
        &self.items
    }
}

impl<'a> IntoIterator for &'a ListTag {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Named tags in insertion order.
///
/// Entry order is reproduced on encode, so two compounds are only equal when
/// they hold the same entries in the same order.
#[derive(Debug, Clone, Default)]
pub struct CompoundTag {
    tags: IndexMap<String, Tag>,
}

impl PartialEq for CompoundTag {
    fn eq(&self, other: &Self) -> bool {
        self.tags.len() == other.tags.len() && self.tags.iter().eq(other.tags.iter())
    }
}

macro_rules! define_getter {
    ($fn_name:ident, $variant:ident, $ret:ty, $value:ident => $convert:expr) => {
        pub fn $fn_name(&self, name: &str) -> Result<$ret, CompoundTagError> {
            match self.tags.get(name) {
                Some(Tag::$variant($value)) => Ok($convert),
                Some(tag) => Err(CompoundTagError::TagWrongType {
                    name: name.to_owned(),
                    expected: TagKind::$variant,
                    actual: tag.kind(),
                }),
                None => Err(CompoundTagError::TagNotFound {
                    name: name.to_owned(),
                }),
            }
        }
    };
}

macro_rules! define_setter {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&mut self, name: impl Into<String>, value: $ty) {
            self.insert(name, Tag::$variant(value));
        }
    };
}

impl CompoundTag {
    pub fn new() -> Self {
        CompoundTag {
            tags: IndexMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Tag> {
        self.tags.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Tag> {
        self.tags.get_mut(name)
    }

    /// Sets `name` to `tag` and returns the previous value.
    ///
    /// An existing entry keeps its position, a new one is appended.
    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<Tag>) -> Option<Tag> {
        self.tags.insert(name.into(), tag.into())
    }

    /// Removes `name` keeping the order of the remaining entries. Removing an
    /// absent name does nothing.
    pub fn remove(&mut self, name: &str) -> Option<Tag> {
        self.tags.shift_remove(name)
    }

    /// Duplicate names resolve to the last occurrence, placed where that
    /// occurrence was read.
    pub(crate) fn insert_decoded(&mut self, name: String, tag: Tag) {
        self.tags.shift_remove(&name);
        self.tags.insert(name, tag);
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Tag> {
        self.tags.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, String, Tag> {
        self.tags.keys()
    }

    define_getter!(get_i8, Byte, i8, value => *value);
    define_getter!(get_bool, Byte, bool, value => *value != 0);
    define_getter!(get_i16, Short, i16, value => *value);
    define_getter!(get_i32, Int, i32, value => *value);
    define_getter!(get_i64, Long, i64, value => *value);
    define_getter!(get_f32, Float, f32, value => *value);
    define_getter!(get_f64, Double, f64, value => *value);
    define_getter!(get_str, String, &str, value => value.as_str());
    define_getter!(get_i8_vec, ByteArray, &[i8], value => value.as_slice());
    define_getter!(get_i32_vec, IntArray, &[i32], value => value.as_slice());
    define_getter!(get_i64_vec, LongArray, &[i64], value => value.as_slice());
    define_getter!(get_list, List, &ListTag, value => value);
    define_getter!(get_compound_tag, Compound, &CompoundTag, value => value);

    define_setter!(insert_i8, Byte, i8);
    define_setter!(insert_i16, Short, i16);
    define_setter!(insert_i32, Int, i32);
    define_setter!(insert_i64, Long, i64);
    define_setter!(insert_f32, Float, f32);
    define_setter!(insert_f64, Double, f64);
    define_setter!(insert_i8_vec, ByteArray, Vec<i8>);
    define_setter!(insert_i32_vec, IntArray, Vec<i32>);
    define_setter!(insert_i64_vec, LongArray, Vec<i64>);
    define_setter!(insert_list, List, ListTag);
    define_setter!(insert_compound_tag, Compound, CompoundTag);

    pub fn insert_bool(&mut self, name: impl Into<String>, value: bool) {
        self.insert(name, value);
    }

    pub fn insert_str(&mut self, name: impl Into<String>, value: &str) {
        self.insert(name, value);
    }
}

impl<'a> IntoIterator for &'a CompoundTag {
    type Item = (&'a String, &'a Tag);
    type IntoIter = indexmap::map::Iter<'a, String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.tags.iter()
    }
}
