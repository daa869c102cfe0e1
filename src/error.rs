use crate::position::RegionChunkPosition;
use crate::tag::TagKind;
use std::{error::Error, fmt::Display, io};

/// Possible errors while decoding binary data to a tag.
#[derive(Debug)]
pub enum TagDecodeError {
    /// Type id byte does not name any known tag.
    UnknownTagType { tag_type_id: u8 },
    /// Length prefix of an array, list or string is negative or impossible.
    InvalidLength { tag_kind: TagKind, length: i32 },
    /// String bytes are not valid UTF-8.
    InvalidString { bytes: Vec<u8> },
    /// Lists and compounds are nested deeper than allowed.
    DepthLimitExceeded { maximum_depth: usize },
    /// A compound was requested but the document root is another kind.
    RootMustBeCompound { actual: TagKind },
    /// Source ended in the middle of a tag.
    UnexpectedEof,
    /// I/O Error which happened while were reading tag data.
    IOError { io_error: io::Error },
}

impl From<io::Error> for TagDecodeError {
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::UnexpectedEof => TagDecodeError::UnexpectedEof,
            _ => TagDecodeError::IOError { io_error },
        }
    }
}

impl Error for TagDecodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TagDecodeError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for TagDecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TagDecodeError::*;
        match self {
            UnknownTagType { tag_type_id } => write!(f, "Unknown tag type id: {}", tag_type_id),
            InvalidLength { tag_kind, length } => {
                write!(f, "Invalid length of {} for {}", length, tag_kind)
            }
            InvalidString { bytes } => write!(
                f,
                "Invalid UTF-8 string: {}",
                String::from_utf8_lossy(bytes)
            ),
            DepthLimitExceeded { maximum_depth } => {
                write!(f, "Tag nesting exceeds maximum depth ({})", maximum_depth)
            }
            RootMustBeCompound { actual } => {
                write!(f, "Root tag must be {} but was {}", TagKind::Compound, actual)
            }
            UnexpectedEof => write!(f, "Unexpected end of input"),
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Possible errors while encoding a tag to binary data.
#[derive(Debug)]
pub enum TagEncodeError {
    /// List item differs from the item kind of its list.
    ListItemTypeMismatch { expected: TagKind, actual: TagKind },
    /// `End` stored as a compound entry or list item.
    UnexpectedEndTag,
    /// String, array or list too long for its length prefix.
    LengthExceedsMaximum {
        tag_kind: TagKind,
        length: usize,
        maximum_length: usize,
    },
    /// I/O Error which happened while were writing tag data.
    IOError { io_error: io::Error },
}

impl From<io::Error> for TagEncodeError {
    fn from(io_error: io::Error) -> Self {
        TagEncodeError::IOError { io_error }
    }
}

impl Error for TagEncodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TagEncodeError::IOError { io_error } => Some(io_error),
            _ => None,
        }
    }
}

impl Display for TagEncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use TagEncodeError::*;
        match self {
            ListItemTypeMismatch { expected, actual } => {
                write!(f, "List of {} contains {}", expected, actual)
            }
            UnexpectedEndTag => write!(f, "{} cannot be stored in a container", TagKind::End),
            LengthExceedsMaximum {
                tag_kind,
                length,
                maximum_length,
            } => write!(
                f,
                "{} length of {} exceeds maximum ({})",
                tag_kind, length, maximum_length
            ),
            IOError { .. } => write!(f, "IO Error"),
        }
    }
}

/// Possible errors while looking up a typed value in a compound.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CompoundTagError {
    TagNotFound {
        name: String,
    },
    TagWrongType {
        name: String,
        expected: TagKind,
        actual: TagKind,
    },
}

impl Error for CompoundTagError {}

impl Display for CompoundTagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use CompoundTagError::*;
        match self {
            TagNotFound { name } => write!(f, "Tag {} not found", name),
            TagWrongType {
                name,
                expected,
                actual,
            } => write!(f, "Tag {} is {}, expected {}", name, actual, expected),
        }
    }
}

/// Item pushed into a list has a different kind than the list.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ListTagError {
    TypeMismatch { expected: TagKind, actual: TagKind },
}

impl Error for ListTagError {}

impl Display for ListTagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListTagError::TypeMismatch { expected, actual } => {
                write!(f, "Cannot put {} into list of {}", actual, expected)
            }
        }
    }
}

/// Path descends into a tag that cannot be addressed by the next segment.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PathError {
    TypeMismatch {
        /// Position of the offending segment in the path.
        depth: usize,
        tag_kind: TagKind,
    },
}

impl Error for PathError {}

impl Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::TypeMismatch { depth, tag_kind } => write!(
                f,
                "Path segment {} cannot address into {}",
                depth, tag_kind
            ),
        }
    }
}

/// Possible errors while loading the chunk.
#[derive(Debug)]
pub enum ChunkReadError {
    /// Chunk at specified coordinates inside region not found.
    ChunkNotFound { position: RegionChunkPosition },
    /// Chunk coordinates are outside `0..32`.
    PositionOutOfBounds { position: RegionChunkPosition },
    /// Chunk length is zero or overlaps declared maximum.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted.
    InvalidLength {
        /// Chunk length.
        length: u32,
        /// Chunk maximum expected length.
        maximum_length: u32,
    },
    /// Currently are only 2 types of compression: Gzip and Zlib.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted or was introduced new compression type.
    UnsupportedCompressionScheme {
        /// Compression scheme type id.
        compression_scheme: u8,
    },
    /// Source ended in the middle of chunk frame.
    UnexpectedEof,
    /// I/O Error which happened while were reading chunk data from region file.
    IOError { io_error: io::Error },
    /// Error while decoding binary data to NBT tag.
    ///
    /// This should not occur under normal conditions.
    ///
    /// Region file are corrupted.
    TagDecodeError { tag_decode_error: TagDecodeError },
}

impl From<io::Error> for ChunkReadError {
    fn from(io_error: io::Error) -> Self {
        match io_error.kind() {
            io::ErrorKind::UnexpectedEof => ChunkReadError::UnexpectedEof,
            _ => ChunkReadError::IOError { io_error },
        }
    }
}

impl From<TagDecodeError> for ChunkReadError {
    fn from(tag_decode_error: TagDecodeError) -> Self {
        ChunkReadError::TagDecodeError { tag_decode_error }
    }
}

impl Error for ChunkReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        use ChunkReadError::*;
        match self {
            IOError { io_error } => Some(io_error),
            TagDecodeError { tag_decode_error } => Some(tag_decode_error),
            _ => None,
        }
    }
}

impl Display for ChunkReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkReadError::*;
        match self {
            ChunkNotFound { position } => {
                write!(f, "Chunk {}, {} not found", position.x, position.z)
            }
            PositionOutOfBounds { position } => write!(
                f,
                "Chunk {}, {} is outside of region",
                position.x, position.z
            ),
            InvalidLength {
                length,
                maximum_length,
            } => write!(
                f,
                "Chunk length of {} is invalid (maximum {})",
                length, maximum_length
            ),
            UnsupportedCompressionScheme { compression_scheme } => {
                write!(f, "Unsupported compression scheme: {}", compression_scheme)
            }
            UnexpectedEof => write!(f, "Unexpected end of chunk data"),
            IOError { .. } => write!(f, "IO Error"),
            TagDecodeError { .. } => write!(f, "Failed to decode nbt"),
        }
    }
}

/// Possible errors while saving the chunk.
#[derive(Debug)]
pub enum ChunkWriteError {
    /// Chunk length exceeds 255 sectors.
    ///
    /// This should not occur under normal conditions.
    LengthExceedsMaximum {
        /// Chunk length.
        length: u32,
    },
    /// Chunk coordinates are outside `0..32`.
    PositionOutOfBounds { position: RegionChunkPosition },
    /// I/O Error which happened while were writing chunk data to region.
    IOError { io_error: io::Error },
    /// Error while encoding NBT tag to binary data.
    TagEncodeError { tag_encode_error: TagEncodeError },
}

impl From<io::Error> for ChunkWriteError {
    fn from(io_error: io::Error) -> Self {
        ChunkWriteError::IOError { io_error }
    }
}

impl From<TagEncodeError> for ChunkWriteError {
    fn from(tag_encode_error: TagEncodeError) -> Self {
        ChunkWriteError::TagEncodeError { tag_encode_error }
    }
}

impl Error for ChunkWriteError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChunkWriteError::IOError { io_error } => Some(io_error),
            ChunkWriteError::TagEncodeError { tag_encode_error } => Some(tag_encode_error),
            _ => None,
        }
    }
}

impl Display for ChunkWriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use ChunkWriteError::*;
        match self {
            LengthExceedsMaximum { length } => {
                write!(f, "Chunk length of {} exceeds maximum (255 sectors)", length)
            }
            PositionOutOfBounds { position } => write!(
                f,
                "Chunk {}, {} is outside of region",
                position.x, position.z
            ),
            IOError { .. } => write!(f, "IO Error"),
            TagEncodeError { .. } => write!(f, "Failed to encode nbt"),
        }
    }
}
