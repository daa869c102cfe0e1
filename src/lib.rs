//! Named binary tag (NBT) codec and region file storage for chunks.
//!
//! Tag trees are decoded with [`decode`], addressed with [`path`] and encoded
//! back with [`encode`]. Region files hold up to 1024 compressed chunk
//! documents and are read and written through [`region::Region`].
pub mod decode;
pub mod dump;
pub mod encode;
pub mod error;
pub mod path;
pub mod position;
pub mod provider;
pub mod region;
pub mod tag;

pub use crate::error::{
    ChunkReadError, ChunkWriteError, CompoundTagError, ListTagError, PathError, TagDecodeError,
    TagEncodeError,
};
pub use crate::path::PathSegment;
pub use crate::position::{RegionChunkPosition, RegionPosition};
pub use crate::provider::{FolderRegionProvider, RegionProvider};
pub use crate::region::Region;
pub use crate::tag::{CompoundTag, ListTag, Tag, TagKind};
