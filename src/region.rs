use crate::decode::read_tag;
use crate::encode::write_zlib_tag;
use crate::error::{ChunkReadError, ChunkWriteError};
use crate::position::{RegionChunkPosition, RegionPosition, REGION_CHUNKS_PER_SIDE};
use crate::tag::Tag;
use bitvec::prelude::*;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::{GzDecoder, ZlibDecoder};
use log::debug;
use num_enum::TryFromPrimitive;
use std::convert::TryFrom;
use std::io;
use std::io::{Cursor, Error, Read, Seek, SeekFrom, Write};
use std::time::{SystemTime, UNIX_EPOCH};

/// Amount of chunks in region.
pub const REGION_CHUNKS: usize = 1024;
/// Region sector length in bytes.
pub const REGION_SECTOR_BYTES_LENGTH: u16 = 4096;
/// Region header length in bytes.
const REGION_HEADER_BYTES_LENGTH: u64 = 2 * REGION_SECTOR_BYTES_LENGTH as u64;
/// Maximum amount of sectors single chunk can occupy.
const CHUNK_MAXIMUM_SECTORS: u8 = 255;
/// Maximum chunk length in bytes.
const CHUNK_MAXIMUM_BYTES_LENGTH: u32 =
    REGION_SECTOR_BYTES_LENGTH as u32 * CHUNK_MAXIMUM_SECTORS as u32;

/// Compression scheme used for chunk.
#[derive(Debug, Copy, Clone, Eq, PartialEq, TryFromPrimitive)]
#[repr(u8)]
pub enum CompressionScheme {
    Gzip = 1,
    /// In practice, you will only ever encounter chunks compressed using zlib.
    Zlib = 2,
}

/// Slot of the chunk at `x`, `z` in the region header, `None` when a
/// coordinate is outside `0..32`.
pub fn chunk_index(x: u8, z: u8) -> Option<usize> {
    RegionChunkPosition::try_new(x as i64, z as i64).map(|position| position.index())
}

/// Calls `visitor` with `x`, `z` and header index of every chunk slot in
/// header order, whether the chunk is present or not.
pub fn foreach_chunk<F: FnMut(u8, u8, usize)>(mut visitor: F) {
    let mut index = 0;

    for z in 0..REGION_CHUNKS_PER_SIDE {
        for x in 0..REGION_CHUNKS_PER_SIDE {
            visitor(x, z, index);
            index += 1;
        }
    }
}

/// Reads the first header sector and returns byte offset of every chunk.
///
/// Offset of zero means that chunk is absent.
pub fn read_offset_table<R: Read>(reader: &mut R) -> Result<[u64; REGION_CHUNKS], io::Error> {
    let mut offsets = [0u64; REGION_CHUNKS];

    for offset in offsets.iter_mut() {
        let location = reader.read_u32::<BigEndian>()?;
        *offset = (location >> 8) as u64 * REGION_SECTOR_BYTES_LENGTH as u64;
    }

    Ok(offsets)
}

/// Reads chunk which data starts at `offset` bytes from source start.
pub fn read_chunk<R: Read + Seek>(reader: &mut R, offset: u64) -> Result<Tag, ChunkReadError> {
    reader.seek(SeekFrom::Start(offset))?;
    let length = reader.read_u32::<BigEndian>()?;

    // Length includes compression scheme byte.
    if length == 0 || length > CHUNK_MAXIMUM_BYTES_LENGTH {
        return Err(ChunkReadError::InvalidLength {
            length,
            maximum_length: CHUNK_MAXIMUM_BYTES_LENGTH,
        });
    }

    let compression_scheme = reader.read_u8()?;
    let compression_scheme = CompressionScheme::try_from(compression_scheme)
        .map_err(|_| ChunkReadError::UnsupportedCompressionScheme { compression_scheme })?;

    let mut compressed_buffer = vec![0u8; (length - 1) as usize];
    reader.read_exact(&mut compressed_buffer)?;

    let mut buffer = Vec::new();

    match compression_scheme {
        CompressionScheme::Gzip => {
            GzDecoder::new(compressed_buffer.as_slice()).read_to_end(&mut buffer)?
        }
        CompressionScheme::Zlib => {
            ZlibDecoder::new(compressed_buffer.as_slice()).read_to_end(&mut buffer)?
        }
    };

    let (tag, _) = read_tag(&mut Cursor::new(buffer))?;

    Ok(tag)
}

/// Region represents a 32x32 group of chunks.
pub struct Region<S> {
    /// Region coordinates.
    position: RegionPosition,
    /// Source in which region are stored.
    source: S,
    /// Array of chunks metadata.
    chunks_metadata: [ChunkMetadata; REGION_CHUNKS],
    /// Used sectors for chunks data.
    used_sectors: BitVec,
}

impl<S> Region<S> {
    pub fn position(&self) -> RegionPosition {
        self.position
    }

    /// Byte offsets of chunks in header order, zero for absent chunks.
    pub fn chunk_offsets(&self) -> [u64; REGION_CHUNKS] {
        let mut offsets = [0u64; REGION_CHUNKS];

        for (offset, metadata) in offsets.iter_mut().zip(self.chunks_metadata.iter()) {
            *offset = metadata.seek_offset();
        }

        offsets
    }

    pub fn contains_chunk(&self, position: RegionChunkPosition) -> bool {
        self.get_metadata(position)
            .map_or(false, |metadata| !metadata.is_empty())
    }

    /// Last time in seconds when chunk was modified, `None` for absent chunks.
    pub fn last_modified(&self, position: RegionChunkPosition) -> Option<u32> {
        self.get_metadata(position)
            .filter(|metadata| !metadata.is_empty())
            .map(|metadata| metadata.last_modified_timestamp)
    }

    pub fn into_inner(self) -> S {
        self.source
    }

    /// Returns chunk metadata at specified coordinates, `None` when
    /// position lies outside the region.
    fn get_metadata(&self, position: RegionChunkPosition) -> Option<ChunkMetadata> {
        if !position.is_within_region() {
            return None;
        }

        Some(self.chunks_metadata[position.index()])
    }
}

/// Calculates used sectors.
fn used_sectors(total_sectors: usize, chunks_metadata: &[ChunkMetadata]) -> BitVec {
    // First two sectors are used to store metadata.
    let mut used_sectors = bitvec![0; total_sectors.max(2)];

    used_sectors.set(0, true);
    used_sectors.set(1, true);

    for metadata in chunks_metadata {
        if metadata.is_empty() {
            continue;
        }

        let start_index = metadata.start_sector_index as usize;
        let end_index = start_index + metadata.sectors as usize;

        // Header may point past the end of a truncated source.
        if end_index > used_sectors.len() {
            used_sectors.resize(end_index, false);
        }

        for index in start_index..end_index {
            used_sectors.set(index, true);
        }
    }

    used_sectors
}

impl<S: Read + Seek> Region<S> {
    pub fn load(position: RegionPosition, mut source: S) -> Result<Self, io::Error> {
        let source_len = source.len()?;
        let chunks_metadata = Self::read_header(&mut source, source_len)?;

        let total_sectors = if source_len > REGION_HEADER_BYTES_LENGTH {
            (source_len as usize + (REGION_SECTOR_BYTES_LENGTH as usize - 1))
                / REGION_SECTOR_BYTES_LENGTH as usize
        } else {
            2
        };

        let used_sectors = used_sectors(total_sectors, &chunks_metadata);

        debug!(
            target: "anvil-nbt",
            "Loaded region x: {}, z: {} with {} sectors",
            position.x,
            position.z,
            used_sectors.len()
        );

        let region = Region {
            position,
            source,
            chunks_metadata,
            used_sectors,
        };

        Ok(region)
    }

    pub fn read_chunk(&mut self, position: RegionChunkPosition) -> Result<Tag, ChunkReadError> {
        let metadata = self
            .get_metadata(position)
            .ok_or(ChunkReadError::PositionOutOfBounds { position })?;

        if metadata.is_empty() {
            return Err(ChunkReadError::ChunkNotFound { position });
        }

        read_chunk(&mut self.source, metadata.seek_offset())
    }

    /// First 8KB of source are header of 1024 locations and 1024 timestamps.
    ///
    /// Empty source is an empty region, a missing timestamps sector reads as
    /// zero timestamps.
    fn read_header(
        source: &mut S,
        source_len: u64,
    ) -> Result<[ChunkMetadata; REGION_CHUNKS], io::Error> {
        let mut chunks_metadata = [ChunkMetadata::default(); REGION_CHUNKS];

        if source_len == 0 {
            return Ok(chunks_metadata);
        }

        if (REGION_SECTOR_BYTES_LENGTH as u64) > source_len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("Region header is truncated to {} bytes", source_len),
            ));
        }

        source.seek(SeekFrom::Start(0))?;

        let mut locations = [0u32; REGION_CHUNKS];
        source.read_u32_into::<BigEndian>(&mut locations)?;

        let mut timestamps = [0u32; REGION_CHUNKS];

        if source_len >= REGION_HEADER_BYTES_LENGTH {
            source.read_u32_into::<BigEndian>(&mut timestamps)?;
        }

        for index in 0..REGION_CHUNKS {
            let location = locations[index];

            let start_sector_index = location >> 8;
            let sectors = (location & 0xFF) as u8;

            chunks_metadata[index] =
                ChunkMetadata::new(start_sector_index, sectors, timestamps[index]);
        }

        Ok(chunks_metadata)
    }
}

impl<S: Write + Seek> Region<S> {
    /// Stores `tag` as unnamed zlib compressed chunk.
    ///
    /// Sector map is updated only after chunk data and header are written.
    pub fn write_chunk(
        &mut self,
        position: RegionChunkPosition,
        tag: &Tag,
    ) -> Result<(), ChunkWriteError> {
        if !position.is_within_region() {
            return Err(ChunkWriteError::PositionOutOfBounds { position });
        }

        let mut buffer = Vec::new();

        // If necessary, extend the source length to the length of the header.
        if REGION_HEADER_BYTES_LENGTH > self.source.len()? {
            debug!(target: "anvil-nbt", "Extending source to header length");
            self.source.extend_len(REGION_HEADER_BYTES_LENGTH)?;
        }

        buffer.write_u8(CompressionScheme::Zlib as u8)?;
        write_zlib_tag(&mut buffer, tag, "")?;

        // 4 bytes for data length.
        let length = buffer.len() + 4;

        if length > CHUNK_MAXIMUM_BYTES_LENGTH as usize {
            return Err(ChunkWriteError::LengthExceedsMaximum {
                length: length.min(u32::MAX as usize) as u32,
            });
        }

        let length = length as u32;
        let (mut metadata, used_sectors) = self.find_place(position, length)?;
        let seek_offset = metadata.seek_offset();

        self.source.seek(SeekFrom::Start(seek_offset))?;
        self.source.write_u32::<BigEndian>(buffer.len() as u32)?;
        self.source.write_all(&buffer)?;

        // Padding to align sector.
        let remainder = length % REGION_SECTOR_BYTES_LENGTH as u32;

        if remainder > 0 {
            let padding_len = REGION_SECTOR_BYTES_LENGTH as u32 - remainder;
            self.source.write_all(&vec![0; padding_len as usize])?;
        }

        metadata.update_last_modified_timestamp();
        self.update_metadata(position, metadata)?;
        self.used_sectors = used_sectors;

        Ok(())
    }

    /// Finds a place where chunk data of a given length can be put and
    /// returns it with the sector map as it will be once chunk is written.
    ///
    /// If cannot find a place to put chunk data will extend source.
    fn find_place(
        &mut self,
        position: RegionChunkPosition,
        chunk_length: u32,
    ) -> Result<(ChunkMetadata, BitVec), io::Error> {
        let sectors_required = sectors_required(chunk_length);
        let metadata = self.chunks_metadata[position.index()];
        let mut used_sectors = self.used_sectors.clone();

        // Chunk still fits in the old place.
        if !metadata.is_empty() && metadata.sectors == sectors_required {
            debug!(
                target: "anvil-nbt",
                "Region x: {}, z: {} chunk x: {}, z: {} with length {} still fits in the old place",
                self.position.x, self.position.z, position.x, position.z, chunk_length
            );

            return Ok((metadata, used_sectors));
        }

        // Release previously used sectors.
        if !metadata.is_empty() {
            for i in 0..metadata.sectors {
                let sector_index = metadata.start_sector_index as usize + i as usize;
                used_sectors.set(sector_index, false);
            }
        }

        let total_sectors = used_sectors.len();

        // Trying to find enough big gap between sectors to put chunk.
        let mut sectors_free = 0;

        for sector_index in 0..total_sectors {
            // Sector occupied and we can't place chunk.
            if used_sectors[sector_index] {
                sectors_free = 0;
                continue;
            }

            sectors_free += 1;

            // Can put chunk in gap.
            if sectors_free == sectors_required as usize {
                let put_sector_index = sector_index + 1 - sectors_free;

                // Marking new sectors as used.
                for index in put_sector_index..=sector_index {
                    used_sectors.set(index, true);
                }

                debug!(
                    target: "anvil-nbt",
                    "Region x: {}, z: {} chunk x: {}, z: {} with {} required sectors \
                    can be placed in free sectors gap between from {} to {}",
                    self.position.x,
                    self.position.z,
                    position.x,
                    position.z,
                    sectors_required,
                    put_sector_index,
                    sector_index
                );

                let metadata = ChunkMetadata::new(put_sector_index as u32, sectors_required, 0);

                return Ok((metadata, used_sectors));
            }
        }

        // Extending source because cannot find a place to put chunk data.
        // Free sectors at the end of source are reused.
        let extend_sectors = sectors_required as usize - sectors_free;
        let put_sector_index = total_sectors - sectors_free;
        let new_len = (total_sectors + extend_sectors) as u64 * REGION_SECTOR_BYTES_LENGTH as u64;

        debug!(
            target: "anvil-nbt",
            "Extending region x: {}, z: {} source to {} bytes to place chunk data",
            self.position.x,
            self.position.z,
            new_len
        );

        self.source.extend_len(new_len)?;

        // Mark new sectors as used.
        for index in put_sector_index..total_sectors {
            used_sectors.set(index, true);
        }

        for _ in 0..extend_sectors {
            used_sectors.push(true);
        }

        let metadata = ChunkMetadata::new(put_sector_index as u32, sectors_required, 0);

        Ok((metadata, used_sectors))
    }

    /// Updates chunk metadata.
    fn update_metadata(
        &mut self,
        position: RegionChunkPosition,
        metadata: ChunkMetadata,
    ) -> Result<(), io::Error> {
        let metadata_index = position.index();

        let start_seek_offset = SeekFrom::Start((metadata_index * 4) as u64);
        let location = (metadata.start_sector_index << 8) | metadata.sectors as u32;

        self.source.seek(start_seek_offset)?;
        self.source.write_u32::<BigEndian>(location)?;

        let next_seek_offset = SeekFrom::Current(REGION_SECTOR_BYTES_LENGTH as i64 - 4);
        let last_modified_timestamp = metadata.last_modified_timestamp;

        self.source.seek(next_seek_offset)?;
        self.source
            .write_u32::<BigEndian>(last_modified_timestamp)?;

        self.chunks_metadata[metadata_index] = metadata;

        Ok(())
    }
}

/// Sectors needed for chunk data of a given length, never more than 255
/// since longer chunks are rejected before placement.
fn sectors_required(chunk_length: u32) -> u8 {
    let sector_length = REGION_SECTOR_BYTES_LENGTH as u32;

    ((chunk_length + sector_length - 1) / sector_length) as u8
}

/// Chunk metadata are stored in header.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
struct ChunkMetadata {
    /// Sector index from which starts chunk data.
    start_sector_index: u32,
    /// Amount of sectors used to store chunk.
    sectors: u8,
    /// Last time in seconds when chunk was modified.
    last_modified_timestamp: u32,
}

impl ChunkMetadata {
    fn new(start_sector_index: u32, sectors: u8, last_modified_timestamp: u32) -> Self {
        ChunkMetadata {
            start_sector_index,
            sectors,
            last_modified_timestamp,
        }
    }

    fn update_last_modified_timestamp(&mut self) {
        let system_time = SystemTime::now();

        self.last_modified_timestamp = system_time
            .duration_since(UNIX_EPOCH)
            .map(|time| time.as_secs() as u32)
            .unwrap_or_default();
    }

    fn seek_offset(&self) -> u64 {
        self.start_sector_index as u64 * REGION_SECTOR_BYTES_LENGTH as u64
    }

    /// Chunk data never starts inside the header, so zero offset means absent.
    fn is_empty(&self) -> bool {
        self.start_sector_index == 0
    }
}

/// Trait adds additional helper methods for `Seek`.
trait SeekExt {
    fn len(&mut self) -> Result<u64, io::Error>;
}

impl<S: Seek> SeekExt for S {
    fn len(&mut self) -> Result<u64, Error> {
        let old_pos = self.seek(SeekFrom::Current(0))?;
        let len = self.seek(SeekFrom::End(0))?;

        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }

        Ok(len)
    }
}

/// Trait adds additional helper methods for `Seek+Write`.
trait SeekWriteExt {
    fn extend_len(&mut self, new_len: u64) -> Result<(), io::Error>;
}

impl<S: Seek + Write> SeekWriteExt for S {
    fn extend_len(&mut self, new_len: u64) -> Result<(), Error> {
        let old_pos = self.seek(SeekFrom::Current(0))?;
        let len = self.seek(SeekFrom::End(0))?;

        if new_len > len {
            let padding_len = new_len - len;
            self.write_all(&vec![0; padding_len as usize])?;
        }

        if old_pos != len {
            self.seek(SeekFrom::Start(old_pos))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::{ChunkReadError, ChunkWriteError};
    use crate::position::{RegionChunkPosition, RegionPosition};
    use crate::region;
    use crate::region::{
        chunk_index, foreach_chunk, read_chunk, read_offset_table, ChunkMetadata, Region,
        SeekExt, SeekWriteExt, REGION_CHUNKS, REGION_HEADER_BYTES_LENGTH,
        REGION_SECTOR_BYTES_LENGTH,
    };
    use crate::tag::{CompoundTag, Tag};
    use byteorder::{BigEndian, WriteBytesExt};
    use flate2::write::{GzEncoder, ZlibEncoder};
    use flate2::Compression;
    use std::collections::HashSet;
    use std::io;
    use std::io::{Cursor, Read, Seek, SeekFrom, Write};

    const SECTOR: usize = REGION_SECTOR_BYTES_LENGTH as usize;

    /// In-memory source which rejects writes while `fail_writes` is set.
    struct FailingCursor {
        cursor: Cursor<Vec<u8>>,
        fail_writes: bool,
    }

    impl FailingCursor {
        fn new() -> Self {
            FailingCursor {
                cursor: Cursor::new(Vec::new()),
                fail_writes: false,
            }
        }
    }

    impl Read for FailingCursor {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.cursor.read(buf)
        }
    }

    impl Write for FailingCursor {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_writes {
                return Err(io::Error::new(io::ErrorKind::Other, "No space left"));
            }

            self.cursor.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.cursor.flush()
        }
    }

    impl Seek for FailingCursor {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.cursor.seek(pos)
        }
    }

    fn chunk_nbt(x_pos: i32, z_pos: i32) -> Vec<u8> {
        let mut data = vec![0x0A, 0x00, 0x00, 0x0A, 0x00, 0x05];
        data.extend_from_slice(b"Level");
        data.extend_from_slice(&[0x03, 0x00, 0x04]);
        data.extend_from_slice(b"xPos");
        data.write_i32::<BigEndian>(x_pos).unwrap();
        data.extend_from_slice(&[0x03, 0x00, 0x04]);
        data.extend_from_slice(b"zPos");
        data.write_i32::<BigEndian>(z_pos).unwrap();
        data.extend_from_slice(&[0x00, 0x00]);

        data
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    /// Builds region source with every chunk placed into its own sector.
    fn region_source(chunks: &[(u8, u8, u8, Vec<u8>)]) -> Vec<u8> {
        let mut source = vec![0u8; REGION_HEADER_BYTES_LENGTH as usize];

        for (x, z, compression_scheme, payload) in chunks {
            let sector_index = source.len() / SECTOR;
            let location = ((sector_index as u32) << 8) | 1;
            let header_offset = chunk_index(*x, *z).unwrap() * 4;

            source[header_offset..header_offset + 4].copy_from_slice(&location.to_be_bytes());
            source[SECTOR + header_offset..SECTOR + header_offset + 4]
                .copy_from_slice(&1570215508u32.to_be_bytes());

            let mut frame = Vec::new();
            frame
                .write_u32::<BigEndian>(payload.len() as u32 + 1)
                .unwrap();
            frame.write_u8(*compression_scheme).unwrap();
            frame.extend_from_slice(payload);
            frame.resize(SECTOR, 0);

            source.extend_from_slice(&frame);
        }

        source
    }

    /// Compressed data which size is close to its raw size.
    fn noise(count: usize) -> Vec<i32> {
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        let mut values = Vec::with_capacity(count);

        for _ in 0..count {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            values.push((state >> 32) as i32);
        }

        values
    }

    fn small_compound_tag() -> Tag {
        let mut compound_tag = CompoundTag::new();
        compound_tag.insert_bool("test_bool", true);
        compound_tag.insert_str("test_str", "test");

        Tag::Compound(compound_tag)
    }

    fn large_compound_tag() -> Tag {
        let mut compound_tag = CompoundTag::new();
        // Around 6000 bytes after compression, which needs second sector.
        compound_tag.insert_i32_vec("test_i32_vec", noise(1500));

        Tag::Compound(compound_tag)
    }

    fn assert_level_position(tag: &Tag, x_pos: i32, z_pos: i32) {
        let level_tag = tag
            .as_compound()
            .unwrap()
            .get_compound_tag("Level")
            .unwrap();

        assert_eq!(level_tag.get_i32("xPos").unwrap(), x_pos);
        assert_eq!(level_tag.get_i32("zPos").unwrap(), z_pos);
    }

    #[test]
    fn test_chunk_index_is_bijection() {
        let mut indexes = HashSet::new();

        for z in 0..32 {
            for x in 0..32 {
                indexes.insert(chunk_index(x, z).unwrap());
            }
        }

        assert_eq!(indexes.len(), REGION_CHUNKS);
        assert!(indexes.iter().all(|index| *index < REGION_CHUNKS));
        assert_eq!(chunk_index(15, 3), Some(111));
        assert_eq!(chunk_index(40, 0), None);
        assert_eq!(chunk_index(0, 32), None);
    }

    #[test]
    fn test_foreach_chunk_order() {
        let mut visited = Vec::new();
        foreach_chunk(|x, z, index| visited.push((x, z, index)));

        assert_eq!(visited.len(), REGION_CHUNKS);
        assert_eq!(visited[0], (0, 0, 0));
        assert_eq!(visited[1], (1, 0, 1));
        assert_eq!(visited[32], (0, 1, 32));
        assert_eq!(visited[1023], (31, 31, 1023));

        for (x, z, index) in visited {
            assert_eq!(chunk_index(x, z), Some(index));
        }
    }

    #[test]
    fn test_read_offset_table() {
        let source = region_source(&[(15, 3, 2, zlib(&chunk_nbt(15, 3)))]);
        let offsets = read_offset_table(&mut Cursor::new(source)).unwrap();

        assert_eq!(offsets.len(), REGION_CHUNKS);
        assert_eq!(offsets[chunk_index(15, 3).unwrap()], 2 * SECTOR as u64);
        assert_eq!(offsets.iter().filter(|offset| **offset != 0).count(), 1);
    }

    #[test]
    fn test_read_chunk_zlib() {
        let source = region_source(&[(15, 3, 2, zlib(&chunk_nbt(15, 3)))]);
        let tag = read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64).unwrap();

        assert_level_position(&tag, 15, 3);
    }

    #[test]
    fn test_read_chunk_gzip() {
        let source = region_source(&[(1, 2, 1, gzip(&chunk_nbt(1, 2)))]);
        let tag = read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64).unwrap();

        assert_level_position(&tag, 1, 2);
    }

    #[test]
    fn test_read_chunk_unsupported_compression() {
        let source = region_source(&[(0, 0, 3, vec![0xDE, 0xAD, 0xBE, 0xEF])]);

        match read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64) {
            Err(ChunkReadError::UnsupportedCompressionScheme { compression_scheme }) => {
                assert_eq!(compression_scheme, 3)
            }
            other => panic!("Expected `UnsupportedCompressionScheme` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_read_chunk_zero_length() {
        let mut source = vec![0u8; REGION_HEADER_BYTES_LENGTH as usize + SECTOR];
        source[2 * SECTOR + 4] = 2;

        match read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64) {
            Err(ChunkReadError::InvalidLength { length, .. }) => assert_eq!(length, 0),
            other => panic!("Expected `InvalidLength` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_header_read() {
        let source = region_source(&[
            (0, 0, 2, zlib(&chunk_nbt(0, 0))),
            (15, 3, 2, zlib(&chunk_nbt(15, 3))),
        ]);

        let region = Region::load(RegionPosition::new(0, 0), Cursor::new(source)).unwrap();

        assert_eq!(
            region.chunks_metadata[chunk_index(0, 0).unwrap()],
            ChunkMetadata::new(2, 1, 1570215508)
        );
        assert_eq!(
            region.chunks_metadata[chunk_index(15, 3).unwrap()],
            ChunkMetadata::new(3, 1, 1570215508)
        );
        assert_eq!(
            region.last_modified(RegionChunkPosition::new(15, 3)),
            Some(1570215508)
        );
        assert_eq!(region.last_modified(RegionChunkPosition::new(1, 1)), None);
    }

    #[test]
    fn test_chunk_offsets_match_offset_table() {
        let source = region_source(&[
            (0, 0, 2, zlib(&chunk_nbt(0, 0))),
            (31, 31, 2, zlib(&chunk_nbt(31, 31))),
        ]);

        let offsets = read_offset_table(&mut Cursor::new(source.clone())).unwrap();
        let region = Region::load(RegionPosition::new(0, 0), Cursor::new(source)).unwrap();

        assert_eq!(region.chunk_offsets()[..], offsets[..]);
    }

    #[test]
    fn test_read_chunk() {
        let source = region_source(&[(15, 3, 2, zlib(&chunk_nbt(15, 3)))]);
        let mut region = Region::load(RegionPosition::new(0, 0), Cursor::new(source)).unwrap();

        let tag = region.read_chunk(RegionChunkPosition::new(15, 3)).unwrap();

        assert_level_position(&tag, 15, 3);
    }

    #[test]
    fn test_read_chunk_not_found() {
        let cursor = Cursor::new(vec![0; REGION_HEADER_BYTES_LENGTH as usize]);
        let mut region = Region::load(RegionPosition::new(0, 0), cursor).unwrap();
        let load_error = region
            .read_chunk(RegionChunkPosition::new(14, 12))
            .err()
            .unwrap();

        match load_error {
            ChunkReadError::ChunkNotFound { position } => {
                assert_eq!(position, RegionChunkPosition::new(14, 12));
            }
            _ => panic!("Expected `ChunkNotFound` but got `{:?}`", load_error),
        }
    }

    #[test]
    fn test_broken_chunk_does_not_stop_scan() {
        let source = region_source(&[
            (0, 0, 3, vec![0x00]),
            (1, 0, 2, vec![0x78, 0x9C, 0xFF]),
            (2, 0, 2, zlib(&chunk_nbt(2, 0))),
        ]);

        let mut region = Region::load(RegionPosition::new(0, 0), Cursor::new(source)).unwrap();
        let mut results = Vec::new();

        foreach_chunk(|x, z, _| {
            let position = RegionChunkPosition::new(x, z);

            if region.contains_chunk(position) {
                results.push(region.read_chunk(position));
            }
        });

        assert_eq!(results.len(), 3);
        assert!(results[0].is_err());
        assert!(results[1].is_err());
        assert_level_position(results[2].as_ref().unwrap(), 2, 0);
    }

    #[test]
    fn test_update_metadata() {
        let cursor = Cursor::new(vec![0; REGION_HEADER_BYTES_LENGTH as usize]);
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();

        let mut metadata = ChunkMetadata::new(500, 10, 0);
        metadata.update_last_modified_timestamp();

        let position = RegionChunkPosition::new(15, 15);
        region.update_metadata(position, metadata).unwrap();

        let chunks_metadata =
            Region::read_header(&mut region.source, REGION_HEADER_BYTES_LENGTH).unwrap();

        // In memory metadata.
        assert_eq!(region.get_metadata(position), Some(metadata));
        // Written to source metadata.
        assert_eq!(chunks_metadata[position.index()], metadata);
    }

    #[test]
    fn test_write_chunk_with_source_extend() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();
        let position = RegionChunkPosition::new(15, 15);

        region.write_chunk(position, &small_compound_tag()).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64
        );

        assert_eq!(region.used_sectors.len(), 3);

        let read_tag = region.read_chunk(position).unwrap();

        assert_eq!(read_tag, small_compound_tag());
        assert!(region.last_modified(position).unwrap() > 0);
    }

    #[test]
    fn test_write_chunk_same_sector() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();
        let position = RegionChunkPosition::new(15, 15);

        let mut write_compound_tag = CompoundTag::new();
        write_compound_tag.insert_bool("test_bool", true);
        write_compound_tag.insert_str("test_str", "test");
        write_compound_tag.insert_f32("test_f32", 1.23);

        region
            .write_chunk(position, &Tag::Compound(write_compound_tag))
            .unwrap();
        region.write_chunk(position, &small_compound_tag()).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64
        );

        assert_eq!(region.used_sectors.len(), 3);

        let read_tag = region.read_chunk(position).unwrap();
        let read_compound_tag = read_tag.as_compound().unwrap();

        assert!(read_compound_tag.get_bool("test_bool").unwrap());
        assert_eq!(read_compound_tag.get_str("test_str").unwrap(), "test");
        assert!(!read_compound_tag.contains_key("test_f32"));
    }

    #[test]
    fn test_write_chunk_same_sector_with_source_expand() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();
        let position = RegionChunkPosition::new(15, 15);

        region.write_chunk(position, &small_compound_tag()).unwrap();
        region.write_chunk(position, &large_compound_tag()).unwrap();

        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 2
        );

        assert_eq!(region.used_sectors.len(), 4);
        assert_eq!(region.read_chunk(position).unwrap(), large_compound_tag());
    }

    #[test]
    fn test_write_chunk_with_insert_in_middle_gap() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();

        // First two sectors are occupied by header.
        for _ in 0..3 {
            region.used_sectors.push(true);
        }

        region.used_sectors.set(2, false);

        let length = REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 3;
        region.source.extend_len(length).unwrap();

        region
            .write_chunk(RegionChunkPosition::new(15, 15), &small_compound_tag())
            .unwrap();

        for i in 0..5 {
            assert!(region.used_sectors[i]);
        }

        assert_eq!(
            region.chunks_metadata[RegionChunkPosition::new(15, 15).index()].start_sector_index,
            2
        );
        assert_eq!(region.source.len().unwrap(), length);
        assert_eq!(region.used_sectors.len(), 5);
    }

    #[test]
    fn test_write_chunk_not_enough_gap() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(1, 1), cursor).unwrap();

        region
            .write_chunk(RegionChunkPosition::new(15, 15), &small_compound_tag())
            .unwrap();
        region
            .write_chunk(RegionChunkPosition::new(0, 0), &small_compound_tag())
            .unwrap();
        region
            .write_chunk(RegionChunkPosition::new(15, 15), &large_compound_tag())
            .unwrap();

        let used: Vec<bool> = region.used_sectors.iter().map(|bit| *bit).collect();

        assert_eq!(used, vec![true, true, false, true, true, true]);
        assert_eq!(
            region.source.len().unwrap(),
            REGION_HEADER_BYTES_LENGTH + REGION_SECTOR_BYTES_LENGTH as u64 * 4
        );
        assert_eq!(
            region
                .read_chunk(RegionChunkPosition::new(0, 0))
                .unwrap(),
            small_compound_tag()
        );
    }

    #[test]
    fn test_written_region_reloads() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(0, 0), cursor).unwrap();

        region
            .write_chunk(RegionChunkPosition::new(3, 4), &small_compound_tag())
            .unwrap();

        let source = region.into_inner();
        let mut region = Region::load(RegionPosition::new(0, 0), source).unwrap();

        assert!(region.contains_chunk(RegionChunkPosition::new(3, 4)));
        assert_eq!(
            region.read_chunk(RegionChunkPosition::new(3, 4)).unwrap(),
            small_compound_tag()
        );
        assert_eq!(region.used_sectors.len(), 3);
    }

    #[test]
    fn test_used_sectors_only_header() {
        let empty_chunks_metadata = Vec::new();
        let used_sectors = region::used_sectors(8, &empty_chunks_metadata);

        // Two sectors are used for header data.
        assert_eq!(used_sectors.count_ones(), 2);
        assert!(used_sectors[0] && used_sectors[1]);
    }

    #[test]
    fn test_used_sectors_all() {
        let chunks_metadata = vec![ChunkMetadata::new(2, 6, 0)];
        let used_sectors = region::used_sectors(8, &chunks_metadata);

        assert!(used_sectors.all());
    }

    #[test]
    fn test_used_sectors_partially() {
        let chunks_metadata = vec![ChunkMetadata::new(3, 3, 0), ChunkMetadata::new(8, 1, 0)];

        let used_sectors = region::used_sectors(10, &chunks_metadata);
        let used: Vec<usize> = used_sectors.iter_ones().collect();

        assert_eq!(used, vec![0, 1, 3, 4, 5, 8]);
    }

    #[test]
    fn test_used_sectors_past_source_end() {
        let chunks_metadata = vec![ChunkMetadata::new(4, 2, 0)];
        let used_sectors = region::used_sectors(3, &chunks_metadata);

        assert_eq!(used_sectors.len(), 6);
    }

    #[test]
    fn test_len() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        let len = cursor.len().unwrap();

        assert_eq!(len, 5);
    }

    #[test]
    fn test_extend_len() {
        let mut cursor = Cursor::new(vec![1, 2, 3, 4, 5]);
        cursor.extend_len(10).unwrap();
        let len = cursor.len().unwrap();

        assert_eq!(len, 10);
    }

    #[test]
    fn test_read_chunk_length_exceeds_maximum() {
        let mut source = vec![0u8; REGION_HEADER_BYTES_LENGTH as usize + SECTOR];
        let length = 255 * SECTOR as u32 + 1;
        source[2 * SECTOR..2 * SECTOR + 4].copy_from_slice(&length.to_be_bytes());
        source[2 * SECTOR + 4] = 2;

        match read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64) {
            Err(ChunkReadError::InvalidLength {
                length: actual_length,
                maximum_length,
            }) => {
                assert_eq!(actual_length, length);
                assert_eq!(maximum_length, 255 * SECTOR as u32);
            }
            other => panic!("Expected `InvalidLength` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_read_chunk_truncated_payload() {
        let mut source = region_source(&[(0, 0, 2, zlib(&chunk_nbt(0, 0)))]);
        // Frame claims more bytes than the source holds.
        source[2 * SECTOR..2 * SECTOR + 4].copy_from_slice(&8000u32.to_be_bytes());

        match read_chunk(&mut Cursor::new(source), 2 * SECTOR as u64) {
            Err(ChunkReadError::UnexpectedEof) => {}
            other => panic!("Expected `UnexpectedEof` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_read_chunk_truncated_frame_header() {
        let source = vec![0u8; REGION_HEADER_BYTES_LENGTH as usize + 2];

        match read_chunk(&mut Cursor::new(source), REGION_HEADER_BYTES_LENGTH) {
            Err(ChunkReadError::UnexpectedEof) => {}
            other => panic!("Expected `UnexpectedEof` but got `{:?}`", other),
        }
    }

    #[test]
    fn test_load_truncated_header() {
        let cursor = Cursor::new(vec![0xFF; 100]);
        let load_error = Region::load(RegionPosition::new(0, 0), cursor).err().unwrap();

        assert_eq!(load_error.kind(), io::ErrorKind::UnexpectedEof);
        assert!(read_offset_table(&mut Cursor::new(vec![0xFF; 100])).is_err());
    }

    #[test]
    fn test_load_empty_source() {
        let region = Region::load(RegionPosition::new(0, 0), Cursor::new(Vec::new())).unwrap();

        assert!(region.chunk_offsets().iter().all(|offset| *offset == 0));
    }

    #[test]
    fn test_position_out_of_bounds() {
        let cursor = Cursor::new(Vec::new());
        let mut region =
            Region::<Cursor<Vec<u8>>>::load(RegionPosition::new(0, 0), cursor).unwrap();
        let position = RegionChunkPosition { x: 40, z: 0 };

        assert!(!region.contains_chunk(position));
        assert_eq!(region.last_modified(position), None);

        match region.read_chunk(position) {
            Err(ChunkReadError::PositionOutOfBounds { .. }) => {}
            other => panic!("Expected `PositionOutOfBounds` but got `{:?}`", other),
        }

        match region.write_chunk(position, &small_compound_tag()) {
            Err(ChunkWriteError::PositionOutOfBounds { .. }) => {}
            other => panic!("Expected `PositionOutOfBounds` but got `{:?}`", other),
        }

        // Nothing was written for the rejected chunk.
        assert_eq!(region.into_inner().into_inner().len(), 0);
    }

    #[test]
    fn test_failed_write_keeps_sectors_of_old_chunk() {
        let mut region = Region::load(RegionPosition::new(0, 0), FailingCursor::new()).unwrap();
        let first = RegionChunkPosition::new(0, 0);
        let second = RegionChunkPosition::new(1, 0);
        let third = RegionChunkPosition::new(2, 0);

        region.write_chunk(first, &small_compound_tag()).unwrap();
        region.write_chunk(second, &small_compound_tag()).unwrap();

        region.source.fail_writes = true;

        match region.write_chunk(first, &large_compound_tag()) {
            Err(ChunkWriteError::IOError { .. }) => {}
            other => panic!("Expected `IOError` but got `{:?}`", other),
        }

        region.source.fail_writes = false;

        let mut third_compound_tag = CompoundTag::new();
        third_compound_tag.insert_i32_vec("third", vec![1, 2, 3]);
        let third_tag = Tag::Compound(third_compound_tag);

        region.write_chunk(third, &third_tag).unwrap();

        assert_eq!(region.chunks_metadata[third.index()].start_sector_index, 4);
        assert_eq!(region.read_chunk(first).unwrap(), small_compound_tag());
        assert_eq!(region.read_chunk(second).unwrap(), small_compound_tag());
        assert_eq!(region.read_chunk(third).unwrap(), third_tag);
    }
}
