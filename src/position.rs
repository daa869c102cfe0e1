/// Amount of chunks along one side of a region.
pub const REGION_CHUNKS_PER_SIDE: u8 = 32;

#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone)]
pub struct RegionPosition {
    pub x: i32,
    pub z: i32,
}

impl RegionPosition {
    pub fn new(x: i32, z: i32) -> RegionPosition {
        RegionPosition { x, z }
    }

    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionPosition {
        let x = chunk_x >> 5;
        let z = chunk_z >> 5;

        RegionPosition::new(x, z)
    }
}

/// Chunk coordinates relative to the region that contains it.
#[derive(Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Copy, Clone)]
pub struct RegionChunkPosition {
    pub x: u8,
    pub z: u8,
}

impl RegionChunkPosition {
    pub fn new(x: u8, z: u8) -> RegionChunkPosition {
        debug_assert!(
            REGION_CHUNKS_PER_SIDE > x,
            "Region chunk x coordinate out of bounds"
        );
        debug_assert!(
            REGION_CHUNKS_PER_SIDE > z,
            "Region chunk z coordinate out of bounds"
        );

        RegionChunkPosition { x, z }
    }

    /// Returns `None` when a coordinate is outside `0..32`.
    pub fn try_new(x: i64, z: i64) -> Option<RegionChunkPosition> {
        let range = 0..REGION_CHUNKS_PER_SIDE as i64;

        if range.contains(&x) && range.contains(&z) {
            Some(RegionChunkPosition::new(x as u8, z as u8))
        } else {
            None
        }
    }

    pub fn from_chunk_position(chunk_x: i32, chunk_z: i32) -> RegionChunkPosition {
        let x = (chunk_x & 31) as u8;
        let z = (chunk_z & 31) as u8;

        RegionChunkPosition::new(x, z)
    }

    /// Both coordinates are in `0..32`.
    pub fn is_within_region(&self) -> bool {
        REGION_CHUNKS_PER_SIDE > self.x && REGION_CHUNKS_PER_SIDE > self.z
    }

    /// Slot of this chunk in the region header.
    pub fn index(&self) -> usize {
        self.x as usize + self.z as usize * REGION_CHUNKS_PER_SIDE as usize
    }
}

#[cfg(test)]
mod tests {
    use crate::position::{RegionChunkPosition, RegionPosition};

    #[test]
    fn test_region_position_from_chunk_position() {
        assert_eq!(
            RegionPosition::from_chunk_position(15, 3),
            RegionPosition::new(0, 0)
        );
        assert_eq!(
            RegionPosition::from_chunk_position(-1, 32),
            RegionPosition::new(-1, 1)
        );
    }

    #[test]
    fn test_region_chunk_position_from_chunk_position() {
        assert_eq!(
            RegionChunkPosition::from_chunk_position(-1, 33),
            RegionChunkPosition::new(31, 1)
        );
    }

    #[test]
    fn test_try_new_bounds() {
        assert_eq!(
            RegionChunkPosition::try_new(31, 0),
            Some(RegionChunkPosition::new(31, 0))
        );
        assert_eq!(RegionChunkPosition::try_new(32, 0), None);
        assert_eq!(RegionChunkPosition::try_new(0, -1), None);
    }

    #[test]
    fn test_index() {
        assert_eq!(RegionChunkPosition::new(0, 0).index(), 0);
        assert_eq!(RegionChunkPosition::new(1, 0).index(), 1);
        assert_eq!(RegionChunkPosition::new(0, 1).index(), 32);
        assert_eq!(RegionChunkPosition::new(31, 31).index(), 1023);
    }
}
