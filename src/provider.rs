use crate::position::RegionPosition;
use crate::region::Region;
use log::debug;
use std::fs::{read_dir, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{fs, io};

pub trait RegionProvider<S> {
    /// Returns region at position, creating its source when absent.
    fn get_region(&self, position: RegionPosition) -> Result<Region<S>, io::Error>;
}

pub struct FolderRegionProvider {
    /// Folder where region files located.
    folder_path: PathBuf,
}

impl FolderRegionProvider {
    pub fn new<P: AsRef<Path>>(folder: P) -> FolderRegionProvider {
        let folder_path = folder.as_ref().to_path_buf();

        FolderRegionProvider { folder_path }
    }

    /// Positions of every region file in folder, other files are skipped.
    pub fn iter_positions(&self) -> Result<impl Iterator<Item = RegionPosition>, io::Error> {
        let mut positions: Vec<_> = read_dir(&self.folder_path)?
            .filter_map(|dir| dir.ok())
            .filter_map(|dir| region_pos_from_filename(&dir.path()).ok())
            .collect();

        positions.sort_by_key(|position| (position.z, position.x));

        Ok(positions.into_iter())
    }

    pub fn region_path(&self, position: RegionPosition) -> PathBuf {
        self.folder_path.join(region_position_filename(position))
    }

    /// Opens existing region for reading only.
    pub fn open_region(&self, position: RegionPosition) -> Result<Region<File>, io::Error> {
        let file = File::open(self.region_path(position))?;

        Region::load(position, file)
    }
}

impl RegionProvider<File> for FolderRegionProvider {
    fn get_region(&self, position: RegionPosition) -> Result<Region<File>, io::Error> {
        if !self.folder_path.exists() {
            debug!(target: "anvil-nbt", "Creating region folder {}", self.folder_path.display());
            fs::create_dir_all(&self.folder_path)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .read(true)
            .create(true)
            .open(self.region_path(position))?;

        Region::load(position, file)
    }
}

/// Parses region position from `r.<x>.<z>.mca` file name.
pub fn region_pos_from_filename(path: &Path) -> Result<RegionPosition, io::Error> {
    // we can use lossy because of the bound check later
    let filename = path.file_name().unwrap_or_default().to_string_lossy();
    let parts: Vec<_> = filename.split('.').collect();

    let (x, z) = parse_coords(parts).ok_or(io::ErrorKind::InvalidInput)?;

    Ok(RegionPosition::new(x, z))
}

fn region_position_filename(position: RegionPosition) -> String {
    format!("r.{}.{}.mca", position.x, position.z)
}

fn parse_coords(parts: Vec<&str>) -> Option<(i32, i32)> {
    let incorrect_format = parts.len() != 4 || parts[0] != "r" || parts[3] != "mca";

    if incorrect_format {
        return None;
    }

    Some((i32::from_str(parts[1]).ok()?, i32::from_str(parts[2]).ok()?))
}

#[cfg(test)]
mod tests {
    use crate::position::{RegionChunkPosition, RegionPosition};
    use crate::provider::{region_pos_from_filename, FolderRegionProvider, RegionProvider};
    use crate::tag::{CompoundTag, Tag};
    use std::fs::File;
    use std::path::PathBuf;

    #[test]
    fn test_position_parse() {
        let mut path = PathBuf::new();
        path.set_file_name("r.-1.1.mca");

        let pos = region_pos_from_filename(&path).unwrap();
        assert_eq!(RegionPosition { x: -1, z: 1 }, pos)
    }

    #[test]
    #[should_panic]
    fn test_position_parse_invalid_format() {
        let mut path = PathBuf::new();
        path.set_file_name("this is not a valid region.filename");

        region_pos_from_filename(&path).unwrap();
    }

    #[test]
    fn test_position_parse_invalid_coordinate() {
        let path = PathBuf::from("r.one.2.mca");

        assert!(region_pos_from_filename(&path).is_err());
    }

    #[test]
    fn test_iter_positions() {
        let folder = tempfile::tempdir().unwrap();

        File::create(folder.path().join("r.1.0.mca")).unwrap();
        File::create(folder.path().join("r.0.-1.mca")).unwrap();
        File::create(folder.path().join("level.dat")).unwrap();

        let provider = FolderRegionProvider::new(folder.path());
        let positions: Vec<_> = provider.iter_positions().unwrap().collect();

        assert_eq!(
            positions,
            vec![RegionPosition::new(0, -1), RegionPosition::new(1, 0)]
        );
    }

    #[test]
    fn test_get_region_writes_and_reopens() {
        let folder = tempfile::tempdir().unwrap();
        let region_folder = folder.path().join("region");
        let provider = FolderRegionProvider::new(&region_folder);
        let position = RegionPosition::new(-2, 3);

        let mut compound_tag = CompoundTag::new();
        compound_tag.insert_i32("xPos", -64);
        let tag = Tag::Compound(compound_tag);

        let mut region = provider.get_region(position).unwrap();
        region
            .write_chunk(RegionChunkPosition::new(0, 31), &tag)
            .unwrap();

        assert!(region_folder.join("r.-2.3.mca").exists());

        let mut region = provider.open_region(position).unwrap();

        assert_eq!(
            region.read_chunk(RegionChunkPosition::new(0, 31)).unwrap(),
            tag
        );
    }

    #[test]
    fn test_open_missing_region() {
        let folder = tempfile::tempdir().unwrap();
        let provider = FolderRegionProvider::new(folder.path());

        assert!(provider.open_region(RegionPosition::new(0, 0)).is_err());
    }
}
