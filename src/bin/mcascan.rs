use anvil_nbt::provider::region_pos_from_filename;
use anvil_nbt::region::{foreach_chunk, read_chunk, read_offset_table};
use anvil_nbt::{FolderRegionProvider, RegionPosition};
use clap::{App, Arg};
use env_logger::Env;
use log::{error, info, warn};
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::process;

/// Prints coordinates of non-empty chunks, optionally decoding each of them.
///
/// Returns amount of non-empty chunks.
fn scan_region(path: &Path, verify: bool) -> Result<usize, io::Error> {
    let mut reader = BufReader::new(File::open(path)?);
    let offsets = read_offset_table(&mut reader)?;
    let mut chunks = 0;

    foreach_chunk(|x, z, index| {
        let offset = offsets[index];

        if offset == 0 {
            return;
        }

        chunks += 1;
        println!("({}, {})", x, z);

        if verify {
            if let Err(err) = read_chunk(&mut reader, offset) {
                warn!("{}: chunk {}, {} is broken: {}", path.display(), x, z, err);
            }
        }
    });

    Ok(chunks)
}

fn scan_folder(path: &Path, verify: bool) -> Result<(), io::Error> {
    let provider = FolderRegionProvider::new(path);
    let mut regions = 0;

    for position in provider.iter_positions()? {
        let region_path = provider.region_path(position);

        println!("r.{}.{}.mca:", position.x, position.z);

        match scan_region(&region_path, verify) {
            Ok(chunks) => {
                regions += 1;
                info!("{}: {} chunks", region_path.display(), chunks);
            }
            Err(err) => error!("{}: {}", region_path.display(), err),
        }
    }

    info!("{} regions scanned", regions);

    Ok(())
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let matches = App::new("mcascan")
        .about("Lists non-empty chunks of region files")
        .arg(
            Arg::with_name("path")
                .required(true)
                .help("region file or folder of region files"),
        )
        .arg(
            Arg::with_name("verify")
                .long("verify")
                .help("decode every chunk and report broken ones"),
        )
        .get_matches();

    let path = Path::new(matches.value_of_os("path").unwrap_or_default());
    let verify = matches.is_present("verify");

    if path.is_dir() {
        if let Err(err) = scan_folder(path, verify) {
            error!("{}: {}", path.display(), err);
            process::exit(1);
        }

        return;
    }

    if let Ok(RegionPosition { x, z }) = region_pos_from_filename(path) {
        info!("region {}, {}", x, z);
    }

    println!("Non-empty chunks:");

    if let Err(err) = scan_region(path, verify) {
        error!("{}: {}", path.display(), err);
        process::exit(1);
    }
}
