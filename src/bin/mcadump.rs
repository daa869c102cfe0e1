use anvil_nbt::{ChunkReadError, Region, RegionChunkPosition, RegionPosition};
use clap::{App, Arg};
use env_logger::Env;
use log::error;
use std::fs::File;
use std::process;

fn parse_coordinate(value: Option<&str>) -> Option<i64> {
    value?.parse().ok()
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let matches = App::new("mcadump")
        .about("Dumps one chunk of a region file as JSON")
        .arg(Arg::with_name("file").required(true))
        .arg(Arg::with_name("x").required(true).allow_hyphen_values(true))
        .arg(Arg::with_name("z").required(true).allow_hyphen_values(true))
        .get_matches();

    let x = parse_coordinate(matches.value_of("x"));
    let z = parse_coordinate(matches.value_of("z"));

    let position = match (x, z) {
        (Some(x), Some(z)) => RegionChunkPosition::try_new(x, z),
        _ => None,
    };

    let position = match position {
        Some(position) => position,
        None => {
            println!("x/z must be between 0 and 31");
            process::exit(1);
        }
    };

    let path = matches.value_of_os("file").unwrap_or_default();

    let region = File::open(path).and_then(|file| Region::load(RegionPosition::new(0, 0), file));

    let mut region = match region {
        Ok(region) => region,
        Err(err) => {
            error!("cannot open {}: {}", path.to_string_lossy(), err);
            process::exit(1);
        }
    };

    match region.read_chunk(position) {
        Ok(tag) => match serde_json::to_string_pretty(&tag.dump()) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                error!("cannot render json: {}", err);
                process::exit(1);
            }
        },
        Err(ChunkReadError::ChunkNotFound { .. }) => println!("chunk is empty"),
        Err(err) => {
            error!("cannot read chunk {}, {}: {}", position.x, position.z, err);
            process::exit(1);
        }
    }
}
