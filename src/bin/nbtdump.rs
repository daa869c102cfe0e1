use anvil_nbt::decode::{read_gzip_tag, read_tag};
use clap::{App, Arg};
use env_logger::Env;
use log::error;
use std::fs::File;
use std::io::BufReader;
use std::process;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let matches = App::new("nbtdump")
        .about("Dumps NBT file as JSON")
        .arg(Arg::with_name("file").required(true))
        .arg(
            Arg::with_name("uncompressed")
                .long("uncompressed")
                .short("u")
                .help("file is not gzip compressed"),
        )
        .get_matches();

    let path = matches.value_of_os("file").unwrap_or_default();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => {
            error!("cannot open {}: {}", path.to_string_lossy(), err);
            process::exit(1);
        }
    };

    let mut reader = BufReader::new(file);

    let result = if matches.is_present("uncompressed") {
        read_tag(&mut reader)
    } else {
        read_gzip_tag(&mut reader)
    };

    match result {
        Ok((tag, _)) => match serde_json::to_string_pretty(&tag.dump()) {
            Ok(json) => println!("{}", json),
            Err(err) => {
                error!("cannot render json: {}", err);
                process::exit(1);
            }
        },
        Err(err) => {
            error!("cannot decode {}: {}", path.to_string_lossy(), err);
            process::exit(1);
        }
    }
}
