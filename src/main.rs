//! proto-to-django CLI
//!
//! Reads a schema file and writes a Django REST Framework app:
//!
//! ```text
//! proto-to-django --proto schema.proto --out accounts
//! ```

use std::path::PathBuf;
use std::process;

use clap::{App, Arg, ArgMatches};
use env_logger::Env;
use log::{debug, error};

use proto_to_django::{generate_app, Config, ConversionError};

fn main() {
    let matches = App::new("proto-to-django")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Generates a Django REST Framework app from a Protobuf schema")
        .arg(
            Arg::with_name("proto")
                .long("proto")
                .value_name("FILE")
                .help("Schema file to read")
                .takes_value(true)
                .required(true),
        )
        .arg(
            Arg::with_name("out")
                .long("out")
                .value_name("DIR")
                .help("App directory to write; its last segment is the app name")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increases log verbosity (-v debug, -vv trace)"),
        )
        .get_matches();

    let level = match matches.occurrences_of("verbose") {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    match run(&matches) {
        Ok(output_dir) => println!("✅ Django app generated at {}", output_dir.display()),
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

fn run(matches: &ArgMatches<'_>) -> Result<PathBuf, ConversionError> {
    let config = match matches.value_of("config") {
        Some(path) => {
            debug!("Loading configuration from {}", path);
            Config::from_file(path)?
        }
        None => Config::default(),
    };

    // required(true) guarantees a value
    let proto_path = PathBuf::from(matches.value_of("proto").unwrap_or_default());
    let output_dir = matches
        .value_of("out")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.output_dir_path());

    let report = generate_app(&proto_path, &output_dir, &config)?;
    if !report.dangling_references.is_empty() {
        debug!(
            "{} field(s) reference types not defined in {}",
            report.dangling_references.len(),
            proto_path.display()
        );
    }

    Ok(report.output_dir)
}
