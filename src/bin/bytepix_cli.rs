//! bytepix CLI: turn any file into a PNG and back.
//! Build with: cargo build --release --bin bytepix-cli

use anyhow::{anyhow, Context, Result};
use bytepix::{HeaderOptions, ImageGrid};
use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, error, info, Level};
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "decoded.bin";

#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    header: &'a bytepix::Header,
    width: usize,
    height: usize,
    payload_len: usize,
}

fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .help("Input file to read data from")
        .required(true)
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .help("Output directory")
        .default_value(".")
}

#[rustfmt::skip]
fn create_cmd_args() -> Command {
    Command::new("bytepix-cli")
        .about("Convert any file into an image, and images back to files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(Command::new("encode")
            .short_flag('e')
            .long_flag("encode")
            .about("Encode a file into a PNG")
            .arg(input_arg())
            .arg(output_arg())
            .arg(Arg::new("sign")
                .short('s')
                .long("sign")
                .help("Sign the encoded image (max 50 bytes)")
                .default_value(""))
            .arg(Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("Fail instead of truncating a long filename or signature"))
            .arg(Arg::new("ascii")
                .long("ascii")
                .action(ArgAction::SetTrue)
                .help("Only allow ASCII in the filename and signature")))
        .subcommand(Command::new("decode")
            .short_flag('d')
            .long_flag("decode")
            .about("Decode a PNG produced by encode back into the original file")
            .arg(input_arg())
            .arg(output_arg())
            .arg(Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Print the image header as JSON")))
        .subcommand(Command::new("inspect")
            .about("Print the header of an encoded image without writing anything")
            .arg(input_arg()))
        .arg(Arg::new("debug")
            .long("debug")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display debug information and higher"))
        .arg(Arg::new("trace")
            .long("trace")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display very verbose information"))
        .arg(Arg::new("info")
            .long("info")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display information about each step"))
        .arg(Arg::new("warn")
            .long("warn")
            .global(true)
            .action(ArgAction::SetTrue)
            .help_heading("LOGGING")
            .help("Display warnings and errors"))
}

fn flag(options: &ArgMatches, name: &str) -> bool {
    options.get_flag(name)
}

fn setup_logger(options: &ArgMatches) -> Result<()> {
    let log_level = if flag(options, "trace") {
        Level::Trace
    } else if flag(options, "debug") {
        Level::Debug
    } else if flag(options, "info") {
        Level::Info
    } else {
        Level::Warn
    };
    simple_logger::init_with_level(log_level).map_err(|e| anyhow!("logger setup failed: {e}"))?;
    debug!("Log level: {}", log_level);
    Ok(())
}

fn main() {
    let options = create_cmd_args().get_matches();
    if let Err(e) = setup_logger(&options) {
        eprintln!("{e:#}");
    }
    let result = match options.subcommand() {
        Some(("encode", sub)) => run_encode(sub),
        Some(("decode", sub)) => run_decode(sub),
        Some(("inspect", sub)) => run_inspect(sub),
        _ => Err(anyhow!("unknown subcommand")),
    };
    if let Err(e) = result {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn arg<'a>(options: &'a ArgMatches, name: &str) -> Result<&'a str> {
    options
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing --{name}"))
}

fn run_encode(options: &ArgMatches) -> Result<()> {
    let input = Path::new(arg(options, "input")?);
    let out_dir = Path::new(arg(options, "output")?);
    let sign = arg(options, "sign")?;
    let header_options = HeaderOptions {
        strict: flag(options, "strict"),
        ascii_only: flag(options, "ascii"),
    };

    let file_name = input
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("{} has no usable file name", input.display()))?;
    let bytes = bytepix::read_file(input)?;
    info!("Read {} bytes from {}", bytes.len(), input.display());

    let grid = bytepix::encode_with(&bytes, file_name, sign, &header_options)
        .with_context(|| format!("encode {}", input.display()))?;

    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let out_path = out_dir.join(format!("{file_name}.png"));
    bytepix::save_image(&grid, &out_path)?;
    eprintln!("Wrote {}", out_path.display());
    Ok(())
}

/// `.png` is implied when the user leaves it off.
fn image_path(input: &str) -> PathBuf {
    if input.ends_with(".png") {
        PathBuf::from(input)
    } else {
        PathBuf::from(format!("{input}.png"))
    }
}

/// Only a bare file name from the header may choose where output lands.
fn output_name(original: &str) -> &str {
    let is_plain = !original.is_empty()
        && original != "."
        && original != ".."
        && Path::new(original).file_name().and_then(|n| n.to_str()) == Some(original);
    if is_plain {
        original
    } else {
        FALLBACK_NAME
    }
}

fn load(options: &ArgMatches) -> Result<(PathBuf, ImageGrid)> {
    let path = image_path(arg(options, "input")?);
    let grid = bytepix::load_image(&path)?;
    Ok((path, grid))
}

fn run_decode(options: &ArgMatches) -> Result<()> {
    let (path, grid) = load(options)?;
    let out_dir = Path::new(arg(options, "output")?);
    let decoded = bytepix::decode(&grid).with_context(|| format!("decode {}", path.display()))?;

    let name = output_name(&decoded.header.original_filename);
    if name != decoded.header.original_filename {
        info!(
            "Header filename {:?} is not a plain file name, using {}",
            decoded.header.original_filename, name
        );
    }
    fs::create_dir_all(out_dir).with_context(|| format!("create {}", out_dir.display()))?;
    let out_path = out_dir.join(name);
    bytepix::write_file(&out_path, &decoded.payload)?;
    eprintln!("Wrote {}", out_path.display());

    if decoded.header.is_signed() {
        println!("This image has been signed: {}", decoded.header.signature);
    }
    if flag(options, "json") {
        let json = serde_json::to_string_pretty(&decoded.header)?;
        io::stdout().write_all(json.as_bytes())?;
        println!();
    }
    Ok(())
}

fn run_inspect(options: &ArgMatches) -> Result<()> {
    let (path, grid) = load(options)?;
    let decoded = bytepix::decode(&grid).with_context(|| format!("decode {}", path.display()))?;
    let report = InspectReport {
        header: &decoded.header,
        width: grid.width(),
        height: grid.height(),
        payload_len: decoded.payload.len(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    io::stdout().write_all(json.as_bytes())?;
    println!();
    Ok(())
}
