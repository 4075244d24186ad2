use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "wavelines",
    author,
    version,
    about = "Animated wave-line backdrop",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Options for the live preview window (the default command).
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (TOML, or JSON when the extension is `.json`).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a single frame to a PNG file and exit.
    Snapshot(SnapshotArgs),
    /// Inspect configuration files.
    Config(ConfigCommand),
}

#[derive(Args, Debug)]
pub struct SnapshotArgs {
    /// Destination PNG path.
    #[arg(long, value_name = "FILE")]
    pub out: PathBuf,

    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Image size in pixels; defaults to the configured preview size.
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Animation time in seconds.
    #[arg(long, value_name = "SECONDS", default_value_t = 0.0)]
    pub time: f32,

    /// Pointer position in pixels from the top-left corner (e.g. `640,360`).
    #[arg(long, value_name = "X,Y", value_parser = parse_pointer)]
    pub pointer: Option<(f64, f64)>,
}

#[derive(Args, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Parse a configuration file and print the resolved settings as JSON.
    Check(CheckArgs),
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_surface_size(input: &str) -> Result<(u32, u32)> {
    let trimmed = input.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| anyhow!("expected WxH format, e.g. 1920x1080"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid width in size specification"))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid height in size specification"))?;

    if width == 0 || height == 0 {
        bail!("surface dimensions must be greater than zero");
    }

    Ok((width, height))
}

pub fn parse_pointer(input: &str) -> Result<(f64, f64)> {
    let (x, y) = input
        .trim()
        .split_once(',')
        .ok_or_else(|| anyhow!("expected X,Y format, e.g. 640,360"))?;

    let x: f64 = x
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid x coordinate '{}'", x.trim()))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|_| anyhow!("invalid y coordinate '{}'", y.trim()))?;

    if !x.is_finite() || !y.is_finite() {
        bail!("pointer coordinates must be finite");
    }

    Ok((x, y))
}
