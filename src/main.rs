// drumchart command line
// Converts a General MIDI drum file into a song folder or a bare chart

use clap::Parser;
use std::path::PathBuf;
use std::process;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use drumchart::config::{ConfigError, ConvertConfig};
use drumchart::package::{self, PackageError, SongMetadata};
use drumchart::pipeline::{self, ConvertError, TraceError, TraceWriter};
use drumchart::LaneMap;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// General MIDI file to convert
    #[arg(value_name = "INPUT_MID")]
    input: PathBuf,

    /// Directory the song folder is created in
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Artist (defaults to the file name up to its first hyphen)
    #[arg(long)]
    artist: Option<String>,

    /// Song title (defaults to the file name)
    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    album: Option<String>,

    #[arg(long)]
    genre: Option<String>,

    #[arg(long)]
    year: Option<String>,

    /// Drum difficulty shown in the song list
    #[arg(long, value_parser = clap::value_parser!(i8).range(0..=6))]
    difficulty: Option<i8>,

    /// Keep the original note timing
    #[arg(long, default_value_t = false)]
    no_quantize: bool,

    /// Path to converter config TOML
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append a JSONL trace of the conversion stages
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Write only the chart to this path, no song folder
    #[arg(long, value_name = "OUTPUT_MID")]
    chart_only: Option<PathBuf>,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Convert(#[from] ConvertError),

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error("Failed to write trace: {0}")]
    Trace(#[from] TraceError),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(Args::parse()) {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if args.no_quantize {
        config.quantize = false;
    }

    let lanes = LaneMap::pro_drums();
    let chart = pipeline::convert_file(&args.input, &config, &lanes)?;

    if let Some(path) = &args.trace {
        TraceWriter::new(path.clone()).write_batch(&chart.trace)?;
    }

    if let Some(path) = &args.chart_only {
        let sha256 = package::write_chart_file(&chart, path)?;
        println!("Wrote chart to {} (sha256 {})", path.display(), sha256);
        return Ok(());
    }

    let metadata = song_metadata(&args);
    let song = package::write_song(&chart, &metadata, &args.out_dir)?;

    println!("Chart generated: {}", song.folder.display());
    println!(
        "  {} gems, {} beats, {} notes dropped",
        chart.report.gems, chart.report.beats, chart.report.notes_dropped
    );
    println!("Copy your audio file (song.ogg) into the folder before playing.");

    Ok(())
}

/// Metadata from flags, filling gaps from the input file name
fn song_metadata(args: &Args) -> SongMetadata {
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let mut metadata = SongMetadata::from_file_stem(&stem);

    if let Some(artist) = &args.artist {
        metadata.artist = artist.clone();
    }
    if let Some(title) = &args.title {
        metadata.name = title.clone();
    }
    if let Some(album) = &args.album {
        metadata.album = album.clone();
    }
    if let Some(genre) = &args.genre {
        metadata.genre = genre.clone();
    }
    if let Some(year) = &args.year {
        metadata.year = year.clone();
    }
    if let Some(difficulty) = args.difficulty {
        metadata.difficulty = difficulty;
    }

    metadata
}
