// Song packaging - Writes a converted chart as a ready-to-scan song folder
// <out_dir>/<Artist> - <Title>/{notes.mid, song.ini}

pub mod metadata;

pub use metadata::SongMetadata;

use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::pipeline::{Chart, ConvertError};

/// Chart file name inside a song folder
pub const CHART_FILE: &str = "notes.mid";

/// Metadata file name inside a song folder
pub const INI_FILE: &str = "song.ini";

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Conversion failed: {0}")]
    Convert(#[from] ConvertError),
}

pub type PackageResult<T> = Result<T, PackageError>;

/// Paths and checksum of a written song folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagedSong {
    pub folder: PathBuf,
    pub chart_path: PathBuf,
    pub ini_path: PathBuf,

    /// SHA-256 of `notes.mid`, hex encoded
    pub chart_sha256: String,
}

/// Keep alphanumerics, space, hyphen, underscore and period, then trim
pub fn sanitize_name(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Folder for a song under `out_dir`
pub fn song_folder(out_dir: &Path, metadata: &SongMetadata) -> PathBuf {
    out_dir.join(format!(
        "{} - {}",
        sanitize_name(&metadata.artist),
        sanitize_name(&metadata.name)
    ))
}

/// Write the chart and song.ini into a fresh song folder
///
/// The chart is serialized before anything touches the disk, so a failed
/// conversion leaves any previous folder in place. A successful run replaces
/// the previous folder entirely.
pub fn write_song(chart: &Chart, metadata: &SongMetadata, out_dir: &Path) -> PackageResult<PackagedSong> {
    let chart_bytes = chart.to_bytes()?;

    let folder = song_folder(out_dir, metadata);
    if folder.exists() {
        log::info!("Replacing existing song folder {}", folder.display());
        fs::remove_dir_all(&folder)?;
    }
    fs::create_dir_all(&folder)?;

    let chart_path = folder.join(CHART_FILE);
    store_file(&chart_path, &chart_bytes)?;

    let ini_path = folder.join(INI_FILE);
    store_file(&ini_path, metadata.to_ini().as_bytes())?;

    let chart_sha256 = calculate_sha256(&chart_bytes);
    log::info!("Wrote {} (sha256 {})", chart_path.display(), chart_sha256);

    Ok(PackagedSong {
        folder,
        chart_path,
        ini_path,
        chart_sha256,
    })
}

/// Write a standalone chart file, returning its SHA-256
pub fn write_chart_file(chart: &Chart, path: &Path) -> PackageResult<String> {
    let chart_bytes = chart.to_bytes()?;
    store_file(path, &chart_bytes)?;
    Ok(calculate_sha256(&chart_bytes))
}

fn store_file(path: &Path, data: &[u8]) -> PackageResult<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    Ok(())
}

/// Calculate SHA256 hash of data
pub fn calculate_sha256(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
