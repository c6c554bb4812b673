// drumchart - General MIDI drum performances to rhythm-game drum charts
// Module declarations

pub mod arranger;
pub mod config;
pub mod groove;
pub mod package;
pub mod pipeline;
pub mod timeline;

pub use arranger::{Lane, LaneMap};
pub use config::{ConfigError, ConvertConfig};
pub use package::{write_song, PackageError, PackagedSong, SongMetadata};
pub use pipeline::{
    convert, convert_bytes, convert_file, Chart, ConversionReport, ConvertError, ConvertResult,
};
