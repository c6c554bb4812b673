// Song metadata - Values for the song.ini sidecar read by the game's library scanner

use serde::{Deserialize, Serialize};

/// Charter credit written into every song.ini
pub const CHARTER: &str = "drumchart";

/// Descriptive song information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongMetadata {
    pub name: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub year: String,

    /// Drum difficulty tier shown in the song list (-1 = unrated)
    pub difficulty: i8,
}

impl Default for SongMetadata {
    fn default() -> Self {
        SongMetadata {
            name: "Unknown Song".to_string(),
            artist: "Unknown Artist".to_string(),
            album: "Unknown Album".to_string(),
            genre: "Rock".to_string(),
            year: "2026".to_string(),
            difficulty: 0,
        }
    }
}

impl SongMetadata {
    /// Guess artist and title from a file stem like `Artist - Title`
    ///
    /// Splits at the first hyphen. Without one the whole stem is the title.
    pub fn from_file_stem(stem: &str) -> Self {
        let mut metadata = SongMetadata::default();

        match stem.split_once('-') {
            Some((artist, name)) => {
                let (artist, name) = (artist.trim(), name.trim());
                if !artist.is_empty() {
                    metadata.artist = artist.to_string();
                }
                if !name.is_empty() {
                    metadata.name = name.to_string();
                }
            }
            None if !stem.trim().is_empty() => metadata.name = stem.trim().to_string(),
            None => {}
        }

        metadata
    }

    /// Render the `[song]` section
    pub fn to_ini(&self) -> String {
        let lines = [
            "[song]".to_string(),
            format!("name = {}", self.name),
            format!("artist = {}", self.artist),
            format!("album = {}", self.album),
            format!("genre = {}", self.genre),
            format!("year = {}", self.year),
            format!("diff_drums = {}", self.difficulty),
            "pro_drums = True".to_string(),
            "diff_band = -1".to_string(),
            "diff_guitar = -1".to_string(),
            "diff_bass = -1".to_string(),
            format!("charter = {}", CHARTER),
            format!("loading_phrase = Auto-generated by {}", CHARTER),
        ];
        lines.join("\n")
    }
}
