//! Metadata document composition
//!
//! The metadata document is rebuilt in full on every submission from the
//! caller's text values and the fixed catalog. It is never merged with what the
//! remote store currently holds.

use serde::{Deserialize, Serialize};

use crate::catalog::{StatTileDefinition, TileType, SONG_FILENAMES, STAT_TILES};
use crate::error::SyncError;

/// Caller-supplied text values, each optionally shorter than its catalog
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataValues {
    pub song_titles: Vec<String>,
    pub song_artists: Vec<String>,
    pub stat_values: Vec<String>,
}

/// One entry of the `songs` array
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntry {
    pub title: String,
    pub artist: String,
    pub filename: String,
}

/// One entry of the `stats` array: a tile definition plus its value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatTile {
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    #[serde(rename = "type")]
    pub tile_type: TileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
    pub value: String,
}

impl StatTile {
    fn from_definition(definition: &StatTileDefinition, value: String) -> Self {
        Self {
            title: definition.title.to_string(),
            subtitle: definition.subtitle.to_string(),
            icon: definition.icon.to_string(),
            tile_type: definition.tile_type,
            max: definition.max,
            value,
        }
    }
}

/// The JSON document stored at the metadata destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataDocument {
    pub songs: Vec<SongEntry>,
    pub stats: Vec<StatTile>,
}

/// Value at `index`, or the empty string when the caller sent fewer values
fn value_at(values: &[String], index: usize) -> String {
    values.get(index).cloned().unwrap_or_default()
}

impl MetadataDocument {
    /// Compose a fresh document; missing values become empty strings and
    /// values past the catalog length are ignored
    pub fn compose(values: &MetadataValues) -> Self {
        let songs = SONG_FILENAMES
            .iter()
            .enumerate()
            .map(|(i, filename)| SongEntry {
                title: value_at(&values.song_titles, i),
                artist: value_at(&values.song_artists, i),
                filename: filename.to_string(),
            })
            .collect();

        let stats = STAT_TILES
            .iter()
            .enumerate()
            .map(|(i, definition)| StatTile::from_definition(definition, value_at(&values.stat_values, i)))
            .collect();

        Self { songs, stats }
    }

    /// Deterministic serialization: fixed field order, two-space indent,
    /// trailing newline
    pub fn to_json(&self) -> Result<Vec<u8>, SyncError> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parse a stored document and check it has the fixed shape
    pub fn from_json(bytes: &[u8]) -> Result<Self, SyncError> {
        let document: MetadataDocument = serde_json::from_slice(bytes)
            .map_err(|e| SyncError::Validation(format!("metadata document is not valid JSON: {}", e)))?;
        document.validate()?;
        Ok(document)
    }

    /// Array lengths must match the catalog
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.songs.len() != SONG_FILENAMES.len() {
            return Err(SyncError::Validation(format!(
                "metadata document has {} songs, expected {}",
                self.songs.len(),
                SONG_FILENAMES.len()
            )));
        }
        if self.stats.len() != STAT_TILES.len() {
            return Err(SyncError::Validation(format!(
                "metadata document has {} stats, expected {}",
                self.stats.len(),
                STAT_TILES.len()
            )));
        }
        Ok(())
    }
}
