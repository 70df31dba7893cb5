//! Fixed destinations and the stat tile catalog
//!
//! The set of paths a submission may touch is decided once at startup from the
//! layout configuration. Nothing outside this set is ever written.

use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;

/// Image slot filenames, in slot order
pub const IMAGE_FILENAMES: [&str; 7] = [
    "collage.jpg",
    "memory1.jpg",
    "memory2.jpg",
    "memory3.jpg",
    "memory4.jpg",
    "memory5.jpg",
    "memory6.jpg",
];

/// Song slot filenames, in slot order
pub const SONG_FILENAMES: [&str; 6] = [
    "song1.mp3",
    "song2.mp3",
    "song3.mp3",
    "song4.mp3",
    "song5.mp3",
    "song6.mp3",
];

pub const SONG_SLOT_COUNT: usize = SONG_FILENAMES.len();

/// Rendering type of a stat tile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TileType {
    Counter,
    Date,
    Location,
    Text,
    Progress,
}

/// Build-time definition of one stat tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatTileDefinition {
    pub title: &'static str,
    pub subtitle: &'static str,
    pub icon: &'static str,
    pub tile_type: TileType,
    pub max: Option<u64>,
}

const fn tile(
    title: &'static str,
    subtitle: &'static str,
    icon: &'static str,
    tile_type: TileType,
    max: Option<u64>,
) -> StatTileDefinition {
    StatTileDefinition { title, subtitle, icon, tile_type, max }
}

pub const STAT_TILES: [StatTileDefinition; 12] = [
    tile("Days Together", "and counting", "heart", TileType::Counter, None),
    tile("Relationship Started", "the day it all began", "calendar-heart", TileType::Date, None),
    tile("First Date", "where it started", "utensils", TileType::Date, None),
    tile("First Kiss", "never forgotten", "map-pin", TileType::Location, None),
    tile("First Hug", "warmest place", "map-pin", TileType::Location, None),
    tile("Best Day", "so far", "star", TileType::Date, None),
    tile("Most Used Word", "in our chats", "message-circle", TileType::Text, None),
    tile("Total Messages", "sent to each other", "messages-square", TileType::Progress, Some(100000)),
    tile("Her Words", "typed by her", "type", TileType::Progress, Some(500000)),
    tile("His Words", "typed by him", "type", TileType::Progress, Some(500000)),
    tile("Reels Shared", "laughs exchanged", "film", TileType::Progress, Some(5000)),
    tile("Love Count", "times said I love you", "infinity", TileType::Progress, Some(10000)),
];

/// Kind of content a destination holds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DestinationKind {
    Image,
    Song,
    Metadata,
}

impl DestinationKind {
    /// Fixed filenames for an upload kind; the metadata kind has no slots
    pub fn slot_filenames(self) -> &'static [&'static str] {
        match self {
            DestinationKind::Image => &IMAGE_FILENAMES,
            DestinationKind::Song => &SONG_FILENAMES,
            DestinationKind::Metadata => &[],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DestinationKind::Image => "image",
            DestinationKind::Song => "song",
            DestinationKind::Metadata => "metadata",
        }
    }
}

/// A repository-relative path designated to hold one content item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Destination {
    pub path: String,
    pub kind: DestinationKind,
}

impl Destination {
    /// Last path segment
    pub fn filename(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// The full destination set, built once at startup
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    metadata: Destination,
    images: Vec<Destination>,
    songs: Vec<Destination>,
}

fn join(dir: &str, filename: &str) -> String {
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", dir, filename)
    }
}

impl Catalog {
    pub fn from_layout(layout: &LayoutConfig) -> Self {
        let slots = |dir: &str, kind: DestinationKind| {
            kind.slot_filenames()
                .iter()
                .map(|name| Destination { path: join(dir, name), kind })
                .collect::<Vec<_>>()
        };

        Self {
            metadata: Destination {
                path: layout.metadata_path.trim_start_matches('/').to_string(),
                kind: DestinationKind::Metadata,
            },
            images: slots(layout.images_dir.trim_start_matches('/'), DestinationKind::Image),
            songs: slots(layout.songs_dir.trim_start_matches('/'), DestinationKind::Song),
        }
    }

    pub fn metadata(&self) -> &Destination {
        &self.metadata
    }

    /// Slot destinations of a kind, in fixed filename order
    pub fn slots(&self, kind: DestinationKind) -> &[Destination] {
        match kind {
            DestinationKind::Image => &self.images,
            DestinationKind::Song => &self.songs,
            DestinationKind::Metadata => std::slice::from_ref(&self.metadata),
        }
    }

    /// Every destination in sync order: metadata, images, songs
    pub fn destinations(&self) -> impl Iterator<Item = &Destination> {
        std::iter::once(&self.metadata)
            .chain(self.images.iter())
            .chain(self.songs.iter())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.destinations().any(|d| d.path == path)
    }
}
