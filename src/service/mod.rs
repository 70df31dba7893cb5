//service/mod.rs
pub mod sync_service;

use actix_multipart::Multipart;
use actix_web::{web, Error, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::json;

use crate::app_state::AppState;
use crate::catalog::{Catalog, DestinationKind, StatTileDefinition, TileType, STAT_TILES};
use crate::error::SyncError;
use crate::service::sync_service::UploadBatch;

/// Multipart field carrying positional image uploads
pub const IMAGES_FIELD: &str = "images";
/// Multipart field carrying positional song uploads
pub const SONGS_FIELD: &str = "songs";
/// Prefix of a field naming its target image slot, e.g. `image:memory3.jpg`
pub const NAMED_IMAGE_PREFIX: &str = "image:";
/// Prefix of a field naming its target song slot, e.g. `song:song2.mp3`
pub const NAMED_SONG_PREFIX: &str = "song:";
pub const SONG_TITLES_FIELD: &str = "songTitles";
pub const SONG_ARTISTS_FIELD: &str = "songArtists";
pub const STATS_VALUES_FIELD: &str = "statsValues";

/// Parse a text field holding a JSON array of strings
///
/// An empty field is an empty list.
pub fn parse_string_list(field: &str, data: &[u8]) -> Result<Vec<String>, SyncError> {
    if data.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Vec::new());
    }
    serde_json::from_slice::<Vec<String>>(data)
        .map_err(|e| SyncError::Validation(format!("{} must be a JSON array of strings: {}", field, e)))
}

/// Route one decoded multipart field into the batch
fn accept_field(batch: &mut UploadBatch, name: &str, data: Bytes) -> Result<(), SyncError> {
    match name {
        IMAGES_FIELD => batch.images.push(data),
        SONGS_FIELD => batch.songs.push(data),
        SONG_TITLES_FIELD => batch.values.song_titles = parse_string_list(name, &data)?,
        SONG_ARTISTS_FIELD => batch.values.song_artists = parse_string_list(name, &data)?,
        STATS_VALUES_FIELD => batch.values.stat_values = parse_string_list(name, &data)?,
        _ => {
            if let Some(filename) = name.strip_prefix(NAMED_IMAGE_PREFIX) {
                batch.named_images.push((filename.to_string(), data));
            } else if let Some(filename) = name.strip_prefix(NAMED_SONG_PREFIX) {
                batch.named_songs.push((filename.to_string(), data));
            } else {
                debug!("Ignoring unknown form field {:?} ({} bytes)", name, data.len());
            }
        }
    }
    Ok(())
}

/// Drain a multipart body into an upload batch, enforcing a total size limit
pub async fn read_batch(mut payload: Multipart, max_payload_size: usize) -> Result<UploadBatch, SyncError> {
    let mut batch = UploadBatch::default();
    let mut total = 0usize;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| SyncError::Validation(format!("malformed multipart body: {}", e)))?;
        let name = field.name().unwrap_or_default().to_string();

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| SyncError::Validation(format!("error reading field {}: {}", name, e)))?;
            total += chunk.len();
            if total > max_payload_size {
                warn!("Upload exceeds {} bytes, rejecting", max_payload_size);
                return Err(SyncError::Validation(format!(
                    "upload exceeds the {} byte limit",
                    max_payload_size
                )));
            }
            data.extend_from_slice(&chunk);
        }

        accept_field(&mut batch, &name, data.freeze())?;
    }

    debug!(
        "Decoded batch: {} image(s), {} song(s), {} named image(s), {} named song(s)",
        batch.images.len(),
        batch.songs.len(),
        batch.named_images.len(),
        batch.named_songs.len()
    );
    Ok(batch)
}

pub async fn upload_service(payload: Multipart, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let batch = read_batch(payload, app_state.config.server.max_payload_size).await?;
    let report = app_state.sync_service.submit(batch).await?;

    info!("Upload {} finished", report.submission);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Files uploaded successfully.",
        "committed": report.committed.len(),
    })))
}

#[derive(Debug, Serialize)]
struct SlotLayout {
    images: Vec<String>,
    songs: Vec<String>,
    metadata: String,
}

#[derive(Debug, Serialize)]
struct TileLayout {
    title: &'static str,
    subtitle: &'static str,
    icon: &'static str,
    #[serde(rename = "type")]
    tile_type: TileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<u64>,
}

impl From<&StatTileDefinition> for TileLayout {
    fn from(definition: &StatTileDefinition) -> Self {
        Self {
            title: definition.title,
            subtitle: definition.subtitle,
            icon: definition.icon,
            tile_type: definition.tile_type,
            max: definition.max,
        }
    }
}

/// Fixed destinations and tile catalog, for rendering the upload form
pub fn layout_document(catalog: &Catalog) -> serde_json::Value {
    let paths = |kind: DestinationKind| catalog.slots(kind).iter().map(|d| d.path.clone()).collect::<Vec<_>>();
    let slots = SlotLayout {
        images: paths(DestinationKind::Image),
        songs: paths(DestinationKind::Song),
        metadata: catalog.metadata().path.clone(),
    };
    let tiles: Vec<TileLayout> = STAT_TILES.iter().map(TileLayout::from).collect();
    json!({ "destinations": slots, "stats": tiles })
}

pub async fn layout_service(app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::Ok().json(layout_document(app_state.sync_service.catalog())))
}
