//! Slot mapping
//!
//! Pairs uploaded blobs with their fixed destinations. Positional uploads go to
//! the filename at the same index and anything past the fixed capacity is
//! dropped. Named uploads pick their destination explicitly and win over a
//! positional upload aimed at the same slot.

use bytes::Bytes;
use log::{debug, warn};

use crate::catalog::{Catalog, Destination, DestinationKind};
use crate::error::SyncError;

/// One uploaded blob paired with the destination it will be written to
#[derive(Debug, Clone, PartialEq)]
pub struct MappedSlot {
    pub index: usize,
    pub destination: Destination,
    pub blob: Bytes,
}

/// Pair `blobs[i]` with slot `i`, for `i < min(blobs, slots)`
pub fn map_positional(catalog: &Catalog, kind: DestinationKind, blobs: Vec<Bytes>) -> Vec<MappedSlot> {
    let slots = catalog.slots(kind);
    if blobs.len() > slots.len() {
        warn!(
            "Dropping {} {} upload(s) beyond the {} fixed slots",
            blobs.len() - slots.len(),
            kind.label(),
            slots.len()
        );
    }

    blobs
        .into_iter()
        .zip(slots.iter())
        .enumerate()
        .map(|(index, (blob, destination))| MappedSlot {
            index,
            destination: destination.clone(),
            blob,
        })
        .collect()
}

/// Map positional and explicitly named uploads of one kind
///
/// The result holds each destination at most once, ordered by fixed filename
/// order. A named upload must target one of the fixed filenames.
pub fn map_slots(
    catalog: &Catalog,
    kind: DestinationKind,
    positional: Vec<Bytes>,
    named: Vec<(String, Bytes)>,
) -> Result<Vec<MappedSlot>, SyncError> {
    let slots = catalog.slots(kind);
    let mut assigned: Vec<Option<Bytes>> = vec![None; slots.len()];

    for slot in map_positional(catalog, kind, positional) {
        assigned[slot.index] = Some(slot.blob);
    }

    for (filename, blob) in named {
        let index = slots
            .iter()
            .position(|d| d.filename() == filename)
            .ok_or_else(|| {
                SyncError::Validation(format!("{} is not a known {} slot", filename, kind.label()))
            })?;
        if assigned[index].is_some() {
            debug!("Named {} upload replaces slot {} ({})", kind.label(), index, filename);
        }
        assigned[index] = Some(blob);
    }

    Ok(assigned
        .into_iter()
        .zip(slots.iter())
        .enumerate()
        .filter_map(|(index, (blob, destination))| {
            blob.map(|blob| MappedSlot {
                index,
                destination: destination.clone(),
                blob,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn catalog() -> Catalog {
        Catalog::from_layout(&AppConfig::default().layout)
    }

    fn blobs(count: usize) -> Vec<Bytes> {
        (0..count).map(|i| Bytes::from(format!("blob-{}", i))).collect()
    }

    #[test]
    fn test_positional_truncates_excess() {
        let catalog = catalog();
        let mapped = map_positional(&catalog, DestinationKind::Image, blobs(10));
        assert_eq!(mapped.len(), 7);
        assert_eq!(mapped[0].destination.filename(), "collage.jpg");
        assert_eq!(mapped[6].destination.filename(), "memory6.jpg");
        // First N kept, by input order
        assert_eq!(mapped[6].blob, Bytes::from("blob-6"));
    }

    #[test]
    fn test_positional_leaves_unmatched_slots_untouched() {
        let catalog = catalog();
        let mapped = map_positional(&catalog, DestinationKind::Song, blobs(2));
        let names: Vec<&str> = mapped.iter().map(|m| m.destination.filename()).collect();
        assert_eq!(names, vec!["song1.mp3", "song2.mp3"]);
        assert!(map_positional(&catalog, DestinationKind::Song, Vec::new()).is_empty());
    }

    #[test]
    fn test_mapped_paths_stay_inside_catalog() {
        let catalog = catalog();
        for count in 0..=9 {
            for kind in [DestinationKind::Image, DestinationKind::Song] {
                for slot in map_positional(&catalog, kind, blobs(count)) {
                    assert!(catalog.contains(&slot.destination.path));
                    assert_eq!(slot.destination.kind, kind);
                }
            }
        }
    }

    #[test]
    fn test_named_upload_overrides_positional() {
        let catalog = catalog();
        let mapped = map_slots(
            &catalog,
            DestinationKind::Image,
            blobs(2),
            vec![
                ("memory5.jpg".to_string(), Bytes::from("five")),
                ("memory1.jpg".to_string(), Bytes::from("one")),
            ],
        )
        .unwrap();

        let result: Vec<(&str, &[u8])> = mapped
            .iter()
            .map(|m| (m.destination.filename(), m.blob.as_ref()))
            .collect();
        assert_eq!(
            result,
            vec![
                ("collage.jpg", b"blob-0".as_ref()),
                ("memory1.jpg", b"one".as_ref()),
                ("memory5.jpg", b"five".as_ref()),
            ]
        );
    }

    #[test]
    fn test_unknown_named_target_is_rejected() {
        let catalog = catalog();
        let result = map_slots(
            &catalog,
            DestinationKind::Song,
            Vec::new(),
            vec![("../../secrets.txt".to_string(), Bytes::from("x"))],
        );
        assert!(matches!(result, Err(SyncError::Validation(_))));

        // Image filename is not a song slot
        let result = map_slots(
            &catalog,
            DestinationKind::Song,
            Vec::new(),
            vec![("collage.jpg".to_string(), Bytes::from("x"))],
        );
        assert!(result.is_err());
    }
}
