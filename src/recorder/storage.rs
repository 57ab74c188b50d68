//! Profile persistence
//!
//! A profile is saved as one JSON document holding every counter array and
//! the per-channel scalars. Arrays are stored verbatim so a save/load cycle
//! reproduces every counter exactly.

use crate::capture::input::types::{Channel, Dataset};
use crate::processing::accumulator::{ChannelState, ProfileTracks, TrackArray};
use crate::recorder::error::StorageError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelRecord {
    pub channel: Channel,
    pub distance: f64,
    pub event_counter: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrayRecord {
    pub dataset: Dataset,
    pub array: TrackArray,
}

/// Everything persisted for one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub version: u32,
    pub profile: String,
    pub saved_at: DateTime<Utc>,
    pub channels: Vec<ChannelRecord>,
    pub arrays: Vec<ArrayRecord>,
}

impl ProfileSnapshot {
    pub fn from_tracks(profile: &str, tracks: &ProfileTracks) -> Self {
        let channels = tracks
            .channels()
            .map(|(channel, state)| ChannelRecord {
                channel,
                distance: state.distance,
                event_counter: state.event_counter,
            })
            .collect();
        let arrays = tracks
            .datasets()
            .flat_map(|(dataset, arrays)| {
                arrays.iter().map(move |array| ArrayRecord {
                    dataset,
                    array: array.clone(),
                })
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            profile: profile.to_string(),
            saved_at: Utc::now(),
            channels,
            arrays,
        }
    }

    /// Rebuild the in-memory profile. Channels come back idle with no last
    /// position, so the first sample after a load starts a new path.
    pub fn into_tracks(self) -> (String, ProfileTracks) {
        let mut tracks = ProfileTracks::default();
        for record in self.channels {
            tracks.set_channel(
                record.channel,
                ChannelState::restored(record.distance, record.event_counter),
            );
        }
        for record in self.arrays {
            tracks.insert_array(record.dataset, record.array);
        }
        (self.profile, tracks)
    }

    /// Write atomically: serialize next to `path`, then rename over it
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let mut file = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        file.persist(path).map_err(|e| StorageError::Io(e.error))?;

        tracing::info!(
            "Saved profile '{}' ({} arrays) to {}",
            self.profile,
            self.arrays.len(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let file = std::fs::File::open(path)?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))?;
        tracing::info!(
            "Loaded profile '{}' ({} arrays, saved {})",
            snapshot.profile,
            snapshot.arrays.len(),
            snapshot.saved_at
        );
        Ok(snapshot)
    }
}
