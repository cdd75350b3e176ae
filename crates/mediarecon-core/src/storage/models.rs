use std::path::{Path, PathBuf};

use crate::catalog::FileRecord;

/// An `EpisodeFiles` row joined with its series folder.
#[derive(Debug, Clone)]
pub struct EpisodeFileRow {
    pub id: i64,
    pub series_id: i64,
    pub relative_path: String,
    pub size: i64,
    pub series_path: Option<String>,
}

impl EpisodeFileRow {
    /// Absolute location on disk. Rows registered outside the series folder already hold one.
    pub fn full_path(&self) -> PathBuf {
        match &self.series_path {
            Some(series_path) => Path::new(series_path).join(&self.relative_path),
            None => PathBuf::from(&self.relative_path),
        }
    }

    pub fn into_record(self, episode_ids: Vec<i64>) -> FileRecord {
        FileRecord {
            id: self.id,
            owner_id: self.series_id,
            album_id: None,
            path: self.full_path(),
            size: self.size,
            sub_entities: episode_ids,
        }
    }
}

/// A `TrackFiles` row with the artist resolved through its album.
#[derive(Debug, Clone)]
pub struct TrackFileRow {
    pub id: i64,
    pub album_id: i64,
    pub artist_id: Option<i64>,
    pub path: String,
    pub size: i64,
}

impl TrackFileRow {
    pub fn into_record(self, track_ids: Vec<i64>) -> FileRecord {
        FileRecord {
            id: self.id,
            owner_id: self.artist_id.unwrap_or_default(),
            album_id: Some(self.album_id),
            path: PathBuf::from(self.path),
            size: self.size,
            sub_entities: track_ids,
        }
    }
}
