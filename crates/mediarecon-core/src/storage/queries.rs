use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use super::models::{EpisodeFileRow, TrackFileRow};
use super::sqlite::CatalogDb;
use crate::catalog::{
    EpisodeFileStore, FileRecord, NewEpisodeFile, NewTrackFile, TrackFileStore, UnlinkedEpisode,
};
use crate::error::Error;
use crate::quality::DEFAULT_LANGUAGES_JSON;

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3fZ").to_string()
}

fn ids_for(conn: &Connection, sql: &str, file_id: i64) -> Result<Vec<i64>, Error> {
    let mut stmt = conn.prepare(sql)?;
    let ids = stmt
        .query_map(params![file_id], |row| row.get(0))?
        .collect::<Result<Vec<i64>, _>>()?;
    Ok(ids)
}

impl CatalogDb {
    // ── Episode files ────────────────────────────────────────────

    fn find_episode_file(&self, conn: &Connection, series_id: i64, relative_path: &str) -> Result<Option<i64>, Error> {
        let id = conn
            .query_row(
                "SELECT Id FROM EpisodeFiles WHERE SeriesId = ?1 AND RelativePath = ?2",
                params![series_id, relative_path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Episode files no longer referenced by any episode.
    fn delete_orphaned_episode_files(&self, conn: &Connection, candidates: &[i64]) -> Result<usize, Error> {
        let mut deleted = 0;
        for file_id in candidates {
            deleted += conn.execute(
                "DELETE FROM EpisodeFiles WHERE Id = ?1 \
                 AND NOT EXISTS (SELECT 1 FROM Episodes WHERE EpisodeFileId = ?1)",
                params![file_id],
            )?;
        }
        Ok(deleted)
    }

    // ── Track files ──────────────────────────────────────────────

    fn find_track_file(&self, conn: &Connection, path: &str) -> Result<Option<i64>, Error> {
        let id = conn
            .query_row("SELECT Id FROM TrackFiles WHERE Path = ?1", params![path], |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    fn delete_orphaned_track_files(&self, conn: &Connection, candidates: &[i64]) -> Result<usize, Error> {
        let mut deleted = 0;
        for file_id in candidates {
            deleted += conn.execute(
                "DELETE FROM TrackFiles WHERE Id = ?1 \
                 AND NOT EXISTS (SELECT 1 FROM Tracks WHERE TrackFileId = ?1)",
                params![file_id],
            )?;
        }
        Ok(deleted)
    }
}

impl EpisodeFileStore for CatalogDb {
    fn register_episode_file(&self, file: &NewEpisodeFile) -> Result<i64, Error> {
        let conn = self.connection()?;
        let existing = self.find_episode_file(conn, file.series_id, &file.relative_path)?;

        if self.is_dry_run() {
            info!(
                "[dry-run] Would register {} for episodes {:?}",
                file.relative_path, file.episode_ids
            );
            return Ok(existing.unwrap_or_default());
        }

        let tx = conn.unchecked_transaction()?;
        let file_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE EpisodeFiles SET Size = ?1, Quality = ?2 WHERE Id = ?3",
                    params![file.size, file.quality.to_json(), id],
                )?;
                debug!("Reusing episode file {} for {}", id, file.relative_path);
                id
            }
            None => {
                tx.execute(
                    "INSERT INTO EpisodeFiles \
                     (SeriesId, SeasonNumber, RelativePath, Size, DateAdded, SceneName, ReleaseGroup, Quality, Languages) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        file.series_id,
                        file.season_number,
                        file.relative_path,
                        file.size,
                        now(),
                        file.scene_name,
                        file.release_group,
                        file.quality.to_json(),
                        DEFAULT_LANGUAGES_JSON,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        let mut replaced = Vec::new();
        for episode_id in &file.episode_ids {
            let previous: Option<i64> = tx
                .query_row(
                    "SELECT EpisodeFileId FROM Episodes WHERE Id = ?1",
                    params![episode_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(previous) = previous.filter(|id| *id > 0 && *id != file_id) {
                replaced.push(previous);
            }
            tx.execute(
                "UPDATE Episodes SET EpisodeFileId = ?1 WHERE Id = ?2",
                params![file_id, episode_id],
            )?;
        }
        let deleted = self.delete_orphaned_episode_files(&tx, &replaced)?;
        tx.commit()?;

        if deleted > 0 {
            debug!("Deleted {} episode files replaced by {}", deleted, file_id);
        }
        Ok(file_id)
    }

    fn episode_files(&self) -> Result<Vec<FileRecord>, Error> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT ef.Id, ef.SeriesId, ef.RelativePath, ef.Size, s.Path \
             FROM EpisodeFiles ef LEFT JOIN Series s ON s.Id = ef.SeriesId \
             ORDER BY ef.Id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(EpisodeFileRow {
                    id: row.get(0)?,
                    series_id: row.get(1)?,
                    relative_path: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    size: row.get(3)?,
                    series_path: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let episodes = ids_for(conn, "SELECT Id FROM Episodes WHERE EpisodeFileId = ?1 ORDER BY Id", row.id)?;
            records.push(row.into_record(episodes));
        }
        Ok(records)
    }

    fn remove_episode_file(&self, file_id: i64) -> Result<Vec<UnlinkedEpisode>, Error> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT Id, SeasonNumber, EpisodeNumber FROM Episodes WHERE EpisodeFileId = ?1 ORDER BY Id",
        )?;
        let unlinked = stmt
            .query_map(params![file_id], |row| {
                Ok(UnlinkedEpisode {
                    id: row.get(0)?,
                    season_number: row.get(1)?,
                    episode_number: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if self.is_dry_run() {
            info!("[dry-run] Would remove episode file {} ({} episodes)", file_id, unlinked.len());
            return Ok(unlinked);
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE Episodes SET EpisodeFileId = 0 WHERE EpisodeFileId = ?1",
            params![file_id],
        )?;
        tx.execute("DELETE FROM EpisodeFiles WHERE Id = ?1", params![file_id])?;
        tx.commit()?;
        Ok(unlinked)
    }
}

impl TrackFileStore for CatalogDb {
    fn register_track_file(&self, file: &NewTrackFile) -> Result<i64, Error> {
        let conn = self.connection()?;
        let existing = self.find_track_file(conn, &file.path)?;

        if self.is_dry_run() {
            info!("[dry-run] Would register {} for tracks {:?}", file.path, file.track_ids);
            return Ok(existing.unwrap_or_default());
        }

        let tx = conn.unchecked_transaction()?;
        let file_id = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE TrackFiles SET AlbumId = ?1, Size = ?2, Quality = ?3, Modified = ?4 WHERE Id = ?5",
                    params![file.album_id, file.size, file.quality.to_json(), now(), id],
                )?;
                id
            }
            None => {
                let stamp = now();
                tx.execute(
                    "INSERT INTO TrackFiles \
                     (AlbumId, Path, Size, Quality, SceneName, DateAdded, Modified, IndexerFlags) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)",
                    params![
                        file.album_id,
                        file.path,
                        file.size,
                        file.quality.to_json(),
                        file.scene_name,
                        stamp,
                        stamp,
                    ],
                )?;
                tx.last_insert_rowid()
            }
        };

        let mut replaced = Vec::new();
        for track_id in &file.track_ids {
            let previous: Option<i64> = tx
                .query_row(
                    "SELECT TrackFileId FROM Tracks WHERE Id = ?1",
                    params![track_id],
                    |row| row.get(0),
                )
                .optional()?;
            if let Some(previous) = previous.filter(|id| *id > 0 && *id != file_id) {
                replaced.push(previous);
            }
            tx.execute(
                "UPDATE Tracks SET TrackFileId = ?1 WHERE Id = ?2",
                params![file_id, track_id],
            )?;
        }
        self.delete_orphaned_track_files(&tx, &replaced)?;
        tx.commit()?;
        Ok(file_id)
    }

    fn track_files(&self) -> Result<Vec<FileRecord>, Error> {
        let conn = self.connection()?;
        let mut stmt = conn.prepare(
            "SELECT tf.Id, tf.AlbumId, ar.Id, tf.Path, tf.Size \
             FROM TrackFiles tf \
             LEFT JOIN Albums al ON al.Id = tf.AlbumId \
             LEFT JOIN Artists ar ON ar.ArtistMetadataId = al.ArtistMetadataId \
             ORDER BY tf.Id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(TrackFileRow {
                    id: row.get(0)?,
                    album_id: row.get(1)?,
                    artist_id: row.get(2)?,
                    path: row.get(3)?,
                    size: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let tracks = ids_for(conn, "SELECT Id FROM Tracks WHERE TrackFileId = ?1 ORDER BY Id", row.id)?;
            records.push(row.into_record(tracks));
        }
        Ok(records)
    }

    fn remove_track_file(&self, file_id: i64) -> Result<Vec<i64>, Error> {
        let conn = self.connection()?;
        let tracks = ids_for(conn, "SELECT Id FROM Tracks WHERE TrackFileId = ?1 ORDER BY Id", file_id)?;

        if self.is_dry_run() {
            info!("[dry-run] Would remove track file {} ({} tracks)", file_id, tracks.len());
            return Ok(tracks);
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE Tracks SET TrackFileId = 0 WHERE TrackFileId = ?1",
            params![file_id],
        )?;
        tx.execute("DELETE FROM TrackFiles WHERE Id = ?1", params![file_id])?;
        tx.commit()?;
        Ok(tracks)
    }
}
