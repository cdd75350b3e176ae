use mediarecon_core::catalog::{EpisodeFileStore, NewEpisodeFile, NewTrackFile, TrackFileStore};
use mediarecon_core::quality::{FLAC, HDTV_720P, WEBDL_1080P};
use mediarecon_core::storage::CatalogDb;
use rusqlite::params;
use std::path::PathBuf;

fn seeded(dry_run: bool) -> CatalogDb {
    let db = CatalogDb::open_in_memory(dry_run).unwrap();
    db.connection()
        .unwrap()
        .execute_batch(
            "INSERT INTO Series (Id, Title, Path) VALUES (1, 'Show Name', '/tv/Show Name');
             INSERT INTO Episodes (Id, SeriesId, SeasonNumber, EpisodeNumber) VALUES (11, 1, 1, 1);
             INSERT INTO Episodes (Id, SeriesId, SeasonNumber, EpisodeNumber) VALUES (12, 1, 1, 2);
             INSERT INTO Artists (Id, ArtistMetadataId, Path) VALUES (5, 50, '/music/Band');
             INSERT INTO Albums (Id, ArtistMetadataId, Title) VALUES (10, 50, 'Album');
             INSERT INTO Tracks (Id, AbsoluteTrackNumber, TrackNumber) VALUES (101, 1, '1');
             INSERT INTO Tracks (Id, AbsoluteTrackNumber, TrackNumber) VALUES (102, 2, '2');",
        )
        .unwrap();
    db
}

fn episode_file(relative_path: &str, episode_ids: Vec<i64>) -> NewEpisodeFile {
    NewEpisodeFile {
        series_id: 1,
        season_number: 1,
        relative_path: relative_path.to_string(),
        size: 1000,
        quality: WEBDL_1080P,
        scene_name: "Show.Name.S01E01.1080p.WEB-DL-GRP".to_string(),
        release_group: Some("GRP".to_string()),
        episode_ids,
    }
}

fn track_file(path: &str, track_ids: Vec<i64>) -> NewTrackFile {
    NewTrackFile {
        album_id: 10,
        path: path.to_string(),
        size: 500,
        quality: FLAC,
        scene_name: "Band-Album-2019-FLAC".to_string(),
        track_ids,
    }
}

fn linked_file(db: &CatalogDb, table: &str, id: i64) -> i64 {
    let column = if table == "Episodes" { "EpisodeFileId" } else { "TrackFileId" };
    db.connection()
        .unwrap()
        .query_row(
            &format!("SELECT {} FROM {} WHERE Id = ?1", column, table),
            params![id],
            |row| row.get(0),
        )
        .unwrap()
}

fn row_count(db: &CatalogDb, table: &str) -> i64 {
    db.connection()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_register_episode_file_links_episodes() {
    let db = seeded(false);
    let id = db
        .register_episode_file(&episode_file("Season 1/Show.S01E01E02.mkv", vec![11, 12]))
        .unwrap();
    assert!(id > 0);
    assert_eq!(linked_file(&db, "Episodes", 11), id);
    assert_eq!(linked_file(&db, "Episodes", 12), id);

    let (quality, languages, date_added): (String, String, String) = db
        .connection()
        .unwrap()
        .query_row(
            "SELECT Quality, Languages, DateAdded FROM EpisodeFiles WHERE Id = ?1",
            params![id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    let quality: serde_json::Value = serde_json::from_str(&quality).unwrap();
    assert_eq!(quality["quality"]["id"], 3);
    assert_eq!(quality["revision"]["version"], 1);
    assert!(languages.contains("English"));
    assert!(!date_added.is_empty());
}

#[test]
fn test_register_same_path_reuses_row() {
    let db = seeded(false);
    let first = db
        .register_episode_file(&episode_file("Show.S01E01.mkv", vec![11]))
        .unwrap();
    let second = db
        .register_episode_file(&episode_file("Show.S01E01.mkv", vec![11]))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(row_count(&db, "EpisodeFiles"), 1);
}

#[test]
fn test_replaced_episode_file_is_deleted() {
    let db = seeded(false);
    let old = db
        .register_episode_file(&episode_file("Old.S01E01.mkv", vec![11]))
        .unwrap();
    let mut replacement = episode_file("New.S01E01.mkv", vec![11]);
    replacement.quality = HDTV_720P;
    let new = db.register_episode_file(&replacement).unwrap();

    assert_ne!(old, new);
    assert_eq!(linked_file(&db, "Episodes", 11), new);
    assert_eq!(row_count(&db, "EpisodeFiles"), 1);
}

#[test]
fn test_partly_replaced_file_is_kept() {
    let db = seeded(false);
    let shared = db
        .register_episode_file(&episode_file("Show.S01E01E02.mkv", vec![11, 12]))
        .unwrap();
    db.register_episode_file(&episode_file("Show.S01E01.mkv", vec![11]))
        .unwrap();

    // Still backs episode 12.
    assert_eq!(linked_file(&db, "Episodes", 12), shared);
    assert_eq!(row_count(&db, "EpisodeFiles"), 2);
}

#[test]
fn test_episode_files_resolve_full_path() {
    let db = seeded(false);
    let id = db
        .register_episode_file(&episode_file("Season 1/Show.S01E01.mkv", vec![11]))
        .unwrap();

    let records = db.episode_files().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, id);
    assert_eq!(records[0].owner_id, 1);
    assert_eq!(records[0].path, PathBuf::from("/tv/Show Name/Season 1/Show.S01E01.mkv"));
    assert_eq!(records[0].sub_entities, vec![11]);
}

#[test]
fn test_remove_episode_file_clears_links() {
    let db = seeded(false);
    let id = db
        .register_episode_file(&episode_file("Show.S01E01E02.mkv", vec![11, 12]))
        .unwrap();

    let unlinked = db.remove_episode_file(id).unwrap();
    let ids: Vec<i64> = unlinked.iter().map(|episode| episode.id).collect();
    assert_eq!(ids, vec![11, 12]);
    assert_eq!(unlinked[1].episode_number, 2);
    assert_eq!(linked_file(&db, "Episodes", 11), 0);
    assert_eq!(linked_file(&db, "Episodes", 12), 0);
    assert_eq!(row_count(&db, "EpisodeFiles"), 0);
}

#[test]
fn test_dry_run_writes_nothing() {
    let db = seeded(true);
    let id = db
        .register_episode_file(&episode_file("Show.S01E01.mkv", vec![11]))
        .unwrap();
    assert_eq!(id, 0);
    assert_eq!(row_count(&db, "EpisodeFiles"), 0);
    assert_eq!(linked_file(&db, "Episodes", 11), 0);

    let id = db.register_track_file(&track_file("/music/Band/01.flac", vec![101])).unwrap();
    assert_eq!(id, 0);
    assert_eq!(row_count(&db, "TrackFiles"), 0);
}

#[test]
fn test_dry_run_remove_reports_without_deleting() {
    let db = seeded(true);
    db.connection()
        .unwrap()
        .execute_batch(
            "INSERT INTO EpisodeFiles (Id, SeriesId, SeasonNumber, RelativePath, Size, DateAdded, Quality) \
             VALUES (7, 1, 1, 'Show.S01E01.mkv', 10, '2024-01-01 00:00:00', '{}');
             UPDATE Episodes SET EpisodeFileId = 7 WHERE Id = 11;",
        )
        .unwrap();

    let unlinked = db.remove_episode_file(7).unwrap();
    assert_eq!(unlinked.len(), 1);
    assert_eq!(linked_file(&db, "Episodes", 11), 7);
    assert_eq!(row_count(&db, "EpisodeFiles"), 1);
}

#[test]
fn test_register_track_file_and_list() {
    let db = seeded(false);
    let first = db.register_track_file(&track_file("/music/Band/01.flac", vec![101])).unwrap();
    let second = db.register_track_file(&track_file("/music/Band/02.flac", vec![102])).unwrap();
    assert_ne!(first, second);
    assert_eq!(linked_file(&db, "Tracks", 101), first);

    let again = db.register_track_file(&track_file("/music/Band/01.flac", vec![101])).unwrap();
    assert_eq!(again, first);
    assert_eq!(row_count(&db, "TrackFiles"), 2);

    let records = db.track_files().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].owner_id, 5);
    assert_eq!(records[0].album_id, Some(10));
    assert_eq!(records[0].path, PathBuf::from("/music/Band/01.flac"));
    assert_eq!(records[0].sub_entities, vec![101]);
}

#[test]
fn test_remove_track_file() {
    let db = seeded(false);
    let id = db.register_track_file(&track_file("/music/Band/01.flac", vec![101])).unwrap();

    assert_eq!(db.remove_track_file(id).unwrap(), vec![101]);
    assert_eq!(linked_file(&db, "Tracks", 101), 0);
    assert_eq!(row_count(&db, "TrackFiles"), 0);
}

#[test]
fn test_foreign_database_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.db");
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE Unrelated (Id INTEGER PRIMARY KEY);")
        .unwrap();

    let db = CatalogDb::sonarr(&path, false);
    assert!(db.connection().is_err());
    assert!(db.episode_files().is_err());
}
