use ahash::AHashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::{MediaHandler, Resolution, StaleRemoval};
use crate::catalog::{
    Album, Artist, Command, FileRecord, ManagerApi, MediaKind, MusicCatalog, NewTrackFile, Track,
    TrackFileStore,
};
use crate::config::MatchingConfig;
use crate::cooldown::CooldownKey;
use crate::error::Error;
use crate::matching::{best_match, compact, significant_words, MatchOptions};
use crate::parse::{parse_track_file, TrackNumber};
use crate::quality::audio_quality;
use crate::scanner::walk::{list_media_files, MUSIC_EXTENSIONS};

/// Titles this short are matched as substrings of the compacted release name.
const SHORT_TITLE_CHARS: usize = 4;

#[derive(Debug, Clone)]
pub struct AlbumTarget {
    pub artist: Artist,
    pub album: Album,
    pub tracks: Vec<Track>,
}

pub struct TrackHandler<C: MusicCatalog, S: TrackFileStore> {
    catalog: C,
    store: S,
    artist_options: MatchOptions,
    album_threshold: f64,
}

/// Album title against the release. Short titles need an exact substring hit and score 1.0;
/// longer ones score the fraction of their words found in the release.
pub fn album_score(release: &str, title: &str) -> f64 {
    let title_words = significant_words(title);
    let compact_title = compact(title);
    if title_words.len() <= 1 || compact_title.chars().count() <= SHORT_TITLE_CHARS {
        let hit = !compact_title.is_empty() && compact(release).contains(&compact_title);
        return if hit { 1.0 } else { 0.0 };
    }

    let release_words: AHashSet<String> = significant_words(release).into_iter().collect();
    let title_words: AHashSet<String> = title_words.into_iter().collect();
    let found = title_words.iter().filter(|word| release_words.contains(*word)).count();
    found as f64 / title_words.len() as f64
}

fn is_open(track: &Track, claimed: &AHashSet<i64>) -> bool {
    !track.has_file && !claimed.contains(&track.id)
}

/// Unfilled track for a parsed number. With a disc the position on that disc decides;
/// without one the absolute number wins over a first-disc position.
fn find_track<'a>(tracks: &'a [Track], number: TrackNumber, claimed: &AHashSet<i64>) -> Option<&'a Track> {
    let on_disc = |disc: u32| {
        tracks
            .iter()
            .filter(|track| is_open(track, claimed))
            .find(|track| track.medium_number == disc && track.disc_position() == Some(number.track))
    };
    let absolute = || {
        tracks
            .iter()
            .filter(|track| is_open(track, claimed))
            .find(|track| track.absolute_track_number == number.track)
    };

    match number.disc {
        Some(1) => on_disc(1).or_else(absolute),
        Some(disc) => on_disc(disc),
        None => absolute().or_else(|| on_disc(1)),
    }
}

impl<C: MusicCatalog, S: TrackFileStore> TrackHandler<C, S> {
    pub fn new(catalog: C, store: S, matching: &MatchingConfig) -> Self {
        Self {
            catalog,
            store,
            artist_options: MatchOptions::entity(matching).with_threshold(matching.artist_threshold),
            album_threshold: matching.album_threshold,
        }
    }

    fn best_album(&self, release: &str, albums: Vec<Album>) -> Option<Album> {
        let mut best: Option<(Album, f64)> = None;
        for album in albums {
            let score = album_score(release, &album.title);
            debug!("album score {:.2} for '{}' against '{}'", score, album.title, release);
            if best.as_ref().map_or(true, |(_, current)| score > *current) {
                best = Some((album, score));
            }
        }
        best.filter(|(_, score)| *score >= self.album_threshold)
            .map(|(album, _)| album)
    }
}

impl<C: MusicCatalog, S: TrackFileStore> MediaHandler for TrackHandler<C, S> {
    type Candidate = Artist;
    type Target = AlbumTarget;

    fn kind(&self) -> MediaKind {
        MediaKind::Track
    }

    fn extensions(&self) -> &'static [&'static str] {
        MUSIC_EXTENSIONS
    }

    fn api(&self) -> &dyn ManagerApi {
        &self.catalog
    }

    fn fetch_candidates(&self) -> Result<Vec<Artist>, Error> {
        self.catalog.artists()
    }

    fn resolve(&self, release: &str, candidates: &[Artist]) -> Result<Resolution<AlbumTarget>, Error> {
        let artist = match best_match(
            release,
            None,
            candidates,
            |artist| artist.name.as_str(),
            |_| None,
            &self.artist_options,
        ) {
            Some(scored) => scored.candidate.clone(),
            None => return Ok(Resolution::NoMatch),
        };

        let albums = self.catalog.albums(artist.id)?;
        let album = match self.best_album(release, albums) {
            Some(album) => album,
            None => {
                info!("'{}' matched artist '{}' but none of their albums", release, artist.name);
                return Ok(Resolution::NoMatch);
            }
        };

        let tracks = self.catalog.tracks(album.id)?;
        Ok(Resolution::Matched(AlbumTarget { artist, album, tracks }))
    }

    fn label(&self, target: &AlbumTarget) -> String {
        format!("'{}' - '{}'", target.artist.name, target.album.title)
    }

    fn is_satisfied(&self, target: &AlbumTarget) -> bool {
        !target.tracks.is_empty() && target.tracks.iter().all(|track| track.has_file)
    }

    fn acquisition(&self, target: &AlbumTarget) -> (CooldownKey, Command) {
        (
            CooldownKey::album(target.artist.id, target.album.id),
            Command::ArtistSearch(target.artist.id),
        )
    }

    fn register(&self, target: &AlbumTarget, release: &str, dir: &Path) -> Result<usize, Error> {
        let mut linked = 0;
        let mut claimed = AHashSet::new();

        for file in list_media_files(dir, MUSIC_EXTENSIONS) {
            let number = match parse_track_file(&file) {
                Some(number) => number,
                None => {
                    debug!("No track number in {}", file.display());
                    continue;
                }
            };
            let track = match find_track(&target.tracks, number, &claimed) {
                Some(track) => track,
                None => {
                    debug!("No unfilled track {:?} for {}", number, file.display());
                    continue;
                }
            };

            let size = match fs::metadata(&file) {
                Ok(meta) => meta.len() as i64,
                Err(err) => {
                    error!("Cannot stat {}: {}", file.display(), err);
                    continue;
                }
            };
            let new_file = NewTrackFile {
                album_id: target.album.id,
                path: file.to_string_lossy().into_owned(),
                size,
                quality: audio_quality(&file),
                scene_name: release.to_string(),
                track_ids: vec![track.id],
            };
            match self.store.register_track_file(&new_file) {
                Ok(id) => {
                    debug!("Registered {} as track file {}", new_file.path, id);
                    claimed.insert(track.id);
                    linked += 1;
                }
                Err(err) => error!("Registering {} failed: {}", file.display(), err),
            }
        }

        if linked > 0 {
            info!("Registered {} tracks of {}", linked, self.label(target));
        }
        Ok(linked)
    }

    /// One artist-level refresh covers every track registered in the pass.
    fn refresh_command(&self, target: &AlbumTarget) -> Command {
        Command::RefreshArtist(target.artist.id)
    }

    fn file_records(&self) -> Result<Vec<FileRecord>, Error> {
        self.store.track_files()
    }

    fn remove_file_record(&self, record: &FileRecord) -> Result<StaleRemoval, Error> {
        let unlinked = self.store.remove_track_file(record.id)?;
        debug!("Unlinked {} tracks from file record {}", unlinked.len(), record.id);
        let searches = record
            .album_id
            .map(|album| {
                (
                    CooldownKey::album(record.owner_id, album),
                    Command::AlbumSearch(vec![album]),
                )
            })
            .into_iter()
            .collect();
        Ok(StaleRemoval {
            refresh: Some(Command::RefreshArtist(record.owner_id)),
            searches,
        })
    }
}
