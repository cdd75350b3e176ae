use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::path::PathBuf;

use crate::quality::Quality;

/// A completed download as reported by the history source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub job_name: String,
    pub category: String,
}

impl ReleaseRecord {
    pub fn new(job_name: &str, category: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            category: category.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Movie,
    Episode,
    Track,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Movie => write!(f, "movies"),
            MediaKind::Episode => write!(f, "tv"),
            MediaKind::Track => write!(f, "music"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub movie_file: Option<MovieFile>,
}

impl Movie {
    /// Radarr reports unknown years as 0.
    pub fn known_year(&self) -> Option<i32> {
        self.year.filter(|year| *year > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieFile {
    pub id: i64,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub size: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: i64,
    pub series_id: i64,
    pub season_number: u32,
    pub episode_number: u32,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub episode_file_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: i64,
    #[serde(rename = "artistName")]
    pub name: String,
    #[serde(default)]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: i64,
    pub artist_id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: i64,
    pub album_id: i64,
    #[serde(default)]
    pub absolute_track_number: u32,
    /// Position on its medium. Vinyl releases use values like `A1`.
    #[serde(default)]
    pub track_number: String,
    #[serde(default = "default_medium")]
    pub medium_number: u32,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub track_file_id: i64,
}

fn default_medium() -> u32 {
    1
}

impl Track {
    pub fn disc_position(&self) -> Option<u32> {
        let digits: String = self
            .track_number
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// A manager's record of a file backing one or more sub-entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Movie, series or artist the file belongs to.
    pub owner_id: i64,
    /// Album holding a track file.
    pub album_id: Option<i64>,
    pub path: PathBuf,
    pub size: i64,
    pub sub_entities: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewEpisodeFile {
    pub series_id: i64,
    pub season_number: u32,
    pub relative_path: String,
    pub size: i64,
    pub quality: Quality,
    pub scene_name: String,
    pub release_group: Option<String>,
    pub episode_ids: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct NewTrackFile {
    pub album_id: i64,
    pub path: String,
    pub size: i64,
    pub quality: Quality,
    pub scene_name: String,
    pub track_ids: Vec<i64>,
}

/// An episode whose file link was cleared by a stale-file removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnlinkedEpisode {
    pub id: i64,
    pub season_number: u32,
    pub episode_number: u32,
}

/// Refresh and search commands understood by the library managers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    RefreshMovie(i64),
    MoviesSearch(i64),
    RefreshSeries(i64),
    EpisodeSearch(Vec<i64>),
    SeasonSearch { series_id: i64, season: u32 },
    RefreshArtist(i64),
    ArtistSearch(i64),
    AlbumSearch(Vec<i64>),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::RefreshMovie(_) => "RefreshMovie",
            Command::MoviesSearch(_) => "MoviesSearch",
            Command::RefreshSeries(_) => "RefreshSeries",
            Command::EpisodeSearch(_) => "EpisodeSearch",
            Command::SeasonSearch { .. } => "SeasonSearch",
            Command::RefreshArtist(_) => "RefreshArtist",
            Command::ArtistSearch(_) => "ArtistSearch",
            Command::AlbumSearch(_) => "AlbumSearch",
        }
    }

    pub fn is_search(&self) -> bool {
        matches!(
            self,
            Command::MoviesSearch(_)
                | Command::EpisodeSearch(_)
                | Command::SeasonSearch { .. }
                | Command::ArtistSearch(_)
                | Command::AlbumSearch(_)
        )
    }

    /// Request body for the managers' `POST /command` endpoint.
    pub fn body(&self) -> Value {
        let name = self.name();
        match self {
            Command::RefreshMovie(id) | Command::MoviesSearch(id) => {
                json!({ "name": name, "movieIds": [id] })
            }
            Command::RefreshSeries(id) => json!({ "name": name, "seriesId": id }),
            Command::EpisodeSearch(ids) => json!({ "name": name, "episodeIds": ids }),
            Command::SeasonSearch { series_id, season } => {
                json!({ "name": name, "seriesId": series_id, "seasonNumber": season })
            }
            Command::RefreshArtist(id) | Command::ArtistSearch(id) => {
                json!({ "name": name, "artistId": id })
            }
            Command::AlbumSearch(ids) => json!({ "name": name, "albumIds": ids }),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name(), self.body())
    }
}
