#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;

use mediarecon_core::catalog::{
    Album, Artist, Command, Episode, HistorySource, ManagerApi, Movie, MovieCatalog, MovieFile,
    MusicCatalog, ReleaseRecord, Series, SeriesCatalog, Track,
};
use mediarecon_core::Error;

pub fn touch(path: &Path, bytes: usize) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, vec![0u8; bytes]).unwrap();
}

pub fn release(job_name: &str, category: &str) -> ReleaseRecord {
    ReleaseRecord::new(job_name, category)
}

// ── History ──────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeHistory {
    pub releases: RefCell<Vec<ReleaseRecord>>,
    pub fail: Cell<bool>,
    pub calls: Cell<usize>,
}

impl FakeHistory {
    pub fn with(releases: Vec<ReleaseRecord>) -> Self {
        Self {
            releases: RefCell::new(releases),
            ..Self::default()
        }
    }
}

impl HistorySource for FakeHistory {
    fn fetch_completed_releases(&self) -> Result<Vec<ReleaseRecord>, Error> {
        self.calls.set(self.calls.get() + 1);
        if self.fail.get() {
            return Err(Error::Http("history unreachable".to_string()));
        }
        Ok(self.releases.borrow().clone())
    }
}

// ── Manager commands ─────────────────────────────────────────

#[derive(Default)]
pub struct FakeManager {
    pub commands: RefCell<Vec<Command>>,
    pub queue_removals: RefCell<Vec<String>>,
    pub fail_commands: Cell<bool>,
}

impl FakeManager {
    pub fn sent(&self) -> Vec<Command> {
        self.commands.borrow().clone()
    }

    pub fn searches(&self) -> Vec<Command> {
        self.sent().into_iter().filter(Command::is_search).collect()
    }
}

impl ManagerApi for FakeManager {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        if self.fail_commands.get() {
            return Err(Error::Http("manager unreachable".to_string()));
        }
        self.commands.borrow_mut().push(command.clone());
        Ok(())
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.queue_removals.borrow_mut().push(release.to_string());
        Ok(1)
    }
}

// ── Radarr ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRadarr {
    pub api: FakeManager,
    pub movies: RefCell<Vec<Movie>>,
    pub path_updates: RefCell<Vec<(i64, String)>>,
    pub deleted_files: RefCell<Vec<i64>>,
    pub fail_listing: Cell<bool>,
}

pub fn movie(id: i64, title: &str, year: i32, path: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        year: Some(year),
        path: path.to_string(),
        has_file: false,
        movie_file: None,
    }
}

pub fn movie_with_file(id: i64, title: &str, file_id: i64, file_path: &Path) -> Movie {
    Movie {
        has_file: true,
        movie_file: Some(MovieFile {
            id: file_id,
            path: file_path.to_string_lossy().into_owned(),
            size: 100,
        }),
        ..movie(id, title, 2020, "")
    }
}

impl FakeRadarr {
    pub fn with(movies: Vec<Movie>) -> Self {
        Self {
            movies: RefCell::new(movies),
            ..Self::default()
        }
    }
}

impl ManagerApi for FakeRadarr {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.api.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.api.remove_queue_entries(release)
    }
}

impl MovieCatalog for FakeRadarr {
    fn movies(&self) -> Result<Vec<Movie>, Error> {
        if self.fail_listing.get() {
            return Err(Error::Http("radarr unreachable".to_string()));
        }
        Ok(self.movies.borrow().clone())
    }

    fn update_movie_path(&self, movie_id: i64, path: &str) -> Result<(), Error> {
        self.path_updates.borrow_mut().push((movie_id, path.to_string()));
        for movie in self.movies.borrow_mut().iter_mut().filter(|m| m.id == movie_id) {
            movie.path = path.to_string();
        }
        Ok(())
    }

    fn delete_movie_file(&self, file_id: i64) -> Result<(), Error> {
        self.deleted_files.borrow_mut().push(file_id);
        for movie in self.movies.borrow_mut().iter_mut() {
            if movie.movie_file.as_ref().map(|file| file.id) == Some(file_id) {
                movie.movie_file = None;
                movie.has_file = false;
            }
        }
        Ok(())
    }
}

// ── Sonarr ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSonarr {
    pub api: FakeManager,
    pub series: Vec<Series>,
    pub episodes: RefCell<Vec<Episode>>,
}

pub fn series(id: i64, title: &str, path: &str) -> Series {
    Series {
        id,
        title: title.to_string(),
        year: None,
        path: path.to_string(),
    }
}

pub fn episode(id: i64, series_id: i64, season: u32, number: u32) -> Episode {
    Episode {
        id,
        series_id,
        season_number: season,
        episode_number: number,
        has_file: false,
        episode_file_id: 0,
    }
}

impl ManagerApi for FakeSonarr {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.api.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.api.remove_queue_entries(release)
    }
}

impl SeriesCatalog for FakeSonarr {
    fn series(&self) -> Result<Vec<Series>, Error> {
        Ok(self.series.clone())
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<Episode>, Error> {
        Ok(self
            .episodes
            .borrow()
            .iter()
            .filter(|episode| episode.series_id == series_id)
            .cloned()
            .collect())
    }
}

// ── Lidarr ───────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeLidarr {
    pub api: FakeManager,
    pub artists: Vec<Artist>,
    pub albums: Vec<Album>,
    pub tracks: Vec<Track>,
}

pub fn artist(id: i64, name: &str) -> Artist {
    Artist {
        id,
        name: name.to_string(),
        path: format!("/music/{}", name),
    }
}

pub fn album(id: i64, artist_id: i64, title: &str) -> Album {
    Album {
        id,
        artist_id,
        title: title.to_string(),
    }
}

pub fn track(id: i64, album_id: i64, absolute: u32, medium: u32, position: u32) -> Track {
    Track {
        id,
        album_id,
        absolute_track_number: absolute,
        track_number: position.to_string(),
        medium_number: medium,
        has_file: false,
        track_file_id: 0,
    }
}

impl ManagerApi for FakeLidarr {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.api.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.api.remove_queue_entries(release)
    }
}

impl MusicCatalog for FakeLidarr {
    fn artists(&self) -> Result<Vec<Artist>, Error> {
        Ok(self.artists.clone())
    }

    fn albums(&self, artist_id: i64) -> Result<Vec<Album>, Error> {
        Ok(self.albums.iter().filter(|a| a.artist_id == artist_id).cloned().collect())
    }

    fn tracks(&self, album_id: i64) -> Result<Vec<Track>, Error> {
        Ok(self.tracks.iter().filter(|t| t.album_id == album_id).cloned().collect())
    }
}
