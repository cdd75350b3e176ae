//! Collaborator contracts consumed by the reconcilers.
//!
//! HTTP and SQLite implementations live in `clients` and `storage`; tests supply fakes.

pub mod models;

use std::rc::Rc;

use crate::error::Error;
pub use models::*;

pub trait HistorySource {
    /// Only entries in the terminal "completed" state.
    fn fetch_completed_releases(&self) -> Result<Vec<ReleaseRecord>, Error>;
}

/// Operations every library manager supports.
pub trait ManagerApi {
    fn execute(&self, command: &Command) -> Result<(), Error>;

    /// Drops queue entries for `release` without touching the download client.
    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error>;
}

pub trait MovieCatalog: ManagerApi {
    fn movies(&self) -> Result<Vec<Movie>, Error>;
    fn update_movie_path(&self, movie_id: i64, path: &str) -> Result<(), Error>;
    fn delete_movie_file(&self, file_id: i64) -> Result<(), Error>;
}

pub trait SeriesCatalog: ManagerApi {
    fn series(&self) -> Result<Vec<Series>, Error>;
    fn episodes(&self, series_id: i64) -> Result<Vec<Episode>, Error>;
}

pub trait MusicCatalog: ManagerApi {
    fn artists(&self) -> Result<Vec<Artist>, Error>;
    fn albums(&self, artist_id: i64) -> Result<Vec<Album>, Error>;
    fn tracks(&self, album_id: i64) -> Result<Vec<Track>, Error>;
}

/// Direct write access to a manager's episode file table.
pub trait EpisodeFileStore {
    /// Returns the file id. Re-registering the same relative path reuses the existing row.
    fn register_episode_file(&self, file: &NewEpisodeFile) -> Result<i64, Error>;
    fn episode_files(&self) -> Result<Vec<FileRecord>, Error>;
    /// Clears the episode links and deletes the row.
    fn remove_episode_file(&self, file_id: i64) -> Result<Vec<UnlinkedEpisode>, Error>;
}

/// Direct write access to a manager's track file table.
pub trait TrackFileStore {
    fn register_track_file(&self, file: &NewTrackFile) -> Result<i64, Error>;
    fn track_files(&self) -> Result<Vec<FileRecord>, Error>;
    /// Returns the ids of the tracks that were unlinked.
    fn remove_track_file(&self, file_id: i64) -> Result<Vec<i64>, Error>;
}

impl<T: HistorySource + ?Sized> HistorySource for Rc<T> {
    fn fetch_completed_releases(&self) -> Result<Vec<ReleaseRecord>, Error> {
        (**self).fetch_completed_releases()
    }
}

impl<T: ManagerApi + ?Sized> ManagerApi for Rc<T> {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        (**self).execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        (**self).remove_queue_entries(release)
    }
}

impl<T: MovieCatalog + ?Sized> MovieCatalog for Rc<T> {
    fn movies(&self) -> Result<Vec<Movie>, Error> {
        (**self).movies()
    }

    fn update_movie_path(&self, movie_id: i64, path: &str) -> Result<(), Error> {
        (**self).update_movie_path(movie_id, path)
    }

    fn delete_movie_file(&self, file_id: i64) -> Result<(), Error> {
        (**self).delete_movie_file(file_id)
    }
}

impl<T: SeriesCatalog + ?Sized> SeriesCatalog for Rc<T> {
    fn series(&self) -> Result<Vec<Series>, Error> {
        (**self).series()
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<Episode>, Error> {
        (**self).episodes(series_id)
    }
}

impl<T: MusicCatalog + ?Sized> MusicCatalog for Rc<T> {
    fn artists(&self) -> Result<Vec<Artist>, Error> {
        (**self).artists()
    }

    fn albums(&self, artist_id: i64) -> Result<Vec<Album>, Error> {
        (**self).albums(artist_id)
    }

    fn tracks(&self, album_id: i64) -> Result<Vec<Track>, Error> {
        (**self).tracks(album_id)
    }
}

impl<T: EpisodeFileStore + ?Sized> EpisodeFileStore for Rc<T> {
    fn register_episode_file(&self, file: &NewEpisodeFile) -> Result<i64, Error> {
        (**self).register_episode_file(file)
    }

    fn episode_files(&self) -> Result<Vec<FileRecord>, Error> {
        (**self).episode_files()
    }

    fn remove_episode_file(&self, file_id: i64) -> Result<Vec<UnlinkedEpisode>, Error> {
        (**self).remove_episode_file(file_id)
    }
}

impl<T: TrackFileStore + ?Sized> TrackFileStore for Rc<T> {
    fn register_track_file(&self, file: &NewTrackFile) -> Result<i64, Error> {
        (**self).register_track_file(file)
    }

    fn track_files(&self) -> Result<Vec<FileRecord>, Error> {
        (**self).track_files()
    }

    fn remove_track_file(&self, file_id: i64) -> Result<Vec<i64>, Error> {
        (**self).remove_track_file(file_id)
    }
}
