use std::path::{Path, PathBuf};
use tracing::info;

use super::{MediaHandler, Resolution, StaleRemoval};
use crate::catalog::{Command, FileRecord, ManagerApi, MediaKind, Movie, MovieCatalog};
use crate::config::MatchingConfig;
use crate::cooldown::CooldownKey;
use crate::error::Error;
use crate::matching::{best_match, MatchOptions};
use crate::scanner::walk::VIDEO_EXTENSIONS;

/// One directory per movie. Registration points the movie's stored path at it.
pub struct MovieHandler<C: MovieCatalog> {
    catalog: C,
    options: MatchOptions,
}

impl<C: MovieCatalog> MovieHandler<C> {
    pub fn new(catalog: C, matching: &MatchingConfig) -> Self {
        Self {
            catalog,
            options: MatchOptions::entity(matching),
        }
    }
}

impl<C: MovieCatalog> MediaHandler for MovieHandler<C> {
    type Candidate = Movie;
    type Target = Movie;

    fn kind(&self) -> MediaKind {
        MediaKind::Movie
    }

    fn extensions(&self) -> &'static [&'static str] {
        VIDEO_EXTENSIONS
    }

    fn api(&self) -> &dyn ManagerApi {
        &self.catalog
    }

    fn fetch_candidates(&self) -> Result<Vec<Movie>, Error> {
        self.catalog.movies()
    }

    fn resolve(&self, release: &str, candidates: &[Movie]) -> Result<Resolution<Movie>, Error> {
        let found = best_match(
            release,
            None,
            candidates,
            |movie| movie.title.as_str(),
            Movie::known_year,
            &self.options,
        );
        Ok(match found {
            Some(scored) => Resolution::Matched(scored.candidate.clone()),
            None => Resolution::NoMatch,
        })
    }

    fn label(&self, movie: &Movie) -> String {
        match movie.known_year() {
            Some(year) => format!("'{}' ({})", movie.title, year),
            None => format!("'{}'", movie.title),
        }
    }

    fn is_satisfied(&self, movie: &Movie) -> bool {
        movie.has_file
    }

    fn acquisition(&self, movie: &Movie) -> (CooldownKey, Command) {
        (CooldownKey::entity(movie.id), Command::MoviesSearch(movie.id))
    }

    fn register(&self, movie: &Movie, _release: &str, dir: &Path) -> Result<usize, Error> {
        let path = dir.to_string_lossy();
        if Path::new(&movie.path) != dir {
            info!("Updating path of '{}': {} -> {}", movie.title, movie.path, path);
            self.catalog.update_movie_path(movie.id, &path)?;
        }
        Ok(1)
    }

    fn refresh_command(&self, movie: &Movie) -> Command {
        Command::RefreshMovie(movie.id)
    }

    fn file_records(&self) -> Result<Vec<FileRecord>, Error> {
        let records = self
            .catalog
            .movies()?
            .into_iter()
            .filter_map(|movie| {
                let file = movie.movie_file?;
                Some(FileRecord {
                    id: file.id,
                    owner_id: movie.id,
                    album_id: None,
                    path: PathBuf::from(file.path),
                    size: file.size,
                    sub_entities: vec![movie.id],
                })
            })
            .collect();
        Ok(records)
    }

    fn remove_file_record(&self, record: &FileRecord) -> Result<StaleRemoval, Error> {
        self.catalog.delete_movie_file(record.id)?;
        Ok(StaleRemoval {
            refresh: Some(Command::RefreshMovie(record.owner_id)),
            searches: vec![(
                CooldownKey::entity(record.owner_id),
                Command::MoviesSearch(record.owner_id),
            )],
        })
    }
}
