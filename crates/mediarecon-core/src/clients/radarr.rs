use serde_json::Value;

use super::http::ArrClient;
use crate::catalog::{Command, ManagerApi, Movie, MovieCatalog};
use crate::error::Error;

pub struct RadarrClient {
    http: ArrClient,
}

impl RadarrClient {
    pub fn new(http: ArrClient) -> Self {
        Self { http }
    }
}

impl ManagerApi for RadarrClient {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.http.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.http.remove_queue_entries(release)
    }
}

impl MovieCatalog for RadarrClient {
    fn movies(&self) -> Result<Vec<Movie>, Error> {
        self.http.get_json("/movie")
    }

    /// Radarr only accepts whole-resource updates, so the current movie is fetched and
    /// written back with the new path. `moveFiles=false` keeps Radarr off the read-only mount.
    fn update_movie_path(&self, movie_id: i64, path: &str) -> Result<(), Error> {
        let mut movie: Value = self.http.get_json(&format!("/movie/{}", movie_id))?;
        movie["path"] = Value::String(path.to_string());
        self.http
            .send_json("PUT", &format!("/movie/{}?moveFiles=false", movie_id), &movie)
    }

    fn delete_movie_file(&self, file_id: i64) -> Result<(), Error> {
        self.http.delete(&format!("/moviefile/{}", file_id))
    }
}
