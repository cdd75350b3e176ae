use super::http::ArrClient;
use crate::catalog::{Album, Artist, Command, ManagerApi, MusicCatalog, Track};
use crate::error::Error;

pub struct LidarrClient {
    http: ArrClient,
}

impl LidarrClient {
    pub fn new(http: ArrClient) -> Self {
        Self { http }
    }
}

impl ManagerApi for LidarrClient {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.http.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.http.remove_queue_entries(release)
    }
}

impl MusicCatalog for LidarrClient {
    fn artists(&self) -> Result<Vec<Artist>, Error> {
        self.http.get_json("/artist")
    }

    fn albums(&self, artist_id: i64) -> Result<Vec<Album>, Error> {
        self.http.get_json(&format!("/album?artistId={}", artist_id))
    }

    fn tracks(&self, album_id: i64) -> Result<Vec<Track>, Error> {
        self.http.get_json(&format!("/track?albumId={}", album_id))
    }
}
