use super::http::ArrClient;
use crate::catalog::{Command, Episode, ManagerApi, Series, SeriesCatalog};
use crate::error::Error;

pub struct SonarrClient {
    http: ArrClient,
}

impl SonarrClient {
    pub fn new(http: ArrClient) -> Self {
        Self { http }
    }
}

impl ManagerApi for SonarrClient {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        self.http.execute(command)
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        self.http.remove_queue_entries(release)
    }
}

impl SeriesCatalog for SonarrClient {
    fn series(&self) -> Result<Vec<Series>, Error> {
        self.http.get_json("/series")
    }

    fn episodes(&self, series_id: i64) -> Result<Vec<Episode>, Error> {
        self.http.get_json(&format!("/episode?seriesId={}", series_id))
    }
}
