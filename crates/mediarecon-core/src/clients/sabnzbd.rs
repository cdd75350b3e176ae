use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::http::{build_agent, endpoint_base};
use crate::catalog::{HistorySource, ReleaseRecord};
use crate::config::HistoryConfig;
use crate::error::Error;

const COMPLETED: &str = "Completed";

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: History,
}

#[derive(Debug, Deserialize)]
struct History {
    #[serde(default)]
    slots: Vec<HistorySlot>,
}

#[derive(Debug, Deserialize)]
struct HistorySlot {
    name: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    status: String,
}

/// Completed downloads from the SABnzbd history API.
pub struct SabnzbdClient {
    agent: ureq::Agent,
    base: String,
    api_key: String,
    limit: u32,
}

impl SabnzbdClient {
    pub fn new(config: &HistoryConfig, timeout: Duration) -> Result<Self, Error> {
        let base = endpoint_base(&config.url);
        if base.is_empty() {
            return Err(Error::InvalidConfig("history.url is empty".to_string()));
        }
        Ok(Self {
            agent: build_agent(timeout),
            base,
            api_key: config.api_key.clone(),
            limit: config.limit,
        })
    }

    pub fn history_url(&self) -> String {
        format!(
            "{}/api?mode=history&output=json&apikey={}&limit={}",
            self.base,
            urlencoding::encode(&self.api_key),
            self.limit
        )
    }
}

/// Keeps only slots in the terminal "Completed" state.
pub fn parse_history(body: &str) -> Result<Vec<ReleaseRecord>, Error> {
    let response: HistoryResponse = serde_json::from_str(body)?;
    let releases = response
        .history
        .slots
        .into_iter()
        .filter(|slot| slot.status == COMPLETED)
        .map(|slot| ReleaseRecord {
            job_name: slot.name,
            category: slot.category,
        })
        .collect();
    Ok(releases)
}

impl HistorySource for SabnzbdClient {
    fn fetch_completed_releases(&self) -> Result<Vec<ReleaseRecord>, Error> {
        let body = self.agent.get(&self.history_url()).call()?.into_string()?;
        let releases = parse_history(&body)?;
        debug!("SABnzbd history: {} completed", releases.len());
        Ok(releases)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_history_keeps_completed() {
        let body = r#"{"history": {"slots": [
            {"name": "Movie.Title.2023.1080p.WEBDL-LAMA", "category": "movies", "status": "Completed",
             "nzo_id": "SABnzbd_nzo_1", "storage": "/downloads/complete/movies/Movie.Title.2023.1080p.WEBDL-LAMA"},
            {"name": "Show.S01E01.720p", "category": "tv", "status": "Failed"},
            {"name": "Band-Album-2020-FLAC", "category": "music", "status": "Extracting"}
        ]}}"#;
        let releases = parse_history(body).unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].category, "movies");
        assert_eq!(releases[0].job_name, "Movie.Title.2023.1080p.WEBDL-LAMA");
    }

    #[test]
    fn test_history_url() {
        let config = HistoryConfig {
            url: "http://sab:8080/".to_string(),
            api_key: "a b".to_string(),
            limit: 50,
        };
        let client = SabnzbdClient::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.history_url(),
            "http://sab:8080/api?mode=history&output=json&apikey=a%20b&limit=50"
        );
    }

    #[test]
    fn test_malformed_history_is_an_error() {
        assert!(matches!(parse_history("{}"), Err(Error::Json(_))));
    }
}
