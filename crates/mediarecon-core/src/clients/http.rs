use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::catalog::{Command, ManagerApi};
use crate::error::Error;
use crate::matching::compact;

const QUEUE_PAGE_SIZE: u32 = 200;

pub(crate) fn build_agent(timeout: Duration) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout_connect(timeout)
        .timeout_read(timeout)
        .timeout_write(timeout)
        .build()
}

pub(crate) fn endpoint_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Shared transport for the *arr managers: versioned API root, `X-Api-Key` auth, and a
/// dry-run switch that logs every mutating call instead of sending it.
pub struct ArrClient {
    agent: ureq::Agent,
    base: String,
    api_key: String,
    dry_run: bool,
}

impl ArrClient {
    pub fn new(url: &str, version: &str, api_key: &str, timeout: Duration, dry_run: bool) -> Result<Self, Error> {
        let base = endpoint_base(url);
        if base.is_empty() {
            return Err(Error::InvalidConfig("manager url is empty".to_string()));
        }
        Ok(Self {
            agent: build_agent(timeout),
            base: format!("{}/api/{}", base, version),
            api_key: api_key.to_string(),
            dry_run,
        })
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.agent.get(&url).set("X-Api-Key", &self.api_key).call()?;
        Ok(response.into_json()?)
    }

    pub fn send_json(&self, method: &str, path: &str, body: &Value) -> Result<(), Error> {
        let url = self.url(path);
        if self.dry_run {
            info!("[dry-run] Would {} {}", method, url);
            return Ok(());
        }
        debug!("{} {}", method, url);
        self.agent
            .request(method, &url)
            .set("X-Api-Key", &self.api_key)
            .send_json(body)?;
        Ok(())
    }

    pub fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path);
        if self.dry_run {
            info!("[dry-run] Would DELETE {}", url);
            return Ok(());
        }
        debug!("DELETE {}", url);
        self.agent.delete(&url).set("X-Api-Key", &self.api_key).call()?;
        Ok(())
    }
}

/// Ids of queue records whose title is the release, ignoring case and punctuation.
pub fn matching_queue_ids(queue: &Value, release: &str) -> Vec<i64> {
    let wanted = compact(release);
    let records = match queue {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => queue
            .get("records")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };
    records
        .iter()
        .filter(|record| {
            record
                .get("title")
                .and_then(Value::as_str)
                .map_or(false, |title| compact(title) == wanted)
        })
        .filter_map(|record| record.get("id").and_then(Value::as_i64))
        .collect()
}

impl ManagerApi for ArrClient {
    fn execute(&self, command: &Command) -> Result<(), Error> {
        if self.dry_run {
            info!("[dry-run] Would send {}", command);
            return Ok(());
        }
        info!("Sending {}", command);
        self.send_json("POST", "/command", &command.body())
    }

    fn remove_queue_entries(&self, release: &str) -> Result<usize, Error> {
        let queue: Value = self.get_json(&format!("/queue?page=1&pageSize={}", QUEUE_PAGE_SIZE))?;
        let ids = matching_queue_ids(&queue, release);
        for id in &ids {
            self.delete(&format!("/queue/{}?removeFromClient=false&blocklist=false", id))?;
        }
        Ok(ids.len())
    }
}
