use ahash::AHashSet;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

use super::{MediaHandler, Reconciler};
use crate::error::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub category: String,
    /// Library root missing or empty, nothing was checked.
    pub skipped: bool,
    pub checked: usize,
    pub removed: usize,
    pub refreshes: usize,
    pub deferred: usize,
    pub failed: usize,
}

/// An unmounted or empty store must never be read as "every file vanished".
pub fn library_root_available(root: &Path) -> bool {
    match fs::read_dir(root) {
        Ok(mut entries) => entries.next().is_some(),
        Err(err) => {
            warn!("Library root {} unavailable: {}", root.display(), err);
            false
        }
    }
}

impl<H: MediaHandler> Reconciler<H> {
    /// Removes file records whose backing file is gone. Owners are refreshed right away;
    /// searches are queued for the next reconcile pass.
    pub fn sweep_stale_records(&mut self) -> Result<AuditReport, Error> {
        let mut report = AuditReport {
            category: self.category.clone(),
            ..AuditReport::default()
        };

        if !library_root_available(&self.root) {
            warn!("[{}] Skipping stale audit, {} is missing or empty", self.name, self.root.display());
            report.skipped = true;
            return Ok(report);
        }

        let records = self.handler.file_records()?;
        let mut refreshes = Vec::new();
        let mut seen_refreshes = AHashSet::new();
        let mut queued: AHashSet<_> = self.deferred.iter().map(|(key, _)| *key).collect();

        for record in records.iter().filter(|record| record.path.starts_with(&self.root)) {
            report.checked += 1;
            if record.path.exists() {
                continue;
            }

            info!("[{}] File record {} is stale: {}", self.name, record.id, record.path.display());
            match self.handler.remove_file_record(record) {
                Ok(removal) => {
                    report.removed += 1;
                    if let Some(refresh) = removal.refresh {
                        if seen_refreshes.insert(refresh.clone()) {
                            refreshes.push(refresh);
                        }
                    }
                    for (key, command) in removal.searches {
                        if queued.insert(key) {
                            debug!("[{}] Deferring {}", self.name, command);
                            self.deferred.push((key, command));
                            report.deferred += 1;
                        }
                    }
                }
                Err(err) => {
                    error!("[{}] Removing file record {} failed: {}", self.name, record.id, err);
                    report.failed += 1;
                }
            }
        }

        for refresh in refreshes {
            match self.handler.api().execute(&refresh) {
                Ok(()) => report.refreshes += 1,
                Err(err) => {
                    error!("[{}] {} failed: {}", self.name, refresh, err);
                    report.failed += 1;
                }
            }
        }

        info!(
            "[{}] Audit checked {} records, removed {}, deferred {} searches",
            self.name, report.checked, report.removed, report.deferred
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_root_availability() {
        let dir = tempdir().unwrap();
        assert!(!library_root_available(dir.path()));
        assert!(!library_root_available(&dir.path().join("missing")));
        fs::create_dir(dir.path().join("Movie (2020)")).unwrap();
        assert!(library_root_available(dir.path()));
    }
}
