use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::catalog::{HistorySource, ReleaseRecord};
use crate::clients::{ArrClient, LidarrClient, RadarrClient, SabnzbdClient, SonarrClient};
use crate::config::{AppConfig, CategoryConfig};
use crate::error::Error;
use crate::reconcile::{
    AuditReport, CategoryReconciler, CategoryReport, EpisodeHandler, MovieHandler, Reconciler,
    TrackHandler,
};
use crate::storage::CatalogDb;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Polling,
}

#[derive(Debug, Default)]
pub struct CycleReport {
    pub releases: usize,
    pub history_failed: bool,
    pub categories: Vec<CategoryReport>,
    /// Reconcilers that failed as a whole, with the error text.
    pub failures: Vec<(String, String)>,
    pub audits: Vec<AuditReport>,
    pub duration: Duration,
}

impl CycleReport {
    pub fn audited(&self) -> bool {
        !self.audits.is_empty()
    }
}

/// Drives one reconciliation pass per interval across every enabled category.
pub struct PollEngine {
    history: Box<dyn HistorySource>,
    reconcilers: Vec<Box<dyn CategoryReconciler>>,
    poll_interval: Duration,
    audit_interval: Duration,
    last_audit: Option<Instant>,
    state: SchedulerState,
}

impl PollEngine {
    pub fn new(history: Box<dyn HistorySource>, poll_interval: Duration, audit_interval: Duration) -> Self {
        Self {
            history,
            reconcilers: Vec::new(),
            poll_interval,
            audit_interval,
            last_audit: None,
            state: SchedulerState::Idle,
        }
    }

    /// Wires the HTTP clients, catalog databases and reconcilers for every enabled category.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let timeout = config.http_timeout();
        let history = SabnzbdClient::new(&config.history, timeout)?;
        let mut engine = Self::new(Box::new(history), config.poll_interval(), config.audit_interval());

        if config.movies.enabled {
            let client = RadarrClient::new(arr_client(&config.movies, "v3", config)?);
            let handler = MovieHandler::new(client, &config.matching);
            engine.add(reconciler(&config.movies, handler, config));
        }
        if config.tv.enabled {
            let client = SonarrClient::new(arr_client(&config.tv, "v3", config)?);
            let db = CatalogDb::sonarr(database_path(&config.tv)?, config.dry_run);
            let handler = EpisodeHandler::new(client, db, &config.matching);
            engine.add(reconciler(&config.tv, handler, config));
        }
        if config.music.enabled {
            let client = LidarrClient::new(arr_client(&config.music, "v1", config)?);
            let db = CatalogDb::lidarr(database_path(&config.music)?, config.dry_run);
            let handler = TrackHandler::new(client, db, &config.matching);
            engine.add(reconciler(&config.music, handler, config));
        }

        info!(
            "Poll engine ready: {} categories, poll every {}s, audit every {}s{}",
            engine.reconcilers.len(),
            engine.poll_interval.as_secs(),
            engine.audit_interval.as_secs(),
            if config.dry_run { " (dry run)" } else { "" }
        );
        Ok(engine)
    }

    pub fn add(&mut self, reconciler: Box<dyn CategoryReconciler>) {
        self.reconcilers.push(reconciler);
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn categories(&self) -> Vec<&str> {
        self.reconcilers.iter().map(|reconciler| reconciler.name()).collect()
    }

    /// The first cycle always audits.
    pub fn audit_due_at(&self, now: Instant) -> bool {
        self.last_audit
            .map_or(true, |last| now.duration_since(last) >= self.audit_interval)
    }

    fn fetch_snapshot(&self, report: &mut CycleReport) -> Vec<ReleaseRecord> {
        match self.history.fetch_completed_releases() {
            Ok(releases) => {
                debug!("History returned {} completed releases", releases.len());
                releases
            }
            Err(err) => {
                warn!("History unavailable, treating as empty: {}", err);
                report.history_failed = true;
                Vec::new()
            }
        }
    }

    pub fn run_cycle(&mut self) -> CycleReport {
        self.run_cycle_at(Instant::now())
    }

    /// One full pass. Every reconciler sees the same snapshot; failures stay local to the
    /// reconciler that raised them.
    pub fn run_cycle_at(&mut self, now: Instant) -> CycleReport {
        let started = Instant::now();
        self.state = SchedulerState::Polling;

        let mut report = CycleReport::default();
        let releases = self.fetch_snapshot(&mut report);
        report.releases = releases.len();

        for reconciler in self.reconcilers.iter_mut() {
            match reconciler.reconcile(&releases) {
                Ok(category) => report.categories.push(category),
                Err(err) => {
                    error!("[{}] Reconcile failed: {}", reconciler.name(), err);
                    report.failures.push((reconciler.name().to_string(), err.to_string()));
                }
            }
        }

        if self.audit_due_at(now) {
            report.audits = self.audit_all();
            self.last_audit = Some(now);
        }

        report.duration = started.elapsed();
        self.state = SchedulerState::Idle;
        report
    }

    /// Stale-entry sweep over every category, regardless of the audit interval.
    pub fn audit_all(&mut self) -> Vec<AuditReport> {
        let mut audits = Vec::new();
        for reconciler in self.reconcilers.iter_mut() {
            match reconciler.audit() {
                Ok(audit) => audits.push(audit),
                Err(err) => error!("[{}] Audit failed: {}", reconciler.name(), err),
            }
        }
        audits
    }

    /// Runs cycles back to back, sleeping out the rest of each interval. Never returns.
    pub fn run(&mut self) {
        loop {
            let started = Instant::now();
            let report = self.run_cycle();
            let registered: usize = report.categories.iter().map(|c| c.registered).sum();
            let searches: usize = report.categories.iter().map(|c| c.searches).sum();
            info!(
                "Cycle done in {:.2}s: {} releases, {} registered, {} searches, {} failures",
                report.duration.as_secs_f64(),
                report.releases,
                registered,
                searches,
                report.failures.len()
            );
            let wait = self.poll_interval.saturating_sub(started.elapsed());
            debug!("Sleeping {}s", wait.as_secs());
            thread::sleep(wait);
        }
    }
}

fn arr_client(category: &CategoryConfig, version: &str, config: &AppConfig) -> Result<ArrClient, Error> {
    ArrClient::new(&category.url, version, &category.api_key, config.http_timeout(), config.dry_run)
}

fn database_path(category: &CategoryConfig) -> Result<&Path, Error> {
    category
        .database_path
        .as_deref()
        .ok_or_else(|| Error::InvalidConfig(format!("{}.database_path is required", category.category)))
}

fn reconciler<H>(category: &CategoryConfig, handler: H, config: &AppConfig) -> Box<dyn CategoryReconciler>
where
    H: crate::reconcile::MediaHandler + 'static,
{
    Box::new(Reconciler::new(
        &category.category,
        category.root.clone(),
        handler,
        &config.matching,
        config.cooldown(),
    ))
}
