//! Per-category reconciliation.
//!
//! A [`Reconciler`] owns everything a category needs across cycles: the locator, the cooldown
//! tracker and the searches deferred by the last audit. What differs between movies, episodes
//! and tracks lives behind [`MediaHandler`].

pub mod audit;
pub mod episode;
pub mod movie;
pub mod track;

use ahash::AHashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::catalog::{Command, FileRecord, ManagerApi, MediaKind, ReleaseRecord};
use crate::config::MatchingConfig;
use crate::cooldown::{CooldownKey, CooldownTracker};
use crate::error::Error;
use crate::matching::MatchOptions;
use crate::scanner::Locator;

pub use audit::AuditReport;
pub use episode::{EpisodeHandler, EpisodeTarget};
pub use movie::MovieHandler;
pub use track::{AlbumTarget, TrackHandler};

/// Result of matching a release against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Matched(T),
    NoMatch,
    /// The release name carries no usable numbering. Retrying will not help.
    Unparseable,
}

/// Catalog changes made when a stale file record is removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaleRemoval {
    pub refresh: Option<Command>,
    pub searches: Vec<(CooldownKey, Command)>,
}

/// The media-kind specific half of a reconciler.
pub trait MediaHandler {
    type Candidate;
    type Target;

    fn kind(&self) -> MediaKind;

    /// Extensions that count as media when locating a release on disk.
    fn extensions(&self) -> &'static [&'static str];

    fn api(&self) -> &dyn ManagerApi;

    fn fetch_candidates(&self) -> Result<Vec<Self::Candidate>, Error>;

    fn resolve(
        &self,
        release: &str,
        candidates: &[Self::Candidate],
    ) -> Result<Resolution<Self::Target>, Error>;

    fn label(&self, target: &Self::Target) -> String;

    fn is_satisfied(&self, target: &Self::Target) -> bool;

    /// Whether a located directory can hold the target. Rejected directories count as
    /// not found.
    fn accepts_location(&self, _target: &Self::Target, _dir: &Path) -> bool {
        true
    }

    /// Cooldown key and search command used when the media is missing on disk.
    fn acquisition(&self, target: &Self::Target) -> (CooldownKey, Command);

    /// Links the media found in `dir` to the target. Returns how many files were linked.
    fn register(&self, target: &Self::Target, release: &str, dir: &Path) -> Result<usize, Error>;

    fn refresh_command(&self, target: &Self::Target) -> Command;

    fn file_records(&self) -> Result<Vec<FileRecord>, Error>;

    fn remove_file_record(&self, record: &FileRecord) -> Result<StaleRemoval, Error>;
}

/// What happened to a single release in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Registered(usize),
    Satisfied,
    NoMatch,
    Unparseable,
    /// Media located but nothing in it could be assigned.
    NothingAssigned,
    SearchTriggered,
    CoolingDown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub releases: usize,
    pub registered: usize,
    pub satisfied: usize,
    pub unmatched: usize,
    pub unparseable: usize,
    pub nothing_assigned: usize,
    pub searches: usize,
    pub cooling_down: usize,
    pub failed: usize,
    pub deferred_fired: usize,
}

impl CategoryReport {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Registered(count) => self.registered += count,
            Outcome::Satisfied => self.satisfied += 1,
            Outcome::NoMatch => self.unmatched += 1,
            Outcome::Unparseable => self.unparseable += 1,
            Outcome::NothingAssigned => self.nothing_assigned += 1,
            Outcome::SearchTriggered => self.searches += 1,
            Outcome::CoolingDown => self.cooling_down += 1,
        }
    }
}

/// Object-safe face of a reconciler, driven by the poll engine.
pub trait CategoryReconciler {
    fn name(&self) -> &str;

    /// Runs one pass over the shared history snapshot. Only releases of this category are used.
    fn reconcile(&mut self, releases: &[ReleaseRecord]) -> Result<CategoryReport, Error>;

    fn audit(&mut self) -> Result<AuditReport, Error>;
}

pub struct Reconciler<H: MediaHandler> {
    name: String,
    category: String,
    root: PathBuf,
    handler: H,
    locator: Locator,
    cooldown: CooldownTracker,
    deferred: Vec<(CooldownKey, Command)>,
}

impl<H: MediaHandler> Reconciler<H> {
    pub fn new(
        category: &str,
        root: PathBuf,
        handler: H,
        matching: &MatchingConfig,
        cooldown: Duration,
    ) -> Self {
        let locator = Locator::new(handler.extensions(), MatchOptions::directory(matching));
        Self {
            name: handler.kind().to_string(),
            category: category.to_string(),
            root,
            handler,
            locator,
            cooldown: CooldownTracker::new(cooldown),
            deferred: Vec::new(),
        }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    pub fn deferred(&self) -> &[(CooldownKey, Command)] {
        &self.deferred
    }

    /// Releases of this category, first occurrence of each job name only.
    fn releases_for_category<'a>(&self, releases: &'a [ReleaseRecord]) -> Vec<&'a ReleaseRecord> {
        let mut seen = AHashSet::new();
        releases
            .iter()
            .filter(|release| release.category.eq_ignore_ascii_case(&self.category))
            .filter(|release| seen.insert(release.job_name.clone()))
            .collect()
    }

    /// Fires searches queued by the previous audit, still subject to cooldown.
    /// Failed searches stay queued for the next pass.
    fn fire_deferred(&mut self) -> usize {
        let mut fired = 0;
        let mut retry = Vec::new();
        for (key, command) in std::mem::take(&mut self.deferred) {
            if !self.cooldown.should_trigger(&key) {
                debug!("[{}] Deferred {} still cooling down", self.name, command);
                continue;
            }
            match self.handler.api().execute(&command) {
                Ok(()) => {
                    info!("[{}] Fired deferred {}", self.name, command);
                    self.cooldown.record(key);
                    fired += 1;
                }
                Err(err) => {
                    error!("[{}] Deferred {} failed, retrying next pass: {}", self.name, command, err);
                    retry.push((key, command));
                }
            }
        }
        self.deferred.extend(retry);
        fired
    }

    fn trigger_search(&mut self, target: &H::Target, label: &str) -> Result<Outcome, Error> {
        let (key, command) = self.handler.acquisition(target);
        if !self.cooldown.should_trigger(&key) {
            debug!("[{}] {} missing on disk, search cooling down", self.name, label);
            return Ok(Outcome::CoolingDown);
        }
        info!("[{}] {} missing on disk, triggering {}", self.name, label, command.name());
        self.handler.api().execute(&command)?;
        self.cooldown.record(key);
        Ok(Outcome::SearchTriggered)
    }

    fn process_release(
        &mut self,
        release: &ReleaseRecord,
        candidates: &[H::Candidate],
    ) -> Result<Outcome, Error> {
        let job = release.job_name.as_str();
        let target = match self.handler.resolve(job, candidates)? {
            Resolution::Matched(target) => target,
            Resolution::NoMatch => {
                info!("[{}] No catalog match for '{}'", self.name, job);
                return Ok(Outcome::NoMatch);
            }
            Resolution::Unparseable => {
                info!("[{}] Cannot parse episode or season from '{}'", self.name, job);
                return Ok(Outcome::Unparseable);
            }
        };

        let label = self.handler.label(&target);
        if self.handler.is_satisfied(&target) {
            debug!("[{}] {} already has media", self.name, label);
            return Ok(Outcome::Satisfied);
        }

        let located = self.locator.locate(job, &self.root).filter(|dir| {
            let accepted = self.handler.accepts_location(&target, dir);
            if !accepted {
                debug!("[{}] {} does not hold {}", self.name, dir.display(), label);
            }
            accepted
        });
        let dir = match located {
            Some(dir) => dir,
            None => return self.trigger_search(&target, &label),
        };

        info!("[{}] '{}' -> {} at {}", self.name, job, label, dir.display());
        let linked = self.handler.register(&target, job, &dir)?;
        if linked == 0 {
            warn!("[{}] Media for {} found in {} but nothing could be linked", self.name, label, dir.display());
            return Ok(Outcome::NothingAssigned);
        }

        match self.handler.api().remove_queue_entries(job) {
            Ok(0) => {}
            Ok(removed) => debug!("[{}] Removed {} queue entries for '{}'", self.name, removed, job),
            Err(err) => warn!("[{}] Queue cleanup for '{}' failed: {}", self.name, job, err),
        }
        self.handler.api().execute(&self.handler.refresh_command(&target))?;
        Ok(Outcome::Registered(linked))
    }
}

impl<H: MediaHandler> CategoryReconciler for Reconciler<H> {
    fn name(&self) -> &str {
        &self.name
    }

    fn reconcile(&mut self, releases: &[ReleaseRecord]) -> Result<CategoryReport, Error> {
        let mut report = CategoryReport::new(&self.category);
        report.deferred_fired = self.fire_deferred();

        let releases = self.releases_for_category(releases);
        report.releases = releases.len();
        if releases.is_empty() {
            return Ok(report);
        }

        let candidates = self.handler.fetch_candidates()?;
        debug!("[{}] {} releases against {} catalog entries", self.name, releases.len(), candidates.len());

        for release in releases {
            match self.process_release(release, &candidates) {
                Ok(outcome) => report.record(outcome),
                Err(err) => {
                    error!("[{}] Failed on '{}': {}", self.name, release.job_name, err);
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    fn audit(&mut self) -> Result<AuditReport, Error> {
        self.sweep_stale_records()
    }
}
