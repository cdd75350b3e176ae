mod support;

use mediarecon_core::catalog::Command;
use mediarecon_core::config::MatchingConfig;
use mediarecon_core::reconcile::MovieHandler;
use mediarecon_core::{PollEngine, Reconciler, SchedulerState};
use std::path::Path;
use std::rc::Rc;
use std::time::{Duration, Instant};
use support::*;
use tempfile::tempdir;

const POLL: Duration = Duration::from_secs(300);
const AUDIT: Duration = Duration::from_secs(3600);

fn movie_reconciler(
    category: &str,
    root: &Path,
    radarr: &Rc<FakeRadarr>,
) -> Box<Reconciler<MovieHandler<Rc<FakeRadarr>>>> {
    let matching = MatchingConfig::default();
    let handler = MovieHandler::new(Rc::clone(radarr), &matching);
    Box::new(Reconciler::new(
        category,
        root.to_path_buf(),
        handler,
        &matching,
        Duration::from_secs(3600),
    ))
}

#[test]
fn test_history_fetched_once_per_cycle() {
    let root = tempdir().unwrap();
    let history = Rc::new(FakeHistory::with(vec![
        release("Movie.Title.2023-GRP", "movies"),
        release("Other.Film.2021-GRP", "films"),
    ]));
    let first = Rc::new(FakeRadarr::default());
    let second = Rc::new(FakeRadarr::default());

    let mut engine = PollEngine::new(Box::new(Rc::clone(&history)), POLL, AUDIT);
    engine.add(movie_reconciler("movies", root.path(), &first));
    engine.add(movie_reconciler("films", root.path(), &second));

    let report = engine.run_cycle();
    assert_eq!(history.calls.get(), 1);
    assert_eq!(report.releases, 2);
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].releases, 1);
    assert_eq!(report.categories[1].releases, 1);
    assert_eq!(engine.state(), SchedulerState::Idle);
}

#[test]
fn test_failing_category_does_not_stop_others() {
    let root = tempdir().unwrap();
    touch(&root.path().join("Other.Film.2021.1080p-GRP").join("film.mkv"), 100);

    let history = Rc::new(FakeHistory::with(vec![
        release("Movie.Title.2023.1080p-GRP", "movies"),
        release("Other.Film.2021.1080p-GRP", "films"),
    ]));
    let broken = Rc::new(FakeRadarr::default());
    broken.fail_listing.set(true);
    let working = Rc::new(FakeRadarr::with(vec![movie(9, "Other Film", 2021, "")]));

    let mut engine = PollEngine::new(Box::new(Rc::clone(&history)), POLL, AUDIT);
    engine.add(movie_reconciler("movies", root.path(), &broken));
    engine.add(movie_reconciler("films", root.path(), &working));

    let report = engine.run_cycle();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.categories.len(), 1);
    assert_eq!(report.categories[0].category, "films");
    assert_eq!(report.categories[0].registered, 1);
    assert_eq!(working.api.sent(), vec![Command::RefreshMovie(9)]);
}

#[test]
fn test_audit_runs_first_cycle_then_on_interval() {
    let root = tempdir().unwrap();
    let history = Rc::new(FakeHistory::default());
    let radarr = Rc::new(FakeRadarr::default());

    let mut engine = PollEngine::new(Box::new(Rc::clone(&history)), POLL, AUDIT);
    engine.add(movie_reconciler("movies", root.path(), &radarr));

    let start = Instant::now();
    assert!(engine.audit_due_at(start));
    assert!(engine.run_cycle_at(start).audited());
    assert!(!engine.run_cycle_at(start + POLL).audited());
    assert!(!engine.audit_due_at(start + Duration::from_secs(3599)));
    assert!(engine.run_cycle_at(start + AUDIT).audited());
}

#[test]
fn test_history_failure_still_fires_deferred_searches() {
    let root = tempdir().unwrap();
    touch(&root.path().join("Other (2020)").join("other.mkv"), 10);
    let gone = root.path().join("Gone Movie (2019)").join("gone.mkv");

    let history = Rc::new(FakeHistory::default());
    history.fail.set(true);
    let radarr = Rc::new(FakeRadarr::with(vec![movie_with_file(2, "Gone Movie", 502, &gone)]));

    let mut engine = PollEngine::new(Box::new(Rc::clone(&history)), POLL, AUDIT);
    engine.add(movie_reconciler("movies", root.path(), &radarr));

    let start = Instant::now();
    let first = engine.run_cycle_at(start);
    assert!(first.history_failed);
    assert_eq!(first.releases, 0);
    assert_eq!(first.audits[0].removed, 1);
    assert!(radarr.api.searches().is_empty());

    let second = engine.run_cycle_at(start + POLL);
    assert!(second.history_failed);
    assert_eq!(second.categories[0].deferred_fired, 1);
    assert_eq!(radarr.api.searches(), vec![Command::MoviesSearch(2)]);
}

#[test]
fn test_audit_all_ignores_interval() {
    let root = tempdir().unwrap();
    let history = Rc::new(FakeHistory::default());
    let radarr = Rc::new(FakeRadarr::default());

    let mut engine = PollEngine::new(Box::new(Rc::clone(&history)), POLL, AUDIT);
    engine.add(movie_reconciler("movies", root.path(), &radarr));
    engine.run_cycle();

    let audits = engine.audit_all();
    assert_eq!(audits.len(), 1);
    assert!(audits[0].skipped);
    assert_eq!(history.calls.get(), 1);
}
