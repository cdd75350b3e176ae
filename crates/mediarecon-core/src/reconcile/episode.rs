use ahash::AHashSet;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::{MediaHandler, Resolution, StaleRemoval};
use crate::catalog::{
    Command, Episode, EpisodeFileStore, FileRecord, ManagerApi, MediaKind, NewEpisodeFile, Series,
    SeriesCatalog, UnlinkedEpisode,
};
use crate::config::MatchingConfig;
use crate::cooldown::CooldownKey;
use crate::error::Error;
use crate::matching::{best_match, MatchOptions};
use crate::parse::{classify_release, parse_episode, ReleaseShape};
use crate::quality::{release_group, video_quality};
use crate::scanner::walk::{is_sample, list_media_files, VIDEO_EXTENSIONS};

/// A matched series plus the episodes the release is meant to fill.
#[derive(Debug, Clone)]
pub struct EpisodeTarget {
    pub series: Series,
    pub shape: ReleaseShape,
    pub season: u32,
    /// The numbered episodes for a single release; the whole season for a pack.
    pub episodes: Vec<Episode>,
}

impl EpisodeTarget {
    pub fn is_season_pack(&self) -> bool {
        matches!(self.shape, ReleaseShape::SeasonPack { .. })
    }
}

pub struct EpisodeHandler<C: SeriesCatalog, S: EpisodeFileStore> {
    catalog: C,
    store: S,
    options: MatchOptions,
}

impl<C: SeriesCatalog, S: EpisodeFileStore> EpisodeHandler<C, S> {
    pub fn new(catalog: C, store: S, matching: &MatchingConfig) -> Self {
        Self {
            catalog,
            store,
            options: MatchOptions::entity(matching),
        }
    }

    fn register_file(
        &self,
        target: &EpisodeTarget,
        scene_name: &str,
        release: &str,
        file: &Path,
        episode_ids: Vec<i64>,
    ) -> Result<i64, Error> {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let new_file = NewEpisodeFile {
            series_id: target.series.id,
            season_number: target.season,
            relative_path: relative_path(&target.series.path, file),
            size: fs::metadata(file)?.len() as i64,
            quality: video_quality(release, &file_name),
            scene_name: scene_name.to_string(),
            release_group: release_group(release),
            episode_ids,
        };
        let id = self.store.register_episode_file(&new_file)?;
        info!(
            "Registered {} as episode file {} for {} episode(s)",
            new_file.relative_path,
            id,
            new_file.episode_ids.len()
        );
        Ok(id)
    }

    fn register_single(&self, target: &EpisodeTarget, release: &str, dir: &Path) -> Result<usize, Error> {
        let files: Vec<PathBuf> = list_media_files(dir, VIDEO_EXTENSIONS)
            .into_iter()
            .filter(|path| !is_sample(path))
            .collect();
        // Files named for the target win; unnumbered files are the fallback.
        let named: Vec<&PathBuf> = files
            .iter()
            .filter(|path| names_target(target, &file_stem(path)) == Some(true))
            .collect();
        let pool = if named.is_empty() {
            files.iter().filter(|path| names_target(target, &file_stem(path)).is_none()).collect()
        } else {
            named
        };
        let largest = pool
            .into_iter()
            .max_by_key(|path| fs::metadata(path).map(|meta| meta.len()).unwrap_or(0));
        let file = match largest {
            Some(file) => file,
            None => return Ok(0),
        };
        let ids = target.episodes.iter().map(|episode| episode.id).collect();
        self.register_file(target, release, release, file, ids)?;
        Ok(1)
    }

    fn register_pack(&self, target: &EpisodeTarget, release: &str, dir: &Path) -> Result<usize, Error> {
        let mut linked = 0;
        let mut claimed = AHashSet::new();

        for file in list_media_files(dir, VIDEO_EXTENSIONS).into_iter().filter(|path| !is_sample(path)) {
            let stem = file_stem(&file);
            let number = match parse_episode(&stem) {
                Some(number) => number,
                None => {
                    debug!("No episode number in {}", file.display());
                    continue;
                }
            };
            if number.season.map_or(false, |season| season != target.season) {
                debug!("{} belongs to another season", file.display());
                continue;
            }

            let ids: Vec<i64> = number
                .episodes
                .iter()
                .filter_map(|wanted| {
                    target
                        .episodes
                        .iter()
                        .find(|episode| episode.episode_number == *wanted && !episode.has_file)
                })
                .map(|episode| episode.id)
                .filter(|id| claimed.insert(*id))
                .collect();
            if ids.is_empty() {
                debug!("No unfilled catalog episode for {}", file.display());
                continue;
            }

            match self.register_file(target, &stem, release, &file, ids) {
                Ok(_) => linked += 1,
                Err(err) => error!("Registering {} failed: {}", file.display(), err),
            }
        }
        Ok(linked)
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// `None` when the name carries no episode number, otherwise whether it names one of the
/// target's episodes in the target's season.
fn names_target(target: &EpisodeTarget, name: &str) -> Option<bool> {
    let number = parse_episode(name)?;
    Some(
        number.season_or_default() == target.season
            && number
                .episodes
                .iter()
                .any(|wanted| target.episodes.iter().any(|episode| episode.episode_number == *wanted)),
    )
}

/// Path relative to the series folder when the file lives under it, absolute otherwise.
fn relative_path(series_path: &str, file: &Path) -> String {
    if !series_path.is_empty() {
        if let Ok(relative) = file.strip_prefix(series_path) {
            return relative.to_string_lossy().into_owned();
        }
    }
    file.to_string_lossy().into_owned()
}

/// Several episodes of one season go out as a season search, a lone one as an episode search.
fn searches_for(series_id: i64, unlinked: &[UnlinkedEpisode]) -> Vec<(CooldownKey, Command)> {
    let mut by_season: BTreeMap<u32, Vec<&UnlinkedEpisode>> = BTreeMap::new();
    for episode in unlinked {
        by_season.entry(episode.season_number).or_default().push(episode);
    }
    by_season
        .into_iter()
        .map(|(season, episodes)| match episodes.as_slice() {
            [episode] => (
                CooldownKey::episode(series_id, season, episode.episode_number),
                Command::EpisodeSearch(vec![episode.id]),
            ),
            _ => (
                CooldownKey::season(series_id, season),
                Command::SeasonSearch { series_id, season },
            ),
        })
        .collect()
}

impl<C: SeriesCatalog, S: EpisodeFileStore> MediaHandler for EpisodeHandler<C, S> {
    type Candidate = Series;
    type Target = EpisodeTarget;

    fn kind(&self) -> MediaKind {
        MediaKind::Episode
    }

    fn extensions(&self) -> &'static [&'static str] {
        VIDEO_EXTENSIONS
    }

    fn api(&self) -> &dyn ManagerApi {
        &self.catalog
    }

    fn fetch_candidates(&self) -> Result<Vec<Series>, Error> {
        self.catalog.series()
    }

    fn resolve(&self, release: &str, candidates: &[Series]) -> Result<Resolution<EpisodeTarget>, Error> {
        let shape = match classify_release(release) {
            Some(shape) => shape,
            None => return Ok(Resolution::Unparseable),
        };
        let series = match best_match(
            release,
            None,
            candidates,
            |series| series.title.as_str(),
            |series| series.year.filter(|year| *year > 0),
            &self.options,
        ) {
            Some(scored) => scored.candidate.clone(),
            None => return Ok(Resolution::NoMatch),
        };

        let season = match &shape {
            ReleaseShape::Episode(number) => number.season_or_default(),
            ReleaseShape::SeasonPack { season } => *season,
        };
        let episodes: Vec<Episode> = self
            .catalog
            .episodes(series.id)?
            .into_iter()
            .filter(|episode| episode.season_number == season)
            .filter(|episode| match &shape {
                ReleaseShape::Episode(number) => number.episodes.contains(&episode.episode_number),
                ReleaseShape::SeasonPack { .. } => true,
            })
            .collect();

        if episodes.is_empty() {
            info!("'{}' matched '{}' but season {} has no such episodes", release, series.title, season);
            return Ok(Resolution::NoMatch);
        }
        Ok(Resolution::Matched(EpisodeTarget {
            series,
            shape,
            season,
            episodes,
        }))
    }

    fn label(&self, target: &EpisodeTarget) -> String {
        match &target.shape {
            ReleaseShape::Episode(number) => {
                let episodes: Vec<String> = number.episodes.iter().map(|e| format!("E{:02}", e)).collect();
                format!("'{}' S{:02}{}", target.series.title, target.season, episodes.join(""))
            }
            ReleaseShape::SeasonPack { .. } => format!("'{}' season {}", target.series.title, target.season),
        }
    }

    fn is_satisfied(&self, target: &EpisodeTarget) -> bool {
        target.episodes.iter().all(|episode| episode.has_file)
    }

    /// Fuzzy directory matching ignores episode markers, so a directory named for another
    /// episode or season of the same show is turned away here.
    fn accepts_location(&self, target: &EpisodeTarget, dir: &Path) -> bool {
        let name = match dir.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return false,
        };
        match classify_release(&name) {
            Some(ReleaseShape::SeasonPack { season }) => season == target.season,
            Some(ReleaseShape::Episode(_)) if target.is_season_pack() => false,
            Some(ReleaseShape::Episode(_)) => names_target(target, &name).unwrap_or(true),
            None => true,
        }
    }

    fn acquisition(&self, target: &EpisodeTarget) -> (CooldownKey, Command) {
        let series_id = target.series.id;
        match &target.shape {
            ReleaseShape::SeasonPack { season } => (
                CooldownKey::season(series_id, *season),
                Command::SeasonSearch {
                    series_id,
                    season: *season,
                },
            ),
            ReleaseShape::Episode(number) => {
                let first = number.episodes.first().copied().unwrap_or_default();
                (
                    CooldownKey::episode(series_id, target.season, first),
                    Command::EpisodeSearch(target.episodes.iter().map(|episode| episode.id).collect()),
                )
            }
        }
    }

    fn register(&self, target: &EpisodeTarget, release: &str, dir: &Path) -> Result<usize, Error> {
        if target.is_season_pack() {
            self.register_pack(target, release, dir)
        } else {
            self.register_single(target, release, dir)
        }
    }

    fn refresh_command(&self, target: &EpisodeTarget) -> Command {
        Command::RefreshSeries(target.series.id)
    }

    fn file_records(&self) -> Result<Vec<FileRecord>, Error> {
        self.store.episode_files()
    }

    fn remove_file_record(&self, record: &FileRecord) -> Result<StaleRemoval, Error> {
        let unlinked = self.store.remove_episode_file(record.id)?;
        Ok(StaleRemoval {
            refresh: Some(Command::RefreshSeries(record.owner_id)),
            searches: searches_for(record.owner_id, &unlinked),
        })
    }
}
