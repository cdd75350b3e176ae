use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::walk::contains_media;
use crate::matching::{compact, rank_matches, MatchOptions};

lazy_static::lazy_static! {
    static ref DUPLICATE_SUFFIX: Regex = Regex::new(r"^(.*) \(([0-9]+)\)$").unwrap();
}

/// Resolves the directory under a library root that actually holds a release's media.
#[derive(Debug, Clone)]
pub struct Locator {
    extensions: &'static [&'static str],
    options: MatchOptions,
}

/// Splits `"Name (3)"` into `("Name", 3)`. Only retry markers (N >= 2) count.
pub fn split_duplicate_suffix(name: &str) -> Option<(&str, u32)> {
    let caps = DUPLICATE_SUFFIX.captures(name)?;
    let base = caps.get(1)?.as_str();
    let version: u32 = caps.get(2)?.as_str().parse().ok()?;
    (version >= 2).then_some((base, version))
}

fn list_subdirectories(root: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) || entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

impl Locator {
    pub fn new(extensions: &'static [&'static str], options: MatchOptions) -> Self {
        Self {
            extensions,
            options,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        self.extensions
    }

    /// Exact normalized name, then the newest numbered retry, then the best fuzzy match.
    /// Each step only accepts directories that contain media.
    pub fn locate(&self, release: &str, root: &Path) -> Option<PathBuf> {
        let dirs = match list_subdirectories(root) {
            Ok(dirs) => dirs,
            Err(err) => {
                warn!("Cannot list library root {}: {}", root.display(), err);
                return None;
            }
        };

        let wanted = compact(release);
        if wanted.is_empty() {
            return None;
        }

        if let Some(found) = self.exact(root, &dirs, &wanted) {
            return Some(found);
        }
        if let Some(found) = self.newest_duplicate(root, &dirs, &wanted) {
            return Some(found);
        }
        self.fuzzy(release, root, &dirs)
    }

    fn exact(&self, root: &Path, dirs: &[String], wanted: &str) -> Option<PathBuf> {
        dirs.iter()
            .filter(|name| compact(name) == wanted)
            .find_map(|name| {
                let path = root.join(name);
                if contains_media(&path, self.extensions) {
                    debug!("Exact directory match {}", path.display());
                    Some(path)
                } else {
                    debug!("Exact directory {} has no media", path.display());
                    None
                }
            })
    }

    fn newest_duplicate(&self, root: &Path, dirs: &[String], wanted: &str) -> Option<PathBuf> {
        let mut duplicates: Vec<(u32, &String)> = dirs
            .iter()
            .filter_map(|name| {
                split_duplicate_suffix(name)
                    .filter(|(base, _)| compact(base) == wanted)
                    .map(|(_, version)| (version, name))
            })
            .collect();
        duplicates.sort_by(|a, b| b.0.cmp(&a.0));

        duplicates.into_iter().find_map(|(version, name)| {
            let path = root.join(name);
            if contains_media(&path, self.extensions) {
                info!("Using retry directory {} (version {})", path.display(), version);
                Some(path)
            } else {
                debug!("Retry directory {} has no media", path.display());
                None
            }
        })
    }

    fn fuzzy(&self, release: &str, root: &Path, dirs: &[String]) -> Option<PathBuf> {
        let ranked = rank_matches(release, None, dirs, |name| name.as_str(), |_| None, &self.options);
        ranked.into_iter().find_map(|scored| {
            let path = root.join(scored.candidate);
            if contains_media(&path, self.extensions) {
                info!(
                    "Fuzzy directory match {} (score {:.2}) for '{}'",
                    path.display(),
                    scored.score,
                    release
                );
                Some(path)
            } else {
                None
            }
        })
    }
}
