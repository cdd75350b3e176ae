use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov"];
/// Broader audio set used by the music reconciler.
pub const MUSIC_EXTENSIONS: &[&str] = &["flac", "mp3", "m4a", "aac", "ogg", "wav"];

/// How far below a release directory media files are looked for (`CD1/`, `Season 1/`, ...).
pub const MAX_MEDIA_DEPTH: usize = 4;

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .map_or(false, |ext| extensions.contains(&ext.as_str()))
}

/// Sample clips ship alongside many video releases and must never be registered.
pub fn is_sample(path: &Path) -> bool {
    let in_sample_dir = path
        .parent()
        .and_then(|parent| parent.file_name())
        .map_or(false, |name| name.to_string_lossy().eq_ignore_ascii_case("sample"));
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    in_sample_dir || stem == "sample" || stem.ends_with("-sample") || stem.ends_with(".sample")
}

/// Media files below `dir`, sorted by path. Unreadable entries are logged and skipped.
pub fn list_media_files(dir: &Path, extensions: &[&str]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(MAX_MEDIA_DEPTH)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Error reading entry under {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_extension(path, extensions))
        .collect();
    files.sort();
    files
}

/// Whether `dir` holds at least one non-sample media file, stopping at the first hit.
pub fn contains_media(dir: &Path, extensions: &[&str]) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(MAX_MEDIA_DEPTH)
        .into_iter()
        .filter_map(Result::ok)
        .any(|entry| {
            entry.file_type().is_file()
                && has_extension(entry.path(), extensions)
                && !is_sample(entry.path())
        })
}
