//! Quality descriptors written into the managers' file tables.
//!
//! The managers identify qualities by numeric id. Video quality is inferred from the source
//! and resolution tags of the release; anything unrecognised falls back to WEBDL-1080p.

use regex::Regex;
use serde_json::json;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality {
    pub id: i32,
    pub name: &'static str,
}

impl Quality {
    pub const fn new(id: i32, name: &'static str) -> Self {
        Self { id, name }
    }

    /// Serialized `QualityModel` as stored in the managers' `Quality` columns.
    pub fn to_json(&self) -> String {
        json!({
            "quality": { "id": self.id, "name": self.name },
            "revision": { "version": 1, "real": 0, "isRepack": false }
        })
        .to_string()
    }
}

pub const SDTV: Quality = Quality::new(1, "SDTV");
pub const DVD: Quality = Quality::new(2, "DVD");
pub const WEBDL_1080P: Quality = Quality::new(3, "WEBDL-1080p");
pub const HDTV_720P: Quality = Quality::new(4, "HDTV-720p");
pub const WEBDL_720P: Quality = Quality::new(5, "WEBDL-720p");
pub const BLURAY_720P: Quality = Quality::new(6, "Bluray-720p");
pub const BLURAY_1080P: Quality = Quality::new(7, "Bluray-1080p");
pub const WEBDL_480P: Quality = Quality::new(8, "WEBDL-480p");
pub const HDTV_1080P: Quality = Quality::new(9, "HDTV-1080p");
pub const HDTV_2160P: Quality = Quality::new(16, "HDTV-2160p");
pub const WEBDL_2160P: Quality = Quality::new(18, "WEBDL-2160p");
pub const BLURAY_2160P: Quality = Quality::new(19, "Bluray-2160p");

pub const MP3_320: Quality = Quality::new(4, "MP3-320");
pub const FLAC: Quality = Quality::new(6, "FLAC");
pub const ALAC: Quality = Quality::new(7, "ALAC");
pub const AAC_320: Quality = Quality::new(11, "AAC-320");
pub const WAV: Quality = Quality::new(13, "WAV");
pub const VORBIS_Q10: Quality = Quality::new(14, "OGG Vorbis Q10");
pub const FLAC_24: Quality = Quality::new(21, "FLAC 24bit");
pub const UNKNOWN_AUDIO: Quality = Quality::new(0, "Unknown");

/// Language column for registered episode files.
pub const DEFAULT_LANGUAGES_JSON: &str = r#"[{"id":1,"name":"English"}]"#;

lazy_static::lazy_static! {
    static ref RESOLUTION_TAG: Regex = Regex::new(r"(?i)(?:^|[^0-9])(480|576|720|1080|2160)[pi]").unwrap();
    static ref UHD_TAG: Regex = Regex::new(r"(?i)(?:^|[^a-z0-9])(?:4k|uhd)(?:[^a-z0-9]|$)").unwrap();
    static ref BLURAY_TAG: Regex = Regex::new(r"(?i)blu[ ._-]?ray|bdrip|brrip|bdremux|remux").unwrap();
    static ref HDTV_TAG: Regex = Regex::new(r"(?i)hdtv").unwrap();
    static ref RELEASE_GROUP: Regex = Regex::new(r"-([A-Za-z0-9]+)(?:\[[^\]]*\])?$").unwrap();
}

enum Source {
    Web,
    Bluray,
    Television,
}

fn resolution(text: &str) -> Option<u32> {
    if let Some(caps) = RESOLUTION_TAG.captures(text) {
        return caps.get(1).and_then(|m| m.as_str().parse().ok());
    }
    UHD_TAG.is_match(text).then_some(2160)
}

/// Video quality from the release name, falling back to the file name for missing tags.
pub fn video_quality(release: &str, file_name: &str) -> Quality {
    let source = if BLURAY_TAG.is_match(release) || BLURAY_TAG.is_match(file_name) {
        Source::Bluray
    } else if HDTV_TAG.is_match(release) || HDTV_TAG.is_match(file_name) {
        Source::Television
    } else {
        Source::Web
    };

    match (source, resolution(release).or_else(|| resolution(file_name))) {
        (Source::Web, Some(2160)) => WEBDL_2160P,
        (Source::Web, Some(720)) => WEBDL_720P,
        (Source::Web, Some(480 | 576)) => WEBDL_480P,
        (Source::Web, _) => WEBDL_1080P,
        (Source::Bluray, Some(2160)) => BLURAY_2160P,
        (Source::Bluray, Some(720)) => BLURAY_720P,
        (Source::Bluray, Some(480 | 576)) => DVD,
        (Source::Bluray, _) => BLURAY_1080P,
        (Source::Television, Some(2160)) => HDTV_2160P,
        (Source::Television, Some(1080)) => HDTV_1080P,
        (Source::Television, Some(720)) => HDTV_720P,
        (Source::Television, _) => SDTV,
    }
}

/// Audio quality tier from the extension; lossless FLAC is promoted by a `24bit` marker.
pub fn audio_quality(path: &Path) -> Quality {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let name = path.to_string_lossy().to_lowercase();

    match extension.as_str() {
        "flac" if name.contains("24bit") || name.contains("24-bit") => FLAC_24,
        "flac" => FLAC,
        "wav" => WAV,
        "m4a" if name.contains("alac") => ALAC,
        "m4a" | "aac" => AAC_320,
        "mp3" => MP3_320,
        "ogg" => VORBIS_Q10,
        _ => UNKNOWN_AUDIO,
    }
}

/// Trailing `-GROUP` of a release name.
pub fn release_group(release: &str) -> Option<String> {
    let caps = RELEASE_GROUP.captures(release.trim())?;
    let group = caps.get(1)?.as_str();
    if group.chars().all(|c| c.is_ascii_digit()) || resolution(group).is_some() {
        return None;
    }
    Some(group.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_quality() {
        assert_eq!(video_quality("Show.S01E01.1080p.WEB-DL-GRP", "x.mkv"), WEBDL_1080P);
        assert_eq!(video_quality("Show.S01E01.2160p.WEB.H265-GRP", "x.mkv"), WEBDL_2160P);
        assert_eq!(video_quality("Show.S01.720p.BluRay.x264-GRP", "x.mkv"), BLURAY_720P);
        assert_eq!(video_quality("Show.S01E01.HDTV.x264-GRP", "x.mkv"), SDTV);
        assert_eq!(video_quality("Show.S01", "Show.S01E01.720p.WEB.mkv"), WEBDL_720P);
        assert_eq!(video_quality("Show", "episode.mkv"), WEBDL_1080P);
    }

    #[test]
    fn test_audio_quality() {
        assert_eq!(audio_quality(Path::new("/a/01 - x.flac")), FLAC);
        assert_eq!(audio_quality(Path::new("/a [24bit]/01 - x.flac")), FLAC_24);
        assert_eq!(audio_quality(Path::new("/a/01 - x.MP3")), MP3_320);
        assert_eq!(audio_quality(Path::new("/a/01 - x.m4a")), AAC_320);
        assert_eq!(audio_quality(Path::new("/a/01 - x.wav")), WAV);
    }

    #[test]
    fn test_release_group() {
        assert_eq!(release_group("Movie.Title.2023.1080p.WEBDL-LAMA"), Some("LAMA".to_string()));
        assert_eq!(release_group("Show.S01E01.720p-GRP[rarbg]"), Some("GRP".to_string()));
        assert_eq!(release_group("Movie Title 2023"), None);
        assert_eq!(release_group("Movie.Title-2023"), None);
    }

    #[test]
    fn test_quality_json() {
        let value: serde_json::Value = serde_json::from_str(&WEBDL_1080P.to_json()).unwrap();
        assert_eq!(value["quality"]["id"], 3);
        assert_eq!(value["revision"]["version"], 1);
    }
}
