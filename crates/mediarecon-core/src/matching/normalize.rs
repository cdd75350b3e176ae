use regex::Regex;

lazy_static::lazy_static! {
    static ref YEAR: Regex = Regex::new(r"(?:^|[^0-9])((?:19|20)[0-9]{2})(?:[^0-9]|$)").unwrap();
    static ref EPISODE_MARKER: Regex = Regex::new(r"(?i)s[0-9]{1,2}e[0-9]{1,3}(?:-?e[0-9]{1,3})*").unwrap();
    /// Applied after separators become spaces, so `_` does not hide the word boundary.
    static ref RESOLUTION: Regex = Regex::new(r"(?i)\b(?:480|720|1080|2160)[pi]?\b").unwrap();
    /// Noise tokens that span separators and would otherwise split into stray words.
    static ref COMPOSITE_NOISE: Regex = Regex::new(
        r"(?i)\b(?:web[ ._-]?dl|web[ ._-]?rip|blu[ ._-]?ray|[hx][ .]?26[45]|dd[p+]?[ .]?[257][ .][01]|aac[ .]?[257][ .][01]|[257][ .][01]|directors[ ._-]cut|director'?s[ ._-]cut|extended[ ._-]cut|final[ ._-]cut|special[ ._-]edition)\b"
    )
    .unwrap();
    static ref SEPARATORS: Regex = Regex::new(r"[._\-]+").unwrap();
    static ref NON_ALNUM: Regex = Regex::new(r"[^a-z0-9 ]+").unwrap();
}

/// Video/audio codecs, containers, sources.
const CODEC_TOKENS: &[&str] = &[
    "x264", "x265", "h264", "h265", "hevc", "avc", "xvid", "divx", "av1", "vp9", "aac", "ac3",
    "eac3", "dts", "dtshd", "dd", "ddp", "truehd", "atmos", "flac", "mp3", "opus", "mkv", "mp4",
    "avi", "mov", "web", "webdl", "webrip", "bluray", "bdrip", "brrip", "hdrip", "dvdrip",
    "hdtv", "remux", "hdr", "hdr10", "dv", "dovi", "10bit", "8bit", "sdr", "uhd", "amzn",
    "nf", "dsnp", "hmax", "atvp", "pcm", "lpcm", "320", "v0", "cbr", "vbr", "24bit", "16bit",
];

/// Release groups that show up in the wild often enough to poison the word overlap.
const RELEASE_GROUPS: &[&str] = &[
    "lama", "yts", "yify", "rarbg", "ntb", "flux", "cmrg", "tgx", "evo", "fgt", "sparks",
    "geckos", "ion10", "megusta", "psa", "qxr", "tepes", "edith", "successfulcrab", "ntg",
    "playweb", "smurf", "kogi", "nogrp", "epsilon", "cakes", "mzabi", "btn", "tommy", "dimension",
    "killers", "lol", "asap", "amiable", "drones", "blow", "galaxyrg", "mkvcage", "etrg",
];

/// Edition and cut tags.
const EDITION_TOKENS: &[&str] = &[
    "repack", "proper", "extended", "unrated", "uncut", "remastered", "limited", "internal",
    "theatrical", "imax", "criterion", "complete", "rerip", "real", "readnfo", "dubbed",
    "subbed", "multi", "dual",
];

/// Significant words of a release or title, plus the year found in the original text.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Normalized {
    pub words: Vec<String>,
    pub year: Option<i32>,
}

pub fn normalize(text: &str) -> Normalized {
    Normalized {
        words: significant_words(text),
        year: extract_year(text),
    }
}

/// First 1900-2099 year in `text` that is not part of a longer digit run.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn significant_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let without_episodes = EPISODE_MARKER.replace_all(&lowered, " ");
    let without_composites = COMPOSITE_NOISE.replace_all(&without_episodes, " ");
    let spaced = SEPARATORS.replace_all(&without_composites, " ");
    let without_resolutions = RESOLUTION.replace_all(&spaced, " ");
    let cleaned = NON_ALNUM.replace_all(&without_resolutions, "");

    cleaned
        .split_whitespace()
        .filter(|word| word.len() > 1)
        .filter(|word| !is_year_token(word))
        .filter(|word| !is_noise_token(word))
        .map(str::to_string)
        .collect()
}

/// Lowercase alphanumerics only. Used for exact directory and short-title comparisons.
pub fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_year_token(word: &str) -> bool {
    word.len() == 4
        && word
            .parse::<i32>()
            .map(|year| (1900..=2099).contains(&year))
            .unwrap_or(false)
}

fn is_noise_token(word: &str) -> bool {
    CODEC_TOKENS.contains(&word) || RELEASE_GROUPS.contains(&word) || EDITION_TOKENS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_quality_noise() {
        let normalized = normalize("Movie.Title.2023.1080p.WEBDL-LAMA");
        assert_eq!(normalized.words, vec!["movie", "title"]);
        assert_eq!(normalized.year, Some(2023));
    }

    #[test]
    fn test_strips_composite_codecs() {
        let words = significant_words("The.Long.Walk.2025.2160p.WEB-DL.DDP5.1.Atmos.H.265-FLUX");
        assert_eq!(words, vec!["the", "long", "walk"]);
    }

    #[test]
    fn test_strips_episode_markers_and_editions() {
        let words = significant_words("Some_Show_S02E05_REPACK_720p_HDTV_x264-KILLERS");
        assert_eq!(words, vec!["some", "show"]);
    }

    #[test]
    fn test_directors_cut() {
        let words = significant_words("Blade Runner (Directors Cut) 1982 BluRay");
        assert_eq!(words, vec!["blade", "runner"]);
    }

    #[test]
    fn test_year_extraction_ignores_longer_digit_runs() {
        assert_eq!(extract_year("Release.12023.x264"), None);
        assert_eq!(extract_year("Release.1999.x264"), Some(1999));
        assert_eq!(extract_year("Release 1080p"), None);
        assert_eq!(extract_year("Sequel.2004.Remake.2019"), Some(2004));
        assert_eq!(extract_year("1850 Exhibition"), None);
    }

    #[test]
    fn test_year_every_value_in_range() {
        for year in 1900..=2099 {
            let text = format!("Title.{}.720p", year);
            assert_eq!(extract_year(&text), Some(year));
            assert!(!significant_words(&text).contains(&year.to_string()));
        }
    }

    #[test]
    fn test_noise_tokens_never_survive() {
        for token in CODEC_TOKENS.iter().chain(RELEASE_GROUPS).chain(EDITION_TOKENS) {
            let text = format!("Movie.Title.2020.{}", token.to_uppercase());
            assert_eq!(significant_words(&text), vec!["movie", "title"], "{}", text);
            let text = format!("Movie Title - {}", token);
            assert_eq!(significant_words(&text), vec!["movie", "title"], "{}", text);
        }
    }

    #[test]
    fn test_resolutions_never_survive() {
        let resolutions = ["480", "720", "1080", "2160"];
        for base in resolutions {
            for suffix in ["", "p", "i", "P"] {
                let tag = format!("{}{}", base, suffix);
                for text in [
                    format!("Movie.Title.{}.x264", tag),
                    format!("Movie_Title_{}_HDTV", tag),
                    format!("Movie Title [{}]", tag),
                    format!("Movie-Title-{}", tag),
                ] {
                    assert_eq!(significant_words(&text), vec!["movie", "title"], "{}", text);
                }
                for other in resolutions {
                    let text = format!("Movie.Title.{}.{}{}.x264", tag, other, suffix);
                    assert_eq!(significant_words(&text), vec!["movie", "title"], "{}", text);
                }
            }
        }
    }

    #[test]
    fn test_adjacent_resolution_tags() {
        assert_eq!(significant_words("Movie.Title.720p.1080p.x264"), vec!["movie", "title"]);
        assert_eq!(significant_words("Show.Name.480p.720p-LOL"), vec!["show", "name"]);
    }

    #[test]
    fn test_resolution_inside_word_is_kept() {
        assert_eq!(significant_words("Area.51080p"), vec!["area", "51080p"]);
    }

    #[test]
    fn test_single_characters_dropped() {
        assert_eq!(significant_words("A.Quiet.Place"), vec!["quiet", "place"]);
    }

    #[test]
    fn test_deterministic() {
        let first = normalize("Show.Name.S01.1080p.BluRay.x265-RARBG");
        let _ = normalize("Other.Thing.2020");
        let second = normalize("Show.Name.S01.1080p.BluRay.x265-RARBG");
        assert_eq!(first, second);
    }

    #[test]
    fn test_compact() {
        assert_eq!(compact("Movie.Title (2023)"), "movietitle2023");
        assert_eq!(compact("AC/DC"), "acdc");
    }
}
