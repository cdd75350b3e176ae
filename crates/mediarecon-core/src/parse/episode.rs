use regex::{Captures, Regex};

/// Season and episode numbers parsed from a release or file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeNumber {
    /// `None` for season-less forms such as `E05` or `Episode 5`.
    pub season: Option<u32>,
    /// One entry per episode; multi-episode files carry several.
    pub episodes: Vec<u32>,
}

impl EpisodeNumber {
    pub fn season_or_default(&self) -> u32 {
        self.season.unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseShape {
    Episode(EpisodeNumber),
    SeasonPack { season: u32 },
}

pub struct EpisodePattern {
    pub name: &'static str,
    regex: Regex,
    extract: fn(&Captures) -> Option<EpisodeNumber>,
}

pub struct SeasonPattern {
    pub name: &'static str,
    regex: Regex,
}

impl EpisodePattern {
    pub fn parse(&self, text: &str) -> Option<EpisodeNumber> {
        self.regex.captures(text).and_then(|caps| (self.extract)(&caps))
    }
}

impl SeasonPattern {
    pub fn parse(&self, text: &str) -> Option<u32> {
        self.regex
            .captures(text)
            .and_then(|caps| number(&caps, 1))
    }
}

fn number(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

/// First episode from `group`, then every `E<n>` in the chained tail held by `chain`.
fn chained_episodes(caps: &Captures, group: usize, chain: usize) -> Option<Vec<u32>> {
    let mut episodes = vec![number(caps, group)?];
    if let Some(tail) = caps.get(chain) {
        for link in CHAINED_EPISODE.captures_iter(tail.as_str()) {
            if let Some(episode) = number(&link, 1) {
                if !episodes.contains(&episode) {
                    episodes.push(episode);
                }
            }
        }
    }
    Some(episodes)
}

fn season_episode(caps: &Captures) -> Option<EpisodeNumber> {
    Some(EpisodeNumber {
        season: Some(number(caps, 1)?),
        episodes: chained_episodes(caps, 2, 3)?,
    })
}

fn seasonless_episode(caps: &Captures) -> Option<EpisodeNumber> {
    Some(EpisodeNumber {
        season: None,
        episodes: chained_episodes(caps, 1, 2)?,
    })
}

fn cross_episode(caps: &Captures) -> Option<EpisodeNumber> {
    Some(EpisodeNumber {
        season: Some(number(caps, 1)?),
        episodes: vec![number(caps, 2)?],
    })
}

fn spelled_episode(caps: &Captures) -> Option<EpisodeNumber> {
    Some(EpisodeNumber {
        season: None,
        episodes: vec![number(caps, 1)?],
    })
}

lazy_static::lazy_static! {
    static ref CHAINED_EPISODE: Regex = Regex::new(r"(?i)e([0-9]{1,3})").unwrap();

    pub static ref EPISODE_PATTERNS: Vec<EpisodePattern> = vec![
        EpisodePattern {
            name: "season_episode",
            regex: Regex::new(r"(?i)(?:^|[^a-z0-9])s([0-9]{1,2})[ .]?e([0-9]{1,3})((?:-?e[0-9]{1,3})*)").unwrap(),
            extract: season_episode,
        },
        EpisodePattern {
            name: "seasonless_episode",
            regex: Regex::new(r"(?i)(?:^|[^a-z0-9])e(?:p[ .]?)?([0-9]{1,3})((?:-?e[0-9]{1,3})*)(?:[^a-z0-9]|$)").unwrap(),
            extract: seasonless_episode,
        },
        EpisodePattern {
            name: "cross",
            regex: Regex::new(r"(?i)(?:^|[^a-z0-9])([0-9]{1,2})x([0-9]{2,3})(?:[^0-9]|$)").unwrap(),
            extract: cross_episode,
        },
        EpisodePattern {
            name: "spelled",
            regex: Regex::new(r"(?i)episode[ ._-]?([0-9]{1,3})").unwrap(),
            extract: spelled_episode,
        },
    ];

    pub static ref SEASON_PATTERNS: Vec<SeasonPattern> = vec![
        SeasonPattern {
            name: "season_marker",
            // `S01` not followed by `E<digits>`.
            regex: Regex::new(r"(?i)(?:^|[^a-z0-9])s([0-9]{1,2})(?:[^0-9e]|e[^0-9]|e$|$)").unwrap(),
        },
        SeasonPattern {
            name: "spelled",
            regex: Regex::new(r"(?i)season[ ._-]?([0-9]{1,2})").unwrap(),
        },
        SeasonPattern {
            name: "delimited",
            regex: Regex::new(r"(?i)[._]s([0-9]{1,2})[._]").unwrap(),
        },
    ];
}

pub fn parse_episode(text: &str) -> Option<EpisodeNumber> {
    EPISODE_PATTERNS.iter().find_map(|pattern| pattern.parse(text))
}

/// Season number of a season pack. Any episode marker anywhere disqualifies the name.
pub fn parse_season(text: &str) -> Option<u32> {
    if parse_episode(text).is_some() {
        return None;
    }
    SEASON_PATTERNS.iter().find_map(|pattern| pattern.parse(text))
}

pub fn classify_release(text: &str) -> Option<ReleaseShape> {
    if let Some(episode) = parse_episode(text) {
        return Some(ReleaseShape::Episode(episode));
    }
    parse_season(text).map(|season| ReleaseShape::SeasonPack { season })
}
