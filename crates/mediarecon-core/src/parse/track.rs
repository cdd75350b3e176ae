use regex::{Captures, Regex};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackNumber {
    pub disc: Option<u32>,
    pub track: u32,
}

pub struct TrackPattern {
    pub name: &'static str,
    regex: Regex,
    extract: fn(&Captures) -> Option<TrackNumber>,
}

impl TrackPattern {
    pub fn parse(&self, stem: &str) -> Option<TrackNumber> {
        self.regex
            .captures(stem)
            .and_then(|caps| (self.extract)(&caps))
            .filter(|parsed| parsed.track > 0)
    }
}

fn number(caps: &Captures, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn disc_and_track(caps: &Captures) -> Option<TrackNumber> {
    let disc = number(caps, 1)?;
    Some(TrackNumber {
        disc: (disc > 0).then_some(disc),
        track: number(caps, 2)?,
    })
}

fn track_only(caps: &Captures) -> Option<TrackNumber> {
    Some(TrackNumber {
        disc: None,
        track: number(caps, 1)?,
    })
}

lazy_static::lazy_static! {
    pub static ref TRACK_PATTERNS: Vec<TrackPattern> = vec![
        TrackPattern {
            name: "disc_track_prefix",
            regex: Regex::new(r"^([0-9])([0-9]{2})(?:[ ._-]|$)").unwrap(),
            extract: disc_and_track,
        },
        TrackPattern {
            name: "number_prefix",
            regex: Regex::new(r"^([0-9]{1,2})[ ._-]").unwrap(),
            extract: track_only,
        },
        TrackPattern {
            name: "dashed_infix",
            regex: Regex::new(r"_-_([0-9]{1,2})_-_").unwrap(),
            extract: track_only,
        },
        TrackPattern {
            name: "track_keyword",
            regex: Regex::new(r"(?i)track[ ._-]?([0-9]{1,2})").unwrap(),
            extract: track_only,
        },
        TrackPattern {
            name: "dotted_prefix",
            regex: Regex::new(r"^([0-9]{1,2})\.").unwrap(),
            extract: track_only,
        },
    ];

    static ref DISC_FOLDER: Regex = Regex::new(r"(?i)^(?:cd|disc|disk)[ ._-]?([0-9]{1,2})$").unwrap();
}

/// Track number from a file stem (no extension).
pub fn parse_track_number(stem: &str) -> Option<TrackNumber> {
    TRACK_PATTERNS.iter().find_map(|pattern| pattern.parse(stem.trim()))
}

/// Disc number from a folder such as `CD2` or `Disc 1`.
pub fn disc_from_folder(name: &str) -> Option<u32> {
    DISC_FOLDER
        .captures(name.trim())
        .and_then(|caps| number(&caps, 1))
}

/// Track number of an audio file, taking the disc from its parent folder when the name has none.
pub fn parse_track_file(path: &Path) -> Option<TrackNumber> {
    let stem = path.file_stem()?.to_string_lossy();
    let mut parsed = parse_track_number(&stem)?;
    if parsed.disc.is_none() {
        parsed.disc = path
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|name| disc_from_folder(&name.to_string_lossy()));
    }
    Some(parsed)
}
