//! Release and file name parsers.
//!
//! Each parser is an ordered table of independent patterns; the first pattern that
//! yields a result wins. Tables are public so every entry can be exercised on its own.

pub mod episode;
pub mod track;

pub use episode::{classify_release, parse_episode, parse_season, EpisodeNumber, ReleaseShape};
pub use track::{disc_from_folder, parse_track_file, parse_track_number, TrackNumber};
