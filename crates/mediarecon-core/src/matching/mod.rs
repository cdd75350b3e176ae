pub mod normalize;
pub mod score;
pub mod select;

pub use normalize::{compact, extract_year, normalize, significant_words, Normalized};
pub use score::word_set_score;
pub use select::{best_match, rank_matches, MatchOptions, Scored};
