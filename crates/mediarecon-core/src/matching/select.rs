use tracing::debug;

use super::normalize::{extract_year, significant_words};
use super::score::word_set_score;
use crate::config::MatchingConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOptions {
    pub threshold: f64,
    pub year_bonus: f64,
    /// Applied when both years are known and more than one year apart. `None` disables it.
    pub year_penalty: Option<f64>,
}

impl MatchOptions {
    /// Release name against catalog titles.
    pub fn entity(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.entity_threshold,
            year_bonus: config.year_bonus,
            year_penalty: Some(config.year_penalty),
        }
    }

    /// Release name against on-disk directory names. Stricter, and never penalised.
    pub fn directory(config: &MatchingConfig) -> Self {
        Self {
            threshold: config.directory_threshold,
            year_bonus: config.year_bonus,
            year_penalty: None,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self::entity(&MatchingConfig::default())
    }
}

#[derive(Debug)]
pub struct Scored<'a, T> {
    pub candidate: &'a T,
    pub score: f64,
}

// Manual impls: a derive would require `T: Clone`.
impl<T> Clone for Scored<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Scored<'_, T> {}

fn adjust_for_year(score: f64, target_year: Option<i32>, candidate_year: Option<i32>, options: &MatchOptions) -> f64 {
    match (target_year, candidate_year) {
        (Some(a), Some(b)) if a == b => score + options.year_bonus,
        (Some(a), Some(b)) if (a - b).abs() > 1 => match options.year_penalty {
            Some(penalty) => score - penalty,
            None => score,
        },
        _ => score,
    }
}

fn score_all<'a, T>(
    target: &str,
    target_year: Option<i32>,
    candidates: &'a [T],
    title_of: impl Fn(&T) -> &str,
    year_of: impl Fn(&T) -> Option<i32>,
    options: &MatchOptions,
) -> Vec<Scored<'a, T>> {
    let target_words = significant_words(target);
    let target_year = target_year.or_else(|| extract_year(target));

    candidates
        .iter()
        .map(|candidate| {
            let title = title_of(candidate);
            let candidate_year = year_of(candidate).or_else(|| extract_year(title));
            let base = word_set_score(&target_words, &significant_words(title));
            let score = adjust_for_year(base, target_year, candidate_year, options);
            debug!("score {:.2} for '{}' against '{}'", score, title, target);
            Scored { candidate, score }
        })
        .collect()
}

/// Highest-scoring candidate at or above the threshold. Ties go to the first candidate seen.
pub fn best_match<'a, T>(
    target: &str,
    target_year: Option<i32>,
    candidates: &'a [T],
    title_of: impl Fn(&T) -> &str,
    year_of: impl Fn(&T) -> Option<i32>,
    options: &MatchOptions,
) -> Option<Scored<'a, T>> {
    let mut best: Option<Scored<'a, T>> = None;
    for scored in score_all(target, target_year, candidates, title_of, year_of, options) {
        if best.map_or(true, |current| scored.score > current.score) {
            best = Some(scored);
        }
    }
    best.filter(|scored| scored.score >= options.threshold)
}

/// Every candidate at or above the threshold, best first. Equal scores keep input order.
pub fn rank_matches<'a, T>(
    target: &str,
    target_year: Option<i32>,
    candidates: &'a [T],
    title_of: impl Fn(&T) -> &str,
    year_of: impl Fn(&T) -> Option<i32>,
    options: &MatchOptions,
) -> Vec<Scored<'a, T>> {
    let mut ranked: Vec<Scored<'a, T>> =
        score_all(target, target_year, candidates, title_of, year_of, options)
            .into_iter()
            .filter(|scored| scored.score >= options.threshold)
            .collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}
