use ahash::AHashSet;

/// Overlap coefficient: `|A ∩ B| / min(|A|, |B|)` over the distinct words of each side.
///
/// A short library title fully contained in a noisy release name scores 1.0.
pub fn word_set_score<S: AsRef<str>>(a: &[S], b: &[S]) -> f64 {
    let set_a: AHashSet<&str> = a.iter().map(|w| w.as_ref()).collect();
    let set_b: AHashSet<&str> = b.iter().map(|w| w.as_ref()).collect();

    let smaller = set_a.len().min(set_b.len());
    if smaller == 0 {
        return 0.0;
    }

    let intersection_size = set_a.intersection(&set_b).count();
    intersection_size as f64 / smaller as f64
}
