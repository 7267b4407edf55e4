//! Deterministic ranking of classification results.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RankError {
    /// Label count and probability-vector length disagree. This is a contract
    /// violation between the model provider and the ranking logic and must
    /// not be silently truncated.
    #[error("Dimension mismatch: {labels} labels but {probs} probabilities")]
    DimensionMismatch { labels: usize, probs: usize },
}

/// A ranked (label, probability) pair.
pub type RankedPair = (String, f32);

/// Pairs each label with its probability by position and sorts descending by
/// probability.
///
/// The sort is stable: labels with equal probabilities keep their vocabulary
/// order, so the result is reproducible across runs. `NaN` probabilities
/// compare as equal and therefore also stay in place. The function is pure;
/// calling it twice with the same inputs yields the same output.
///
/// ```
/// use labelkiosk::rank;
///
/// let labels = ["A".to_string(), "B".to_string(), "C".to_string()];
/// let ranked = rank(&labels, &[0.2, 0.5, 0.3]).unwrap();
/// assert_eq!(ranked[0], ("B".to_string(), 0.5));
/// assert_eq!(ranked[1], ("C".to_string(), 0.3));
/// assert_eq!(ranked[2], ("A".to_string(), 0.2));
/// ```
pub fn rank(labels: &[String], probs: &[f32]) -> Result<Vec<RankedPair>, RankError> {
    if labels.len() != probs.len() {
        return Err(RankError::DimensionMismatch {
            labels: labels.len(),
            probs: probs.len(),
        });
    }

    let mut pairs: Vec<RankedPair> = labels
        .iter()
        .cloned()
        .zip(probs.iter().copied())
        .collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    Ok(pairs)
}
