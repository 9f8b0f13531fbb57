//! Cosine-similarity ranking over a materialized candidate pool

use tracing::debug;

use crate::errors::QaError;
use crate::models::ContextRecord;
use crate::models::RetrievalResult;
use crate::Result;

/// Cosine similarity of two equal-length vectors, in [-1, 1]
///
/// A zero-magnitude operand yields 0. Vectors of different lengths are a
/// contract violation and fail with [`QaError::DimensionMismatch`].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(QaError::DimensionMismatch {
            left: a.len(),
            right: b.len(),
        });
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let magnitude = norm_a.sqrt() * norm_b.sqrt();
    if magnitude == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / magnitude).clamp(-1.0, 1.0) as f32)
}

/// Picks the single best-scoring context, subject to an acceptance threshold
#[derive(Debug, Clone, Copy)]
pub struct SimilarityRanker {
    threshold: f32,
}

impl SimilarityRanker {
    pub const fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Scan all candidates and return the best one if it scores `>= threshold`
    ///
    /// Ties keep the first-encountered candidate. The reported score is the
    /// best score seen even when the context is rejected; an empty pool
    /// reports 0.
    pub fn rank(&self, query: &[f32], candidates: &[ContextRecord]) -> Result<RetrievalResult> {
        let mut best: Option<(f32, &ContextRecord)> = None;

        for candidate in candidates {
            let score = cosine_similarity(query, &candidate.embedding)?;
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, candidate));
            }
        }

        let Some((score, record)) = best else {
            debug!("Empty candidate pool");
            return Ok(RetrievalResult::empty());
        };

        debug!(
            "Best score {:.4} over {} candidates (threshold {:.2})",
            score,
            candidates.len(),
            self.threshold
        );

        Ok(RetrievalResult {
            context: (score >= self.threshold).then(|| record.text.clone()),
            score,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn record(text: &str, embedding: Vec<f32>) -> ContextRecord {
        ContextRecord::new(text, embedding)
    }

    // ====== Cosine Similarity Tests ======

    #[test]
    fn test_identical_vectors() {
        let a = [0.3, -1.2, 4.0, 0.01];
        assert_relative_eq!(cosine_similarity(&a, &a).unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_symmetry() {
        let a = [0.12, 0.5, -0.33, 0.9];
        let b = [-0.7, 0.25, 0.4, 0.05];
        assert_eq!(
            cosine_similarity(&a, &b).unwrap(),
            cosine_similarity(&b, &a).unwrap()
        );
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert_relative_eq!(
            cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(),
            0.0,
            epsilon = 1e-6
        );
        assert_relative_eq!(
            cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(),
            -1.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let zero = [0.0, 0.0, 0.0];
        let a = [1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&a, &zero).unwrap(), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero).unwrap(), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let err = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]).unwrap_err();
        assert!(matches!(err, QaError::DimensionMismatch { left: 2, right: 3 }));
    }

    // ====== Ranking Tests ======

    #[test]
    fn test_empty_pool() {
        let result = SimilarityRanker::new(0.3).rank(&[1.0, 0.0], &[]).unwrap();
        assert_eq!(result, RetrievalResult::empty());
        assert!(!result.is_found());
    }

    #[test]
    fn test_picks_best_candidate() {
        let candidates = vec![
            record("Library opens at 9", vec![0.0, 1.0]),
            record("Hostels: Rose, Lily", vec![1.0, 0.1]),
            record("Fees are due in June", vec![-1.0, 0.0]),
        ];
        let result = SimilarityRanker::new(0.3)
            .rank(&[1.0, 0.0], &candidates)
            .unwrap();
        assert_eq!(result.context.as_deref(), Some("Hostels: Rose, Lily"));
        assert!(result.score > 0.99);
    }

    #[test]
    fn test_below_threshold_rejects_context() {
        // cos = 0.2 against a 0.3 threshold
        let candidates = vec![record("Canteen menu", vec![0.2, 0.979_795_9])];
        let result = SimilarityRanker::new(0.3)
            .rank(&[1.0, 0.0], &candidates)
            .unwrap();
        assert!(result.context.is_none());
        assert_relative_eq!(result.score, 0.2, epsilon = 1e-5);
    }

    #[test]
    fn test_score_equal_to_threshold_is_accepted() {
        let candidates = vec![record("Exact", vec![1.0, 0.0])];
        let ranker = SimilarityRanker::new(1.0);
        let result = ranker.rank(&[2.0, 0.0], &candidates).unwrap();
        assert_eq!(result.score, 1.0);
        assert_eq!(result.context.as_deref(), Some("Exact"));
    }

    #[test]
    fn test_ties_keep_first() {
        let candidates = vec![
            record("first", vec![1.0, 1.0]),
            record("second", vec![2.0, 2.0]),
        ];
        let result = SimilarityRanker::new(0.0)
            .rank(&[1.0, 1.0], &candidates)
            .unwrap();
        assert_eq!(result.context.as_deref(), Some("first"));
    }

    #[test]
    fn test_rank_is_idempotent() {
        let candidates = vec![
            record("a", vec![0.3, 0.4, 0.5]),
            record("b", vec![0.5, 0.4, 0.3]),
        ];
        let ranker = SimilarityRanker::new(0.5);
        let query = [0.4, 0.4, 0.4];
        assert_eq!(
            ranker.rank(&query, &candidates).unwrap(),
            ranker.rank(&query, &candidates).unwrap()
        );
    }

    #[test]
    fn test_mismatched_candidate_fails_whole_rank() {
        let candidates = vec![
            record("ok", vec![1.0, 0.0]),
            record("bad", vec![1.0, 0.0, 0.0]),
        ];
        let err = SimilarityRanker::new(0.3)
            .rank(&[1.0, 0.0], &candidates)
            .unwrap_err();
        assert!(matches!(err, QaError::DimensionMismatch { .. }));
    }
}
