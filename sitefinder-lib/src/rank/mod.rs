//! Similarity ranking over a catalog snapshot
//!
//! Scores every stored site against a query vector with cosine similarity and
//! keeps the best `k`. The whole catalog is scanned per query; a single bad
//! row never fails the ranking.
//!
//! # Ordering
//!
//! Higher score first, then name ascending, so equal scores order the same
//! way on every call regardless of the order the store returned rows in.
//!
//! Sites whose embedding cannot be decoded, or whose dimensionality differs
//! from the query, have no usable score. They are left out of the ranking
//! and counted in [`Ranking::malformed`].

use std::cmp::Ordering;

use crate::embed::decode_embedding;
use crate::site::{ScoredSite, SiteRecord};
use crate::{Error, Result};

/// Outcome of ranking one catalog snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    /// Top sites, best first
    pub sites: Vec<ScoredSite>,
    /// Records looked at
    pub scanned: usize,
    /// Records dropped because their coordinates did not parse
    pub excluded: usize,
    /// Records dropped because their embedding was unusable
    pub malformed: usize,
}

/// Brute-force cosine ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    /// Create a new ranker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Rank `records` against `query`, keeping at most `k` sites.
    pub fn rank(&self, query: &[f32], records: Vec<SiteRecord>, k: usize) -> Ranking {
        let mut ranking = Ranking {
            scanned: records.len(),
            ..Ranking::default()
        };

        let mut scored = Vec::with_capacity(records.len());
        for record in records {
            let site = match record.to_site() {
                Ok(site) => site,
                Err(e) => {
                    tracing::warn!(error = %e, "excluding site from ranking");
                    ranking.excluded += 1;
                    continue;
                }
            };

            match stored_vector(query, &record.embedding) {
                Ok(vector) => scored.push(ScoredSite {
                    score: cosine_similarity(query, &vector),
                    site,
                }),
                Err(e) => {
                    tracing::warn!(site = %site.name, error = %e, "skipping site with unusable embedding");
                    ranking.malformed += 1;
                }
            }
        }

        scored.sort_by(compare);
        scored.truncate(k);
        ranking.sites = scored;

        ranking
    }
}

fn compare(a: &ScoredSite, b: &ScoredSite) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.site.name.cmp(&b.site.name))
}

fn stored_vector(query: &[f32], stored: &str) -> Result<Vec<f32>> {
    let vector = decode_embedding(stored)?;
    if vector.len() != query.len() {
        return Err(Error::MalformedCandidate(format!(
            "stored embedding has {} dimensions, query has {}",
            vector.len(),
            query.len()
        )));
    }
    Ok(vector)
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 means identical direction. Vectors of
/// different length, empty vectors and zero vectors score `0.0`. Sums are
/// accumulated in `f64` so large components do not overflow.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    // adding 0.0 turns -0.0 into 0.0
    ((dot / (norm_a * norm_b)).clamp(-1.0, 1.0) + 0.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::Coordinate;

    fn record(name: &str, embedding: &str) -> SiteRecord {
        SiteRecord {
            name: name.to_string(),
            description: format!("{name} description"),
            latitude: Coordinate::Number(10.0),
            longitude: Coordinate::Number(20.0),
            photo_url: None,
            embedding: embedding.to_string(),
        }
    }

    fn names(ranking: &Ranking) -> Vec<&str> {
        ranking.sites.iter().map(|s| s.site.name.as_str()).collect()
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![0.3, -1.2, 4.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!(sim.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &b);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let a = vec![0.2, 0.7, -0.1];
        let b = vec![0.9, -0.3, 0.4];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0];
        let b = vec![1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&a, &a), 0.0);
    }

    #[test]
    fn test_cosine_similarity_length_mismatch() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_large_components() {
        let sim = cosine_similarity(&[1.0, 0.0, 0.0], &[1e20, 0.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);

        let sim = cosine_similarity(&[3e30, 4e30], &[3e30, 4e30]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_is_positive_zero() {
        let sim = cosine_similarity(&[-1.0, 0.0], &[0.0, -1.0]);
        assert_eq!(sim.to_bits(), 0.0f32.to_bits());
    }

    #[test]
    fn test_unusable_embeddings_are_skipped() {
        let records = vec![
            record("empty", ""),
            record("words", "not a vector"),
            record("short", "1 0"),
            record("ok", "[2 0 0]"),
        ];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 5);

        assert_eq!(names(&ranking), vec!["ok"]);
        assert!((ranking.sites[0].score - 1.0).abs() < 1e-6);
        assert_eq!(ranking.malformed, 3);
    }

    #[test]
    fn test_rank_picks_closest_site() {
        let records = vec![record("Yosemite", "1 0 0"), record("Everest", "0 1 0")];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 1);

        assert_eq!(names(&ranking), vec!["Yosemite"]);
        assert!((ranking.sites[0].score - 1.0).abs() < 1e-6);
        assert_eq!(ranking.scanned, 2);
    }

    #[test]
    fn test_rank_returns_sorted() {
        let records = vec![
            record("far", "0 1 0"),
            record("close", "1 0 0"),
            record("medium", "0.5 0.5 0"),
        ];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 3);

        assert_eq!(names(&ranking), vec!["close", "medium", "far"]);
        for window in ranking.sites.windows(2) {
            assert!(window[0].score >= window[1].score);
        }
    }

    #[test]
    fn test_rank_k_larger_than_catalog() {
        let records = vec![record("only", "1 0")];
        let ranking = Ranker::new().rank(&[1.0, 0.0], records, 100);
        assert_eq!(ranking.sites.len(), 1);
    }

    #[test]
    fn test_rank_empty_catalog() {
        let ranking = Ranker::new().rank(&[1.0, 0.0], Vec::new(), 5);
        assert!(ranking.sites.is_empty());
        assert_eq!(ranking.scanned, 0);
    }

    #[test]
    fn test_malformed_embedding_is_left_out() {
        let records = vec![
            record("broken", "not a vector"),
            record("opposite", "-1 0 0"),
            record("match", "1 0 0"),
        ];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 5);

        assert_eq!(names(&ranking), vec!["match", "opposite"]);
        assert_eq!(ranking.malformed, 1);
    }

    #[test]
    fn test_scores_non_increasing_with_negative_and_malformed_rows() {
        let records = vec![
            record("broken", "oops"),
            record("away", "-1 -1 0"),
            record("side", "0 1 0"),
            record("wrong-size", "1 0"),
            record("near", "1 0.2 0"),
            record("opposite", "-1 0 0"),
        ];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 10);

        assert_eq!(ranking.sites.len(), 4);
        assert!(ranking.sites.windows(2).all(|w| w[0].score >= w[1].score));
        assert_eq!(ranking.malformed, 2);
    }

    #[test]
    fn test_wrong_dimension_counts_as_malformed() {
        let records = vec![record("short", "1 0"), record("ok", "0 0 1")];
        let ranking = Ranker::new().rank(&[1.0, 0.0, 0.0], records, 5);

        assert_eq!(names(&ranking), vec!["ok"]);
        assert_eq!(ranking.malformed, 1);
    }

    #[test]
    fn test_no_usable_embeddings_is_empty() {
        let records = vec![record("a", ""), record("b", "[oops]")];
        let ranking = Ranker::new().rank(&[1.0, 0.0], records, 5);

        assert!(ranking.sites.is_empty());
        assert_eq!(ranking.malformed, 2);
    }

    #[test]
    fn test_bad_coordinates_are_excluded() {
        let mut bad = record("nowhere", "1 0");
        bad.latitude = Coordinate::Text("north-ish".to_string());
        let records = vec![bad, record("somewhere", "0 1")];
        let ranking = Ranker::new().rank(&[1.0, 0.0], records, 5);

        assert_eq!(names(&ranking), vec!["somewhere"]);
        assert_eq!(ranking.excluded, 1);
    }

    #[test]
    fn test_equal_scores_order_by_name() {
        let records = vec![
            record("Zion", "1 0"),
            record("Acadia", "2 0"),
            record("Denali", "0.5 0"),
        ];
        let ranking = Ranker::new().rank(&[1.0, 0.0], records, 3);

        assert_eq!(names(&ranking), vec!["Acadia", "Denali", "Zion"]);
    }

    #[test]
    fn test_zero_scores_of_either_sign_tie_by_name() {
        let records = vec![record("b", "0 1"), record("a", "0 -1")];
        let ranking = Ranker::new().rank(&[-1.0, 0.0], records, 2);

        assert_eq!(names(&ranking), vec!["a", "b"]);
        assert!(ranking.sites.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn test_tie_break_ignores_fetch_order() {
        let forward = vec![record("b", "1 0"), record("a", "1 0")];
        let backward = vec![record("a", "1 0"), record("b", "1 0")];
        let query = [1.0, 0.0];

        assert_eq!(
            names(&Ranker::new().rank(&query, forward, 2)),
            names(&Ranker::new().rank(&query, backward, 2)),
        );
    }

    #[test]
    fn test_length_is_min_of_k_and_candidates() {
        let records: Vec<_> = (0..7)
            .map(|i| record(&format!("site-{i}"), &format!("1 {i}")))
            .collect();

        for k in 1..10 {
            let ranking = Ranker::new().rank(&[1.0, 0.0], records.clone(), k);
            assert_eq!(ranking.sites.len(), k.min(7));
        }
    }
}
