//! Ranking-quality metrics over a single target rank (1-based)

/// Reward for placing the target at `rank`: `1 / log2(rank + 1)`.
///
/// 1.0 at rank 1, non-increasing afterwards. Rank 0 is not a valid position
/// and scores 0.0.
pub fn ndcg(rank: usize) -> f64 {
    if rank == 0 {
        return 0.0;
    }
    1.0 / ((rank as f64) + 1.0).log2()
}

/// NDCG truncated at `k`: zero when the target falls outside the top `k`.
pub fn ndcg_at(rank: usize, k: usize) -> f64 {
    if rank == 0 || rank > k {
        0.0
    } else {
        ndcg(rank)
    }
}

/// 1.0 when the target is within the top `k`, else 0.0.
pub fn hit_at(rank: usize, k: usize) -> f64 {
    if rank >= 1 && rank <= k {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndcg_values() {
        assert_eq!(ndcg(1), 1.0);
        assert!((ndcg(3) - 0.5).abs() < 1e-12);
        assert_eq!(ndcg(0), 0.0);
    }

    #[test]
    fn test_ndcg_non_increasing() {
        let mut prev = ndcg(1);
        for rank in 2..50 {
            let cur = ndcg(rank);
            assert!(cur <= prev);
            assert!(cur > 0.0);
            prev = cur;
        }
    }

    #[test]
    fn test_truncated_metrics() {
        assert_eq!(hit_at(5, 5), 1.0);
        assert_eq!(hit_at(6, 5), 0.0);
        assert_eq!(hit_at(0, 5), 0.0);
        assert_eq!(ndcg_at(11, 10), 0.0);
        assert_eq!(ndcg_at(1, 10), 1.0);
    }
}
