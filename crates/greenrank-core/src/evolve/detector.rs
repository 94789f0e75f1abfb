//! Pass/fail classification of ranking responses

use greenrank_tools::extract_rank;

/// Ranks 10 and worse (1-based) are unacceptable
pub const DEFAULT_RANK_THRESHOLD: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ErrorDetector {
    pub threshold: usize,
}

impl Default for ErrorDetector {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_RANK_THRESHOLD,
        }
    }
}

impl ErrorDetector {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// True when the response fails: the target's rank cannot be recovered,
    /// or it sits at or beyond the threshold.
    pub fn detect_error(&self, response: &str, target: &str) -> bool {
        match extract_rank(response, target).last() {
            Some(&rank) => rank >= self.threshold,
            None => true,
        }
    }
}

/// [`ErrorDetector::detect_error`] with the default threshold.
pub fn detect_error(response: &str, target: &str) -> bool {
    ErrorDetector::default().detect_error(response, target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ranking_with;

    #[test]
    fn test_threshold_boundary() {
        for rank in 1..=20 {
            let response = ranking_with("Recycled Notebook", rank);
            assert_eq!(
                detect_error(&response, "Recycled Notebook"),
                rank >= 10,
                "rank {}",
                rank
            );
        }
    }

    #[test]
    fn test_unparsed_is_failure() {
        assert!(detect_error("", "Recycled Notebook"));
        assert!(detect_error("I cannot rank these items.", "Recycled Notebook"));
        assert!(detect_error("Recycled Notebook first!", "Recycled Notebook"));
    }

    #[test]
    fn test_only_last_number_matters() {
        let response = "Considered 42 options.\n15. Glass Jar\n3. Recycled Notebook";
        assert!(!detect_error(response, "Recycled Notebook"));
    }

    #[test]
    fn test_custom_threshold() {
        let detector = ErrorDetector::new(3);
        assert!(detector.detect_error(&ranking_with("Jar", 3), "Jar"));
        assert!(!detector.detect_error(&ranking_with("Jar", 2), "Jar"));
    }

    #[test]
    fn test_deterministic() {
        let response = ranking_with("Jar", 12);
        let first = detect_error(&response, "Jar");
        assert!((0..5).all(|_| detect_error(&response, "Jar") == first));
    }
}
