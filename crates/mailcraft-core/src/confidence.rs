//! Confidence aggregation
//!
//! Category scores are plain means of the provider's per-field confidences.
//! The overall score weights the categories; line items dominate because they
//! carry the business value of an order.

use crate::models::Confidence;

/// Mean of the given scores, 0 when there are none
pub fn aggregate(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Category weights for the overall confidence score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceWeights {
    pub customer_info: f64,
    pub line_items: f64,
    pub totals: f64,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            customer_info: 0.2,
            line_items: 0.6,
            totals: 0.2,
        }
    }
}

impl ConfidenceWeights {
    /// Weighted combination of the three category scores
    pub fn overall(&self, customer_info: f64, line_items: f64, totals: f64) -> f64 {
        customer_info * self.customer_info + line_items * self.line_items + totals * self.totals
    }

    /// Build a full confidence block from category scores
    pub fn score(&self, customer_info: f64, line_items: f64, totals: f64) -> Confidence {
        Confidence {
            overall: self.overall(customer_info, line_items, totals),
            customer_info,
            line_items,
            totals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_zero() {
        assert_eq!(aggregate(&[]), 0.0);
    }

    #[test]
    fn test_aggregate_mean() {
        assert!((aggregate(&[0.5, 1.0, 0.0]) - 0.5).abs() < 1e-12);
        assert_eq!(aggregate(&[0.8]), 0.8);
    }

    #[test]
    fn test_default_weights() {
        let weights = ConfidenceWeights::default();
        assert_eq!(weights.customer_info, 0.2);
        assert_eq!(weights.line_items, 0.6);
        assert_eq!(weights.totals, 0.2);
    }

    #[test]
    fn test_overall_is_exact_weighted_sum() {
        let weights = ConfidenceWeights::default();
        for &(c, l, t) in &[(0.9, 0.7, 0.3), (0.0, 1.0, 0.0), (0.33, 0.66, 0.99)] {
            let expected = c * 0.2 + l * 0.6 + t * 0.2;
            assert_eq!(weights.overall(c, l, t), expected);
        }
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        let weights = ConfidenceWeights::default();
        let high = weights.score(1.0, 1.0, 1.0);
        assert!(high.overall <= 1.0 + 1e-12);
        let low = weights.score(0.0, 0.0, 0.0);
        assert_eq!(low.overall, 0.0);
    }
}
