//! Additive confidence scoring
//!
//! Scores are sums of weights, not probabilities. With the default weights a
//! sender-matched or itemized detection with every signal scores 1.15; the
//! value is left unclamped so existing rankings keep their order.

use serde::{Deserialize, Serialize};

/// Which detection path produced a result
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetectionPath {
    /// Catalog pattern matched somewhere in the text
    Generic,
    /// Catalog pattern matched and the sender is the service itself
    SenderMatched,
    /// Line item from an itemized Apple receipt
    AppleItemized,
}

/// Signals gathered while matching one email or receipt line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signals {
    pub path: DetectionPath,
    pub has_price: bool,
    pub has_cycle: bool,
    pub billing_keyword: bool,
}

/// Weights for each signal
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    pub base_generic: f64,
    pub base_sender_matched: f64,
    pub base_apple_itemized: f64,
    pub price: f64,
    pub cycle: f64,
    pub billing_keyword: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            base_generic: 0.3,
            base_sender_matched: 0.5,
            base_apple_itemized: 0.5,
            price: 0.2,
            cycle: 0.15,
            billing_keyword: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
}

impl ConfidenceScorer {
    #[must_use]
    pub const fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    /// Sum the weights of the present signals. Not clamped to 1.0.
    #[must_use]
    pub fn score(&self, signals: Signals) -> f64 {
        let w = &self.weights;
        let mut score = match signals.path {
            DetectionPath::Generic => w.base_generic,
            DetectionPath::SenderMatched => w.base_sender_matched,
            DetectionPath::AppleItemized => w.base_apple_itemized,
        };
        if signals.has_price {
            score += w.price;
        }
        if signals.has_cycle {
            score += w.cycle;
        }
        if signals.billing_keyword {
            score += w.billing_keyword;
        }
        score
    }
}
