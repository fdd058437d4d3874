//! Detector configuration
//!
//! Every field is optional in JSON; anything left out keeps the built-in
//! default.

use crate::catalog::{KnownAppEntry, ServiceEntry};
use crate::confidence::ScoringWeights;
use crate::error::Result;
use crate::price::{PriceWindow, PriceWindows};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    /// Confidence weights
    pub scoring: ScoringWeights,

    /// Plausibility windows for the generic price extractor
    pub price_windows: PriceWindows,

    /// Plausibility window for itemized Apple receipt lines (yen)
    pub itemizer_price_window: PriceWindow,

    /// Replacement service catalog, in match order
    pub services: Option<Vec<ServiceEntry>>,

    /// Replacement known-app catalog, in match order
    pub known_apps: Option<Vec<KnownAppEntry>>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringWeights::default(),
            price_windows: PriceWindows::default(),
            itemizer_price_window: PriceWindow::new(50.0, 100_000.0),
            services: None,
            known_apps: None,
        }
    }
}

impl DetectorConfig {
    /// Load configuration from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
