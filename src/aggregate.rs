//! Deduplication and ranking of detections across a mailbox scan

use crate::types::{DetectedSubscription, PaymentRecord};
use std::collections::HashMap;
use tracing::debug;

/// Collects detections keyed by display name
///
/// On a name collision the higher-confidence record wins; on a tie the
/// earlier one is kept. Payment history accumulates from every
/// billing-related detection that carries a price, whichever record wins.
#[derive(Debug, Default)]
pub struct Aggregator {
    records: Vec<DetectedSubscription>,
    index: HashMap<String, usize>,
    history: HashMap<String, Vec<PaymentRecord>>,
}

impl Aggregator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one detection
    pub fn add(&mut self, detection: DetectedSubscription) {
        if detection.billing_related
            && let Some(price) = detection.price
        {
            self.history
                .entry(detection.name.clone())
                .or_default()
                .push(PaymentRecord {
                    date: detection.detected_date,
                    price,
                    currency: detection.currency,
                });
        }

        match self.index.get(&detection.name) {
            Some(&slot) => {
                let existing = &mut self.records[slot];
                if detection.confidence > existing.confidence {
                    debug!(
                        name = %detection.name,
                        old = existing.confidence,
                        new = detection.confidence,
                        "replacing lower-confidence detection"
                    );
                    *existing = detection;
                }
            }
            None => {
                self.index.insert(detection.name.clone(), self.records.len());
                self.records.push(detection);
            }
        }
    }

    /// Number of distinct names seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Payments recorded for `name`, in the order they were added
    #[must_use]
    pub fn payment_history(&self, name: &str) -> &[PaymentRecord] {
        self.history
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Arithmetic sum of recorded payments for `name`.
    ///
    /// No currency conversion is performed.
    #[must_use]
    pub fn total_paid(&self, name: &str) -> f64 {
        self.payment_history(name).iter().map(|p| p.price).sum()
    }

    /// All payment histories keyed by name
    #[must_use]
    pub const fn histories(&self) -> &HashMap<String, Vec<PaymentRecord>> {
        &self.history
    }

    /// Deduplicated records sorted by descending confidence.
    ///
    /// The sort is stable, so equal scores keep first-seen order.
    #[must_use]
    pub fn ranked(&self) -> Vec<DetectedSubscription> {
        let mut records = self.records.clone();
        sort_by_confidence(&mut records);
        records
    }

    #[must_use]
    pub fn into_ranked(self) -> Vec<DetectedSubscription> {
        let mut records = self.records;
        sort_by_confidence(&mut records);
        records
    }
}

impl Extend<DetectedSubscription> for Aggregator {
    fn extend<T: IntoIterator<Item = DetectedSubscription>>(&mut self, iter: T) {
        for detection in iter {
            self.add(detection);
        }
    }
}

fn sort_by_confidence(records: &mut [DetectedSubscription]) {
    records.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
}
