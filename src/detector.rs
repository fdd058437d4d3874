//! Email-to-subscription detection pipeline
//!
//! Apple receipts go through the itemizer; every other email goes through
//! the catalog classifier and the price/cycle extractors. Results are scored,
//! then deduplicated and ranked by the aggregator.

use crate::aggregate::Aggregator;
use crate::apple::{AppleItemizer, ReceiptItem, is_apple_receipt};
use crate::catalog::{KnownAppCatalog, ServiceCatalog};
use crate::classifier::ServiceClassifier;
use crate::confidence::{ConfidenceScorer, DetectionPath, Signals};
use crate::config::DetectorConfig;
use crate::error::Result;
use crate::message::parse_email;
use crate::normalize::{normalize_body, normalize_text};
use crate::price::{CycleExtractor, PriceExtractor, Strictness};
use crate::types::{Currency, DetectedSubscription, EmailAddress, PaymentRecord, RawEmail};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, trace, warn};

static BILLING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)領収書|レシート|請求|お支払い|支払い|ご利用料金|決済|購入|更新のお知らせ|receipt|invoice|billing|payment|charged|renewal",
    )
    .unwrap()
});

/// Whether `text` mentions a receipt, invoice or billing keyword
#[must_use]
pub fn has_billing_keyword(text: &str) -> bool {
    BILLING_KEYWORD.is_match(text)
}

/// Outcome of scanning raw message sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    /// Deduplicated detections, highest confidence first
    pub subscriptions: Vec<DetectedSubscription>,

    /// Payment history per subscription name
    pub payments: HashMap<String, Vec<PaymentRecord>>,

    /// Messages parsed and analysed
    pub scanned: usize,

    /// Messages that failed to parse and were skipped
    pub skipped: usize,
}

/// Stateless detector over immutable, injected catalogs
#[derive(Debug, Clone, Default)]
pub struct Detector {
    classifier: ServiceClassifier,
    prices: PriceExtractor,
    cycles: CycleExtractor,
    itemizer: AppleItemizer,
    scorer: ConfidenceScorer,
}

impl Detector {
    /// Build a detector from configuration, compiling any replacement catalogs
    pub fn new(config: &DetectorConfig) -> Result<Self> {
        let services = match &config.services {
            Some(entries) => ServiceCatalog::from_entries(entries.iter().cloned())?,
            None => ServiceCatalog::default(),
        };
        let known_apps = match &config.known_apps {
            Some(entries) => KnownAppCatalog::from_entries(entries.iter().cloned())?,
            None => KnownAppCatalog::default(),
        };

        Ok(Self {
            itemizer: AppleItemizer::new(known_apps, services.clone(), config.itemizer_price_window),
            classifier: ServiceClassifier::new(services),
            prices: PriceExtractor::new(config.price_windows),
            cycles: CycleExtractor::default(),
            scorer: ConfidenceScorer::new(config.scoring),
        })
    }

    /// Assemble a detector from individually built components
    #[must_use]
    pub const fn from_parts(
        classifier: ServiceClassifier,
        prices: PriceExtractor,
        cycles: CycleExtractor,
        itemizer: AppleItemizer,
        scorer: ConfidenceScorer,
    ) -> Self {
        Self {
            classifier,
            prices,
            cycles,
            itemizer,
            scorer,
        }
    }

    /// Detect subscriptions and purchases in one email.
    ///
    /// Apple receipts yield one result per itemized purchase (possibly none);
    /// other emails yield at most one result.
    #[must_use]
    pub fn detect(&self, email: &RawEmail) -> Vec<DetectedSubscription> {
        if is_apple_receipt(email) {
            let items = self.itemizer.itemize_email(email);
            debug!(subject = %email.subject, count = items.len(), "itemized Apple receipt");
            let billing = has_billing_keyword(&email.subject);
            return items
                .into_iter()
                .map(|item| self.receipt_detection(email, item, billing))
                .collect();
        }

        self.detect_generic(email).into_iter().collect()
    }

    fn detect_generic(&self, email: &RawEmail) -> Option<DetectedSubscription> {
        let body = normalize_body(email.body_text.as_deref(), email.body_html.as_deref());

        // The sender alone is not evidence of a subscription
        if body.is_empty()
            && self.classifier.classify(&email.subject).is_none()
            && !has_billing_keyword(&email.subject)
        {
            trace!(from = %email.from, "empty body and no subject signal");
            return None;
        }

        let full = normalize_text(&format!("{} {} {}", email.subject, email.from, body));
        let sender = EmailAddress::parse(&email.from);

        let service = self.classifier.classify_from(&full, sender.as_ref())?;
        let (path, strictness) = if service.sender_matched {
            (DetectionPath::SenderMatched, Strictness::Strict)
        } else {
            (DetectionPath::Generic, Strictness::Lenient)
        };

        let price = self.prices.extract(&full, strictness);
        let billing_cycle = self.cycles.extract(&full);
        let billing_related = has_billing_keyword(&email.subject) || has_billing_keyword(&body);

        let confidence = self.scorer.score(Signals {
            path,
            has_price: price.is_some(),
            has_cycle: billing_cycle.is_some(),
            billing_keyword: billing_related,
        });

        debug!(
            service = %service.name,
            price = ?price.map(|p| p.amount),
            cycle = ?billing_cycle,
            confidence,
            "classified email"
        );

        Some(DetectedSubscription {
            name: service.name,
            item_name: None,
            category: service.category,
            price: price.map(|p| p.amount),
            currency: price.map_or(Currency::Jpy, |p| p.currency),
            billing_cycle,
            source_address: email.sender_address(),
            detected_date: email.date,
            confidence,
            purchase_type: None,
            billing_related,
        })
    }

    fn receipt_detection(&self, email: &RawEmail, item: ReceiptItem, billing: bool) -> DetectedSubscription {
        let confidence = self.scorer.score(Signals {
            path: DetectionPath::AppleItemized,
            has_price: true,
            has_cycle: item.billing_cycle.is_some(),
            billing_keyword: billing,
        });

        DetectedSubscription {
            name: item.app_name,
            item_name: item.item_name,
            category: item.category,
            price: Some(item.price),
            currency: Currency::Jpy,
            billing_cycle: item.billing_cycle,
            source_address: email.sender_address(),
            detected_date: email.date,
            confidence,
            purchase_type: Some(item.purchase_type),
            billing_related: billing,
        }
    }

    /// Detect across a batch and feed everything to an aggregator
    pub fn aggregate<'a>(&self, emails: impl IntoIterator<Item = &'a RawEmail>) -> Aggregator {
        let mut aggregator = Aggregator::new();
        for email in emails {
            aggregator.extend(self.detect(email));
        }
        aggregator
    }

    /// Detect, deduplicate and rank a batch of emails
    pub fn scan<'a>(&self, emails: impl IntoIterator<Item = &'a RawEmail>) -> Vec<DetectedSubscription> {
        self.aggregate(emails).into_ranked()
    }

    /// Same as [`Detector::scan`], detecting emails in parallel.
    ///
    /// Per-email results are collected in input order, so the output is
    /// identical to the sequential scan.
    #[must_use]
    pub fn scan_parallel(&self, emails: &[RawEmail]) -> Vec<DetectedSubscription> {
        let per_email: Vec<Vec<DetectedSubscription>> =
            emails.par_iter().map(|email| self.detect(email)).collect();

        let mut aggregator = Aggregator::new();
        aggregator.extend(per_email.into_iter().flatten());
        aggregator.into_ranked()
    }

    /// Parse and scan raw message sources.
    ///
    /// A source that fails to parse is logged and skipped; it never aborts
    /// the batch.
    pub fn scan_messages<S: AsRef<[u8]>>(&self, sources: impl IntoIterator<Item = S>) -> ScanReport {
        let mut aggregator = Aggregator::new();
        let mut scanned = 0;
        let mut skipped = 0;

        for (index, source) in sources.into_iter().enumerate() {
            match parse_email(source.as_ref()) {
                Ok(email) => {
                    scanned += 1;
                    aggregator.extend(self.detect(&email));
                }
                Err(e) => {
                    skipped += 1;
                    warn!(index, error = %e, "skipping unparseable message");
                }
            }
        }

        let payments = aggregator.histories().clone();
        ScanReport {
            subscriptions: aggregator.into_ranked(),
            payments,
            scanned,
            skipped,
        }
    }
}
