// Enforce at crate level
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! Subscription Extractor
//!
//! Heuristic extraction of subscriptions and purchases from receipt emails
//! written in Japanese and/or English.
//!
//! # Features
//!
//! - Ordered, data-driven service catalog (first match wins)
//! - Currency-aware price extraction with plausibility windows
//! - Billing-cycle inference from Japanese and English keywords
//! - Apple receipt itemization into one record per purchase
//! - Additive confidence scoring, deduplication and ranking
//!
//! The engine performs no I/O and never fails: unmatched, malformed or
//! implausible input simply yields no detection.
//!
//! # Example
//!
//! ```rust
//! use chrono::Utc;
//! use subscription_extract::{Detector, RawEmail};
//!
//! let email = RawEmail::new("Netflix: お支払いのお知らせ", "info@account.netflix.com", Utc::now())
//!     .with_text("ご利用料金 ¥1,490 (月額)");
//!
//! let detector = Detector::default();
//! let found = detector.detect(&email);
//!
//! assert_eq!(found[0].name, "Netflix");
//! assert_eq!(found[0].price, Some(1490.0));
//! ```

mod aggregate;
mod apple;
mod catalog;
mod classifier;
mod confidence;
mod config;
mod detector;
mod error;
mod message;
mod normalize;
mod price;
mod types;

pub use aggregate::Aggregator;
pub use apple::{
    AppleItemizer, ReceiptItem, classify_purchase, is_apple_receipt, split_generic, strip_boilerplate,
};
pub use catalog::{
    KnownApp, KnownAppCatalog, KnownAppEntry, ServiceCatalog, ServiceEntry, ServicePattern,
    builtin_known_app_entries, builtin_service_entries,
};
pub use classifier::{ServiceClassifier, ServiceMatch};
pub use confidence::{ConfidenceScorer, DetectionPath, ScoringWeights, Signals};
pub use config::DetectorConfig;
pub use detector::{Detector, ScanReport, has_billing_keyword};
pub use error::{ParseError, Result};
pub use message::parse_email;
pub use normalize::{body_lines, body_source, normalize_body, normalize_text, strip_html};
pub use price::{
    CycleExtractor, Price, PriceExtractor, PriceWindow, PriceWindows, Strictness, parse_amount, parse_amount_for,
};
pub use types::*;
