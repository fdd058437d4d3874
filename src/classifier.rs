//! Service classification against the ordered catalog

use crate::catalog::{ServiceCatalog, ServicePattern};
use crate::types::{Category, EmailAddress};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Result of a successful classification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceMatch {
    pub name: String,
    pub category: Category,

    /// The sender belongs to one of the service's own domains
    pub sender_matched: bool,
}

/// First-match-wins classifier over an injected catalog
#[derive(Debug, Clone, Default)]
pub struct ServiceClassifier {
    catalog: ServiceCatalog,
}

impl ServiceClassifier {
    #[must_use]
    pub const fn new(catalog: ServiceCatalog) -> Self {
        Self { catalog }
    }

    /// Classify normalized full text (subject, sender and body together).
    ///
    /// Only the first matching catalog entry is considered.
    #[must_use]
    pub fn classify(&self, text: &str) -> Option<(String, Category)> {
        self.first(text).map(|p| (p.name.clone(), p.category))
    }

    /// Classify and additionally check the sender against the matched
    /// service's own domains
    #[must_use]
    pub fn classify_from(&self, text: &str, sender: Option<&EmailAddress>) -> Option<ServiceMatch> {
        let pattern = self.first(text)?;
        let sender_matched = sender.is_some_and(|s| pattern.matches_sender(s));
        Some(ServiceMatch {
            name: pattern.name.clone(),
            category: pattern.category,
            sender_matched,
        })
    }

    fn first(&self, text: &str) -> Option<&ServicePattern> {
        if text.trim().is_empty() {
            return None;
        }
        let hit = self.catalog.first_match(text);
        if let Some(p) = hit {
            trace!(service = %p.name, "catalog match");
        }
        hit
    }
}
