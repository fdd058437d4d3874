//! Core types for receipt emails and detected subscriptions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An email as delivered by the mail-fetch layer
///
/// The engine only ever borrows this; it is never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmail {
    /// Subject line
    pub subject: String,

    /// Raw `From` header or bare address
    pub from: String,

    /// Plain text body (if available)
    pub body_text: Option<String>,

    /// HTML body (if available)
    pub body_html: Option<String>,

    /// Date sent/received
    pub date: DateTime<Utc>,
}

impl RawEmail {
    pub fn new(subject: impl Into<String>, from: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            subject: subject.into(),
            from: from.into(),
            body_text: None,
            body_html: None,
            date,
        }
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.body_html = Some(html.into());
        self
    }

    /// Bare sender address, falling back to the raw header when unparseable
    #[must_use]
    pub fn sender_address(&self) -> String {
        EmailAddress::parse(&self.from)
            .map_or_else(|| self.from.trim().to_string(), |addr| addr.address)
    }
}

/// Email address with optional display name
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailAddress {
    /// Display name (e.g., "App Store")
    pub name: Option<String>,

    /// Email address (e.g., "no_reply@email.apple.com")
    pub address: String,

    /// Domain extracted from address
    pub domain: String,

    /// Local part (before @)
    pub local_part: String,
}

impl EmailAddress {
    /// Parse an email address from a string
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();

        // Try to match "Name <email@domain.com>" format
        if let Some(start) = s.find('<')
            && let Some(end) = s[start..].find('>').map(|i| start + i)
        {
            let name_part = s[..start].trim().trim_matches('"');
            let address = s[start + 1..end].trim().to_string();

            if let Some((local, domain)) = address.split_once('@') {
                return Some(Self {
                    name: if name_part.is_empty() {
                        None
                    } else {
                        Some(name_part.to_string())
                    },
                    local_part: local.to_string(),
                    domain: domain.to_lowercase(),
                    address,
                });
            }
        }

        // Plain email address
        if let Some((local, domain)) = s.split_once('@')
            && !local.is_empty()
            && !domain.is_empty()
            && !s.contains(char::is_whitespace)
        {
            return Some(Self {
                name: None,
                local_part: local.to_string(),
                domain: domain.to_lowercase(),
                address: s.to_string(),
            });
        }

        None
    }

    /// Check whether the address belongs to `domain` or one of its subdomains
    #[must_use]
    pub fn is_from_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_start_matches('@').to_lowercase();
        self.domain == domain || self.domain.ends_with(&format!(".{domain}"))
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <{}>", name, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}

/// Service category
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Streaming,
    Music,
    Productivity,
    Cloud,
    Gaming,
    News,
    Fitness,
    Education,
    #[default]
    Other,
}

impl Category {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Streaming => "streaming",
            Self::Music => "music",
            Self::Productivity => "productivity",
            Self::Cloud => "cloud",
            Self::Gaming => "gaming",
            Self::News => "news",
            Self::Fitness => "fitness",
            Self::Education => "education",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence period of a subscription charge
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Monthly,
    Yearly,
    Weekly,
    Quarterly,
}

impl BillingCycle {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::Weekly => "weekly",
            Self::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of purchase found on an itemized receipt
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    Subscription,
    InAppPurchase,
    OneTime,
}

/// Supported currencies
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Jpy,
    Usd,
    Eur,
}

impl Currency {
    /// ISO 4217 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Jpy => "JPY",
            Self::Usd => "USD",
            Self::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A subscription or purchase detected in one email
///
/// `confidence` is an additive heuristic score, not a probability; it can
/// exceed 1.0 on the sender-matched and itemized paths.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectedSubscription {
    /// Service or app display name
    pub name: String,

    /// Item name within the app (itemized receipts only)
    pub item_name: Option<String>,

    pub category: Category,

    /// Price, always finite, positive and below the currency ceiling
    pub price: Option<f64>,

    pub currency: Currency,

    pub billing_cycle: Option<BillingCycle>,

    /// Bare sender address of the source email
    pub source_address: String,

    /// Date of the source email
    pub detected_date: DateTime<Utc>,

    pub confidence: f64,

    /// Purchase type (itemized receipts only)
    pub purchase_type: Option<PurchaseType>,

    /// Whether the source email matched a receipt/billing keyword
    pub billing_related: bool,
}

/// One payment contributing to a subscription's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentRecord {
    pub date: DateTime<Utc>,
    pub price: f64,
    pub currency: Currency,
}
