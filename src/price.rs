//! Price and billing-cycle extraction from normalized text

use crate::types::{BillingCycle, Currency};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::trace;

/// An extracted price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Price {
    pub amount: f64,
    pub currency: Currency,
}

/// Inclusive plausibility window for one currency
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceWindow {
    pub min: f64,
    pub max: f64,
}

impl PriceWindow {
    #[must_use]
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Finite, positive and within `[min, max]`
    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value > 0.0 && value >= self.min && value <= self.max
    }
}

/// How strictly JPY amounts are bounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strictness {
    /// Generic text match: any yen amount below one million
    Lenient,
    /// The sender is the service itself: typical subscription range only
    Strict,
}

/// Per-currency plausibility windows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PriceWindows {
    pub jpy_lenient: PriceWindow,
    pub jpy_strict: PriceWindow,
    pub usd: PriceWindow,
    pub eur: PriceWindow,
}

impl Default for PriceWindows {
    fn default() -> Self {
        Self {
            // Yen has no minor unit, so (0, 1_000_000) is [1, 999_999]
            jpy_lenient: PriceWindow::new(1.0, 999_999.0),
            jpy_strict: PriceWindow::new(100.0, 100_000.0),
            usd: PriceWindow::new(1.0, 1000.0),
            eur: PriceWindow::new(1.0, 1000.0),
        }
    }
}

impl PriceWindows {
    #[must_use]
    pub const fn for_currency(&self, currency: Currency, strictness: Strictness) -> PriceWindow {
        match (currency, strictness) {
            (Currency::Jpy, Strictness::Lenient) => self.jpy_lenient,
            (Currency::Jpy, Strictness::Strict) => self.jpy_strict,
            (Currency::Usd, _) => self.usd,
            (Currency::Eur, _) => self.eur,
        }
    }
}

/// Integer part with well-formed thousands groups, optional cents
static GROUPED_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d{1,2})?$").unwrap());

/// Continental notation, e.g. "9,99" or "1.299,00"
static DECIMAL_COMMA_AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\d{1,3}(?:\.\d{3})+|\d+),\d{2}$").unwrap());

/// Parse an amount token, stripping thousands separators.
///
/// A comma only separates thousands when followed by exactly three digits;
/// any other grouping ("12,34", "1,4900") is rejected.
#[must_use]
pub fn parse_amount(raw: &str) -> Option<f64> {
    if !GROUPED_AMOUNT.is_match(raw) {
        return None;
    }
    raw.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse an amount token in the notation customary for `currency`.
///
/// Euro amounts also accept a decimal comma.
#[must_use]
pub fn parse_amount_for(raw: &str, currency: Currency) -> Option<f64> {
    if currency == Currency::Eur && DECIMAL_COMMA_AMOUNT.is_match(raw) {
        let dotted = raw.replace('.', "").replace(',', ".");
        return dotted.parse::<f64>().ok().filter(|v| v.is_finite());
    }
    parse_amount(raw)
}

// Capture the whole numeric run; parse_amount_for decides if it is well formed
const AMOUNT: &str = r"(\d[\d,.]*\d|\d)";

static PRICE_PATTERNS: LazyLock<Vec<(Currency, Regex)>> = LazyLock::new(|| {
    let patterns = [
        (Currency::Jpy, format!(r"[¥￥]\s*{AMOUNT}")),
        (Currency::Jpy, format!(r"{AMOUNT}\s*円")),
        (Currency::Jpy, format!(r"(?i)JPY\s*{AMOUNT}")),
        (Currency::Jpy, format!(r"(?i){AMOUNT}\s*JPY")),
        (Currency::Usd, format!(r"\$\s*{AMOUNT}")),
        (Currency::Usd, format!(r"(?i)USD\s*{AMOUNT}")),
        (Currency::Usd, format!(r"(?i){AMOUNT}\s*USD")),
        (Currency::Eur, format!(r"€\s*{AMOUNT}")),
        (Currency::Eur, format!(r"(?i)EUR\s*{AMOUNT}")),
        (Currency::Eur, format!(r"(?i){AMOUNT}\s*(?:€|EUR)")),
    ];
    patterns
        .into_iter()
        .map(|(c, p)| (c, Regex::new(&p).unwrap()))
        .collect()
});

/// Ordered, currency-tagged price matcher
#[derive(Debug, Clone)]
pub struct PriceExtractor {
    patterns: Vec<(Currency, Regex)>,
    windows: PriceWindows,
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new(PriceWindows::default())
    }
}

impl PriceExtractor {
    /// Built-in patterns with the given windows
    #[must_use]
    pub fn new(windows: PriceWindows) -> Self {
        Self {
            patterns: PRICE_PATTERNS.clone(),
            windows,
        }
    }

    /// Custom pattern list; each regex must capture the amount in group 1
    #[must_use]
    pub const fn with_patterns(patterns: Vec<(Currency, Regex)>, windows: PriceWindows) -> Self {
        Self { patterns, windows }
    }

    /// First plausible price in pattern order.
    ///
    /// Within one pattern every occurrence is tried in document order; an
    /// implausible amount (order numbers, phone fragments) moves on to the
    /// next occurrence, then to the next pattern.
    #[must_use]
    pub fn extract(&self, text: &str, strictness: Strictness) -> Option<Price> {
        for (currency, regex) in &self.patterns {
            let window = self.windows.for_currency(*currency, strictness);
            for caps in regex.captures_iter(text) {
                let Some(amount) = caps.get(1).and_then(|m| parse_amount_for(m.as_str(), *currency)) else {
                    continue;
                };
                if window.contains(amount) {
                    return Some(Price {
                        amount,
                        currency: *currency,
                    });
                }
                trace!(amount, currency = %currency, "implausible price skipped");
            }
        }
        None
    }
}

static CYCLE_PATTERNS: LazyLock<Vec<(BillingCycle, Regex)>> = LazyLock::new(|| {
    let patterns = [
        (
            BillingCycle::Monthly,
            r"月額|毎月|月払い|/\s*月|per\s+month|\bmonthly\b|/\s*mo\b|every\s+month",
        ),
        (
            BillingCycle::Yearly,
            r"年額|毎年|年払い|年間プラン|/\s*年|per\s+year|\byearly\b|\bannual(?:ly)?\b|/\s*yr\b|every\s+year",
        ),
        (
            BillingCycle::Weekly,
            r"週額|毎週|週払い|per\s+week|\bweekly\b|every\s+week",
        ),
        (
            BillingCycle::Quarterly,
            r"四半期|3\s*[ヶか]月(?:ごと|毎)|\bquarterly\b|every\s+(?:3|three)\s+months",
        ),
    ];
    patterns
        .into_iter()
        .map(|(cycle, p)| (cycle, Regex::new(&format!("(?i){p}")).unwrap()))
        .collect()
});

/// Ordered billing-cycle keyword matcher. Never defaults to monthly.
#[derive(Debug, Clone)]
pub struct CycleExtractor {
    patterns: Vec<(BillingCycle, Regex)>,
}

impl Default for CycleExtractor {
    fn default() -> Self {
        Self {
            patterns: CYCLE_PATTERNS.clone(),
        }
    }
}

impl CycleExtractor {
    #[must_use]
    pub const fn with_patterns(patterns: Vec<(BillingCycle, Regex)>) -> Self {
        Self { patterns }
    }

    #[must_use]
    pub fn extract(&self, text: &str) -> Option<BillingCycle> {
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(text))
            .map(|(cycle, _)| *cycle)
    }
}
