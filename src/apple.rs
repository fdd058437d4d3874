//! Apple receipt itemization
//!
//! An Apple receipt bundles several purchases in one body. Every purchase
//! line ends with the "問題を報告する" ("Report a Problem") link followed by
//! its price, so the scanner walks the body collecting text until such an
//! anchor closes the group. The collected text then holds the app name, the
//! item name and the purchase-type markers for that one purchase.

use crate::catalog::{KnownAppCatalog, ServiceCatalog};
use crate::normalize::{body_lines, normalize_text};
use crate::price::{PriceWindow, parse_amount};
use crate::types::{BillingCycle, Category, EmailAddress, PurchaseType, RawEmail};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, trace};

static APPLE_SENDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:no_reply|no-reply|noreply|do_not_reply)@(?:email\.|insideapple\.)?apple\.com$")
        .unwrap()
});

static RECEIPT_SUBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)領収書|請求書|ご購入|レシート|receipt|invoice").unwrap()
});

/// Tax breakdown attached to each line, e.g. "JCT（10%）を含む ¥64"
static TAX_DISCLOSURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)JCT\s*[（(]\s*\d+\s*[%％]\s*[）)]\s*を含む\s*[¥￥]\s*[\d,]+|includes\s+JCT\s*(?:[（(]\s*\d+\s*[%％]\s*[）)])?\s*[¥￥]\s*[\d,]+",
    )
    .unwrap()
});

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:問題を報告する|(?i:report\s+a\s+problem))\s*[¥￥]\s*(\d[\d,]*\d|\d)").unwrap()
});

static YEARLY_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)[（(]\s*(?:年額|yearly|annual)\s*[）)]").unwrap());

static MONTHLY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[（(]\s*(?:月額|monthly)\s*[）)]|更新\s*[：:]|\brenews\s").unwrap()
});

static IN_APP_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)アプリ内課金|App内課金|in-app\s+purchase").unwrap());

/// Everything up to the last store marker or order metadata label
static LEADING_BOILERPLATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^.*(?:App\s*Store|(?:注文ID|注文番号|書類番号|Order\s+ID|Document\s+No\.?)\s*[：:]?\s*\S+)\s*",
    )
    .unwrap()
});

static RENEWAL_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)更新\s*[：:]\s*\S+|\brenews\s+[a-z]+\s+\d{1,2},?\s*\d{4}").unwrap()
});

static CYCLE_PARENTHETICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[（(]\s*(?:月額|年額|週額|monthly|yearly|annual|weekly)\s*[）)]").unwrap()
});

/// In-app marker plus whatever follows it (account or device name)
static TRAILING_IN_APP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:アプリ内課金|App内課金|in-app\s+purchase).*$").unwrap());

/// Words that typically end an item name rather than an app name
const ITEM_SUFFIXES: [&str; 24] = [
    "pass", "premium", "plus", "pro", "coin", "coins", "bundle", "pack", "gem", "gems", "gold",
    "vip", "upgrade", "monthly", "yearly", "weekly", "membership", "subscription", "tier",
    "season", "ticket", "tickets", "set", "points",
];

const JA_ITEM_SUFFIXES: [&str; 12] = [
    "パス", "プレミアム", "プラス", "コイン", "パック", "セット", "ジェム", "チケット", "石",
    "会員", "プラン", "バンドル",
];

const CONNECTORS: [&str; 6] = ["-", "–", "x", "×", "&", "+"];

/// One purchase found on an itemized receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReceiptItem {
    pub app_name: String,
    pub item_name: Option<String>,
    pub category: Category,

    /// Price in yen
    pub price: f64,

    pub purchase_type: PurchaseType,
    pub billing_cycle: Option<BillingCycle>,
}

/// Scanner state between anchors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Nothing collected since the last anchor; an anchor here is orphaned
    SeekingAnchor,
    /// Text collected for a purchase; the next anchor closes it
    InContextWindow,
}

/// Input to the scanner, in body order
#[derive(Debug)]
enum ScanEvent<'h> {
    /// Text between two anchors
    Text(&'h str),
    /// A "report a problem" link with the raw amount that follows it
    Anchor(&'h str),
}

/// Split the receipt into text runs and anchors
fn scan_events(body: &str) -> Vec<ScanEvent<'_>> {
    let mut events = Vec::new();
    let mut cursor = 0;
    for caps in ANCHOR.captures_iter(body) {
        let (Some(anchor), Some(amount)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        events.push(ScanEvent::Text(&body[cursor..anchor.start()]));
        events.push(ScanEvent::Anchor(amount.as_str()));
        cursor = anchor.end();
    }
    events.push(ScanEvent::Text(&body[cursor..]));
    events
}

/// Lines collected for the purchase the next anchor will close
#[derive(Debug, Default)]
struct ReceiptLineGroup {
    lines: Vec<String>,
}

impl ReceiptLineGroup {
    fn push_segment(&mut self, segment: &str) {
        self.lines.extend(
            segment
                .lines()
                .map(normalize_text)
                .filter(|l| !l.is_empty()),
        );
    }

    fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn take_context(&mut self) -> String {
        let context = self.lines.join(" ");
        self.lines.clear();
        context
    }
}

/// Check the Apple receipt precondition: Apple receipt sender and a
/// receipt/invoice keyword in the subject
#[must_use]
pub fn is_apple_receipt(email: &RawEmail) -> bool {
    let sender = EmailAddress::parse(&email.from)
        .map_or_else(|| email.from.trim().to_string(), |a| a.address);
    APPLE_SENDER.is_match(&sender) && RECEIPT_SUBJECT.is_match(&email.subject)
}

/// Purchase type and billing cycle implied by the markers in `context`
#[must_use]
pub fn classify_purchase(context: &str) -> (PurchaseType, Option<BillingCycle>) {
    if YEARLY_MARKER.is_match(context) {
        (PurchaseType::Subscription, Some(BillingCycle::Yearly))
    } else if MONTHLY_MARKER.is_match(context) {
        (PurchaseType::Subscription, Some(BillingCycle::Monthly))
    } else if IN_APP_MARKER.is_match(context) {
        (PurchaseType::InAppPurchase, None)
    } else {
        (PurchaseType::OneTime, None)
    }
}

/// Remove store markers, order metadata, renewal dates, cycle parentheticals
/// and the in-app marker, leaving "app name + item name"
#[must_use]
pub fn strip_boilerplate(context: &str) -> String {
    let text = normalize_text(context);
    let text = LEADING_BOILERPLATE.replace(&text, "");
    let text = TRAILING_IN_APP.replace(&text, "");
    let text = RENEWAL_DATE.replace_all(&text, " ");
    let text = CYCLE_PARENTHETICAL.replace_all(&text, " ");
    normalize_text(&text)
        .trim_end_matches([' ', '-', ':', '：'])
        .to_string()
}

fn is_connector(token: &str) -> bool {
    CONNECTORS.contains(&token)
}

fn is_item_token(token: &str) -> bool {
    let lower = token.to_lowercase();
    if ITEM_SUFFIXES.contains(&lower.as_str()) || JA_ITEM_SUFFIXES.iter().any(|s| token.ends_with(s)) {
        return true;
    }
    if token.chars().all(|c| c.is_ascii_digit() || c == ',') {
        return true;
    }
    // All-caps words such as "BRAWL" or "VIP", optionally with digits ("X100")
    let letters = token.chars().filter(char::is_ascii_alphabetic).count();
    letters >= 2
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '-' | '+' | '\''))
}

/// Split a residual string with the generic suffix heuristic.
///
/// The trailing run of item-like tokens becomes the item name; at least one
/// token is always left for the app name. Returns `None` when there is no
/// such run.
#[must_use]
pub fn split_generic(residual: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = residual.split_whitespace().collect();
    if tokens.len() < 2 {
        return None;
    }

    let mut start = tokens.len();
    while start > 1 && (is_item_token(tokens[start - 1]) || is_connector(tokens[start - 1])) {
        start -= 1;
    }
    // A run may not begin with a connector
    while start < tokens.len() && is_connector(tokens[start]) {
        start += 1;
    }

    let run = &tokens[start..];
    let has_word = run
        .iter()
        .any(|t| !is_connector(t) && !t.chars().all(|c| c.is_ascii_digit() || c == ','));
    if run.is_empty() || !has_word {
        return None;
    }

    let app = tokens[..start].join(" ");
    let app = app.trim_end_matches([' ', '-', ':']).to_string();
    if app.is_empty() {
        return None;
    }
    Some((app, run.join(" ")))
}

/// Itemizes Apple receipts into individual purchases
#[derive(Debug, Clone)]
pub struct AppleItemizer {
    known_apps: KnownAppCatalog,
    services: ServiceCatalog,
    window: PriceWindow,
}

impl Default for AppleItemizer {
    fn default() -> Self {
        Self::new(
            KnownAppCatalog::default(),
            ServiceCatalog::default(),
            PriceWindow::new(50.0, 100_000.0),
        )
    }
}

impl AppleItemizer {
    #[must_use]
    pub const fn new(known_apps: KnownAppCatalog, services: ServiceCatalog, window: PriceWindow) -> Self {
        Self {
            known_apps,
            services,
            window,
        }
    }

    /// Itemize a receipt email's body. Does not check the Apple precondition.
    ///
    /// The plain-text rendition is read first. When it holds no purchases
    /// (often a "view this receipt in HTML" stub), the HTML rendition is
    /// itemized instead.
    #[must_use]
    pub fn itemize_email(&self, email: &RawEmail) -> Vec<ReceiptItem> {
        let items = self.itemize(&body_lines(email.body_text.as_deref(), None));
        if !items.is_empty() {
            return items;
        }
        match email.body_html.as_deref() {
            Some(html) => {
                trace!("no purchases in text rendition, itemizing HTML");
                self.itemize(&body_lines(None, Some(html)))
            }
            None => items,
        }
    }

    /// Itemize normalized, non-empty body lines
    #[must_use]
    pub fn itemize(&self, lines: &[String]) -> Vec<ReceiptItem> {
        let joined = lines.join("\n");
        let cleaned = TAX_DISCLOSURE.replace_all(&joined, " ");

        let mut state = ScanState::SeekingAnchor;
        let mut group = ReceiptLineGroup::default();
        let mut seen: HashSet<(String, u64)> = HashSet::new();
        let mut items = Vec::new();

        for event in scan_events(&cleaned) {
            state = match (state, event) {
                (_, ScanEvent::Text(text)) => {
                    group.push_segment(text);
                    if group.is_empty() {
                        ScanState::SeekingAnchor
                    } else {
                        ScanState::InContextWindow
                    }
                }
                (ScanState::SeekingAnchor, ScanEvent::Anchor(raw)) => {
                    trace!(amount = raw, "anchor without context skipped");
                    ScanState::SeekingAnchor
                }
                (ScanState::InContextWindow, ScanEvent::Anchor(raw)) => {
                    let context = group.take_context();
                    if let Some(item) = self.close_group(&context, raw) {
                        if seen.insert((item.app_name.clone(), item.price.to_bits())) {
                            debug!(
                                app = %item.app_name,
                                item = ?item.item_name,
                                price = item.price,
                                purchase_type = ?item.purchase_type,
                                "itemized purchase"
                            );
                            items.push(item);
                        } else {
                            trace!(app = %item.app_name, "duplicate receipt line skipped");
                        }
                    }
                    ScanState::SeekingAnchor
                }
            };
        }

        if state == ScanState::InContextWindow {
            trace!("trailing text without anchor dropped");
        }
        items
    }

    /// Validate the anchor amount and resolve the collected context
    fn close_group(&self, context: &str, raw_amount: &str) -> Option<ReceiptItem> {
        let amount = parse_amount(raw_amount)?;
        if !self.window.contains(amount) {
            trace!(amount, "implausible receipt amount skipped");
            return None;
        }
        self.resolve(context, amount)
    }

    /// Turn one context window into a purchase
    fn resolve(&self, context: &str, price: f64) -> Option<ReceiptItem> {
        let (purchase_type, billing_cycle) = classify_purchase(context);
        let residual = strip_boilerplate(context);
        if residual.is_empty() {
            return None;
        }

        let (app_name, item_name) = self.split_names(&residual);
        let (app_name, category) = self.reconcile(app_name, item_name.as_deref());

        Some(ReceiptItem {
            app_name,
            item_name,
            category,
            price,
            purchase_type,
            billing_cycle,
        })
    }

    /// Known apps first, then the suffix heuristic, then the whole residual
    fn split_names(&self, residual: &str) -> (String, Option<String>) {
        if let Some(split) = self.known_apps.split(residual) {
            return split;
        }
        if let Some((app, item)) = split_generic(residual) {
            return (app, Some(item));
        }
        (residual.to_string(), None)
    }

    /// Prefer a catalog service's canonical name and category when the app,
    /// the item or both together name a known service
    fn reconcile(&self, app_name: String, item_name: Option<&str>) -> (String, Category) {
        let combined = item_name.map(|item| format!("{app_name} {item}"));
        let hit = self
            .services
            .first_match(&app_name)
            .or_else(|| item_name.and_then(|i| self.services.first_match(i)))
            .or_else(|| combined.as_deref().and_then(|c| self.services.first_match(c)));

        match hit {
            Some(service) => (service.name.clone(), service.category),
            None => (app_name, Category::Other),
        }
    }
}
