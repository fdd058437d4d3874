use chrono::{TimeZone, Utc};
use subscription_extract::*;

fn detection(name: &str, confidence: f64, price: Option<f64>, billing_related: bool) -> DetectedSubscription {
    DetectedSubscription {
        name: name.to_string(),
        item_name: None,
        category: Category::Streaming,
        price,
        currency: Currency::Jpy,
        billing_cycle: Some(BillingCycle::Monthly),
        source_address: "info@example.com".to_string(),
        detected_date: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
        confidence,
        purchase_type: None,
        billing_related,
    }
}

#[test]
fn test_keeps_higher_confidence() {
    let mut aggregator = Aggregator::new();
    aggregator.add(detection("Netflix", 0.65, None, false));
    aggregator.add(detection("Netflix", 0.8, Some(1490.0), false));

    let ranked = aggregator.into_ranked();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].confidence, 0.8);
    assert_eq!(ranked[0].price, Some(1490.0));
}

#[test]
fn test_keeps_higher_confidence_regardless_of_order() {
    let mut aggregator = Aggregator::new();
    aggregator.add(detection("Netflix", 0.8, Some(1490.0), false));
    aggregator.add(detection("Netflix", 0.65, None, false));

    let ranked = aggregator.into_ranked();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].confidence, 0.8);
}

#[test]
fn test_tie_keeps_earlier() {
    let mut aggregator = Aggregator::new();
    aggregator.add(detection("Spotify", 0.5, Some(980.0), false));
    aggregator.add(detection("Spotify", 0.5, Some(1480.0), false));

    let ranked = aggregator.into_ranked();
    assert_eq!(ranked[0].price, Some(980.0));
}

#[test]
fn test_key_is_case_sensitive() {
    let mut aggregator = Aggregator::new();
    aggregator.add(detection("Netflix", 0.5, None, false));
    aggregator.add(detection("NETFLIX", 0.5, None, false));

    assert_eq!(aggregator.len(), 2);
}

#[test]
fn test_sorted_by_descending_confidence() {
    let mut aggregator = Aggregator::new();
    aggregator.extend([
        detection("Hulu", 0.3, None, false),
        detection("Netflix", 1.15, Some(1490.0), true),
        detection("Spotify", 0.65, Some(980.0), false),
        detection("DAZN", 0.65, None, false),
    ]);

    let names: Vec<String> = aggregator.ranked().into_iter().map(|d| d.name).collect();
    assert_eq!(names, vec!["Netflix", "Spotify", "DAZN", "Hulu"]);
}

#[test]
fn test_payment_history() {
    let mut aggregator = Aggregator::new();
    aggregator.add(detection("Netflix", 0.9, Some(1490.0), true));
    aggregator.add(detection("Netflix", 0.9, Some(1490.0), true));
    // Not billing-related: no history entry
    aggregator.add(detection("Netflix", 0.9, Some(990.0), false));
    // No price: no history entry
    aggregator.add(detection("Netflix", 0.9, None, true));

    let history = aggregator.payment_history("Netflix");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].currency, Currency::Jpy);
    assert_eq!(aggregator.total_paid("Netflix"), 2980.0);
}

#[test]
fn test_payment_history_unknown_name() {
    let aggregator = Aggregator::new();
    assert!(aggregator.payment_history("Nothing").is_empty());
    assert_eq!(aggregator.total_paid("Nothing"), 0.0);
}

#[test]
fn test_empty() {
    let aggregator = Aggregator::new();
    assert!(aggregator.is_empty());
    assert!(aggregator.into_ranked().is_empty());
}
