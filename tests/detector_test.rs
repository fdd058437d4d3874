use chrono::{TimeZone, Utc};
use regex::Regex;
use subscription_extract::*;

fn email(subject: &str, from: &str, body: &str) -> RawEmail {
    RawEmail::new(subject, from, Utc.with_ymd_and_hms(2026, 1, 2, 9, 0, 0).unwrap()).with_text(body)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

const APPLE_RECEIPT: &str = "App Store ARK: Ultimate Mobile Edition ARK Pass - Monthly (月額) \
     更新：2026年2月2日 問題を報告する ¥700 JCT（10%）を含む ¥64 ブロスタ BRAWL PASS PLUS UPGRADE \
     アプリ内課金 大にっし〜 問題を報告する ¥800 JCT（10%）を含む ¥73 小計 ¥1,363 JCT10%課税 ¥137 \
     合計 ¥1,500";

#[test]
fn test_sender_matched_detection() {
    let found = Detector::default().detect(&email(
        "Netflix: お支払いのお知らせ",
        "Netflix <info@account.netflix.com>",
        "ご利用料金 ¥1,490 (月額)",
    ));

    assert_eq!(found.len(), 1);
    let netflix = &found[0];
    assert_eq!(netflix.name, "Netflix");
    assert_eq!(netflix.category, Category::Streaming);
    assert_eq!(netflix.price, Some(1490.0));
    assert_eq!(netflix.currency, Currency::Jpy);
    assert_eq!(netflix.billing_cycle, Some(BillingCycle::Monthly));
    assert_eq!(netflix.source_address, "info@account.netflix.com");
    assert!(netflix.billing_related);
    assert!(netflix.purchase_type.is_none());
}

#[test]
fn test_confidence_is_not_a_probability() {
    // Every signal on the sender-matched path adds up past 1.0
    let found = Detector::default().detect(&email(
        "Netflix: お支払いのお知らせ",
        "info@account.netflix.com",
        "ご利用料金 ¥1,490 (月額)",
    ));

    assert!(approx(found[0].confidence, 1.15));
    assert!(found[0].confidence > 1.0);
}

#[test]
fn test_generic_detection() {
    let found = Detector::default().detect(&email(
        "news",
        "friend@example.com",
        "I started Spotify Premium for ¥980 per month",
    ));

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Spotify");
    assert_eq!(found[0].price, Some(980.0));
    assert_eq!(found[0].billing_cycle, Some(BillingCycle::Monthly));
    assert!(!found[0].billing_related);
    assert!(approx(found[0].confidence, 0.65));
}

#[test]
fn test_generic_uses_lenient_yen_window() {
    let found = Detector::default().detect(&email("hello", "friend@example.com", "Hulu ¥60"));
    assert_eq!(found[0].price, Some(60.0));
}

#[test]
fn test_sender_matched_uses_strict_yen_window() {
    let found = Detector::default().detect(&email("Hulu", "billing@hulu.jp", "Hulu ¥60"));
    assert_eq!(found[0].price, None);
}

#[test]
fn test_empty_email_yields_nothing() {
    let empty = RawEmail::new("", "someone@example.com", Utc::now());
    assert!(Detector::default().detect(&empty).is_empty());
}

#[test]
fn test_empty_body_from_service_sender_yields_nothing() {
    let bare = RawEmail::new("", "info@netflix.com", Utc::now());
    assert!(Detector::default().detect(&bare).is_empty());

    let blank = email("", "Netflix <info@account.netflix.com>", "   ");
    assert!(Detector::default().detect(&blank).is_empty());
}

#[test]
fn test_empty_body_with_billing_subject_still_detects() {
    let found = Detector::default().detect(&RawEmail::new(
        "お支払いのお知らせ",
        "info@netflix.com",
        Utc::now(),
    ));

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Netflix");
    assert!(found[0].billing_related);
    // Sender match base plus the billing keyword
    assert!(approx(found[0].confidence, 0.8));
}

#[test]
fn test_empty_body_with_service_subject_still_detects() {
    let found = Detector::default().detect(&RawEmail::new("Spotify", "friend@example.com", Utc::now()));
    assert_eq!(found[0].name, "Spotify");
    assert!(approx(found[0].confidence, 0.3));
}

#[test]
fn test_unrelated_email_yields_nothing() {
    let found = Detector::default().detect(&email(
        "Lunch",
        "friend@example.com",
        "See you at noon",
    ));
    assert!(found.is_empty());
}

#[test]
fn test_apple_receipt_is_itemized() {
    let found = Detector::default().detect(&email(
        "Apple からの領収書です。",
        "App Store <no_reply@email.apple.com>",
        APPLE_RECEIPT,
    ));

    assert_eq!(found.len(), 2);

    assert_eq!(found[0].name, "ARK: Ultimate Mobile Edition");
    assert_eq!(found[0].item_name.as_deref(), Some("ARK Pass - Monthly"));
    assert_eq!(found[0].price, Some(700.0));
    assert_eq!(found[0].purchase_type, Some(PurchaseType::Subscription));
    assert_eq!(found[0].billing_cycle, Some(BillingCycle::Monthly));
    assert!(approx(found[0].confidence, 1.15));

    assert_eq!(found[1].name, "ブロスタ");
    assert_eq!(found[1].price, Some(800.0));
    assert_eq!(found[1].purchase_type, Some(PurchaseType::InAppPurchase));
    assert_eq!(found[1].billing_cycle, None);
    assert!(approx(found[1].confidence, 1.0));
}

#[test]
fn test_apple_receipt_html_behind_text_stub() {
    let receipt = RawEmail::new(
        "Apple からの領収書です。",
        "App Store <no_reply@email.apple.com>",
        Utc::now(),
    )
    .with_text("この領収書は HTML 形式で表示してください。")
    .with_html("<table><tr><td>Minecraft</td><td>問題を報告する</td><td>&yen;980</td></tr></table>");

    let found = Detector::default().detect(&receipt);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Minecraft");
    assert_eq!(found[0].price, Some(980.0));
}

#[test]
fn test_apple_receipt_without_anchor_does_not_fall_back() {
    let found = Detector::default().detect(&email(
        "Apple からの領収書です。",
        "no_reply@email.apple.com",
        "Netflix ¥1,490 (月額)",
    ));
    assert!(found.is_empty());
}

#[test]
fn test_scan_deduplicates_and_ranks() {
    let emails = vec![
        email("hello", "friend@example.com", "Netflix is great"),
        email(
            "Netflix: お支払いのお知らせ",
            "info@account.netflix.com",
            "ご利用料金 ¥1,490 (月額)",
        ),
        email("hello", "friend@example.com", "Spotify ¥980"),
    ];
    let found = Detector::default().scan(&emails);

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "Netflix");
    assert_eq!(found[0].price, Some(1490.0));
    assert_eq!(found[1].name, "Spotify");
}

#[test]
fn test_scan_parallel_matches_sequential() {
    let emails = vec![
        email("Apple からの領収書です。", "no_reply@email.apple.com", APPLE_RECEIPT),
        email("お支払い", "info@account.netflix.com", "Netflix ¥1,490 月額"),
        email("hello", "friend@example.com", "Spotify ¥980"),
        email("hello", "friend@example.com", "Spotify ¥1,080"),
    ];
    let detector = Detector::default();

    assert_eq!(detector.scan_parallel(&emails), detector.scan(&emails));
}

#[test]
fn test_aggregate_collects_payment_history() {
    let emails = vec![
        email("お支払いのお知らせ", "info@account.netflix.com", "Netflix ¥1,490"),
        email("お支払いのお知らせ", "info@account.netflix.com", "Netflix ¥1,490"),
    ];
    let aggregator = Detector::default().aggregate(&emails);

    assert_eq!(aggregator.payment_history("Netflix").len(), 2);
    assert_eq!(aggregator.total_paid("Netflix"), 2980.0);
}

#[test]
fn test_scan_messages_skips_unparseable() {
    let good = b"From: Netflix <info@account.netflix.com>\r\n\
                 Subject: Your Netflix receipt\r\n\
                 Date: Fri, 02 Jan 2026 09:00:00 +0000\r\n\
                 \r\n\
                 Your monthly membership: $15.49";
    let bad = b"Subject: no sender here\r\n\r\nbody";

    let report = Detector::default().scan_messages([&good[..], &bad[..]]);

    assert_eq!(report.scanned, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.subscriptions.len(), 1);
    assert_eq!(report.subscriptions[0].name, "Netflix");
    assert_eq!(report.subscriptions[0].price, Some(15.49));
    assert_eq!(report.subscriptions[0].currency, Currency::Usd);
    assert_eq!(report.payments["Netflix"].len(), 1);
}

#[test]
fn test_detector_from_config() {
    let config = DetectorConfig::from_json(
        r#"{
            "scoring": { "base_generic": 0.25 },
            "services": [
                { "name": "Acme Cloud", "pattern": "acme\\s*cloud", "category": "cloud" }
            ]
        }"#,
    )
    .unwrap();
    let detector = Detector::new(&config).unwrap();

    let found = detector.detect(&email("hi", "friend@example.com", "Acme Cloud storage"));
    assert_eq!(found[0].name, "Acme Cloud");
    assert_eq!(found[0].category, Category::Cloud);
    assert!(approx(found[0].confidence, 0.25));

    // Built-in services are replaced, not extended
    assert!(detector.detect(&email("hi", "friend@example.com", "Netflix")).is_empty());
}

#[test]
fn test_detector_rejects_invalid_config_pattern() {
    let config = DetectorConfig {
        known_apps: Some(vec![KnownAppEntry::new("Broken", "(")]),
        ..DetectorConfig::default()
    };
    assert!(matches!(
        Detector::new(&config),
        Err(ParseError::InvalidPattern { .. })
    ));
}

#[test]
fn test_detector_from_substitute_parts() {
    let services = ServiceCatalog::from_entries([ServiceEntry::new(
        "Acme Cloud",
        r"acme",
        Category::Cloud,
        &["acme.example"],
    )])
    .unwrap();
    let prices = PriceExtractor::with_patterns(
        vec![(Currency::Usd, Regex::new(r"(\d+)\s*credits").unwrap())],
        PriceWindows::default(),
    );
    let cycles = CycleExtractor::with_patterns(vec![(BillingCycle::Quarterly, Regex::new(r"(?i)per\s+term").unwrap())]);
    let weights = ScoringWeights {
        base_sender_matched: 0.4,
        price: 0.1,
        cycle: 0.1,
        billing_keyword: 0.0,
        ..ScoringWeights::default()
    };
    let detector = Detector::from_parts(
        ServiceClassifier::new(services.clone()),
        prices,
        cycles,
        AppleItemizer::new(KnownAppCatalog::default(), services, PriceWindow::new(50.0, 100_000.0)),
        ConfidenceScorer::new(weights),
    );

    let found = detector.detect(&email(
        "Acme invoice",
        "billing@acme.example",
        "¥1,490 monthly, or 12 credits per term",
    ));

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Acme Cloud");
    // Only the substitute lists apply: the yen amount and "monthly" are ignored
    assert_eq!(found[0].price, Some(12.0));
    assert_eq!(found[0].currency, Currency::Usd);
    assert_eq!(found[0].billing_cycle, Some(BillingCycle::Quarterly));
    assert!(approx(found[0].confidence, 0.6));
}
