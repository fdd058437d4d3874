use chrono::Utc;
use subscription_extract::*;

// --- EmailAddress ---

#[test]
fn test_email_address_parse_with_name() {
    let addr = EmailAddress::parse("App Store <no_reply@email.apple.com>").unwrap();
    assert_eq!(addr.address, "no_reply@email.apple.com");
    assert_eq!(addr.domain, "email.apple.com");
    assert_eq!(addr.local_part, "no_reply");
    assert_eq!(addr.name.as_deref(), Some("App Store"));
}

#[test]
fn test_email_address_parse_plain() {
    let addr = EmailAddress::parse("info@account.netflix.com").unwrap();
    assert_eq!(addr.address, "info@account.netflix.com");
    assert_eq!(addr.domain, "account.netflix.com");
    assert!(addr.name.is_none());
}

#[test]
fn test_email_address_parse_quoted_name() {
    let addr = EmailAddress::parse("\"Spotify\" <no-reply@spotify.com>").unwrap();
    assert_eq!(addr.name.as_deref(), Some("Spotify"));
    assert_eq!(addr.address, "no-reply@spotify.com");
}

#[test]
fn test_email_address_parse_angle_no_name() {
    let addr = EmailAddress::parse("<bob@test.io>").unwrap();
    assert_eq!(addr.address, "bob@test.io");
    assert!(addr.name.is_none());
}

#[test]
fn test_email_address_domain_is_lowercased() {
    let addr = EmailAddress::parse("Billing@Hulu.JP").unwrap();
    assert_eq!(addr.domain, "hulu.jp");
    assert!(addr.is_from_domain("hulu.jp"));
}

#[test]
fn test_email_address_parse_invalid() {
    assert!(EmailAddress::parse("not an address").is_none());
    assert!(EmailAddress::parse("").is_none());
    assert!(EmailAddress::parse("@example.com").is_none());
}

#[test]
fn test_is_from_domain() {
    let addr = EmailAddress::parse("info@mailer.netflix.com").unwrap();
    assert!(addr.is_from_domain("netflix.com"));
    assert!(addr.is_from_domain("mailer.netflix.com"));
    assert!(!addr.is_from_domain("flix.com"));
    assert!(!addr.is_from_domain("example.com"));
}

#[test]
fn test_email_address_display() {
    let addr = EmailAddress::parse("App Store <no_reply@email.apple.com>").unwrap();
    assert_eq!(addr.to_string(), "App Store <no_reply@email.apple.com>");
}

// --- RawEmail ---

#[test]
fn test_raw_email_builder() {
    let email = RawEmail::new("subject", "Netflix <info@netflix.com>", Utc::now())
        .with_text("text")
        .with_html("<p>html</p>");

    assert_eq!(email.body_text.as_deref(), Some("text"));
    assert_eq!(email.body_html.as_deref(), Some("<p>html</p>"));
    assert_eq!(email.sender_address(), "info@netflix.com");
}

#[test]
fn test_raw_email_sender_fallback() {
    let email = RawEmail::new("subject", "  Mailer Daemon  ", Utc::now());
    assert_eq!(email.sender_address(), "Mailer Daemon");
}

// --- Enums ---

#[test]
fn test_category_serialization() {
    assert_eq!(serde_json::to_string(&Category::Streaming).unwrap(), "\"streaming\"");
    assert_eq!(Category::default(), Category::Other);
    assert_eq!(Category::Fitness.to_string(), "fitness");
}

#[test]
fn test_purchase_type_serialization() {
    assert_eq!(
        serde_json::to_string(&PurchaseType::InAppPurchase).unwrap(),
        "\"in_app_purchase\""
    );
    assert_eq!(serde_json::to_string(&PurchaseType::OneTime).unwrap(), "\"one_time\"");
}

#[test]
fn test_currency_codes() {
    assert_eq!(serde_json::to_string(&Currency::Jpy).unwrap(), "\"JPY\"");
    assert_eq!(Currency::Usd.code(), "USD");
    assert_eq!(Currency::Eur.to_string(), "EUR");
}

#[test]
fn test_billing_cycle_display() {
    assert_eq!(BillingCycle::Quarterly.to_string(), "quarterly");
    assert_eq!(
        serde_json::from_str::<BillingCycle>("\"yearly\"").unwrap(),
        BillingCycle::Yearly
    );
}

#[test]
fn test_config_defaults_and_errors() {
    let config = DetectorConfig::from_json("{}").unwrap();
    assert_eq!(config, DetectorConfig::default());
    assert_eq!(config.itemizer_price_window, PriceWindow::new(50.0, 100_000.0));

    assert!(matches!(
        DetectorConfig::from_json("{ not json"),
        Err(ParseError::Config(_))
    ));
}
