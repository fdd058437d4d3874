//! RFC 5322 message sources to `RawEmail`

use crate::error::{ParseError, Result};
use crate::types::{EmailAddress, RawEmail};
use chrono::{DateTime, Utc};
use mailparse::{MailHeader, MailHeaderMap, ParsedMail};
use tracing::debug;

/// Parse raw message bytes (as fetched from a mailbox) into a `RawEmail`
pub fn parse_email(raw: &[u8]) -> Result<RawEmail> {
    let parsed = mailparse::parse_mail(raw).map_err(|e| ParseError::Structure(e.to_string()))?;

    let from = extract_from(&parsed.headers)?;
    let subject = parsed.headers.get_first_value("Subject").unwrap_or_default();
    let date = extract_date(&parsed.headers);
    let body_text = find_body(&parsed, "text/plain");
    let body_html = find_body(&parsed, "text/html");

    debug!(
        subject = %subject,
        from = %from,
        has_text = body_text.is_some(),
        has_html = body_html.is_some(),
        "parsed message"
    );

    Ok(RawEmail {
        subject,
        from,
        body_text,
        body_html,
        date,
    })
}

fn extract_from(headers: &[MailHeader]) -> Result<String> {
    let from_header = headers
        .get_first_value("From")
        .ok_or_else(|| ParseError::MissingHeader("From".into()))?;

    if EmailAddress::parse(&from_header).is_none() {
        return Err(ParseError::InvalidHeader {
            header: "From".into(),
            details: format!("Could not parse: {from_header}"),
        });
    }
    Ok(from_header)
}

fn extract_date(headers: &[MailHeader]) -> DateTime<Utc> {
    headers
        .get_first_value("Date")
        .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok())
        .map_or_else(Utc::now, |dt| dt.with_timezone(&Utc))
}

/// Depth-first search for the first decodable part of `mimetype`
fn find_body(mail: &ParsedMail, mimetype: &str) -> Option<String> {
    if mail.ctype.mimetype.eq_ignore_ascii_case(mimetype)
        && let Ok(body) = mail.get_body()
    {
        return Some(body);
    }
    mail.subparts.iter().find_map(|part| find_body(part, mimetype))
}
