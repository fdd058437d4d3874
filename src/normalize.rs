//! Body text normalization
//!
//! Turns plain text and/or HTML bodies into text suitable for pattern
//! matching. Everything here is a pure function of its input; a missing body
//! yields an empty string, which downstream stages treat as "no match".

/// Tags whose closing (or self-closing) form ends a line
const BLOCK_TAGS: [&str; 10] = ["br", "/p", "/div", "/li", "/h", "/tr", "/table", "hr", "/td", "/th"];

/// Entities decoded after tag stripping. `&amp;` is decoded last so that
/// escaped entities are not decoded twice.
const ENTITIES: [(&str, &str); 10] = [
    ("&nbsp;", " "),
    ("&#160;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&yen;", "¥"),
    ("&#165;", "¥"),
    ("&#xa5;", "¥"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Case-insensitive ASCII prefix test at byte offset `i`
fn starts_with_at(s: &str, i: usize, prefix: &str) -> bool {
    s.get(i..i + prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Elements whose content is raw text, skipped up to their closing tag
const RAW_TEXT_TAGS: [&str; 2] = ["script", "style"];

/// Strip tags from an HTML body, keeping block structure as line breaks.
///
/// `<style>` and `<script>` contents are dropped entirely, including any
/// `<` they contain. Each resulting line is whitespace-collapsed; empty
/// lines are removed.
#[must_use]
pub fn strip_html(html: &str) -> String {
    let lower = html.to_ascii_lowercase();
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;
    let mut tag_start: usize = 0;
    let mut resume_at: usize = 0;

    for (i, c) in html.char_indices() {
        if i < resume_at {
            continue;
        }
        if !in_tag && c == '<' {
            if let Some(name) = RAW_TEXT_TAGS.iter().find(|name| starts_with_at(html, i + 1, name)) {
                // ASCII lowercasing keeps byte offsets, so `lower` indexes `html`
                let close = format!("</{name}");
                resume_at = lower[i..]
                    .find(&close)
                    .and_then(|at| lower[i + at..].find('>').map(|gt| i + at + gt + 1))
                    .unwrap_or(html.len());
                result.push(' ');
                continue;
            }
            tag_start = i;
            in_tag = true;
        } else if in_tag && c == '>' {
            in_tag = false;
            let tag = &html[tag_start + 1..i];
            if BLOCK_TAGS.iter().any(|b| starts_with_at(tag, 0, b)) {
                result.push('\n');
            } else {
                // Inline tags still separate words, e.g. adjacent table cells
                result.push(' ');
            }
        } else if !in_tag {
            result.push(c);
        }
    }

    let decoded = ENTITIES
        .iter()
        .fold(result, |acc, &(entity, replacement)| acc.replace(entity, replacement));

    decoded
        .lines()
        .map(normalize_text)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse every whitespace run (including ideographic spaces) to a single
/// space and trim. Idempotent.
#[must_use]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pick the best available body, preferring non-blank plain text over HTML.
///
/// The result keeps line breaks.
#[must_use]
pub fn body_source(text: Option<&str>, html: Option<&str>) -> String {
    match (text, html) {
        (Some(t), _) if !t.trim().is_empty() => t.to_string(),
        (_, Some(h)) => strip_html(h),
        _ => String::new(),
    }
}

/// Normalized single-line body blob
#[must_use]
pub fn normalize_body(text: Option<&str>, html: Option<&str>) -> String {
    normalize_text(&body_source(text, html))
}

/// Normalized body split into non-empty, trimmed lines in document order
#[must_use]
pub fn body_lines(text: Option<&str>, html: Option<&str>) -> Vec<String> {
    body_source(text, html)
        .lines()
        .map(normalize_text)
        .filter(|l| !l.is_empty())
        .collect()
}
