//! Service and app catalogs
//!
//! Catalogs are ordered lists compiled once from plain data. Order is part of
//! the contract: lookups return the first entry that matches, so more
//! specific entries (e.g. "Amazon Prime Video") must precede looser ones
//! ("Amazon Prime").

use crate::error::{ParseError, Result};
use crate::types::{Category, EmailAddress};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Uncompiled service catalog entry, as written in configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEntry {
    /// Canonical display name
    pub name: String,

    /// Case-insensitive pattern matched against free text
    pub pattern: String,

    pub category: Category,

    /// Sender domains that identify the service's own billing mail
    #[serde(default)]
    pub senders: Vec<String>,
}

impl ServiceEntry {
    pub fn new(name: &str, pattern: &str, category: Category, senders: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            category,
            senders: senders.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Compiled service catalog entry
#[derive(Debug, Clone)]
pub struct ServicePattern {
    pub name: String,
    pub category: Category,
    pub senders: Vec<String>,
    regex: Regex,
}

impl ServicePattern {
    pub fn compile(entry: ServiceEntry) -> Result<Self> {
        let regex = compile_case_insensitive(&entry.name, &entry.pattern)?;
        Ok(Self {
            name: entry.name,
            category: entry.category,
            senders: entry.senders,
            regex,
        })
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Whether `sender` comes from one of this service's own domains
    #[must_use]
    pub fn matches_sender(&self, sender: &EmailAddress) -> bool {
        self.senders.iter().any(|d| sender.is_from_domain(d))
    }
}

fn compile_case_insensitive(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){pattern}")).map_err(|source| ParseError::InvalidPattern {
        name: name.to_string(),
        source,
    })
}

/// Ordered, immutable list of service patterns
#[derive(Debug, Clone)]
pub struct ServiceCatalog {
    entries: Vec<ServicePattern>,
}

impl ServiceCatalog {
    /// Compile a catalog, keeping the given order
    pub fn from_entries(entries: impl IntoIterator<Item = ServiceEntry>) -> Result<Self> {
        let entries = entries
            .into_iter()
            .map(ServicePattern::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    /// First entry whose pattern matches `text`
    #[must_use]
    pub fn first_match(&self, text: &str) -> Option<&ServicePattern> {
        self.entries.iter().find(|p| p.is_match(text))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ServicePattern> {
        self.entries.iter()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        BUILTIN_SERVICES.clone()
    }
}

/// Built-in service entries, most specific first
#[must_use]
pub fn builtin_service_entries() -> Vec<ServiceEntry> {
    use Category::{Cloud, Education, Fitness, Gaming, Music, News, Other, Productivity, Streaming};

    vec![
        ServiceEntry::new("Netflix", r"netflix", Streaming, &["netflix.com"]),
        ServiceEntry::new(
            "Amazon Prime Video",
            r"amazon\s*prime\s*video|prime\s*video|プライム・?ビデオ",
            Streaming,
            &["amazon.co.jp", "amazon.com", "primevideo.com"],
        ),
        ServiceEntry::new(
            "Amazon Music Unlimited",
            r"amazon\s*music|アマゾン\s*ミュージック",
            Music,
            &["amazon.co.jp", "amazon.com"],
        ),
        ServiceEntry::new(
            "Kindle Unlimited",
            r"kindle\s*unlimited|キンドル\s*アンリミテッド",
            Education,
            &["amazon.co.jp", "amazon.com"],
        ),
        ServiceEntry::new("Audible", r"audible|オーディブル", Education, &["audible.co.jp", "audible.com"]),
        ServiceEntry::new(
            "Amazon Prime",
            r"amazon\s*prime|amazon\s*プライム|アマゾン\s*プライム|プライム会員",
            Other,
            &["amazon.co.jp", "amazon.com"],
        ),
        ServiceEntry::new(
            "Disney+",
            r"disney\s*\+|disney\s*plus|ディズニープラス|ディズニー\+",
            Streaming,
            &["disneyplus.com"],
        ),
        ServiceEntry::new("Hulu", r"\bhulu\b|フールー", Streaming, &["hulu.jp", "hulu.com"]),
        ServiceEntry::new("U-NEXT", r"\bu-?next\b", Streaming, &["unext.jp"]),
        ServiceEntry::new("DAZN", r"\bdazn\b", Streaming, &["dazn.com"]),
        ServiceEntry::new("ABEMA", r"\babema\b|アベマ", Streaming, &["abema.tv"]),
        ServiceEntry::new("Apple TV+", r"apple\s*tv\s*\+|apple\s*tv\s*plus", Streaming, &[]),
        ServiceEntry::new("YouTube Music", r"youtube\s*music", Music, &[]),
        ServiceEntry::new(
            "YouTube Premium",
            r"youtube\s*premium|youtube\s*プレミアム",
            Streaming,
            &["youtube.com"],
        ),
        ServiceEntry::new("Spotify", r"spotify", Music, &["spotify.com"]),
        ServiceEntry::new("Apple Music", r"apple\s*music", Music, &[]),
        ServiceEntry::new("LINE MUSIC", r"\bline\s*music\b", Music, &["line.me"]),
        ServiceEntry::new("Apple Arcade", r"apple\s*arcade", Gaming, &[]),
        ServiceEntry::new("iCloud+", r"icloud", Cloud, &[]),
        ServiceEntry::new("Google One", r"google\s*one", Cloud, &[]),
        ServiceEntry::new("Dropbox", r"dropbox", Cloud, &["dropbox.com"]),
        ServiceEntry::new(
            "Microsoft 365",
            r"microsoft\s*365|office\s*365",
            Productivity,
            &["microsoft.com"],
        ),
        ServiceEntry::new(
            "Adobe Creative Cloud",
            r"adobe|creative\s*cloud",
            Productivity,
            &["adobe.com"],
        ),
        ServiceEntry::new("Notion", r"\bnotion\b", Productivity, &["notion.so"]),
        ServiceEntry::new("Slack", r"\bslack\b", Productivity, &["slack.com"]),
        ServiceEntry::new("Zoom", r"zoom\s*(?:pro|workplace|one)\b|zoom\.us", Productivity, &["zoom.us"]),
        ServiceEntry::new("ChatGPT Plus", r"chatgpt\s*plus|openai", Productivity, &["openai.com"]),
        ServiceEntry::new("GitHub", r"github", Productivity, &["github.com"]),
        ServiceEntry::new(
            "Nintendo Switch Online",
            r"nintendo\s*switch\s*online|ニンテンドー\s*スイッチ\s*オンライン",
            Gaming,
            &["nintendo.net", "nintendo.com"],
        ),
        ServiceEntry::new(
            "PlayStation Plus",
            r"playstation\s*plus|\bps\s*plus\b",
            Gaming,
            &["playstation.com", "sony.com"],
        ),
        ServiceEntry::new("Xbox Game Pass", r"xbox\s*game\s*pass|\bgame\s*pass\b", Gaming, &["xbox.com"]),
        ServiceEntry::new(
            "日経電子版",
            r"日経電子版|日本経済新聞\s*電子版|nikkei",
            News,
            &["nikkei.com", "nikkei.co.jp"],
        ),
        ServiceEntry::new("The New York Times", r"new\s*york\s*times|nytimes", News, &["nytimes.com"]),
        ServiceEntry::new("Duolingo", r"duolingo", Education, &["duolingo.com"]),
        ServiceEntry::new("Coursera", r"coursera", Education, &["coursera.org"]),
        ServiceEntry::new("Strava", r"strava", Fitness, &["strava.com"]),
        ServiceEntry::new("Fitbit Premium", r"fitbit\s*premium", Fitness, &["fitbit.com"]),
    ]
}

static BUILTIN_SERVICES: LazyLock<ServiceCatalog> =
    LazyLock::new(|| ServiceCatalog::from_entries(builtin_service_entries()).unwrap());

/// Uncompiled known-app entry
///
/// `pattern` matches the app name at the start of a receipt line; whatever
/// follows it (after whitespace) is taken as the item name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnownAppEntry {
    pub name: String,
    pub pattern: String,
}

impl KnownAppEntry {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

/// Compiled known-app entry
#[derive(Debug, Clone)]
pub struct KnownApp {
    pub name: String,
    regex: Regex,
}

impl KnownApp {
    pub fn compile(entry: KnownAppEntry) -> Result<Self> {
        let pattern = format!(r"^(?:{})(?:\s+(?P<item>.+))?$", entry.pattern);
        let regex = compile_case_insensitive(&entry.name, &pattern)?;
        Ok(Self {
            name: entry.name,
            regex,
        })
    }

    /// Split `residual` into the canonical app name and an optional item name
    #[must_use]
    pub fn split(&self, residual: &str) -> Option<(String, Option<String>)> {
        let caps = self.regex.captures(residual)?;
        let item = caps
            .name("item")
            .map(|m| m.as_str().trim().trim_start_matches(['-', ':']).trim())
            .filter(|s| !s.is_empty())
            .map(ToString::to_string);
        Some((self.name.clone(), item))
    }
}

/// Ordered, immutable list of known multi-word app names
#[derive(Debug, Clone)]
pub struct KnownAppCatalog {
    apps: Vec<KnownApp>,
}

impl KnownAppCatalog {
    pub fn from_entries(entries: impl IntoIterator<Item = KnownAppEntry>) -> Result<Self> {
        let apps = entries
            .into_iter()
            .map(KnownApp::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { apps })
    }

    /// Split using the first known app that matches
    #[must_use]
    pub fn split(&self, residual: &str) -> Option<(String, Option<String>)> {
        self.apps.iter().find_map(|app| app.split(residual))
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.apps.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }
}

impl Default for KnownAppCatalog {
    fn default() -> Self {
        BUILTIN_APPS.clone()
    }
}

/// Built-in known apps whose names would confuse the generic splitter
#[must_use]
pub fn builtin_known_app_entries() -> Vec<KnownAppEntry> {
    vec![
        KnownAppEntry::new("ARK: Ultimate Mobile Edition", r"ark:\s*ultimate\s*mobile\s*edition"),
        KnownAppEntry::new("ブロスタ", r"ブロスタ|brawl\s*stars"),
        KnownAppEntry::new("クラッシュ・ロワイヤル", r"クラッシュ・ロワイヤル|クラロワ|clash\s*royale"),
        KnownAppEntry::new("モンスターストライク", r"モンスターストライク|モンスト"),
        KnownAppEntry::new("パズル&ドラゴンズ", r"パズル&ドラゴンズ|パズドラ"),
        KnownAppEntry::new("ウマ娘 プリティーダービー", r"ウマ娘\s*プリティーダービー|ウマ娘"),
        KnownAppEntry::new("Fate/Grand Order", r"fate/grand\s*order"),
        KnownAppEntry::new("Pokémon GO", r"pok[eé]mon\s*go"),
        KnownAppEntry::new("原神", r"原神|genshin\s*impact"),
        KnownAppEntry::new("YouTube", r"youtube"),
        KnownAppEntry::new("Tinder", r"tinder"),
    ]
}

static BUILTIN_APPS: LazyLock<KnownAppCatalog> =
    LazyLock::new(|| KnownAppCatalog::from_entries(builtin_known_app_entries()).unwrap());
