//! Browser and OS Extraction
//!
//! Parses the user-agent string into browser and operating-system facets,
//! preferring the UA-database capability when one is wired in and falling
//! back to a deterministic substring parser otherwise. Language and
//! platform come from `Accept-Language` / `Sec-CH-UA-Platform` headers.

use std::time::Duration;

use anyhow::Result;
use regex::Regex;
use tokio::time::timeout;

use super::ExtractError;
use crate::capabilities::UserAgentParser;
use crate::facts::RequestFacts;
use crate::record::{BrowserInfo, OsInfo};

/// Fallback parse result, mirroring what a UA database would report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackUa {
    pub browser: &'static str,
    pub version: Option<String>,
    pub os: &'static str,
}

/// Deterministic regex-based user-agent parser used when no UA-database
/// capability is available.
///
/// Browser classification is first-match-wins over substrings in a fixed
/// order: Chrome (excluding Chromium), Firefox, Safari (excluding Chrome),
/// Edge, Opera, Unknown. The major version comes from a `<marker>/(\d+)`
/// pattern per browser.
pub struct FallbackUaParser {
    chrome: Regex,
    firefox: Regex,
    safari: Regex,
    edge: Regex,
    opera: Regex,
}

impl FallbackUaParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            chrome: Regex::new(r"chrome/(\d+)")?,
            firefox: Regex::new(r"firefox/(\d+)")?,
            safari: Regex::new(r"safari/(\d+)")?,
            edge: Regex::new(r"edge?/(\d+)")?,
            opera: Regex::new(r"opera/(\d+)")?,
        })
    }

    /// Classify a user agent into browser and OS families.
    pub fn parse(&self, user_agent: &str) -> FallbackUa {
        let ua = user_agent.to_lowercase();

        let (browser, version) = if ua.contains("chrome") && !ua.contains("chromium") {
            ("Chrome", self.major_version(&self.chrome, &ua))
        } else if ua.contains("firefox") {
            ("Firefox", self.major_version(&self.firefox, &ua))
        } else if ua.contains("safari") && !ua.contains("chrome") {
            ("Safari", self.major_version(&self.safari, &ua))
        } else if ua.contains("edge") {
            ("Edge", self.major_version(&self.edge, &ua))
        } else if ua.contains("opera") {
            ("Opera", self.major_version(&self.opera, &ua))
        } else {
            ("Unknown", None)
        };

        FallbackUa {
            browser,
            version,
            os: detect_os(&ua),
        }
    }

    fn major_version(&self, pattern: &Regex, ua: &str) -> Option<String> {
        pattern
            .captures(ua)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

fn detect_os(ua_lower: &str) -> &'static str {
    if ua_lower.contains("windows") {
        "Windows"
    } else if ua_lower.contains("mac") || ua_lower.contains("darwin") {
        "macOS"
    } else if ua_lower.contains("linux") {
        "Linux"
    } else if ua_lower.contains("android") {
        "Android"
    } else if ua_lower.contains("ios") || ua_lower.contains("iphone") || ua_lower.contains("ipad")
    {
        "iOS"
    } else {
        "Unknown"
    }
}

/// Extract the browser and OS facets for one request.
pub(super) async fn extract(
    facts: &RequestFacts,
    parser: Option<&dyn UserAgentParser>,
    fallback: &FallbackUaParser,
    lookup_timeout: Duration,
) -> Result<Option<(BrowserInfo, OsInfo)>, ExtractError> {
    let user_agent = facts.user_agent().unwrap_or("");

    let mut browser = BrowserInfo {
        user_agent: Some(user_agent.to_string()),
        ..Default::default()
    };
    let mut os = OsInfo::default();

    match parser {
        Some(parser) => {
            let parsed = timeout(lookup_timeout, parser.parse(user_agent))
                .await
                .map_err(|_| ExtractError::Timeout(lookup_timeout))??;

            browser.name = parsed.browser;
            browser.version = parsed.browser_version;
            browser.major_version = parsed.browser_major;
            browser.engine = parsed.engine;
            browser.engine_version = parsed.engine_version;

            os.name = parsed.os_name;
            os.version = parsed.os_version;
            os.platform = parsed.device_family;
        }
        None => {
            let parsed = fallback.parse(user_agent);
            browser.name = Some(parsed.browser.to_string());
            browser.major_version = parsed.version.clone();
            browser.version = parsed.version;
            os.name = Some(parsed.os.to_string());
        }
    }

    if let Some(accept_language) = facts.header("accept-language") {
        let languages: Vec<String> = accept_language
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        browser.language = languages.first().cloned();
        if !languages.is_empty() {
            browser.languages = Some(languages);
        }
    }

    if let Some(platform) = facts.header("sec-ch-ua-platform") {
        browser.platform = Some(platform.trim_matches('"').to_string());
    }

    Ok(Some((browser, os)))
}
