//! Request Facts
//!
//! The immutable input to both pipelines: everything the caller observed
//! about one inbound request. Headers are stored with lowercased keys so
//! lookups are case-insensitive; when the same header arrives twice the
//! first value wins.

use std::collections::HashMap;

use serde_json::Value;

/// Proxy headers consulted to resolve the real client IP, in priority order.
const CLIENT_IP_HEADERS: &[&str] = &[
    "cf-connecting-ip",
    "x-real-ip",
    "x-forwarded-for",
    "x-client-ip",
    "forwarded-for",
    "forwarded",
];

/// Facts about one inbound request, immutable once built.
#[derive(Debug, Clone)]
pub struct RequestFacts {
    /// Client IP string; may be IPv4, IPv6, or `"unknown"`.
    pub client_ip: String,
    /// URL the client requested.
    pub url: String,
    /// Referrer URL, if any.
    pub referrer: Option<String>,
    /// Client-submitted technical blob (fingerprints, screen, hardware).
    pub technical_data: Option<Value>,
    /// Client-submitted behavioral blob (event stream, timing metrics).
    pub behavioral_data: Option<Value>,
    /// Whether this request carries a form submission.
    pub is_form_submission: bool,
    /// Raw form payload for form submissions.
    pub form_data: Option<Value>,
    /// Request headers, keys lowercased.
    headers: HashMap<String, String>,
}

impl RequestFacts {
    /// Start building request facts.
    pub fn builder() -> RequestFactsBuilder {
        RequestFactsBuilder::default()
    }

    /// Look up a header value, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(|v| v.as_str())
    }

    /// Iterate over all headers as `(lowercased name, value)` pairs.
    pub fn headers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The `User-Agent` header, if present.
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }
}

/// Builder for [`RequestFacts`].
#[derive(Debug, Default)]
pub struct RequestFactsBuilder {
    client_ip: Option<String>,
    url: Option<String>,
    referrer: Option<String>,
    technical_data: Option<Value>,
    behavioral_data: Option<Value>,
    is_form_submission: bool,
    form_data: Option<Value>,
    headers: HashMap<String, String>,
}

impl RequestFactsBuilder {
    /// Set the client IP string.
    pub fn client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = Some(ip.into());
        self
    }

    /// Set the requested URL.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the referrer URL.
    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Add a header. Keys are lowercased; the first value for a key wins.
    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .or_insert_with(|| value.into());
        self
    }

    /// Attach the client-submitted technical blob.
    pub fn technical_data(mut self, data: Value) -> Self {
        self.technical_data = Some(data);
        self
    }

    /// Attach the client-submitted behavioral blob.
    pub fn behavioral_data(mut self, data: Value) -> Self {
        self.behavioral_data = Some(data);
        self
    }

    /// Mark this request as a form submission with its payload.
    pub fn form_submission(mut self, form_data: Option<Value>) -> Self {
        self.is_form_submission = true;
        self.form_data = form_data;
        self
    }

    /// Finish building. Missing IP or URL default to `"unknown"` / empty;
    /// the collector validates them before assembling a record.
    pub fn build(self) -> RequestFacts {
        RequestFacts {
            client_ip: self.client_ip.unwrap_or_else(|| "unknown".to_string()),
            url: self.url.unwrap_or_default(),
            referrer: self.referrer,
            technical_data: self.technical_data,
            behavioral_data: self.behavioral_data,
            is_form_submission: self.is_form_submission,
            form_data: self.form_data,
            headers: self.headers,
        }
    }
}

/// Resolve the real client IP from proxy headers, falling back to the
/// transport-level peer address.
///
/// Headers are consulted in a fixed priority order (CDN first, then common
/// reverse-proxy headers). Comma-separated lists yield their first entry;
/// blank or literal `"unknown"` entries are skipped.
pub fn resolve_client_ip<'a>(
    header: impl Fn(&str) -> Option<&'a str>,
    peer_addr: Option<&str>,
) -> String {
    for name in CLIENT_IP_HEADERS {
        if let Some(value) = header(name) {
            let first = value.split(',').next().unwrap_or("").trim();
            if !first.is_empty() && first != "unknown" {
                return first.to_string();
            }
        }
    }

    peer_addr
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_case_insensitive() {
        let facts = RequestFacts::builder()
            .header("User-Agent", "Mozilla/5.0")
            .header("Accept-Language", "en-US,en")
            .build();

        assert_eq!(facts.header("user-agent"), Some("Mozilla/5.0"));
        assert_eq!(facts.header("USER-AGENT"), Some("Mozilla/5.0"));
        assert_eq!(facts.user_agent(), Some("Mozilla/5.0"));
        assert_eq!(facts.header("accept-language"), Some("en-US,en"));
        assert_eq!(facts.header("accept"), None);
    }

    #[test]
    fn test_first_header_value_wins() {
        let facts = RequestFacts::builder()
            .header("X-Real-IP", "1.2.3.4")
            .header("x-real-ip", "5.6.7.8")
            .build();

        assert_eq!(facts.header("x-real-ip"), Some("1.2.3.4"));
    }

    #[test]
    fn test_resolve_client_ip_priority() {
        let facts = RequestFacts::builder()
            .header("x-forwarded-for", "198.51.100.9, 10.0.0.1")
            .header("cf-connecting-ip", "203.0.113.44")
            .build();

        let ip = resolve_client_ip(|name| facts.header(name), Some("10.0.0.2"));
        assert_eq!(ip, "203.0.113.44");
    }

    #[test]
    fn test_resolve_client_ip_forwarded_list() {
        let facts = RequestFacts::builder()
            .header("x-forwarded-for", "198.51.100.9, 10.0.0.1")
            .build();

        let ip = resolve_client_ip(|name| facts.header(name), None);
        assert_eq!(ip, "198.51.100.9");
    }

    #[test]
    fn test_resolve_client_ip_skips_unknown() {
        let facts = RequestFacts::builder()
            .header("x-forwarded-for", "unknown")
            .build();

        let ip = resolve_client_ip(|name| facts.header(name), Some("192.0.2.5"));
        assert_eq!(ip, "192.0.2.5");
    }

    #[test]
    fn test_resolve_client_ip_no_sources() {
        let ip = resolve_client_ip(|_| None, None);
        assert_eq!(ip, "unknown");
    }
}
