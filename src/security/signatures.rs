//! Attack Signature Scanning
//!
//! A fixed catalogue of attack-signature patterns applied to the URL path,
//! query parameters, and header values of one request. Any match blocks the
//! request outright; the report's risk sub-score scales with the match
//! count, capped at 1.0.

use anyhow::{Context, Result};
use regex::Regex;

use crate::facts::RequestFacts;

/// Attack class a signature detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignatureCategory {
    SqlInjection,
    Xss,
    PathTraversal,
    CommandInjection,
    LdapInjection,
}

impl std::fmt::Display for SignatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignatureCategory::SqlInjection => write!(f, "SQL Injection"),
            SignatureCategory::Xss => write!(f, "Cross-Site Scripting"),
            SignatureCategory::PathTraversal => write!(f, "Path Traversal"),
            SignatureCategory::CommandInjection => write!(f, "Command Injection"),
            SignatureCategory::LdapInjection => write!(f, "LDAP Injection"),
        }
    }
}

/// One compiled signature.
struct Signature {
    category: SignatureCategory,
    pattern: Regex,
}

/// One threat found by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    pub category: SignatureCategory,
    /// Which part of the request matched.
    pub location: String,
}

/// Outcome of scanning one request.
#[derive(Debug, Clone, Default)]
pub struct WafReport {
    pub blocked: bool,
    pub threats: Vec<Threat>,
    /// `min(0.3 * match_count, 1.0)`.
    pub risk_score: f64,
}

/// The compiled signature catalogue.
pub struct SignatureSet {
    signatures: Vec<Signature>,
}

impl SignatureSet {
    /// Compile the built-in catalogue.
    pub fn new() -> Result<Self> {
        let catalogue: &[(SignatureCategory, &str)] = &[
            (
                SignatureCategory::SqlInjection,
                r"(?i)\b(union(\s+all)?\s+select|select\s+[\w\*,\s]+\s+from|insert\s+into|delete\s+from|drop\s+(table|database)|update\s+\w+\s+set|exec(ute)?\s*\()",
            ),
            (
                SignatureCategory::SqlInjection,
                r"(?i)\b(or|and)\b\s+\d+\s*=\s*\d+",
            ),
            (SignatureCategory::SqlInjection, r"('|%27)\s*(--|#|/\*)"),
            (
                SignatureCategory::Xss,
                r"(?i)(<\s*/?\s*script\b|javascript:|vbscript:|on(load|error|click|mouseover|focus)\s*=)",
            ),
            (
                SignatureCategory::Xss,
                r"(?i)\b(alert|confirm|prompt|eval)\s*\(",
            ),
            (
                SignatureCategory::PathTraversal,
                r"(?i)(\.\./|\.\.\\|%2e%2e%2f|%2e%2e/|/etc/(passwd|shadow)|\\windows\\system32)",
            ),
            (
                SignatureCategory::CommandInjection,
                r"(?i)(;|\||&&|\$\(|`)\s*(cat|ls|pwd|id|whoami|uname|curl|wget|nc|bash|sh|rm|chmod)\b",
            ),
            (SignatureCategory::LdapInjection, r"(\*\)|\(\||\(&)"),
        ];

        let signatures = catalogue
            .iter()
            .map(|&(category, pattern)| {
                Ok(Signature {
                    category,
                    pattern: Regex::new(pattern)
                        .with_context(|| format!("invalid {category} signature"))?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { signatures })
    }

    /// Scan one request's path, query parameters, and header values.
    pub fn scan(&self, facts: &RequestFacts) -> WafReport {
        let mut threats = Vec::new();

        let (path, query) = split_url(&facts.url);

        if let Some(category) = self.first_match(path) {
            threats.push(Threat {
                category,
                location: "url path".to_string(),
            });
        }

        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                if let Some(category) = self.first_match(pair) {
                    let key = pair.split('=').next().unwrap_or(pair);
                    threats.push(Threat {
                        category,
                        location: format!("query parameter {key}"),
                    });
                }
            }
        }

        for (name, value) in facts.headers() {
            if let Some(category) = self.first_match(value) {
                threats.push(Threat {
                    category,
                    location: format!("header {name}"),
                });
            }
        }

        WafReport {
            blocked: !threats.is_empty(),
            risk_score: (0.3 * threats.len() as f64).min(1.0),
            threats,
        }
    }

    fn first_match(&self, text: &str) -> Option<SignatureCategory> {
        self.signatures
            .iter()
            .find(|s| s.pattern.is_match(text))
            .map(|s| s.category)
    }
}

/// Split a URL into its path portion and optional query string. The scheme
/// and authority, if present, are excluded from scanning.
fn split_url(url: &str) -> (&str, Option<&str>) {
    let without_scheme = match url.find("://") {
        Some(idx) => {
            let rest = &url[idx + 3..];
            match rest.find('/') {
                Some(slash) => &rest[slash..],
                None => "",
            }
        }
        None => url,
    };

    match without_scheme.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (without_scheme, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> SignatureSet {
        SignatureSet::new().unwrap()
    }

    fn facts_for_url(url: &str) -> RequestFacts {
        RequestFacts::builder().client_ip("203.0.113.7").url(url).build()
    }

    #[test]
    fn test_union_select_in_path_blocks() {
        let report = set().scan(&facts_for_url(
            "https://example.com/products/1 UNION SELECT username,password FROM users",
        ));
        assert!(report.blocked);
        assert!(report.risk_score >= 0.3);
        assert_eq!(report.threats[0].category, SignatureCategory::SqlInjection);
    }

    #[test]
    fn test_clean_alphanumeric_path_passes() {
        let report = set().scan(&facts_for_url("https://example.com/products123/details456"));
        assert!(!report.blocked);
        assert!(report.threats.is_empty());
        assert_eq!(report.risk_score, 0.0);
    }

    #[test]
    fn test_hyphenated_slug_passes() {
        let report = set().scan(&facts_for_url(
            "https://example.com/blog/select-the-right-union-for-you",
        ));
        assert!(!report.blocked, "threats: {:?}", report.threats);
    }

    #[test]
    fn test_xss_in_query_parameter() {
        let report =
            set().scan(&facts_for_url("https://example.com/search?q=<script>alert(1)</script>"));
        assert!(report.blocked);
        assert!(report
            .threats
            .iter()
            .any(|t| t.category == SignatureCategory::Xss));
        assert!(report.threats[0].location.contains("query parameter q"));
    }

    #[test]
    fn test_path_traversal() {
        let report = set().scan(&facts_for_url("https://example.com/files?name=../../etc/passwd"));
        assert!(report.blocked);
        assert!(report
            .threats
            .iter()
            .any(|t| t.category == SignatureCategory::PathTraversal));
    }

    #[test]
    fn test_command_injection_requires_command_word() {
        let blocked = set().scan(&facts_for_url("https://example.com/run?cmd=;cat /etc/hosts"));
        assert!(blocked.blocked);

        // Separators alone, as in plain search text, are not enough.
        let clean = set().scan(&facts_for_url("https://example.com/search?q=fish&chips"));
        assert!(!clean.blocked);
    }

    #[test]
    fn test_ldap_injection() {
        let report = set().scan(&facts_for_url("https://example.com/dir?filter=*)(uid=*"));
        assert!(report.blocked);
        assert_eq!(report.threats[0].category, SignatureCategory::LdapInjection);
    }

    #[test]
    fn test_malicious_header_value() {
        let facts = RequestFacts::builder()
            .client_ip("203.0.113.7")
            .url("https://example.com/")
            .header("referer", "javascript:alert(document.cookie)")
            .build();

        let report = set().scan(&facts);
        assert!(report.blocked);
        assert!(report.threats[0].location.contains("header referer"));
    }

    #[test]
    fn test_risk_score_scales_and_caps() {
        let report = set().scan(&facts_for_url(
            "https://example.com/x?a=1 UNION SELECT 1&b=<script>&c=../../etc/passwd&d=;whoami",
        ));
        assert!(report.blocked);
        assert_eq!(report.threats.len(), 4);
        // 4 matches at 0.3 each, capped.
        assert!((report.risk_score - 1.0).abs() < f64::EPSILON);
    }
}
