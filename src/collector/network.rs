//! Network Extraction
//!
//! Derives connection attributes from the request itself. IP version is a
//! syntactic check on the resolved client IP string.

use super::ExtractError;
use crate::facts::RequestFacts;
use crate::record::NetworkInfo;

pub(super) async fn extract(facts: &RequestFacts) -> Result<Option<NetworkInfo>, ExtractError> {
    let ip_version = if facts.client_ip == "unknown" || facts.client_ip.is_empty() {
        None
    } else if facts.client_ip.contains(':') {
        Some("IPv6".to_string())
    } else {
        Some("IPv4".to_string())
    };

    Ok(Some(NetworkInfo {
        ip_version,
        connection_type: facts.header("connection").map(str::to_string),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ipv4_and_connection_header() {
        let facts = RequestFacts::builder()
            .client_ip("203.0.113.7")
            .header("connection", "keep-alive")
            .build();

        let network = extract(&facts).await.unwrap().unwrap();
        assert_eq!(network.ip_version.as_deref(), Some("IPv4"));
        assert_eq!(network.connection_type.as_deref(), Some("keep-alive"));
    }

    #[tokio::test]
    async fn test_ipv6() {
        let facts = RequestFacts::builder().client_ip("2001:db8::1").build();
        let network = extract(&facts).await.unwrap().unwrap();
        assert_eq!(network.ip_version.as_deref(), Some("IPv6"));
    }

    #[tokio::test]
    async fn test_unknown_ip_has_no_version() {
        let facts = RequestFacts::builder().build();
        let network = extract(&facts).await.unwrap().unwrap();
        assert_eq!(network.ip_version, None);
        assert_eq!(network.connection_type, None);
    }
}
