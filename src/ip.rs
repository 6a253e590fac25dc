//! IP Classification Helpers
//!
//! Shared by the geolocation extractor (skip private/loopback addresses)
//! and the threat-intelligence heuristic (neutral score for them).

use std::net::IpAddr;

/// Parse an IP string; `None` for malformed input.
pub(crate) fn parse_ip(raw: &str) -> Option<IpAddr> {
    raw.trim().parse().ok()
}

/// True for addresses that never warrant geolocation or threat lookups:
/// loopback, RFC 1918 private ranges, link-local, and IPv6 unique-local.
pub(crate) fn is_private_or_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_private() || v4.is_loopback() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            // fc00::/7 unique-local, fe80::/10 link-local
            v6.is_loopback()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
