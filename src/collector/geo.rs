//! Geolocation Extraction
//!
//! City-level lookup through the attached GeoIP provider, with best-effort
//! ISP attribution layered on top. Private, loopback, and unparseable IPs
//! skip the lookup entirely; an ISP failure keeps the city result.

use std::time::Duration;

use tokio::time::timeout;
use tracing::debug;

use super::ExtractError;
use crate::capabilities::GeoProvider;
use crate::facts::RequestFacts;
use crate::ip::{is_private_or_loopback, parse_ip};
use crate::record::GeolocationInfo;

pub(super) async fn extract(
    facts: &RequestFacts,
    geo: Option<&dyn GeoProvider>,
    lookup_timeout: Duration,
) -> Result<Option<GeolocationInfo>, ExtractError> {
    let geo = match geo {
        Some(geo) => geo,
        None => return Ok(None),
    };

    let ip = match parse_ip(&facts.client_ip) {
        Some(ip) if !is_private_or_loopback(ip) => ip,
        _ => return Ok(None),
    };

    let city = timeout(lookup_timeout, geo.city(ip))
        .await
        .map_err(|_| ExtractError::Timeout(lookup_timeout))??;

    let city = match city {
        Some(city) => city,
        None => return Ok(None),
    };

    let mut info = GeolocationInfo {
        country: city.country,
        country_code: city.country_code,
        region: city.region,
        region_code: city.region_code,
        city: city.city,
        postal_code: city.postal_code,
        latitude: city.latitude,
        longitude: city.longitude,
        timezone: city.timezone,
        accuracy_radius: city.accuracy_radius,
        isp: None,
        organization: None,
        as_number: None,
    };

    match timeout(lookup_timeout, geo.isp(ip)).await {
        Ok(Ok(Some(isp))) => {
            info.isp = isp.isp;
            info.organization = isp.organization;
            info.as_number = isp.as_number;
        }
        Ok(Ok(None)) => {}
        Ok(Err(e)) => debug!(ip = %ip, error = %e, "isp lookup failed"),
        Err(_) => debug!(ip = %ip, "isp lookup timed out"),
    }

    Ok(Some(info))
}
