//! HTTP probes against registry endpoints.
//!
//! Probes never surface errors: an unreachable or misbehaving endpoint is
//! a result, not a failure, so a batch over many mirrors can always run to
//! completion.

use std::time::{Duration, Instant};

use reqwest::Client;

/// Default timeout for validation and info probes.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Timed GET against the registry root.
///
/// HTTP 200 yields `(true, elapsed ms)` with the latency rounded to two
/// decimals; any other status, timeout, or transport error yields
/// `(false, 0.0)`.
pub async fn probe_latency(client: &Client, url: &str, timeout: Duration) -> (bool, f64) {
    let start = Instant::now();
    match client.get(url).timeout(timeout).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => {
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
            (true, round2(elapsed_ms))
        }
        Ok(_) | Err(_) => (false, 0.0),
    }
}

/// Structural-then-live check of a candidate registry URL.
///
/// The scheme must be `http://` or `https://`; only then is a HEAD request
/// spent, accepting any status below 400. Network errors count as invalid.
pub async fn validate_registry_url(client: &Client, url: &str) -> bool {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return false;
    }
    let probe_url = if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    };
    match client
        .head(&probe_url)
        .timeout(DEFAULT_PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response.status().as_u16() < 400,
        Err(_) => false,
    }
}

/// Reachability details for one registry.
#[derive(Debug, Clone, Default)]
pub struct RegistryInfo {
    pub reachable: bool,
    pub status_code: Option<u16>,
    /// Whether fetching a well-known package's metadata works.
    pub can_fetch_packages: bool,
    pub error: Option<String>,
}

/// Auxiliary info lookup: root status plus a `/vue` metadata-fetch check.
pub async fn registry_info(client: &Client, url: &str) -> RegistryInfo {
    let response = match client
        .get(url)
        .timeout(DEFAULT_PROBE_TIMEOUT)
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            return RegistryInfo {
                error: Some(e.to_string()),
                ..RegistryInfo::default()
            };
        }
    };

    let status = response.status().as_u16();
    if status != 200 {
        return RegistryInfo {
            reachable: false,
            status_code: Some(status),
            ..RegistryInfo::default()
        };
    }

    let package_url = format!("{}/vue", url.trim_end_matches('/'));
    let can_fetch_packages = matches!(
        client
            .get(&package_url)
            .timeout(DEFAULT_PROBE_TIMEOUT)
            .send()
            .await,
        Ok(package_response) if package_response.status() == reqwest::StatusCode::OK
    );

    RegistryInfo {
        reachable: true,
        status_code: Some(status),
        can_fetch_packages,
        error: None,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(123.4567), 123.46);
        assert_eq!(round2(0.004), 0.0);
        assert_eq!(round2(99.999), 100.0);
    }

    #[tokio::test]
    async fn test_validate_rejects_bad_scheme_without_network() {
        // Client with no connectivity assumptions; the scheme check short-
        // circuits before any request is attempted.
        let client = Client::new();
        assert!(!validate_registry_url(&client, "ftp://example.com/").await);
        assert!(!validate_registry_url(&client, "registry.npmmirror.com").await);
    }
}
