//! Probe Executor
//!
//! Performs one reporting attempt: resolve the local IP, stamp it into the
//! target URL and send a HEAD request to the collector.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{ProbeError, StartupError};
use crate::probe::resolver::resolve_local_ip;

/// Query parameter carrying the resolved local IP
pub const LOCAL_PARAM: &str = "local";

/// Result of a single probe, as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    Success,
    Failure(String),
}

impl From<Result<(), ProbeError>> for ProbeOutcome {
    fn from(result: Result<(), ProbeError>) -> Self {
        match result {
            Ok(()) => ProbeOutcome::Success,
            Err(e) => ProbeOutcome::Failure(e.to_string()),
        }
    }
}

/// One reporting attempt against the collector
///
/// Implementations may mutate `target` in place; the scheduler owns the
/// single instance and lends it out for the duration of one probe.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn probe(&self, target: &mut Url) -> Result<(), ProbeError>;
}

/// Production probe: local IP lookup followed by an HTTP HEAD
pub struct HttpProbe {
    client: reqwest::Client,
    lookup_addr: String,
}

impl HttpProbe {
    /// Create a probe around an already configured client
    pub fn new(client: reqwest::Client, lookup_addr: &str) -> Self {
        Self {
            client,
            lookup_addr: lookup_addr.to_string(),
        }
    }

    /// Create a probe with its own client bounded by `timeout`
    pub fn with_timeout(timeout: Duration, lookup_addr: &str) -> Result<Self, StartupError> {
        Ok(Self::new(build_client(timeout)?, lookup_addr))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn probe(&self, target: &mut Url) -> Result<(), ProbeError> {
        probe_once(&self.client, target, &self.lookup_addr).await
    }
}

/// Build the HTTP client used for every probe of the process
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, StartupError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(StartupError::HttpClient)
}

/// Run a single probe
///
/// A resolver failure fails the probe before any HTTP traffic. Any response
/// that arrives counts as success, whatever its status code.
pub async fn probe_once(
    client: &reqwest::Client,
    target: &mut Url,
    lookup_addr: &str,
) -> Result<(), ProbeError> {
    let ip = resolve_local_ip(lookup_addr).await?;
    stamp_local_ip(target, &ip);

    debug!(url = %target, "Sending HEAD to collector");
    let response = client
        .head(target.clone())
        .send()
        .await
        .map_err(|e| ProbeError::Transport {
            url: target.to_string(),
            source: e.without_url(),
        })?;

    debug!(status = %response.status(), "Collector responded");
    Ok(())
}

/// Set the `local` query parameter to `ip`, keeping every other parameter
///
/// The first existing `local` pair is overwritten in place and any further
/// duplicates are dropped; without one, the pair is appended.
pub fn stamp_local_ip(target: &mut Url, ip: &str) {
    let mut stamped = false;

    let pairs: Vec<(String, String)> = target
        .query_pairs()
        .filter_map(|(key, value)| {
            if key != LOCAL_PARAM {
                return Some((key.into_owned(), value.into_owned()));
            }
            if stamped {
                return None;
            }
            stamped = true;
            Some((key.into_owned(), ip.to_string()))
        })
        .collect();

    let mut query = target.query_pairs_mut();
    query.clear().extend_pairs(pairs);
    if !stamped {
        query.append_pair(LOCAL_PARAM, ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V4: &str = "192.168.1.20";
    const V6: &str = "::1";

    fn local_values(url: &Url) -> Vec<String> {
        url.query_pairs()
            .filter(|(k, _)| k == LOCAL_PARAM)
            .map(|(_, v)| v.into_owned())
            .collect()
    }

    #[test]
    fn test_stamp_adds_param() {
        let mut url = Url::parse("http://collector.local/pi-phone-home").unwrap();
        stamp_local_ip(&mut url, V4);
        assert_eq!(url.query(), Some("local=192.168.1.20"));
    }

    #[test]
    fn test_stamp_escapes_ipv6() {
        let mut url = Url::parse("http://collector.local/pi-phone-home").unwrap();
        stamp_local_ip(&mut url, V6);
        assert_eq!(url.query(), Some("local=%3A%3A1"));
    }

    #[test]
    fn test_stamp_escapes_ipv6_zone() {
        let mut url = Url::parse("http://collector.local/pi-phone-home").unwrap();
        stamp_local_ip(&mut url, "fe80::1%3");
        assert_eq!(url.query(), Some("local=fe80%3A%3A1%253"));
        assert_eq!(local_values(&url), vec!["fe80::1%3".to_string()]);
    }

    #[test]
    fn test_stamp_preserves_other_params() {
        let mut url = Url::parse("http://collector.local/ping?id=pi-7&zone=lab").unwrap();
        stamp_local_ip(&mut url, V4);
        assert_eq!(url.query(), Some("id=pi-7&zone=lab&local=192.168.1.20"));
        assert_eq!(url.path(), "/ping");
    }

    #[test]
    fn test_stamp_overwrites_across_cycles() {
        let mut url = Url::parse("http://collector.local/ping?id=pi-7").unwrap();
        stamp_local_ip(&mut url, V4);
        stamp_local_ip(&mut url, V6);
        stamp_local_ip(&mut url, V4);

        assert_eq!(local_values(&url), vec!["192.168.1.20".to_string()]);
        assert_eq!(url.query(), Some("id=pi-7&local=192.168.1.20"));
    }

    #[test]
    fn test_stamp_collapses_duplicates() {
        let mut url = Url::parse("http://collector.local/ping?local=a&id=1&local=b").unwrap();
        stamp_local_ip(&mut url, V6);
        assert_eq!(url.query(), Some("local=%3A%3A1&id=1"));
    }

    #[test]
    fn test_stamp_keeps_fragment() {
        let mut url = Url::parse("http://collector.local/ping?id=1#frag").unwrap();
        stamp_local_ip(&mut url, V4);
        assert_eq!(url.fragment(), Some("frag"));
        assert_eq!(local_values(&url), vec!["192.168.1.20".to_string()]);
    }

    #[test]
    fn test_outcome_from_result() {
        assert_eq!(ProbeOutcome::from(Ok(())), ProbeOutcome::Success);

        let err = ProbeError::Resolver(crate::error::ResolverError::Timeout {
            addr: "10.0.0.1:80".to_string(),
        });
        let outcome = ProbeOutcome::from(Err(err));
        assert_eq!(
            outcome,
            ProbeOutcome::Failure("connect to lookup address 10.0.0.1:80: timed out".to_string())
        );
    }

    #[tokio::test]
    async fn test_resolver_failure_skips_http_and_url() {
        let client = build_client(Duration::from_millis(50)).unwrap();
        let mut url = Url::parse("http://127.0.0.1:1/ping?id=1").unwrap();

        let err = probe_once(&client, &mut url, "bad-lookup-addr").await.unwrap_err();
        assert!(matches!(err, ProbeError::Resolver(_)));
        assert_eq!(url.query(), Some("id=1"));
    }
}
