//! Error types
//!
//! Per-cycle errors (`ResolverError`, `ProbeError`) are caught by the
//! scheduler and turned into the retry cadence. `StartupError` is fatal and
//! surfaces before the loop starts.

use std::io;
use thiserror::Error;

/// Failure to learn the outbound local address
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The connect to the lookup address did not finish within the bound
    #[error("connect to lookup address {addr}: timed out")]
    Timeout { addr: String },

    /// The connect to the lookup address failed outright
    #[error("connect to lookup address {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The connected socket could not report its local endpoint
    #[error("reading local endpoint: {0}")]
    LocalAddr(#[source] io::Error),
}

/// Failure of a single probe
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error(transparent)]
    Resolver(#[from] ResolverError),

    /// The HEAD request did not complete transport-wise
    #[error("HEAD {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Conditions that stop the agent before the first probe
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid target URL {input:?}: {source}")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
