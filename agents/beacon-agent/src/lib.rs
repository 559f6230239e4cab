//! Beacon Agent Library
//!
//! This crate provides the core functionality for the beacon agent: a
//! long-running loop that periodically phones home to a collector over
//! HTTP, tagging each report with the agent's outbound local IP.

pub mod beacon;
pub mod cli;
pub mod error;
pub mod probe;

// Re-exports for convenience
pub use beacon::scheduler::{parse_target_url, phone_forever, BeaconTimings, Scheduler};
pub use beacon::sink::{LogSink, MemorySink, StdoutSink, TracingSink};
pub use beacon::state::{BeaconState, BeaconStateManager};
pub use cli::config::Config;
pub use error::{ProbeError, ResolverError, StartupError};
pub use probe::executor::{HttpProbe, Probe, ProbeOutcome};
pub use probe::resolver::resolve_local_ip;
