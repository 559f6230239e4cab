//! Probe module
//!
//! One reporting attempt against the collector, and the local IP lookup
//! that precedes it.

pub mod executor;
pub mod resolver;
