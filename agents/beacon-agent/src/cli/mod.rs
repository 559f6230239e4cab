//! CLI support module
//!
//! Configuration loading and the duration text format shared by the
//! command line and the config file.

pub mod config;
pub mod duration;
