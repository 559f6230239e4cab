//! Beacon module
//!
//! This module contains the phone-home scheduler, its state tracking and
//! the sink it reports outcomes through.

pub mod scheduler;
pub mod sink;
pub mod state;
