//! Release monitor module for detecting new releases.
//!
//! The release monitor is responsible for:
//! - Owning the in-memory last-known-release state
//! - Querying each watched repository once per cycle, in order
//! - Establishing baselines for never-seen repositories without notifying
//! - Handing strictly newer releases to the dispatcher and waiting until
//!   it accepts them
//! - Persisting state after every change

mod handoff;
mod service;
mod source;

pub use handoff::NewRelease;
pub use service::{
    CycleReport, DEFAULT_POLL_INTERVAL, Interruption, ReleaseMonitor, ReleaseMonitorConfig,
};
pub use source::ReleaseSource;
