//! Enhancements for an embedded third-party chat widget.
//!
//! The crate is environment independent: [`Enhancer`] owns the state machines
//! and talks to the page only through the [`host::Host`] traits. The web
//! shell implements those over `web-sys`; [`testing::FakeHost`] implements
//! them in memory.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod bridges;
pub mod cache;
pub mod config;
pub mod disclaimer;
pub mod enhancer;
pub mod error;
pub mod host;
pub mod intake;
pub mod popup;
pub mod session;
pub mod status;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod visibility;

pub use config::EnhancerConfig;
pub use enhancer::Enhancer;
pub use error::{ConfigError, EnhancerError, HostError};
pub use host::{DebugCommand, Host, HostEvent, TimerSlot};
pub use status::StatusSnapshot;
