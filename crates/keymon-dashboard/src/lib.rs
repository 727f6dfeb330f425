//! Active-key dashboard panel
//!
//! Polls a backend's `/keys/active` endpoint on a fixed delay and publishes
//! immutable snapshots that render to one detail view per active key.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod client;
pub mod error;
pub mod panel;
pub mod snapshot;
pub mod view;

// Re-export commonly used types
pub use client::{BackendClient, KeySource};
pub use error::{DashboardError, Result};
pub use panel::{DashboardPanel, PanelHandle, PanelStats, RefreshOutcome, refresh_keys};
pub use snapshot::{PanelSnapshot, Phase};
pub use view::{DetailProps, DetailView, KeyLineView, PanelView, ReloadTracker, render};
