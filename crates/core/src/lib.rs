//! Core types, errors, and configuration for Framedash
//!
//! Framedash is a dashboard shell: a sidebar driven by one JSON document and
//! a frame that shows the content URL of the current route. This crate holds
//! everything that decides what the shell shows, independent of HTTP.

pub mod allowlist;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod document;
pub mod error;
pub mod frame;
pub mod overrides;
pub mod routing;
pub mod storage;

// Re-exports for convenience
pub use allowlist::{AllowEntry, AllowList, Rejection};
pub use config::FramedashConfig;
pub use dashboard::{ActiveNav, Dashboard, Outcome, Request, ShellPlan};
pub use document::{DashboardDocument, NavItem, NavSection, Severity, ValidationIssue};
pub use error::{Error, Result};
pub use frame::{compose_frame_url, FrameTarget};
pub use overrides::{EffectiveLook, Overrides};
pub use storage::StorageFlags;
