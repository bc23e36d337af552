//! Web server for the Framedash dashboard shell.
//!
//! Serves the rendered shell for every route, the client script that carries
//! hash fragments and sidebar state, and a few JSON endpoints under `/_shell`.

#![deny(unsafe_code)]

/// Static file serving and bundled client assets.
pub mod assets;

/// Error types for web operations.
pub mod error;

/// Tracing subscriber setup.
pub mod logging;

/// Shell page rendering.
pub mod render;

/// HTTP handlers.
pub mod routes;

/// Server assembly and lifecycle.
pub mod server;

/// Reloadable document store.
pub mod store;

pub use error::{WebError, WebResult};
pub use server::{build_app, start_server, ShellServer};
pub use store::DocumentStore;
