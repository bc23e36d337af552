//! Command-line interface for Framedash.
//!
//! This crate provides commands for checking dashboard documents offline
//! and for running the shell server.

#![deny(missing_docs, unsafe_code)]

/// CLI command definitions and parsing.
pub mod commands;

/// CLI application entry point and command handlers.
pub mod app;

/// Error types for CLI operations.
pub mod error;
