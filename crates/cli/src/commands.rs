//! CLI command definitions for Framedash.
//!
//! Offline tooling for dashboard documents: validate them, see how a route
//! resolves, check a URL against the allow-list, and run the server.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Main CLI application.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Logging verbosity
    #[arg(short, long, global = true, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Server settings file (TOML)
    #[arg(short, long, global = true, env = "FRAMEDASH_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a dashboard document for problems
    Validate(ValidateArgs),

    /// Show what the shell would display for a route
    Resolve(ResolveArgs),

    /// Check URLs against the document's allow-list
    CheckUrl(CheckUrlArgs),

    /// Run the shell server
    Serve(ServeArgs),

    /// Write a settings file with default values
    InitSettings(InitSettingsArgs),
}

/// Document selection shared by the offline commands.
#[derive(Args, Debug, Clone)]
pub struct DocumentArg {
    /// Dashboard document: file path or http(s) URL
    #[arg(short, long, env = "FRAMEDASH_DOCUMENT")]
    pub document: Option<String>,
}

/// Validation arguments.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Dashboard document to load
    #[command(flatten)]
    pub document: DocumentArg,

    /// Treat warnings as failures
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Route resolution arguments.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Dashboard document to load
    #[command(flatten)]
    pub document: DocumentArg,

    /// Address-bar path, optionally with query and hash (`/a/b?x=1#top`)
    pub location: String,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Allow-list check arguments.
#[derive(Args, Debug)]
pub struct CheckUrlArgs {
    /// Dashboard document to load
    #[command(flatten)]
    pub document: DocumentArg,

    /// URLs to check
    #[arg(required = true)]
    pub urls: Vec<String>,
}

/// Server arguments.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Dashboard document to load
    #[command(flatten)]
    pub document: DocumentArg,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory served under /_shell/assets
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Do not reload the document when the file changes
    #[arg(long, default_value_t = false)]
    pub no_watch: bool,
}

/// Settings file arguments.
#[derive(Args, Debug)]
pub struct InitSettingsArgs {
    /// Where to write; defaults to the user config directory
    pub path: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long, default_value_t = false)]
    pub force: bool,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain text for terminals.
    Text,
    /// Pretty-printed JSON.
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_resolve_with_location() {
        let cli = Cli::try_parse_from([
            "framedash",
            "resolve",
            "--document",
            "dash.json",
            "/reports/q1?from=now#top",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Resolve(args) => {
                assert_eq!(args.document.document.as_deref(), Some("dash.json"));
                assert_eq!(args.location, "/reports/q1?from=now#top");
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "framedash",
            "validate",
            "-d",
            "dash.json",
            "-vv",
            "--settings",
            "server.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.settings, Some(PathBuf::from("server.toml")));
        assert!(matches!(cli.command, Commands::Validate(_)));
    }

    #[test]
    fn check_url_requires_urls() {
        assert!(Cli::try_parse_from(["framedash", "check-url", "-d", "dash.json"]).is_err());
    }
}
