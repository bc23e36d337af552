//! CLI application entry point and configuration.
//!
//! This module provides the main CLI application logic, including argument parsing,
//! settings loading, and command dispatch.

use crate::commands::{
    CheckUrlArgs, Cli, Commands, DocumentArg, InitSettingsArgs, OutputFormat, ResolveArgs,
    ServeArgs, ValidateArgs,
};
use crate::error::{CliError, Result};
use clap::Parser;
use framedash_core::config::{DocumentSource, LogLevel, LoggingConfig};
use framedash_core::{
    Dashboard, DashboardDocument, FrameTarget, FramedashConfig, Outcome, Request, Severity,
    ShellPlan, ValidationIssue,
};
use framedash_web::routes::parse_query;
use framedash_web::store::{fetch_document_text, http_client};
use framedash_web::{DocumentStore, ShellServer};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Main CLI application.
#[derive(Debug)]
pub struct App {
    /// Server settings, from the settings file or defaults.
    pub settings: FramedashConfig,
    /// Parsed CLI arguments.
    pub cli: Cli,
}

impl App {
    /// Create a new application instance from command line arguments.
    pub fn new() -> Result<Self> {
        Self::from_cli(Cli::parse())
    }

    /// Create an application instance from already parsed arguments.
    pub fn from_cli(cli: Cli) -> Result<Self> {
        let settings = Self::load_settings(&cli)?;
        Ok(Self { settings, cli })
    }

    fn load_settings(cli: &Cli) -> Result<FramedashConfig> {
        if let Some(path) = &cli.settings {
            if !path.exists() {
                return Err(CliError::Config(format!(
                    "Settings file not found: {}",
                    path.display()
                )));
            }
        }
        Ok(FramedashConfig::load_or_default(cli.settings.as_deref())?)
    }

    /// Run the application.
    pub fn run(self) -> Result<()> {
        self.setup_logging();

        match &self.cli.command {
            Commands::Validate(args) => self.handle_validate(args),
            Commands::Resolve(args) => self.handle_resolve(args),
            Commands::CheckUrl(args) => self.handle_check_url(args),
            Commands::Serve(args) => self.handle_serve(args),
            Commands::InitSettings(args) => self.handle_init_settings(args),
        }
    }

    fn setup_logging(&self) {
        // offline commands stay quiet unless asked; the server uses its settings
        let logging = match &self.cli.command {
            Commands::Serve(_) => self.settings.logging.clone(),
            _ => LoggingConfig {
                level: LogLevel::Warn,
                ..self.settings.logging.clone()
            },
        };
        framedash_web::logging::init_logging(&logging, self.cli.verbose);
    }

    fn document_source(&self, arg: &DocumentArg) -> Result<DocumentSource> {
        let raw = arg
            .document
            .as_deref()
            .unwrap_or(&self.settings.document.source);
        Ok(DocumentSource::parse(raw)?)
    }

    fn handle_validate(&self, args: &ValidateArgs) -> Result<()> {
        let source = self.document_source(&args.document)?;
        let document = load_document(&source)?;
        let issues = document.validate();

        match args.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&issues)
                    .map_err(|e| CliError::Internal(e.to_string()))?
            ),
            OutputFormat::Text => {
                for issue in &issues {
                    println!("{}", issue);
                }
                println!("{}: {}", source, summarize(&issues));
            }
        }

        if has_failures(&issues, args.strict) {
            return Err(CliError::Validation(format!(
                "{} failed validation",
                source
            )));
        }
        Ok(())
    }

    fn handle_resolve(&self, args: &ResolveArgs) -> Result<()> {
        let source = self.document_source(&args.document)?;
        let dashboard = load_dashboard(&source)?;

        let (path, query, hash) = split_location(&args.location)?;
        let query = parse_query(query);
        let plan = dashboard.plan(&Request {
            path,
            query: &query,
            hash,
        })?;

        match args.format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::to_string_pretty(&plan)
                    .map_err(|e| CliError::Internal(e.to_string()))?
            ),
            OutputFormat::Text => print!("{}", describe_plan(&plan)),
        }
        Ok(())
    }

    fn handle_check_url(&self, args: &CheckUrlArgs) -> Result<()> {
        let source = self.document_source(&args.document)?;
        let dashboard = load_dashboard(&source)?;
        let base = dashboard.document().base()?;

        let mut blocked = 0usize;
        for raw in &args.urls {
            let verdict = FrameTarget::parse(raw, base.as_ref())
                .map_err(|e| e.to_string())
                .and_then(|target| {
                    dashboard
                        .allow_list()
                        .permits(&target)
                        .map(|()| target)
                        .map_err(|r| r.to_string())
                });
            match verdict {
                Ok(target) => println!("allowed  {}", target),
                Err(reason) => {
                    blocked += 1;
                    println!("blocked  {}  ({})", raw, reason);
                }
            }
        }

        if blocked > 0 {
            return Err(CliError::Validation(format!(
                "{} of {} URLs blocked",
                blocked,
                args.urls.len()
            )));
        }
        Ok(())
    }

    fn handle_serve(&self, args: &ServeArgs) -> Result<()> {
        let config = apply_serve_args(self.settings.clone(), args);
        info!("Serving {} on {}:{}", config.document.source, config.http.host, config.http.port);

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Internal(e.to_string()))?;
        runtime.block_on(async move {
            let server = ShellServer::new(config).await?;
            server.run().await?;
            Ok(())
        })
    }

    fn handle_init_settings(&self, args: &InitSettingsArgs) -> Result<()> {
        let path = match &args.path {
            Some(path) => path.clone(),
            None => FramedashConfig::default_path()?,
        };
        if path.exists() && !args.force {
            return Err(CliError::Argument(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }
        FramedashConfig::default().save(&path)?;
        println!("Wrote settings to {}", path.display());
        Ok(())
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Internal(e.to_string()))
}

/// Parse the document only. The allow-list is not built.
fn load_document(source: &DocumentSource) -> Result<DashboardDocument> {
    debug!("Loading {}", source);
    let content = runtime()?.block_on(async {
        let client = http_client()?;
        fetch_document_text(&client, source).await
    })?;
    Ok(DashboardDocument::from_json(&content)?)
}

fn load_dashboard(source: &DocumentSource) -> Result<Arc<Dashboard>> {
    let source = source.clone();
    runtime()?.block_on(async move {
        let store = DocumentStore::open(source).await?;
        Ok(store.current().await)
    })
}

/// Split `/path?query#hash` into its parts.
pub fn split_location(location: &str) -> Result<(&str, Option<&str>, Option<&str>)> {
    let location = location.trim();
    let (rest, hash) = match location.split_once('#') {
        Some((rest, hash)) => (rest, Some(hash).filter(|h| !h.is_empty())),
        None => (location, None),
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query).filter(|q| !q.is_empty())),
        None => (rest, None),
    };
    if !path.starts_with('/') {
        return Err(CliError::Argument(format!(
            "location must start with '/': {}",
            location
        )));
    }
    Ok((path, query, hash))
}

/// `2 errors, 1 warning` style summary.
pub fn summarize(issues: &[ValidationIssue]) -> String {
    let errors = issues
        .iter()
        .filter(|i| i.severity == Severity::Error)
        .count();
    let warnings = issues.len() - errors;
    if issues.is_empty() {
        return "ok".to_string();
    }
    format!(
        "{} error{}, {} warning{}",
        errors,
        if errors == 1 { "" } else { "s" },
        warnings,
        if warnings == 1 { "" } else { "s" }
    )
}

/// Whether validation should fail the command.
pub fn has_failures(issues: &[ValidationIssue], strict: bool) -> bool {
    issues
        .iter()
        .any(|i| strict || i.severity == Severity::Error)
}

/// Human readable rendering of a plan.
pub fn describe_plan(plan: &ShellPlan) -> String {
    let mut out = String::new();
    match &plan.outcome {
        Outcome::Frame { src, label } => {
            out.push_str(&format!("frame     {}\n", src));
            if let Some(label) = label {
                out.push_str(&format!("label     {}\n", label));
            }
        }
        Outcome::External { href, label } => {
            out.push_str(&format!("external  {}\n", href));
            out.push_str(&format!("label     {}\n", label));
        }
        Outcome::Redirect { location } => {
            out.push_str(&format!("redirect  {}\n", location));
        }
        Outcome::Blocked { target, reason } => {
            out.push_str(&format!("blocked   {}\n", target));
            out.push_str(&format!("reason    {}\n", reason));
        }
        Outcome::NotFound { path } => {
            out.push_str(&format!("not found {}\n", path));
        }
    }
    if let Some(active) = &plan.active {
        out.push_str(&format!("active    {}\n", active.id));
        if !active.ancestors.is_empty() {
            out.push_str(&format!("expanded  {}\n", active.ancestors.join(", ")));
        }
    }
    if !plan.overrides.is_empty() {
        let pairs: Vec<String> = plan
            .overrides
            .to_query()
            .into_iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect();
        out.push_str(&format!("overrides {}\n", pairs.join("&")));
    }
    for rejected in &plan.overrides.rejected {
        out.push_str(&format!("ignored   {}\n", rejected));
    }
    out
}

fn apply_serve_args(mut config: FramedashConfig, args: &ServeArgs) -> FramedashConfig {
    if let Some(document) = &args.document.document {
        config.document.source = document.clone();
    }
    if let Some(host) = &args.host {
        config.http.host = host.clone();
    }
    if let Some(port) = args.port {
        config.http.port = port;
    }
    if let Some(dir) = &args.assets_dir {
        config.document.assets_dir = Some(PathBuf::from(dir));
    }
    if args.no_watch {
        config.document.watch = false;
    }
    config
}

/// Main entry point for the CLI application.
pub fn run() -> Result<()> {
    let app = App::new()?;
    app.run()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"{
        "title": "Ops",
        "baseUrl": "https://grafana.example.com",
        "defaultRoute": "/overview",
        "allowedDomains": ["grafana.example.com"],
        "sidebar": {"sections": [{"title": "Main", "items": [
            {"label": "Overview", "path": "/overview", "href": "/d/home"},
            {"label": "Rogue", "path": "/rogue", "href": "https://rogue.example.net/"}
        ]}]}
    }"#;

    fn issue(severity: Severity) -> ValidationIssue {
        ValidationIssue {
            severity,
            location: "sidebar".to_string(),
            message: "x".to_string(),
        }
    }

    fn app_for(args: &[&str]) -> App {
        App::from_cli(Cli::try_parse_from(args).expect("args parse")).expect("app builds")
    }

    #[test]
    fn split_location_handles_all_parts() {
        assert_eq!(
            split_location("/a/b?x=1#top").expect("valid"),
            ("/a/b", Some("x=1"), Some("top"))
        );
        assert_eq!(split_location("/a#").expect("valid"), ("/a", None, None));
        assert_eq!(
            split_location("/?theme.bg=red").expect("valid"),
            ("/", Some("theme.bg=red"), None)
        );
        assert!(split_location("a/b").is_err());
    }

    #[test]
    fn summary_counts_errors_and_warnings() {
        assert_eq!(summarize(&[]), "ok");
        assert_eq!(
            summarize(&[issue(Severity::Error), issue(Severity::Warning), issue(Severity::Warning)]),
            "1 error, 2 warnings"
        );
    }

    #[test]
    fn warnings_fail_only_when_strict() {
        let warnings = [issue(Severity::Warning)];
        assert!(!has_failures(&warnings, false));
        assert!(has_failures(&warnings, true));
        assert!(has_failures(&[issue(Severity::Error)], false));
    }

    #[test]
    fn describe_plan_shows_frame_and_active_item() {
        let dashboard = Dashboard::from_json(DOCUMENT).expect("valid document");
        let query = vec![("theme.primary".to_string(), "red".to_string())];
        let plan = dashboard
            .plan(&Request {
                path: "/overview",
                query: &query,
                hash: Some("row"),
            })
            .expect("plan");
        let text = describe_plan(&plan);
        assert!(text.contains("frame     https://grafana.example.com/d/home#row"));
        assert!(text.contains("active    main-overview"));
        assert!(text.contains("overrides theme.primary=red"));
    }

    #[test]
    fn validate_and_check_url_fail_on_blocked_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.json");
        std::fs::write(&path, DOCUMENT).expect("write document");
        let doc = path.to_str().expect("utf-8 path");

        let app = app_for(&["framedash", "validate", "-d", doc]);
        assert!(matches!(app.run(), Err(CliError::Validation(_))));

        let app = app_for(&[
            "framedash",
            "check-url",
            "-d",
            doc,
            "/d/other",
            "https://grafana.example.com/x",
        ]);
        assert!(app.run().is_ok());

        let app = app_for(&["framedash", "check-url", "-d", doc, "https://evil.example.org/"]);
        assert!(matches!(app.run(), Err(CliError::Validation(_))));
    }

    #[test]
    fn missing_document_is_a_document_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let doc = path.to_str().expect("utf-8 path");
        let app = app_for(&["framedash", "validate", "-d", doc]);
        assert!(matches!(app.run(), Err(CliError::Document(_))));
    }

    #[test]
    fn init_settings_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("server.toml");
        let path_arg = path.to_str().expect("utf-8 path");

        app_for(&["framedash", "init-settings", path_arg])
            .run()
            .expect("first write");
        let written = FramedashConfig::load(&path).expect("settings load");
        assert_eq!(written, FramedashConfig::default());

        let again = app_for(&["framedash", "init-settings", path_arg]).run();
        assert!(matches!(again, Err(CliError::Argument(_))));
        app_for(&["framedash", "init-settings", path_arg, "--force"])
            .run()
            .expect("forced write");
    }

    #[test]
    fn missing_settings_file_is_a_config_error() {
        let cli = Cli::try_parse_from([
            "framedash",
            "--settings",
            "/nonexistent/framedash.toml",
            "init-settings",
        ])
        .expect("args parse");
        assert!(matches!(App::from_cli(cli), Err(CliError::Config(_))));
    }

    #[test]
    fn serve_args_override_settings() {
        let cli = Cli::try_parse_from([
            "framedash", "serve", "-d", "other.json", "--port", "9000", "--no-watch",
        ])
        .expect("args parse");
        let Commands::Serve(args) = &cli.command else {
            panic!("expected serve");
        };
        let config = apply_serve_args(FramedashConfig::default(), args);
        assert_eq!(config.document.source, "other.json");
        assert_eq!(config.http.port, 9000);
        assert!(!config.document.watch);
    }
}
