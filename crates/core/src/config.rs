use crate::constants::{DEFAULT_HTTP_HOST, DEFAULT_HTTP_PORT};
use crate::Error;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Server settings for Framedash. Distinct from the dashboard document,
/// which describes what the shell shows.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FramedashConfig {
    /// HTTP server configuration.
    pub http: HttpConfig,

    /// Where the dashboard document comes from.
    pub document: DocumentConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Host to bind to.
    pub host: String,

    /// Port to bind to.
    pub port: u16,

    /// Enable CORS on the shell's JSON endpoints.
    pub enable_cors: bool,

    /// Allowed CORS origins. Empty means any.
    pub cors_allowed_origins: Vec<String>,

    /// Request timeout in seconds.
    pub request_timeout: u64,

    /// Enable request logging.
    pub enable_request_logging: bool,
}

/// Dashboard document source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DocumentConfig {
    /// File path or http(s) URL of the document.
    pub source: String,

    /// Reload the document when the file changes.
    pub watch: bool,

    /// Directory served under `/_shell/assets`.
    pub assets_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level.
    pub level: LogLevel,

    /// Log format.
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Error level.
    Error,

    /// Warning level.
    Warn,

    /// Info level.
    Info,

    /// Debug level.
    Debug,

    /// Trace level.
    Trace,
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format.
    Json,

    /// Text format.
    Text,

    /// Pretty format.
    Pretty,
}

/// Parsed form of [`DocumentConfig::source`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    File(PathBuf),
    Remote(Url),
}

impl DocumentSource {
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::config("document source is empty"));
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            let url = Url::parse(raw).map_err(|e| Error::config(format!("{raw}: {e}")))?;
            return Ok(Self::Remote(url));
        }
        Ok(Self::File(PathBuf::from(raw)))
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

impl std::fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{}", url),
        }
    }
}

impl LogLevel {
    /// Raise the level by `steps` (`-v` count).
    pub fn raised(self, steps: u8) -> Self {
        let order = [Self::Error, Self::Warn, Self::Info, Self::Debug, Self::Trace];
        let current = order.iter().position(|l| *l == self).unwrap_or(2);
        order[(current + steps as usize).min(order.len() - 1)]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl FramedashConfig {
    /// Default settings file: `<config dir>/framedash/server.toml`.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Cannot find config directory".to_string()))?
            .join("framedash");
        Ok(config_dir.join("server.toml"))
    }

    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::FileSystem(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content).map_err(|e| Error::Parse(format!("Failed to parse config: {}", e)))
    }

    /// Load from `path` when given, otherwise from the default location if it
    /// exists, otherwise defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match Self::default_path() {
            Ok(default) if default.exists() => Self::load(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Save configuration to file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Parse(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .map_err(|e| Error::FileSystem(format!("Failed to write config file: {}", e)))
    }

    pub fn document_source(&self) -> Result<DocumentSource> {
        DocumentSource::parse(&self.document.source)
    }

    pub fn bind_addr(&self) -> Result<std::net::SocketAddr> {
        format!("{}:{}", self.http.host, self.http.port)
            .parse()
            .map_err(|e| Error::config(format!("invalid bind address: {e}")))
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HTTP_HOST.to_string(),
            port: DEFAULT_HTTP_PORT,
            enable_cors: false,
            cors_allowed_origins: Vec::new(),
            request_timeout: 30,
            enable_request_logging: true,
        }
    }
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            source: "dashboard.json".to_string(),
            watch: true,
            assets_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_source_detects_urls() {
        assert_eq!(
            DocumentSource::parse("./dash.json").unwrap(),
            DocumentSource::File(PathBuf::from("./dash.json"))
        );
        assert!(matches!(
            DocumentSource::parse("HTTPS://cfg.example.com/dash.json").unwrap(),
            DocumentSource::Remote(_)
        ));
        assert!(DocumentSource::parse("  ").is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: FramedashConfig = toml::from_str(
            r#"
            [http]
            port = 9000

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.host, DEFAULT_HTTP_HOST);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.document.source, "dashboard.json");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("server.toml");
        let mut config = FramedashConfig::default();
        config.document.source = "https://cfg.example.com/d.json".to_string();
        config.save(&path).unwrap();
        assert_eq!(FramedashConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn log_level_raises_and_saturates() {
        assert_eq!(LogLevel::Info.raised(0), LogLevel::Info);
        assert_eq!(LogLevel::Info.raised(1), LogLevel::Debug);
        assert_eq!(LogLevel::Warn.raised(9), LogLevel::Trace);
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = FramedashConfig::default();
        assert_eq!(config.bind_addr().unwrap().port(), DEFAULT_HTTP_PORT);
    }
}
