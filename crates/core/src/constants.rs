//! Application constants and configuration defaults.

/// Default HTTP server port.
pub const DEFAULT_HTTP_PORT: u16 = 8090;

/// Default bind host.
pub const DEFAULT_HTTP_HOST: &str = "127.0.0.1";

/// Path prefix reserved for the shell's own endpoints.
pub const SHELL_PREFIX: &str = "/_shell";

/// Query parameter that carries an explicit frame target.
pub const URL_OVERRIDE_PARAM: &str = "url";

/// Query prefix for theme variable overrides (`theme.primary=...`).
pub const THEME_PARAM_PREFIX: &str = "theme.";

/// Query prefix for branding overrides (`brand.logo=...`).
pub const BRAND_PARAM_PREFIX: &str = "brand.";

/// Maximum accepted length of an overridden theme value.
pub const MAX_THEME_VALUE_LEN: usize = 200;

/// Storage key prefix used by the client script.
pub const STORAGE_KEY_PREFIX: &str = "framedash";

/// Timeout for fetching a remote dashboard document, in seconds.
pub const REMOTE_DOCUMENT_TIMEOUT: u64 = 10;

/// Largest dashboard document accepted, in bytes.
pub const MAX_DOCUMENT_SIZE: usize = 1024 * 1024;
