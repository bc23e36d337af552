//! Domain allow-list for the embedded frame.
//!
//! The list decides what the shell is willing to put in its frame. It is not
//! an isolation boundary: anything the embedded page does after loading is
//! outside its reach.

use crate::frame::FrameTarget;
use crate::{Error, Result};
use std::fmt;
use url::Url;

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowEntry {
    /// `*`: any http(s) host.
    Any,
    /// `example.com`: that host only.
    Host(String),
    /// `*.example.com`: any subdomain, not the apex.
    Subdomains(String),
    /// `https://example.com:8443`: that exact origin.
    Origin {
        scheme: String,
        host: String,
        port: u16,
    },
}

/// Why a target was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Scheme(String),
    Credentials,
    MissingHost,
    HostNotAllowed(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Scheme(scheme) => write!(f, "scheme '{scheme}' is not allowed"),
            Rejection::Credentials => f.write_str("URLs with embedded credentials are not allowed"),
            Rejection::MissingHost => f.write_str("URL has no host"),
            Rejection::HostNotAllowed(host) => write!(f, "host '{host}' is not in the allow-list"),
        }
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn valid_host(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '[' | ']' | ':'))
}

impl AllowEntry {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Ok(Self::Any);
        }

        if trimmed.contains("://") {
            let url = Url::parse(trimmed)
                .map_err(|e| Error::allow_list(format!("{trimmed}: {e}")))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::allow_list(format!(
                    "{trimmed}: only http and https origins can be allowed"
                )));
            }
            let host = url
                .host_str()
                .map(normalize_host)
                .ok_or_else(|| Error::allow_list(format!("{trimmed}: missing host")))?;
            let port = url
                .port_or_known_default()
                .ok_or_else(|| Error::allow_list(format!("{trimmed}: missing port")))?;
            return Ok(Self::Origin {
                scheme: url.scheme().to_string(),
                host,
                port,
            });
        }

        if let Some(domain) = trimmed.strip_prefix("*.") {
            let domain = normalize_host(domain);
            if !valid_host(&domain) || domain.contains('*') {
                return Err(Error::allow_list(format!("{trimmed}: invalid wildcard domain")));
            }
            return Ok(Self::Subdomains(domain));
        }

        let host = normalize_host(trimmed);
        if !valid_host(&host) {
            return Err(Error::allow_list(format!("{trimmed}: invalid host")));
        }
        Ok(Self::Host(host))
    }

    fn matches(&self, url: &Url, host: &str) -> bool {
        match self {
            AllowEntry::Any => true,
            AllowEntry::Host(allowed) => host == allowed,
            AllowEntry::Subdomains(domain) => host
                .strip_suffix(domain.as_str())
                .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
            AllowEntry::Origin { scheme, host: allowed, port } => {
                url.scheme() == scheme
                    && host == allowed
                    && url.port_or_known_default() == Some(*port)
            }
        }
    }
}

/// Parsed allow-list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    entries: Vec<AllowEntry>,
}

impl AllowList {
    /// Parse every entry; the first malformed entry fails the whole list.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let entries = raw
            .iter()
            .map(|entry| AllowEntry::parse(entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<AllowEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[AllowEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check an absolute URL.
    pub fn check(&self, url: &Url) -> std::result::Result<(), Rejection> {
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Rejection::Scheme(url.scheme().to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(Rejection::Credentials);
        }
        let host = url
            .host_str()
            .map(normalize_host)
            .ok_or(Rejection::MissingHost)?;

        if self.entries.iter().any(|entry| entry.matches(url, &host)) {
            Ok(())
        } else {
            Err(Rejection::HostNotAllowed(host))
        }
    }

    /// Check a frame target. Same-origin references are always permitted.
    pub fn permits(&self, target: &FrameTarget) -> std::result::Result<(), Rejection> {
        match target.absolute() {
            Some(url) => self.check(url),
            None => Ok(()),
        }
    }
}
