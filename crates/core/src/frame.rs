//! Frame URL composition.
//!
//! A [`FrameTarget`] is either an absolute URL or a same-origin reference.
//! Same-origin references are parsed against a placeholder origin so the
//! query and fragment can be edited with `url`, and printed without it.

use crate::constants::{BRAND_PARAM_PREFIX, THEME_PARAM_PREFIX, URL_OVERRIDE_PARAM};
use crate::document::DashboardDocument;
use crate::{Error, Result};
use std::collections::HashSet;
use std::fmt;
use url::{Position, Url};

const RELATIVE_BASE: &str = "http://relative.invalid/";

/// How the href named its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    Absolute,
    /// `/path`, printed from the path on.
    RootRelative,
    /// `page.html`, `?q=1`, `#top`: printed without the leading `/` the
    /// placeholder adds. Dot segments are resolved against the root.
    PathRelative,
}

/// Where the embedded frame points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTarget {
    url: Url,
    reference: Reference,
}

impl FrameTarget {
    /// Parse an href, joining relative references against `base` when given.
    ///
    /// A protocol-relative `//host/path` is treated as absolute `https`.
    pub fn parse(href: &str, base: Option<&Url>) -> Result<Self> {
        let href = href.trim();
        if href.is_empty() {
            return Err(Error::url("empty href"));
        }

        if let Some(rest) = href.strip_prefix("//") {
            let url = Url::parse(&format!("https://{rest}"))?;
            return Ok(Self {
                url,
                reference: Reference::Absolute,
            });
        }

        match Url::parse(href) {
            Ok(url) => Ok(Self {
                url,
                reference: Reference::Absolute,
            }),
            Err(url::ParseError::RelativeUrlWithoutBase) => match base {
                Some(base) => Ok(Self {
                    url: base.join(href)?,
                    reference: Reference::Absolute,
                }),
                None => {
                    let placeholder = Url::parse(RELATIVE_BASE)?;
                    let reference = if href.starts_with('/') {
                        Reference::RootRelative
                    } else {
                        Reference::PathRelative
                    };
                    Ok(Self {
                        url: placeholder.join(href)?,
                        reference,
                    })
                }
            },
            Err(e) => Err(Error::url(format!("{href}: {e}"))),
        }
    }

    /// Same-origin reference without scheme or host.
    pub fn is_relative(&self) -> bool {
        self.reference != Reference::Absolute
    }

    /// The absolute URL, `None` for same-origin references.
    pub fn absolute(&self) -> Option<&Url> {
        (!self.is_relative()).then_some(&self.url)
    }

    pub fn host(&self) -> Option<&str> {
        self.absolute().and_then(Url::host_str)
    }

    pub fn fragment(&self) -> Option<&str> {
        self.url.fragment()
    }

    /// Append a sub-path below the current path, keeping query and fragment.
    pub fn append_path(&mut self, remainder: &str) {
        let remainder = remainder.trim_start_matches('/');
        if remainder.is_empty() {
            return;
        }
        let path = format!("{}/{}", self.url.path().trim_end_matches('/'), remainder);
        self.url.set_path(&path);
    }

    /// Query pairs currently on the target.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url.query_pairs().into_owned().collect()
    }

    fn set_query_pairs(&mut self, pairs: &[(String, String)]) {
        if pairs.is_empty() {
            self.url.set_query(None);
        } else {
            self.url.query_pairs_mut().clear().extend_pairs(pairs);
        }
    }

    fn set_fragment(&mut self, fragment: &str) {
        self.url.set_fragment(Some(fragment));
    }
}

impl fmt::Display for FrameTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reference {
            Reference::Absolute => f.write_str(self.url.as_str()),
            Reference::RootRelative => f.write_str(&self.url[Position::BeforePath..]),
            Reference::PathRelative => {
                let tail = &self.url[Position::BeforePath..];
                f.write_str(tail.strip_prefix('/').unwrap_or(tail))
            }
        }
    }
}

/// Query keys that belong to the shell and never reach the frame.
#[derive(Debug, Clone, Default)]
pub struct ReservedParams {
    exact: HashSet<String>,
}

impl ReservedParams {
    pub fn new(extra: impl IntoIterator<Item = String>) -> Self {
        let mut exact: HashSet<String> = extra.into_iter().collect();
        exact.insert(URL_OVERRIDE_PARAM.to_string());
        Self { exact }
    }

    pub fn for_document(document: &DashboardDocument) -> Self {
        Self::new(document.reserved_params.iter().cloned())
    }

    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with(THEME_PARAM_PREFIX)
            || key.starts_with(BRAND_PARAM_PREFIX)
            || self.exact.contains(key)
    }
}

/// Switches for [`compose_frame_url`].
#[derive(Debug, Clone, Copy)]
pub struct ComposeOptions<'a> {
    pub propagate_query: bool,
    pub propagate_hash: bool,
    pub reserved: &'a ReservedParams,
}

impl<'a> ComposeOptions<'a> {
    pub fn for_document(document: &DashboardDocument, reserved: &'a ReservedParams) -> Self {
        Self {
            propagate_query: document.propagate_query,
            propagate_hash: document.propagate_hash,
            reserved,
        }
    }
}

/// Merge the address-bar query and hash into `target`.
///
/// Forwarded keys replace the target's values for the same key at the
/// position of its first occurrence; new keys are appended in address-bar
/// order. A non-empty hash replaces the target fragment.
pub fn compose_frame_url(
    target: &FrameTarget,
    address_query: &[(String, String)],
    address_hash: Option<&str>,
    options: ComposeOptions<'_>,
) -> FrameTarget {
    let mut composed = target.clone();

    if options.propagate_query {
        let forwarded: Vec<&(String, String)> = address_query
            .iter()
            .filter(|(key, _)| !key.is_empty() && !options.reserved.is_reserved(key))
            .collect();

        if !forwarded.is_empty() {
            let existing = target.query_pairs();
            let forwarded_keys: HashSet<&str> =
                forwarded.iter().map(|(k, _)| k.as_str()).collect();
            let existing_keys: HashSet<&str> = existing.iter().map(|(k, _)| k.as_str()).collect();

            let mut merged: Vec<(String, String)> = Vec::with_capacity(existing.len() + forwarded.len());
            let mut replaced: HashSet<&str> = HashSet::new();
            for (key, value) in &existing {
                if forwarded_keys.contains(key.as_str()) {
                    if replaced.insert(key.as_str()) {
                        merged.extend(
                            forwarded
                                .iter()
                                .filter(|(k, _)| k == key)
                                .map(|pair| (*pair).clone()),
                        );
                    }
                } else {
                    merged.push((key.clone(), value.clone()));
                }
            }
            merged.extend(
                forwarded
                    .iter()
                    .filter(|(k, _)| !existing_keys.contains(k.as_str()))
                    .map(|pair| (*pair).clone()),
            );
            composed.set_query_pairs(&merged);
        }
    }

    if options.propagate_hash {
        if let Some(hash) = address_hash.map(|h| h.trim_start_matches('#')) {
            if !hash.is_empty() {
                composed.set_fragment(hash);
            }
        }
    }

    composed
}
