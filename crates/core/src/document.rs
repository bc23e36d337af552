//! Dashboard document model.
//!
//! The whole shell is driven by one JSON document: branding, theme variables,
//! the sidebar tree and the domains the frame may embed. Parsing normalises the
//! document once so routing can compare paths and ids directly.

use crate::allowlist::{AllowEntry, AllowList};
use crate::constants::MAX_DOCUMENT_SIZE;
use crate::frame::FrameTarget;
use crate::routing::{match_route, normalize_path};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use url::Url;

/// Root of the dashboard configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDocument {
    /// Dashboard title, also used for the storage namespace.
    #[serde(default = "default_title")]
    pub title: String,

    /// Base URL that relative hrefs are joined against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Route the shell redirects `/` to.
    #[serde(default = "default_route")]
    pub default_route: String,

    /// Hosts the frame may embed.
    #[serde(default)]
    pub allowed_domains: Vec<String>,

    /// Accept an explicit `url` query parameter as frame target.
    #[serde(default)]
    pub allow_url_override: bool,

    /// Forward address-bar query parameters into the frame.
    #[serde(default = "default_true")]
    pub propagate_query: bool,

    /// Forward the address-bar hash into the frame.
    #[serde(default = "default_true")]
    pub propagate_hash: bool,

    /// Extra query keys that are never forwarded to the frame.
    #[serde(default)]
    pub reserved_params: Vec<String>,

    /// Branding assets.
    #[serde(default)]
    pub branding: Branding,

    /// CSS custom properties applied to the shell.
    #[serde(default)]
    pub theme: BTreeMap<String, String>,

    /// Navigation sidebar.
    #[serde(default)]
    pub sidebar: SidebarConfig,
}

/// Branding assets shown in the sidebar header and the browser tab.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Branding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    /// Where the logo links to. Defaults to `/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_href: Option<String>,
}

/// Sidebar configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SidebarConfig {
    /// Whether the user may collapse the sidebar.
    #[serde(default = "default_true")]
    pub collapsible: bool,

    /// Initial collapsed state before any stored preference.
    #[serde(default)]
    pub default_collapsed: bool,

    /// Sections in display order.
    #[serde(default)]
    pub sections: Vec<NavSection>,
}

/// A titled group of navigation items.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavSection {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub items: Vec<NavItem>,
}

/// A navigation entry. Items with an `href` are routable; items with
/// `children` render as groups.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NavItem {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    /// Shell route for this item.
    #[serde(default)]
    pub path: Option<String>,
    /// Content URL shown in the frame.
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    /// Open in a new window instead of the frame.
    #[serde(default)]
    pub external: bool,
    #[serde(default, rename = "match")]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub children: Vec<NavItem>,
}

/// How an item's path is compared with the current route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    Exact,
    #[default]
    Prefix,
}

/// A flattened view of one nav item with its position in the tree.
#[derive(Debug, Clone)]
pub struct NavEntry<'a> {
    pub item: &'a NavItem,
    /// Ids of the enclosing section and parent items, outermost first.
    pub ancestors: Vec<&'a str>,
    /// Human readable location, e.g. `sidebar.sections[0].items[2]`.
    pub location: String,
}

impl NavEntry<'_> {
    /// Whether the entry can be navigated to.
    pub fn is_routable(&self) -> bool {
        self.item.href.is_some() && self.item.path.is_some()
    }

    pub fn id(&self) -> &str {
        self.item.id.as_deref().unwrap_or_default()
    }
}

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A problem found in a dashboard document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub location: String,
    pub message: String,
}

impl ValidationIssue {
    fn error(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            location: location.into(),
            message: message.into(),
        }
    }

    fn warning(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            location: location.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}: {}", tag, self.location, self.message)
    }
}

fn default_title() -> String {
    "Dashboard".to_string()
}

fn default_route() -> String {
    "/".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SidebarConfig {
    fn default() -> Self {
        Self {
            collapsible: true,
            default_collapsed: false,
            sections: Vec::new(),
        }
    }
}

impl Default for DashboardDocument {
    fn default() -> Self {
        Self {
            title: default_title(),
            base_url: None,
            default_route: default_route(),
            allowed_domains: Vec::new(),
            allow_url_override: false,
            propagate_query: true,
            propagate_hash: true,
            reserved_params: Vec::new(),
            branding: Branding::default(),
            theme: BTreeMap::new(),
            sidebar: SidebarConfig::default(),
        }
    }
}

impl DashboardDocument {
    /// Parse and normalise a JSON document.
    pub fn from_json(content: &str) -> Result<Self> {
        if content.len() > MAX_DOCUMENT_SIZE {
            return Err(Error::Parse(format!(
                "document is {} bytes, limit is {}",
                content.len(),
                MAX_DOCUMENT_SIZE
            )));
        }
        let mut document: DashboardDocument = serde_json::from_str(content)?;
        document.normalize();
        Ok(document)
    }

    /// Read a document from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::FileSystem(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Serialise back to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Title shown in the sidebar and browser tab.
    pub fn display_title(&self) -> &str {
        self.branding.title.as_deref().unwrap_or(&self.title)
    }

    /// Parsed `base_url`, if any.
    pub fn base(&self) -> Result<Option<Url>> {
        match self.base_url.as_deref() {
            None => Ok(None),
            Some(raw) => {
                let url = Url::parse(raw).map_err(|e| Error::url(format!("baseUrl {raw}: {e}")))?;
                Ok(Some(url))
            }
        }
    }

    fn normalize(&mut self) {
        self.default_route = normalize_path(&self.default_route);

        self.theme = std::mem::take(&mut self.theme)
            .into_iter()
            .map(|(name, value)| {
                let name = if name.starts_with("--") {
                    name
                } else {
                    format!("--{}", name.trim_start_matches('-'))
                };
                (name, value.trim().to_string())
            })
            .collect();

        let mut seen_ids: HashMap<String, usize> = HashMap::new();
        for (index, section) in self.sidebar.sections.iter_mut().enumerate() {
            let base = section
                .id
                .clone()
                .or_else(|| section.title.as_deref().map(slugify))
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| format!("section-{index}"));
            let section_id = unique_id(base, &mut seen_ids);
            section.id = Some(section_id.clone());
            for item in &mut section.items {
                normalize_item(item, &section_id, &mut seen_ids);
            }
        }
    }

    /// Depth-first list of every item in the sidebar.
    pub fn nav_entries(&self) -> Vec<NavEntry<'_>> {
        let mut entries = Vec::new();
        for (s, section) in self.sidebar.sections.iter().enumerate() {
            let section_id = section.id.as_deref().unwrap_or_default();
            for (i, item) in section.items.iter().enumerate() {
                collect_entries(
                    item,
                    vec![section_id],
                    format!("sidebar.sections[{s}].items[{i}]"),
                    &mut entries,
                );
            }
        }
        entries
    }

    /// Find an item by its id.
    pub fn find_item(&self, id: &str) -> Option<&NavItem> {
        self.nav_entries()
            .into_iter()
            .find(|entry| entry.id() == id)
            .map(|entry| entry.item)
    }

    /// Report problems without rejecting the document.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        let mut entries_ok = Vec::new();
        for (i, raw) in self.allowed_domains.iter().enumerate() {
            match AllowEntry::parse(raw) {
                Ok(entry) => entries_ok.push(entry),
                Err(e) => issues.push(ValidationIssue::error(
                    format!("allowedDomains[{i}]"),
                    e.to_string(),
                )),
            }
        }
        let allow_list = AllowList::from_entries(entries_ok);

        let base = match self.base() {
            Ok(base) => {
                if let Some(url) = &base {
                    if !matches!(url.scheme(), "http" | "https") {
                        issues.push(ValidationIssue::error(
                            "baseUrl",
                            format!("scheme {} is not http or https", url.scheme()),
                        ));
                    }
                }
                base
            }
            Err(e) => {
                issues.push(ValidationIssue::error("baseUrl", e.to_string()));
                None
            }
        };

        let mut paths: HashMap<&str, String> = HashMap::new();
        for entry in self.nav_entries() {
            let item = entry.item;
            if item.href.is_none() && item.children.is_empty() {
                issues.push(ValidationIssue::warning(
                    &entry.location,
                    format!("item '{}' has neither href nor children", item.label),
                ));
            }
            if item.external && item.href.is_none() {
                issues.push(ValidationIssue::error(
                    &entry.location,
                    "external item needs an href",
                ));
            }

            if !entry.is_routable() {
                continue;
            }
            if let Some(path) = item.path.as_deref() {
                if let Some(previous) = paths.insert(path, entry.location.clone()) {
                    issues.push(ValidationIssue::error(
                        &entry.location,
                        format!("route {path} is already used by {previous}"),
                    ));
                }
            }

            if let Some(href) = item.href.as_deref() {
                match FrameTarget::parse(href, base.as_ref()) {
                    Ok(target) => {
                        if !item.external {
                            if let Err(rejection) = allow_list.permits(&target) {
                                issues.push(ValidationIssue::error(
                                    &entry.location,
                                    format!("href {href} would be blocked: {rejection}"),
                                ));
                            }
                        }
                    }
                    Err(e) => issues.push(ValidationIssue::error(&entry.location, e.to_string())),
                }
            }
        }

        if self.default_route != "/" && match_route(self, &self.default_route).is_none() {
            issues.push(ValidationIssue::error(
                "defaultRoute",
                format!("{} does not match any sidebar item", self.default_route),
            ));
        }

        issues
    }
}

fn normalize_item(item: &mut NavItem, parent_id: &str, seen_ids: &mut HashMap<String, usize>) {
    let base = item
        .id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{}-{}", parent_id, slugify(&item.label)));
    let id = unique_id(base, seen_ids);

    item.path = match (item.path.take(), item.href.as_deref()) {
        (Some(path), _) => Some(normalize_path(&path)),
        (None, Some(href)) if is_root_relative(href) => Some(normalize_path(href)),
        (None, Some(_)) => Some(normalize_path(&id)),
        (None, None) => None,
    };

    for child in &mut item.children {
        normalize_item(child, &id, seen_ids);
    }
    item.id = Some(id);
}

fn collect_entries<'a>(
    item: &'a NavItem,
    ancestors: Vec<&'a str>,
    location: String,
    out: &mut Vec<NavEntry<'a>>,
) {
    let mut child_ancestors = ancestors.clone();
    child_ancestors.push(item.id.as_deref().unwrap_or_default());
    out.push(NavEntry {
        item,
        ancestors,
        location: location.clone(),
    });
    for (i, child) in item.children.iter().enumerate() {
        collect_entries(
            child,
            child_ancestors.clone(),
            format!("{location}.children[{i}]"),
            out,
        );
    }
}

fn is_root_relative(href: &str) -> bool {
    href.starts_with('/') && !href.starts_with("//")
}

fn unique_id(base: String, seen: &mut HashMap<String, usize>) -> String {
    let count = seen.entry(base.clone()).or_insert(0);
    *count += 1;
    if *count == 1 {
        base
    } else {
        format!("{}-{}", base, count)
    }
}

/// Lowercase ASCII slug: runs of anything but letters and digits become `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}
