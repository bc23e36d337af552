//! Live theme and branding overrides from the address bar.
//!
//! `?theme.primary=%23ff6600` sets `--primary`, `?brand.logo=/x.svg` swaps
//! the logo. Values end up inside a `<style>` block or an attribute, so
//! anything that could close either is dropped.

use crate::constants::{BRAND_PARAM_PREFIX, MAX_THEME_VALUE_LEN, THEME_PARAM_PREFIX};
use crate::document::DashboardDocument;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Branding fields that may be overridden.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BrandingOverrides {
    pub title: Option<String>,
    pub logo: Option<String>,
    pub favicon: Option<String>,
}

/// Overrides collected from one request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Overrides {
    /// CSS variable name (with `--`) to value.
    pub theme: BTreeMap<String, String>,
    pub branding: BrandingOverrides,
    /// Raw keys that were dropped.
    pub rejected: Vec<String>,
}

/// Branding and theme after overrides are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveLook {
    pub title: String,
    pub logo: Option<String>,
    pub favicon: Option<String>,
    pub home_href: String,
    pub theme: BTreeMap<String, String>,
}

/// CSS custom property names: letters, digits, `-` and `_`.
pub fn is_valid_var_name(name: &str) -> bool {
    let bare = name.strip_prefix("--").unwrap_or(name);
    !bare.is_empty()
        && bare
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Values that cannot break out of a declaration or the style element.
pub fn is_safe_css_value(value: &str) -> bool {
    !value.trim().is_empty()
        && value.len() <= MAX_THEME_VALUE_LEN
        && !value
            .chars()
            .any(|c| matches!(c, ';' | '{' | '}' | '<' | '>' | '"' | '\'' | '`' | '\\') || c.is_control())
}

/// Asset URLs: same-origin paths, http(s), or inline images.
pub fn is_safe_asset_url(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.chars().any(char::is_control) {
        return false;
    }
    let lower = value.to_ascii_lowercase();
    if lower.starts_with("data:") {
        return lower.starts_with("data:image/") && !lower.starts_with("data:image/svg");
    }
    match lower.find(':') {
        None => true,
        Some(colon) => {
            // a colon after the first '/', '?' or '#' is part of the path, not a scheme
            let first_delim = lower.find(['/', '?', '#']).unwrap_or(usize::MAX);
            if first_delim < colon {
                return true;
            }
            matches!(&lower[..colon], "http" | "https")
        }
    }
}

impl Overrides {
    /// Collect overrides from query pairs. Later duplicates win.
    pub fn from_query(pairs: &[(String, String)]) -> Self {
        let mut overrides = Self::default();
        for (key, value) in pairs {
            if let Some(name) = key.strip_prefix(THEME_PARAM_PREFIX) {
                if is_valid_var_name(name) && is_safe_css_value(value) {
                    let name = format!("--{}", name.trim_start_matches('-'));
                    overrides.theme.insert(name, value.trim().to_string());
                } else {
                    warn!("Dropping theme override {}", key);
                    overrides.rejected.push(key.clone());
                }
            } else if let Some(field) = key.strip_prefix(BRAND_PARAM_PREFIX) {
                let slot = match field {
                    "title" => {
                        overrides.branding.title = Some(value.trim().to_string());
                        continue;
                    }
                    "logo" => &mut overrides.branding.logo,
                    "favicon" => &mut overrides.branding.favicon,
                    _ => {
                        warn!("Unknown branding override {}", key);
                        overrides.rejected.push(key.clone());
                        continue;
                    }
                };
                if is_safe_asset_url(value) {
                    *slot = Some(value.trim().to_string());
                } else {
                    warn!("Dropping unsafe branding asset {}", key);
                    overrides.rejected.push(key.clone());
                }
            }
        }
        overrides
    }

    pub fn is_empty(&self) -> bool {
        self.theme.is_empty() && self.branding == BrandingOverrides::default()
    }

    /// Query pairs that reproduce these overrides, for carrying them across
    /// sidebar links.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .theme
            .iter()
            .map(|(name, value)| {
                (
                    format!("{}{}", THEME_PARAM_PREFIX, name.trim_start_matches("--")),
                    value.clone(),
                )
            })
            .collect();
        let branding = [
            ("title", &self.branding.title),
            ("logo", &self.branding.logo),
            ("favicon", &self.branding.favicon),
        ];
        for (field, value) in branding {
            if let Some(value) = value {
                pairs.push((format!("{BRAND_PARAM_PREFIX}{field}"), value.clone()));
            }
        }
        pairs
    }

    /// Merge the document's look with these overrides. Document theme values
    /// go through the same filter as overrides.
    pub fn apply(&self, document: &DashboardDocument) -> EffectiveLook {
        let mut theme: BTreeMap<String, String> = document
            .theme
            .iter()
            .filter(|(name, value)| {
                let ok = is_valid_var_name(name) && is_safe_css_value(value);
                if !ok {
                    warn!("Ignoring theme variable {} from document", name);
                }
                ok
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        theme.extend(self.theme.clone());

        let branding = &document.branding;
        let document_asset = |asset: &Option<String>| {
            asset.as_deref().filter(|a| is_safe_asset_url(a)).map(str::to_string)
        };

        EffectiveLook {
            title: self
                .branding
                .title
                .clone()
                .unwrap_or_else(|| document.display_title().to_string()),
            logo: self.branding.logo.clone().or_else(|| document_asset(&branding.logo)),
            favicon: self
                .branding
                .favicon
                .clone()
                .or_else(|| document_asset(&branding.favicon)),
            home_href: branding
                .home_href
                .clone()
                .filter(|h| is_safe_asset_url(h))
                .unwrap_or_else(|| "/".to_string()),
            theme,
        }
    }
}
