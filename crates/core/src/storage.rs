//! Key-value flags the client script keeps in `localStorage`.
//!
//! The server renders the document defaults; the script replaces them with
//! whatever the browser has stored under the same keys.

use crate::constants::STORAGE_KEY_PREFIX;
use crate::document::{slugify, DashboardDocument};
use serde::Serialize;
use std::collections::BTreeMap;

const COLLAPSED_SUFFIX: &str = "sidebar-collapsed";
const SECTION_SEGMENT: &str = "section";

/// UI state that survives reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFlags {
    pub sidebar_collapsed: bool,
    /// Section id to open (`true`) or closed (`false`).
    pub sections: BTreeMap<String, bool>,
}

/// Key prefix for one dashboard, so two dashboards on one origin keep
/// separate state.
pub fn namespace(document: &DashboardDocument) -> String {
    let slug = slugify(&document.title);
    if slug.is_empty() {
        STORAGE_KEY_PREFIX.to_string()
    } else {
        format!("{STORAGE_KEY_PREFIX}:{slug}")
    }
}

pub fn collapsed_key(namespace: &str) -> String {
    format!("{namespace}:{COLLAPSED_SUFFIX}")
}

pub fn section_key(namespace: &str, section_id: &str) -> String {
    format!("{namespace}:{SECTION_SEGMENT}:{section_id}")
}

impl StorageFlags {
    /// Defaults from the document: every section open.
    pub fn defaults_for(document: &DashboardDocument) -> Self {
        Self {
            sidebar_collapsed: document.sidebar.collapsible && document.sidebar.default_collapsed,
            sections: document
                .sidebar
                .sections
                .iter()
                .filter_map(|s| s.id.clone())
                .map(|id| (id, true))
                .collect(),
        }
    }

    /// Overlay stored entries. Keys outside `namespace` and unknown values
    /// are ignored.
    pub fn apply_entries<'a>(
        &mut self,
        namespace: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        let collapsed = collapsed_key(namespace);
        let section_prefix = format!("{namespace}:{SECTION_SEGMENT}:");
        for (key, value) in entries {
            if key == collapsed {
                match value {
                    "1" => self.sidebar_collapsed = true,
                    "0" => self.sidebar_collapsed = false,
                    _ => {}
                }
            } else if let Some(id) = key.strip_prefix(section_prefix.as_str()) {
                let open = match value {
                    "open" => true,
                    "closed" => false,
                    _ => continue,
                };
                if let Some(slot) = self.sections.get_mut(id) {
                    *slot = open;
                }
            }
        }
    }

    /// Serialise to storage entries.
    pub fn to_entries(&self, namespace: &str) -> Vec<(String, String)> {
        let mut entries = vec![(
            collapsed_key(namespace),
            if self.sidebar_collapsed { "1" } else { "0" }.to_string(),
        )];
        entries.extend(self.sections.iter().map(|(id, open)| {
            (
                section_key(namespace, id),
                if *open { "open" } else { "closed" }.to_string(),
            )
        }));
        entries
    }
}
