//! Route resolution: which sidebar item does the current path belong to,
//! and which content URL does it point the frame at.

use crate::constants::URL_OVERRIDE_PARAM;
use crate::document::{DashboardDocument, MatchMode, NavItem};
use crate::frame::FrameTarget;
use crate::Result;

/// The sidebar entry selected for a path.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub item: &'a NavItem,
    /// Ids of the enclosing section and parent items, outermost first.
    pub ancestors: Vec<&'a str>,
    /// Part of the path below the item's route, with a leading `/`, or empty.
    pub remainder: String,
    pub exact: bool,
}

impl RouteMatch<'_> {
    pub fn item_id(&self) -> &str {
        self.item.id.as_deref().unwrap_or_default()
    }
}

/// Outcome of resolving a route, before the allow-list is consulted.
#[derive(Debug, Clone)]
pub enum Resolution<'a> {
    /// `/` was requested and the document names another default route.
    Redirect(String),
    /// Show `target` in the frame.
    Frame {
        matched: RouteMatch<'a>,
        target: FrameTarget,
    },
    /// The item opens outside the shell.
    External {
        matched: RouteMatch<'a>,
        target: FrameTarget,
    },
    /// Explicit `url` parameter.
    Override { target: FrameTarget },
    /// The href or `url` parameter is not a usable URL.
    Unusable {
        matched: Option<RouteMatch<'a>>,
        raw: String,
        reason: String,
    },
    NotFound,
}

/// Normalise a route path: leading `/`, no duplicate or trailing slashes,
/// no query or fragment.
pub fn normalize_path(path: &str) -> String {
    let path = path
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Whether `path` equals `prefix` or continues it at a segment boundary.
fn is_segment_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Pick the sidebar entry for `path`.
///
/// Exact matches win over prefix matches; among prefix matches the longest
/// route wins and ties keep document order.
pub fn match_route<'a>(document: &'a DashboardDocument, path: &str) -> Option<RouteMatch<'a>> {
    let path = normalize_path(path);
    let mut best: Option<(usize, RouteMatch<'a>)> = None;

    for entry in document.nav_entries() {
        if !entry.is_routable() {
            continue;
        }
        let Some(route) = entry.item.path.as_deref() else {
            continue;
        };

        if route == path {
            return Some(RouteMatch {
                item: entry.item,
                ancestors: entry.ancestors,
                remainder: String::new(),
                exact: true,
            });
        }

        if entry.item.match_mode != MatchMode::Prefix || !is_segment_prefix(&path, route) {
            continue;
        }
        let better = best.as_ref().map_or(true, |(len, _)| route.len() > *len);
        if better {
            let remainder = if route == "/" {
                path.clone()
            } else {
                path[route.len()..].to_string()
            };
            best = Some((
                route.len(),
                RouteMatch {
                    item: entry.item,
                    ancestors: entry.ancestors,
                    remainder,
                    exact: false,
                },
            ));
        }
    }

    best.map(|(_, matched)| matched)
}

/// Resolve `path` and the address-bar `query` to what the shell should show.
pub fn resolve_route<'a>(
    document: &'a DashboardDocument,
    path: &str,
    query: &[(String, String)],
) -> Result<Resolution<'a>> {
    let base = document.base()?;

    if document.allow_url_override {
        if let Some((_, raw)) = query.iter().find(|(k, _)| k == URL_OVERRIDE_PARAM) {
            return Ok(match FrameTarget::parse(raw, base.as_ref()) {
                Ok(target) => Resolution::Override { target },
                Err(e) => Resolution::Unusable {
                    matched: None,
                    raw: raw.clone(),
                    reason: e.to_string(),
                },
            });
        }
    }

    let normalized = normalize_path(path);
    if normalized == "/" && document.default_route != "/" {
        return Ok(Resolution::Redirect(document.default_route.clone()));
    }

    let Some(matched) = match_route(document, &normalized) else {
        return Ok(Resolution::NotFound);
    };
    let Some(href) = matched.item.href.as_deref() else {
        return Ok(Resolution::NotFound);
    };

    let mut target = match FrameTarget::parse(href, base.as_ref()) {
        Ok(target) => target,
        Err(e) => {
            return Ok(Resolution::Unusable {
                raw: href.to_string(),
                reason: e.to_string(),
                matched: Some(matched),
            })
        }
    };
    if matched.item.external {
        return Ok(Resolution::External { matched, target });
    }
    target.append_path(&matched.remainder);
    Ok(Resolution::Frame { matched, target })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> DashboardDocument {
        DashboardDocument::from_json(
            r#"{
                "baseUrl": "https://app.example.com/",
                "defaultRoute": "/home",
                "allowUrlOverride": true,
                "sidebar": {"sections": [{"title": "Main", "items": [
                    {"label": "Home", "path": "/home", "href": "/ui/home", "match": "exact"},
                    {"label": "Reports", "path": "/reports", "href": "/ui/reports/"},
                    {"label": "Quarterly", "path": "/reports/quarterly", "href": "https://bi.example.com/q?view=1"},
                    {"label": "Status", "path": "/status", "href": "https://status.example.com", "external": true},
                    {"label": "Tools", "children": [
                        {"label": "Shell", "path": "/tools/shell", "href": "/ui/shell"}
                    ]}
                ]}]}
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn normalize_path_cleans_slashes_and_suffixes() {
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("reports"), "/reports");
        assert_eq!(normalize_path("//reports///q1/"), "/reports/q1");
        assert_eq!(normalize_path("/reports?x=1#top"), "/reports");
    }

    #[test]
    fn exact_match_beats_prefix() {
        let doc = document();
        let m = match_route(&doc, "/reports/quarterly").unwrap();
        assert_eq!(m.item.label, "Quarterly");
        assert!(m.exact);
        assert_eq!(m.remainder, "");
    }

    #[test]
    fn longest_prefix_wins_on_segment_boundary() {
        let doc = document();
        let m = match_route(&doc, "/reports/quarterly/2024").unwrap();
        assert_eq!(m.item.label, "Quarterly");
        assert_eq!(m.remainder, "/2024");

        let m = match_route(&doc, "/reports/annual").unwrap();
        assert_eq!(m.item.label, "Reports");
        assert_eq!(m.remainder, "/annual");

        assert!(match_route(&doc, "/reportsx").is_none());
    }

    #[test]
    fn exact_mode_rejects_sub_paths() {
        let doc = document();
        assert!(match_route(&doc, "/home").is_some());
        assert!(match_route(&doc, "/home/deeper").is_none());
    }

    #[test]
    fn nested_match_reports_ancestors() {
        let doc = document();
        let m = match_route(&doc, "/tools/shell").unwrap();
        assert_eq!(m.item_id(), "main-tools-shell");
        assert_eq!(m.ancestors, vec!["main", "main-tools"]);
    }

    #[test]
    fn root_prefix_acts_as_catch_all() {
        let doc = DashboardDocument::from_json(
            r#"{"sidebar":{"sections":[{"items":[
                {"label":"App","path":"/","href":"https://app.example.com/"},
                {"label":"Admin","path":"/admin","href":"https://app.example.com/admin"}
            ]}]}}"#,
        )
        .unwrap();
        let m = match_route(&doc, "/users/42").unwrap();
        assert_eq!(m.item.label, "App");
        assert_eq!(m.remainder, "/users/42");
        assert_eq!(match_route(&doc, "/admin/x").unwrap().item.label, "Admin");
    }

    #[test]
    fn resolve_redirects_root_to_default_route() {
        let doc = document();
        match resolve_route(&doc, "/", &[]).unwrap() {
            Resolution::Redirect(to) => assert_eq!(to, "/home"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolve_appends_remainder_to_href() {
        let doc = document();
        match resolve_route(&doc, "/reports/annual/2023", &[]).unwrap() {
            Resolution::Frame { target, matched } => {
                assert_eq!(matched.item.label, "Reports");
                assert_eq!(
                    target.to_string(),
                    "https://app.example.com/ui/reports/annual/2023"
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolve_marks_external_items() {
        let doc = document();
        assert!(matches!(
            resolve_route(&doc, "/status", &[]).unwrap(),
            Resolution::External { .. }
        ));
    }

    #[test]
    fn resolve_honours_url_override_when_enabled() {
        let doc = document();
        let query = vec![("url".to_string(), "https://other.example.com/x".to_string())];
        match resolve_route(&doc, "/home", &query).unwrap() {
            Resolution::Override { target } => {
                assert_eq!(target.to_string(), "https://other.example.com/x")
            }
            other => panic!("unexpected {other:?}"),
        }

        let mut strict = document();
        strict.allow_url_override = false;
        assert!(matches!(
            resolve_route(&strict, "/home", &query).unwrap(),
            Resolution::Frame { .. }
        ));
    }

    #[test]
    fn resolve_reports_unusable_override() {
        let doc = document();
        let query = vec![("url".to_string(), "https://".to_string())];
        match resolve_route(&doc, "/home", &query).unwrap() {
            Resolution::Unusable { matched, raw, .. } => {
                assert!(matched.is_none());
                assert_eq!(raw, "https://");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn resolve_unknown_path_is_not_found() {
        let doc = document();
        assert!(matches!(
            resolve_route(&doc, "/nope", &[]).unwrap(),
            Resolution::NotFound
        ));
    }
}
