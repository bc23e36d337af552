//! A loaded dashboard and the per-request shell plan.

use crate::allowlist::AllowList;
use crate::document::DashboardDocument;
use crate::frame::{compose_frame_url, ComposeOptions, ReservedParams};
use crate::overrides::{EffectiveLook, Overrides};
use crate::routing::{resolve_route, Resolution};
use crate::storage::{self, StorageFlags};
use crate::Result;
use serde::Serialize;
use tracing::{debug, warn};

/// A document together with its parsed allow-list.
#[derive(Debug, Clone)]
pub struct Dashboard {
    document: DashboardDocument,
    allow_list: AllowList,
    reserved: ReservedParams,
}

/// What the main area of the shell shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    Frame {
        src: String,
        label: Option<String>,
    },
    External {
        href: String,
        label: String,
    },
    Redirect {
        location: String,
    },
    Blocked {
        target: String,
        reason: String,
    },
    NotFound {
        path: String,
    },
}

/// The highlighted sidebar item and the groups to expand for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveNav {
    pub id: String,
    pub ancestors: Vec<String>,
}

/// Everything the renderer needs for one request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellPlan {
    pub outcome: Outcome,
    pub active: Option<ActiveNav>,
    pub look: EffectiveLook,
    pub overrides: Overrides,
    pub storage_namespace: String,
    pub flags: StorageFlags,
}

/// Address-bar state of one request.
#[derive(Debug, Clone, Default)]
pub struct Request<'a> {
    pub path: &'a str,
    pub query: &'a [(String, String)],
    pub hash: Option<&'a str>,
}

impl Dashboard {
    /// Build from a document. Fails when the allow-list is malformed.
    pub fn new(document: DashboardDocument) -> Result<Self> {
        let allow_list = AllowList::parse(&document.allowed_domains)?;
        document.base()?;
        let reserved = ReservedParams::for_document(&document);
        Ok(Self {
            document,
            allow_list,
            reserved,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Self::new(DashboardDocument::from_json(content)?)
    }

    pub fn document(&self) -> &DashboardDocument {
        &self.document
    }

    pub fn allow_list(&self) -> &AllowList {
        &self.allow_list
    }

    pub fn reserved(&self) -> &ReservedParams {
        &self.reserved
    }

    /// Decide what the shell shows for `request`.
    pub fn plan(&self, request: &Request<'_>) -> Result<ShellPlan> {
        let overrides = Overrides::from_query(request.query);
        let look = overrides.apply(&self.document);
        let options = ComposeOptions::for_document(&self.document, &self.reserved);

        let mut active = None;
        let outcome = match resolve_route(&self.document, request.path, request.query)? {
            Resolution::Redirect(location) => Outcome::Redirect { location },
            Resolution::NotFound => Outcome::NotFound {
                path: request.path.to_string(),
            },
            Resolution::External { matched, target } => {
                active = Some(ActiveNav {
                    id: matched.item_id().to_string(),
                    ancestors: matched.ancestors.iter().map(|a| a.to_string()).collect(),
                });
                Outcome::External {
                    href: target.to_string(),
                    label: matched.item.label.clone(),
                }
            }
            Resolution::Override { target } => match self.allow_list.permits(&target) {
                Ok(()) => Outcome::Frame {
                    src: compose_frame_url(&target, request.query, request.hash, options)
                        .to_string(),
                    label: None,
                },
                Err(rejection) => {
                    warn!("Blocked frame override {}: {}", target, rejection);
                    Outcome::Blocked {
                        target: target.to_string(),
                        reason: rejection.to_string(),
                    }
                }
            },
            Resolution::Unusable {
                matched,
                raw,
                reason,
            } => {
                if let Some(matched) = matched {
                    active = Some(ActiveNav {
                        id: matched.item_id().to_string(),
                        ancestors: matched.ancestors.iter().map(|a| a.to_string()).collect(),
                    });
                }
                warn!("Unusable frame target {:?}: {}", raw, reason);
                Outcome::Blocked {
                    target: raw,
                    reason,
                }
            }
            Resolution::Frame { matched, target } => {
                active = Some(ActiveNav {
                    id: matched.item_id().to_string(),
                    ancestors: matched.ancestors.iter().map(|a| a.to_string()).collect(),
                });
                match self.allow_list.permits(&target) {
                    Ok(()) => Outcome::Frame {
                        src: compose_frame_url(&target, request.query, request.hash, options)
                            .to_string(),
                        label: Some(matched.item.label.clone()),
                    },
                    Err(rejection) => {
                        warn!("Blocked frame target {}: {}", target, rejection);
                        Outcome::Blocked {
                            target: target.to_string(),
                            reason: rejection.to_string(),
                        }
                    }
                }
            }
        };
        debug!("Planned {} -> {:?}", request.path, outcome);

        let mut flags = StorageFlags::defaults_for(&self.document);
        if let Some(active) = &active {
            // the active item's section starts open whatever the default says
            if let Some(section) = active.ancestors.first() {
                flags.sections.insert(section.clone(), true);
            }
        }

        Ok(ShellPlan {
            outcome,
            active,
            look,
            overrides,
            storage_namespace: storage::namespace(&self.document),
            flags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dashboard() -> Dashboard {
        Dashboard::from_json(
            r##"{
                "title": "Ops",
                "baseUrl": "https://grafana.example.com",
                "defaultRoute": "/overview",
                "allowedDomains": ["grafana.example.com"],
                "allowUrlOverride": true,
                "sidebar": {"sections": [{"title": "Main", "items": [
                    {"label": "Overview", "path": "/overview", "href": "/d/home?orgId=1"},
                    {"label": "Rogue", "path": "/rogue", "href": "https://rogue.example.net/"},
                    {"label": "Wiki", "path": "/wiki", "href": "https://wiki.example.net/", "external": true}
                ]}]}
            }"##,
        )
        .unwrap()
    }

    fn query(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn plan_frames_allowed_target_with_propagation() {
        let dash = dashboard();
        let q = query(&[("from", "now-1h"), ("theme.primary", "red")]);
        let plan = dash
            .plan(&Request {
                path: "/overview/panel/3",
                query: &q,
                hash: Some("#graph"),
            })
            .unwrap();
        assert_eq!(
            plan.outcome,
            Outcome::Frame {
                src: "https://grafana.example.com/d/home/panel/3?orgId=1&from=now-1h#graph"
                    .to_string(),
                label: Some("Overview".to_string()),
            }
        );
        let active = plan.active.unwrap();
        assert_eq!(active.id, "main-overview");
        assert_eq!(active.ancestors, vec!["main"]);
        assert_eq!(plan.look.theme.get("--primary").map(String::as_str), Some("red"));
        assert_eq!(plan.storage_namespace, "framedash:ops");
    }

    #[test]
    fn plan_blocks_hosts_outside_allow_list() {
        let dash = dashboard();
        let plan = dash
            .plan(&Request {
                path: "/rogue",
                ..Request::default()
            })
            .unwrap();
        match plan.outcome {
            Outcome::Blocked { target, reason } => {
                assert_eq!(target, "https://rogue.example.net/");
                assert!(reason.contains("rogue.example.net"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(plan.active.is_some());
    }

    #[test]
    fn plan_checks_url_override_against_allow_list() {
        let dash = dashboard();
        let allowed = query(&[("url", "https://grafana.example.com/explore")]);
        let plan = dash
            .plan(&Request {
                path: "/overview",
                query: &allowed,
                hash: None,
            })
            .unwrap();
        assert_eq!(
            plan.outcome,
            Outcome::Frame {
                src: "https://grafana.example.com/explore".to_string(),
                label: None
            }
        );

        let denied = query(&[("url", "javascript:alert(1)")]);
        let plan = dash
            .plan(&Request {
                path: "/overview",
                query: &denied,
                hash: None,
            })
            .unwrap();
        assert!(matches!(plan.outcome, Outcome::Blocked { .. }));
    }

    #[test]
    fn plan_redirects_and_reports_missing_routes() {
        let dash = dashboard();
        let root = dash.plan(&Request { path: "/", ..Request::default() }).unwrap();
        assert_eq!(
            root.outcome,
            Outcome::Redirect {
                location: "/overview".to_string()
            }
        );

        let missing = dash.plan(&Request { path: "/nowhere", ..Request::default() }).unwrap();
        assert!(matches!(missing.outcome, Outcome::NotFound { .. }));
        assert!(missing.active.is_none());
    }

    #[test]
    fn external_items_are_not_checked() {
        let dash = dashboard();
        let plan = dash.plan(&Request { path: "/wiki", ..Request::default() }).unwrap();
        assert_eq!(
            plan.outcome,
            Outcome::External {
                href: "https://wiki.example.net/".to_string(),
                label: "Wiki".to_string()
            }
        );
    }

    #[test]
    fn unparsable_targets_are_blocked_not_errors() {
        let dash = dashboard();
        for raw in ["", "https://"] {
            let q = query(&[("url", raw)]);
            let plan = dash
                .plan(&Request {
                    path: "/overview",
                    query: &q,
                    hash: None,
                })
                .unwrap();
            match plan.outcome {
                Outcome::Blocked { target, .. } => assert_eq!(target, raw),
                other => panic!("unexpected {other:?}"),
            }
        }

        let broken = Dashboard::from_json(
            r#"{"sidebar": {"sections": [{"title": "Main", "items": [
                {"label": "Bad", "path": "/bad", "href": "http://exa mple.com/"}
            ]}]}}"#,
        )
        .unwrap();
        let plan = broken.plan(&Request { path: "/bad", ..Request::default() }).unwrap();
        assert!(matches!(plan.outcome, Outcome::Blocked { .. }));
        assert_eq!(plan.active.map(|a| a.id), Some("main-bad".to_string()));
    }

    #[test]
    fn malformed_allow_list_fails_construction() {
        let result = Dashboard::from_json(r#"{"allowedDomains": ["not a host"]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn plan_serializes_with_kind_tag() {
        let dash = dashboard();
        let plan = dash.plan(&Request { path: "/wiki", ..Request::default() }).unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["outcome"]["kind"], "external");
        assert_eq!(json["storageNamespace"], "framedash:ops");
    }
}
