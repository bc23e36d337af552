//! Server-side rendering of the shell page.

use framedash_core::constants::SHELL_PREFIX;
use framedash_core::document::{DashboardDocument, NavItem, NavSection};
use framedash_core::{FrameTarget, Outcome, ShellPlan};
use serde_json::json;
use std::fmt::Write;

/// Inputs for one shell page.
#[derive(Debug, Clone, Copy)]
pub struct ShellView<'a> {
    pub document: &'a DashboardDocument,
    pub plan: &'a ShellPlan,
}

/// Escape text for HTML element content and double-quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Serialise a value for an inline `<script type="application/json">`.
fn inline_json(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

/// Render the complete shell page.
pub fn render_shell(view: &ShellView<'_>) -> String {
    let plan = view.plan;
    let look = &plan.look;
    let collapsible = view.document.sidebar.collapsible;
    let nav_query = nav_query_string(plan);

    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(&page_title(view)));
    if let Some(favicon) = &look.favicon {
        let _ = writeln!(html, "<link rel=\"icon\" href=\"{}\">", escape_html(favicon));
    }
    let _ = writeln!(
        html,
        "<link rel=\"stylesheet\" href=\"{SHELL_PREFIX}/shell.css\">"
    );
    if !look.theme.is_empty() {
        html.push_str("<style>:root{");
        for (name, value) in &look.theme {
            // <style> is raw text; names and values were filtered when the look was built
            let _ = write!(html, "{}:{};", name, value);
        }
        html.push_str("}</style>\n");
    }
    html.push_str("</head>\n");

    let body_class = if collapsible && plan.flags.sidebar_collapsed {
        "fd-shell fd-collapsed"
    } else {
        "fd-shell"
    };
    let _ = writeln!(html, "<body class=\"{body_class}\">");

    render_sidebar(&mut html, view, &nav_query);
    render_main(&mut html, plan);

    let bootstrap = json!({
        "propagateHash": view.document.propagate_hash,
        "collapsible": collapsible,
        "storageNamespace": plan.storage_namespace,
        "flags": plan.flags,
        "active": plan.active,
    });
    let _ = writeln!(
        html,
        "<script id=\"fd-bootstrap\" type=\"application/json\">{}</script>",
        inline_json(&bootstrap)
    );
    let _ = writeln!(html, "<script src=\"{SHELL_PREFIX}/shell.js\" defer></script>");
    html.push_str("</body>\n</html>\n");
    html
}

fn page_title(view: &ShellView<'_>) -> String {
    let label = match &view.plan.outcome {
        Outcome::Frame {
            label: Some(label), ..
        } => Some(label.as_str()),
        Outcome::External { label, .. } => Some(label.as_str()),
        Outcome::NotFound { .. } => Some("Not found"),
        Outcome::Blocked { .. } => Some("Blocked"),
        _ => None,
    };
    match label {
        Some(label) => format!("{} · {}", label, view.plan.look.title),
        None => view.plan.look.title.clone(),
    }
}

/// Override parameters carried on sidebar links so a live theme survives
/// navigation.
fn nav_query_string(plan: &ShellPlan) -> String {
    let pairs = plan.overrides.to_query();
    if pairs.is_empty() {
        return String::new();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(&pairs)
        .finish();
    format!("?{encoded}")
}

fn render_sidebar(html: &mut String, view: &ShellView<'_>, nav_query: &str) {
    let look = &view.plan.look;
    html.push_str("<aside class=\"fd-sidebar\" id=\"fd-sidebar\">\n<div class=\"fd-brand\">");
    let _ = write!(
        html,
        "<a class=\"fd-home\" href=\"{}\">",
        escape_html(&look.home_href)
    );
    if let Some(logo) = &look.logo {
        let _ = write!(
            html,
            "<img class=\"fd-logo\" src=\"{}\" alt=\"\">",
            escape_html(logo)
        );
    }
    let _ = write!(
        html,
        "<span class=\"fd-title\">{}</span></a>",
        escape_html(&look.title)
    );
    if view.document.sidebar.collapsible {
        html.push_str(
            "<button class=\"fd-toggle\" id=\"fd-toggle\" type=\"button\" \
             aria-controls=\"fd-sidebar\" aria-label=\"Toggle sidebar\">&#9776;</button>",
        );
    }
    html.push_str("</div>\n<nav class=\"fd-nav\">\n");
    for section in &view.document.sidebar.sections {
        render_section(html, view, section, nav_query);
    }
    html.push_str("</nav>\n</aside>\n");
}

fn render_section(html: &mut String, view: &ShellView<'_>, section: &NavSection, nav_query: &str) {
    let id = section.id.as_deref().unwrap_or_default();
    let open = view.plan.flags.sections.get(id).copied().unwrap_or(true);
    let _ = write!(
        html,
        "<details class=\"fd-section\" data-section=\"{}\"{}>",
        escape_html(id),
        if open { " open" } else { "" }
    );
    if let Some(title) = &section.title {
        let _ = write!(html, "<summary>{}</summary>", escape_html(title));
    } else {
        html.push_str("<summary class=\"fd-untitled\"></summary>");
    }
    html.push_str("<ul>");
    for item in &section.items {
        render_item(html, view, item, nav_query);
    }
    html.push_str("</ul></details>\n");
}

fn render_item(html: &mut String, view: &ShellView<'_>, item: &NavItem, nav_query: &str) {
    let id = item.id.as_deref().unwrap_or_default();
    let active = view.plan.active.as_ref();
    let is_active = active.is_some_and(|a| a.id == id);
    let on_path = active.is_some_and(|a| a.ancestors.iter().any(|anc| anc == id));

    let mut classes = vec!["fd-item"];
    if is_active {
        classes.push("fd-active");
    }
    if on_path {
        classes.push("fd-open");
    }
    let _ = write!(
        html,
        "<li class=\"{}\" data-item=\"{}\">",
        classes.join(" "),
        escape_html(id)
    );

    let icon = item
        .icon
        .as_deref()
        .map(|icon| format!("<span class=\"fd-icon\" data-icon=\"{}\"></span>", escape_html(icon)))
        .unwrap_or_default();
    let label = escape_html(&item.label);

    match (item.href.as_deref(), item.path.as_deref()) {
        (Some(href), _) if item.external => {
            let base = view.document.base().ok().flatten();
            match FrameTarget::parse(href, base.as_ref()) {
                Ok(target) => {
                    let _ = write!(
                        html,
                        "<a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">{icon}{label}</a>",
                        escape_html(&target.to_string())
                    );
                }
                Err(_) => {
                    let _ = write!(html, "<span class=\"fd-group\">{icon}{label}</span>");
                }
            }
        }
        (Some(_), Some(path)) => {
            let current = if is_active {
                " aria-current=\"page\""
            } else {
                ""
            };
            let _ = write!(
                html,
                "<a href=\"{}{}\"{current}>{icon}{label}</a>",
                escape_html(path),
                escape_html(nav_query)
            );
        }
        _ => {
            let _ = write!(html, "<span class=\"fd-group\">{icon}{label}</span>");
        }
    }

    if !item.children.is_empty() {
        html.push_str("<ul>");
        for child in &item.children {
            render_item(html, view, child, nav_query);
        }
        html.push_str("</ul>");
    }
    html.push_str("</li>");
}

fn render_main(html: &mut String, plan: &ShellPlan) {
    html.push_str("<main class=\"fd-main\">\n");
    match &plan.outcome {
        Outcome::Frame { src, label } => {
            let title = label.as_deref().unwrap_or("Embedded content");
            let _ = writeln!(
                html,
                "<iframe class=\"fd-frame\" id=\"fd-frame\" src=\"{}\" title=\"{}\" \
                 referrerpolicy=\"strict-origin-when-cross-origin\" allow=\"fullscreen; clipboard-write\"></iframe>",
                escape_html(src),
                escape_html(title)
            );
        }
        Outcome::External { href, label } => {
            let _ = writeln!(
                html,
                "<section class=\"fd-panel\"><h1>{}</h1><p>This page opens outside the dashboard.</p>\
                 <p><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">Open {}</a></p></section>",
                escape_html(label),
                escape_html(href),
                escape_html(label)
            );
        }
        Outcome::Blocked { target, reason } => {
            let _ = writeln!(
                html,
                "<section class=\"fd-panel fd-blocked\" role=\"alert\"><h1>Content blocked</h1>\
                 <p>{}</p><p><code>{}</code></p></section>",
                escape_html(reason),
                escape_html(target)
            );
        }
        Outcome::NotFound { path } => {
            let _ = writeln!(
                html,
                "<section class=\"fd-panel fd-not-found\"><h1>Not found</h1>\
                 <p>No dashboard page at <code>{}</code>.</p></section>",
                escape_html(path)
            );
        }
        Outcome::Redirect { location } => {
            let _ = writeln!(
                html,
                "<section class=\"fd-panel\"><p><a href=\"{}\">Continue</a></p></section>",
                escape_html(location)
            );
        }
    }
    html.push_str("</main>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use framedash_core::{Dashboard, Request};

    fn dashboard() -> Dashboard {
        Dashboard::from_json(
            r##"{
                "title": "Ops <Console>",
                "allowedDomains": ["app.example.com"],
                "branding": {"logo": "/_shell/assets/logo.svg", "favicon": "/favicon.ico"},
                "theme": {"primary": "#0a84ff"},
                "sidebar": {"sections": [
                    {"title": "Apps", "items": [
                        {"label": "Home", "path": "/home", "href": "https://app.example.com/"},
                        {"label": "Tools", "icon": "wrench", "children": [
                            {"label": "Shell", "path": "/tools/shell", "href": "https://app.example.com/shell"}
                        ]},
                        {"label": "Docs", "href": "https://docs.example.net/", "external": true}
                    ]},
                    {"title": "Admin", "items": [
                        {"label": "Evil", "path": "/evil", "href": "https://evil.example.net/"}
                    ]}
                ]}
            }"##,
        )
        .unwrap()
    }

    fn render(dash: &Dashboard, path: &str, query: &[(String, String)]) -> String {
        let plan = dash
            .plan(&Request {
                path,
                query,
                hash: None,
            })
            .unwrap();
        render_shell(&ShellView {
            document: dash.document(),
            plan: &plan,
        })
    }

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn renders_frame_sidebar_and_branding() {
        let dash = dashboard();
        let html = render(&dash, "/tools/shell", &[]);
        assert!(html.contains("<title>Shell · Ops &lt;Console&gt;</title>"));
        assert!(html.contains("<link rel=\"icon\" href=\"/favicon.ico\">"));
        assert!(html.contains(":root{--primary:#0a84ff;}"));
        assert!(html.contains("src=\"https://app.example.com/shell\""));
        assert!(html.contains("<a href=\"/tools/shell\" aria-current=\"page\">Shell</a>"));
        assert!(html.contains("class=\"fd-item fd-open\" data-item=\"apps-tools\""));
        assert!(html.contains("data-icon=\"wrench\""));
        assert!(html.contains("target=\"_blank\" rel=\"noopener noreferrer\">Docs</a>"));
        assert!(html.contains("<img class=\"fd-logo\" src=\"/_shell/assets/logo.svg\""));
    }

    #[test]
    fn renders_blocked_panel_instead_of_frame() {
        let dash = dashboard();
        let html = render(&dash, "/evil", &[]);
        assert!(!html.contains("<iframe"));
        assert!(html.contains("Content blocked"));
        assert!(html.contains("evil.example.net"));
    }

    #[test]
    fn sidebar_links_carry_theme_overrides() {
        let dash = dashboard();
        let query = vec![("theme.primary".to_string(), "#ff0000".to_string())];
        let html = render(&dash, "/home", &query);
        assert!(html.contains(":root{--primary:#ff0000;}"));
        assert!(html.contains("href=\"/tools/shell?theme.primary=%23ff0000\""));
    }

    #[test]
    fn bootstrap_json_cannot_close_script() {
        let dash = Dashboard::from_json(
            r#"{"sidebar": {"sections": [{"id": "</script><b>x", "items": []}]}}"#,
        )
        .unwrap();
        let html = render(&dash, "/missing", &[]);
        let bootstrap_start = html.find("id=\"fd-bootstrap\"").unwrap();
        let bootstrap = &html[bootstrap_start..];
        let end = bootstrap.find("</script>").unwrap();
        assert!(bootstrap[..end].contains("<\\/script><b>x"));
        assert!(html.contains("data-section=\"&lt;/script&gt;&lt;b&gt;x\""));
        assert!(html.contains("Not found"));
    }

    #[test]
    fn external_links_are_joined_against_base_url() {
        let dash = Dashboard::from_json(
            r#"{
                "baseUrl": "https://app.example.com",
                "allowedDomains": ["app.example.com"],
                "sidebar": {"sections": [{"title": "Main", "items": [
                    {"label": "Home", "path": "/home", "href": "/"},
                    {"label": "Help", "path": "/help", "href": "/help", "external": true}
                ]}]}
            }"#,
        )
        .unwrap();
        let html = render(&dash, "/home", &[]);
        assert!(html.contains(
            "<a href=\"https://app.example.com/help\" target=\"_blank\" rel=\"noopener noreferrer\">Help</a>"
        ));
        assert!(!html.contains("<a href=\"/help\" target=\"_blank\""));
    }

    #[test]
    fn theme_values_are_written_verbatim_in_style() {
        let dash = dashboard();
        let query = vec![("theme.font".to_string(), "a&b".to_string())];
        let html = render(&dash, "/home", &query);
        assert!(html.contains("--font:a&b;"));
        assert!(!html.contains("--font:a&amp;b;"));
    }

    #[test]
    fn collapsed_flag_marks_body() {
        let mut doc = dashboard().document().clone();
        doc.sidebar.default_collapsed = true;
        let dash = Dashboard::new(doc).unwrap();
        let html = render(&dash, "/home", &[]);
        assert!(html.contains("<body class=\"fd-shell fd-collapsed\">"));
    }
}
