//! Documentation viewer pages.
//!
//! # Responsibilities
//! - Render the Scalar and Redoc pages for a title and JSON document path
//! - Mount each enabled viewer on the router
//!
//! # Design Decisions
//! - Templates are compiled in; `.html` names turn on minijinja auto-escaping,
//!   which also covers the JSON path inside attributes (`/` becomes `&#x2f;`)
//! - Rendered per request, like any other handler; no caching headers
//! - Only title and JSON path reach the template

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use minijinja::{context, Environment};

use crate::config::{DocsOptions, DocsViewer};
use crate::routing::normalize_path;

const SCALAR_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <title>{{ title }}</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
  </head>
  <body>
    <script id="api-reference" data-url="{{ json_path }}"></script>
    <script src="https://cdn.jsdelivr.net/npm/@scalar/api-reference"></script>
  </body>
</html>
"#;

const REDOC_TEMPLATE: &str = r#"<!doctype html>
<html>
  <head>
    <title>{{ title }}</title>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
  </head>
  <body>
    <redoc spec-url="{{ json_path }}"></redoc>
    <script src="https://cdn.redoc.ly/redoc/latest/bundles/redoc.standalone.js"></script>
  </body>
</html>
"#;

impl DocsViewer {
    fn template_name(self) -> &'static str {
        match self {
            DocsViewer::Scalar => "scalar.html",
            DocsViewer::Redoc => "redoc.html",
        }
    }
}

fn environment() -> Result<Environment<'static>, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template(DocsViewer::Scalar.template_name(), SCALAR_TEMPLATE)?;
    env.add_template(DocsViewer::Redoc.template_name(), REDOC_TEMPLATE)?;
    Ok(env)
}

/// Render one viewer page.
pub fn render_page(
    viewer: DocsViewer,
    title: &str,
    json_path: &str,
) -> Result<String, minijinja::Error> {
    let env = environment()?;
    let template = env.get_template(viewer.template_name())?;
    template.render(context! {
        title => title,
        json_path => json_path,
    })
}

/// Mount every enabled viewer on `router`.
///
/// A viewer whose path is already taken (by the JSON document or the other
/// viewer) is skipped.
pub fn mount_docs(mut router: Router, docs: &DocsOptions, title: &str, json_path: &str) -> Router {
    let mut taken = vec![normalize_path(json_path)];
    for (viewer, path) in docs.enabled() {
        let path = normalize_path(path);
        if taken.contains(&path) {
            tracing::warn!(
                viewer = ?viewer,
                path = %path,
                "docs path already in use, viewer not mounted"
            );
            continue;
        }
        tracing::debug!(viewer = ?viewer, path = %path, "docs viewer mounted");
        let title = title.to_string();
        let json_path = json_path.to_string();
        router = router.route(
            &path,
            get(move || {
                let page = render_page(viewer, &title, &json_path);
                async move { page_response(page) }
            }),
        );
        taken.push(path);
    }
    router
}

fn page_response(page: Result<String, minijinja::Error>) -> Response {
    match page {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "docs page failed to render");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_page_points_at_document() {
        let page = render_page(DocsViewer::Scalar, "Pets", "/api/openapi.json").unwrap();
        assert!(page.contains("<title>Pets</title>"));
        assert!(page.contains(r#"data-url="&#x2f;api&#x2f;openapi.json""#));
        assert!(page.contains("@scalar/api-reference"));
    }

    #[test]
    fn test_redoc_page_points_at_document() {
        let page = render_page(DocsViewer::Redoc, "Pets", "/spec.json").unwrap();
        assert!(page.contains(r#"<redoc spec-url="&#x2f;spec.json"></redoc>"#));
        assert!(page.contains("redoc.standalone.js"));
    }

    #[test]
    fn test_json_path_quotes_are_escaped() {
        let page = render_page(DocsViewer::Redoc, "Pets", "/a\"b.json").unwrap();
        assert!(page.contains(r#"spec-url="&#x2f;a&quot;b.json""#));
    }

    #[test]
    fn test_title_is_escaped() {
        let page = render_page(DocsViewer::Scalar, "<script>x</script>", "/a.json").unwrap();
        assert!(!page.contains("<script>x</script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
