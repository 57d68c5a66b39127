//! Browser Front End
//!
//! The HTML form and its result pages.

use axum::{
    Form,
    extract::State,
    http::StatusCode,
    response::Html,
};
use launchpad_core::dto::provision::{ProvisionRequest, ProvisionResponse};
use launchpad_engine::Provisioner;

use crate::api::error::ApiError;
use crate::service::provision_service;

const FORM_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>Launchpad</title>
</head>
<body>
  <h1>Create an application</h1>
  <form action="/submit" method="post">
    <p>
      <label for="appName">Application name</label><br>
      <input id="appName" name="appName" type="text" maxlength="100" required>
    </p>
    <p>
      <label for="appDescription">What should it do?</label><br>
      <textarea id="appDescription" name="appDescription" rows="6" cols="60" required></textarea>
    </p>
    <button type="submit">Create</button>
  </form>
</body>
</html>
"#;

/// GET /
pub async fn index() -> Html<&'static str> {
    Html(FORM_PAGE)
}

/// POST /submit
/// Provision from the form and render the outcome as HTML
pub async fn submit(
    State(provisioner): State<Provisioner>,
    Form(req): Form<ProvisionRequest>,
) -> (StatusCode, Html<String>) {
    tracing::debug!("Form submitted: {}", req.app_name);

    match provision_service::provision(&provisioner, req).await {
        Ok(run) => (StatusCode::OK, Html(success_page(&ProvisionResponse::from(&run)))),
        Err(err) => {
            let err = ApiError::from(err);
            (err.status(), Html(error_page(&err.message())))
        }
    }
}

fn success_page(response: &ProvisionResponse) -> String {
    let repository = response.repository_url.as_deref().unwrap_or_default();
    let service = response.service_url.as_deref().unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Application created</title></head>
<body>
  <h1>Application created</h1>
  <p>Repository: <a href="{repository}" target="_blank">{repository}</a></p>
  <p>Service URL: <a href="{service}" target="_blank">{service}</a></p>
  <p>The first deployment can take a few minutes to come up.</p>
  <p><a href="/">Back to the form</a></p>
</body>
</html>
"#,
        repository = escape_html(repository),
        service = escape_html(service),
    )
}

fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Something went wrong</title></head>
<body>
  <h1>Something went wrong</h1>
  <pre>{}</pre>
  <p><a href="/">Back to the form</a></p>
</body>
</html>
"#,
        escape_html(message)
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_error_page_escapes_message() {
        let page = error_page("<script>alert(1)</script>");
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
