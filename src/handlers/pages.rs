//! Server-rendered pages for the browser flow: pick a file, see its size,
//! choose a quality level, download.

use axum::{
    extract::{rejection::QueryRejection, Multipart, Path, Query, State},
    response::{Html, Redirect},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::AppResult;
use crate::handlers::session::read_upload;
use crate::models::{DownloadQuery, ImageKind, SessionReport};
use crate::state::AppState;

const STYLE: &str = "body { background-color: #f0f8ff; font-family: sans-serif; max-width: 720px; margin: 2em auto; }
h1, h2, h3, h4, h5, h6 { color: #4CAF50; }
.warning { background: #fff3cd; padding: .75em; }
.success { background: #d4edda; padding: .75em; }
.info { background: #d1ecf1; padding: .75em; }
img { max-width: 100%; }";

/// `GET /`
pub async fn index_handler() -> Html<String> {
    let body = format!(
        r#"<h3>Upload your image</h3>
<form action="/upload" method="post" enctype="multipart/form-data">
  <input type="file" name="file" accept="{accept}" required>
  <button type="submit">Upload</button>
</form>
<p class="info">Upload an image file to begin the optimization process.</p>"#,
        accept = accept_attribute(),
    );
    Html(layout(&body))
}

/// `POST /upload`
pub async fn upload_form_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Redirect> {
    let file = read_upload(&mut multipart, state.config.max_file_size_mb).await?;
    let report = state.sessions.create(file).await?;

    info!(session_id = %report.session_id, "Upload received from page");
    Ok(Redirect::to(&format!("/sessions/{}", report.session_id)))
}

/// `GET /sessions/:id`
pub async fn session_page_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    query: Result<Query<DownloadQuery>, QueryRejection>,
) -> AppResult<Html<String>> {
    // A garbled selection just falls back to the default level
    let selected = match query {
        Ok(Query(query)) => query.level(),
        Err(rejection) => {
            debug!(session_id = %id, error = %rejection.body_text(), "Ignoring query string");
            None
        }
    };

    let report = state.sessions.report(id).await?;
    Ok(Html(render_session(
        &report,
        selected,
        state.config.optimize_threshold_mb,
    )))
}

pub fn render_session(report: &SessionReport, selected: Option<u8>, threshold_mb: f64) -> String {
    let id = report.session_id;
    let name = escape_html(&report.file_name);
    let threshold = format!("{}MB", threshold_mb);

    let mut body = format!(
        r#"<h4>Original Image Size: <strong>{size} MB</strong></h4>
<figure><img src="/api/v1/sessions/{id}/preview" alt="{name}"><figcaption>Original Image</figcaption></figure>
<hr>
"#,
        size = report.display_size(),
    );

    match report.default_quality {
        Some(default) => {
            let chosen = selected
                .filter(|q| report.results.iter().any(|r| r.quality == *q))
                .unwrap_or(default);

            body.push_str(&format!(
                r#"<p class="warning">Image is larger than {threshold}. Consider optimizing it.</p>
<h3>Select Quality Levels for Compression</h3>
<ul>
"#
            ));
            for result in &report.results {
                body.push_str(&format!(
                    "<li><strong>{}% Quality</strong>: Simulated Size: {} MB</li>\n",
                    result.quality,
                    result.display_size()
                ));
            }
            body.push_str(&format!(
                "</ul>\n<form action=\"/sessions/{id}\" method=\"get\">\n<p>Select a quality level for download:</p>\n"
            ));
            for result in &report.results {
                let checked = if result.quality == chosen { " checked" } else { "" };
                body.push_str(&format!(
                    "<label><input type=\"radio\" name=\"quality\" value=\"{q}\"{checked}> {q}</label><br>\n",
                    q = result.quality,
                ));
            }
            body.push_str("<button type=\"submit\">Select</button>\n</form>\n");

            if let Some(result) = report.results.iter().find(|r| r.quality == chosen) {
                body.push_str(&format!(
                    r#"<p class="success">You selected {q}% Quality. Simulated Size: {size} MB</p>
<a href="/api/v1/sessions/{id}/download?quality={q}" download="{file}">Download {q}% Quality Image</a>
"#,
                    q = chosen,
                    size = result.display_size(),
                    file = escape_html(&result.file_name),
                ));
            }
        }
        None => {
            body.push_str(&format!(
                r#"<p class="success">Image size is already under {threshold}. Optimization not required.</p>
<p>Feel free to download the original image if needed.</p>
<a href="/api/v1/sessions/{id}/download" download="{name}">Download Original Image</a>
"#
            ));
        }
    }

    body.push_str("<hr>\n<p><a href=\"/\">Upload another image</a></p>\n");
    layout(&body)
}

fn layout(body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Image Compression Tool</title>
<style>{STYLE}</style>
</head>
<body>
<h1>Image Compression Tool</h1>
<h3>Effortlessly optimize your image sizes without compromising too much on quality.</h3>
<hr>
{body}
</body>
</html>"#
    )
}

fn accept_attribute() -> String {
    ImageKind::ACCEPTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

fn escape_html(input: &str) -> String {
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
