//! Index page
//!
//! The page is read from the template file once at startup. A built-in page
//! stands in when the template is missing so `/` always answers 200.

use crate::config::AppState;
use crate::handler::router::RequestContext;
use crate::http;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use std::path::Path;

/// Serve the index page
pub fn serve_index(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    http::build_html_response(state.index_page.clone(), ctx.is_head)
}

/// Read the index template, falling back to the built-in page
///
/// Returns the page and whether the template was found.
pub fn load_index_page(template: &Path) -> (String, bool) {
    match std::fs::read_to_string(template) {
        Ok(html) if !html.trim().is_empty() => (html, true),
        _ => (default_page(), false),
    }
}

/// Built-in page listing the merged dataset as a table
#[allow(clippy::too_many_lines)]
pub fn default_page() -> String {
    String::from(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Lake Water Quality: Actual vs Forecast</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            margin: 0;
            padding: 24px;
            background: #f4f7fb;
            color: #1f2933;
        }
        h1 {
            font-size: 1.6em;
            margin-bottom: 4px;
        }
        .summary {
            color: #52606d;
            margin-bottom: 16px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
            background: white;
            box-shadow: 0 1px 3px rgba(0, 0, 0, 0.1);
        }
        th, td {
            padding: 6px 10px;
            border-bottom: 1px solid #e4e7eb;
            text-align: left;
            white-space: nowrap;
        }
        th {
            background: #243b53;
            color: white;
            position: sticky;
            top: 0;
        }
        .source-actual { color: #2f855a; font-weight: 600; }
        .source-forecast { color: #b7791f; font-weight: 600; }
        .empty { color: #9aa5b1; }
    </style>
</head>
<body>
    <h1>Lake Water Quality</h1>
    <p class="summary" id="summary">Loading /api/data ...</p>
    <table>
        <thead><tr id="header"></tr></thead>
        <tbody id="rows"></tbody>
    </table>
    <script>
        fetch('/api/data')
            .then(resp => resp.json())
            .then(records => {
                const columns = [];
                records.forEach(r => Object.keys(r).forEach(k => {
                    if (!columns.includes(k)) columns.push(k);
                }));

                const header = document.getElementById('header');
                columns.forEach(c => {
                    const th = document.createElement('th');
                    th.textContent = c;
                    header.appendChild(th);
                });

                const body = document.getElementById('rows');
                records.forEach(r => {
                    const tr = document.createElement('tr');
                    columns.forEach(c => {
                        const td = document.createElement('td');
                        const v = r[c];
                        td.textContent = v === null || v === undefined ? '-' : v;
                        if (v === null || v === undefined) td.className = 'empty';
                        if (c === 'Source') td.className = 'source-' + String(v).toLowerCase();
                        tr.appendChild(td);
                    });
                    body.appendChild(tr);
                });

                const actual = records.filter(r => r.Source === 'Actual').length;
                document.getElementById('summary').textContent =
                    `${records.length} records: ${actual} actual, ${records.length - actual} forecast`;
            })
            .catch(err => {
                document.getElementById('summary').textContent = 'Failed to load data: ' + err;
            });
    </script>
</body>
</html>"#,
    )
}
