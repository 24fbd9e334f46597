//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for method validation, route matching, and dispatching.

use crate::config::AppState;
use crate::handler::{page, static_files};
use crate::http::{self, cache};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::http::request::Parts;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Path of the merged dataset endpoint
pub const DATA_PATH: &str = "/api/data";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<&'a str>,
}

/// Main entry point for HTTP request handling
///
/// Generic over the request body since no route reads it.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();

    let response = match check_http_method(&parts.method, state.config.http.enable_cors)
        .or_else(|| check_body_size(&parts, state.config.http.max_body_size))
    {
        Some(resp) => resp,
        None => {
            let ctx = RequestContext {
                path: parts.uri.path(),
                is_head: parts.method == Method::HEAD,
                if_none_match: header_str(&parts, "if-none-match"),
            };
            route_request(&ctx, &state).await
        }
    };
    let response = http::with_server_header(response, &state.config.http.server_name);

    if state.config.logging.access_log {
        let entry = access_entry(&parts, &response, peer_addr, started);
        logger::log_access(&entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|v| v.to_str().ok())
}

/// Check HTTP method and return appropriate response for non-GET/HEAD methods
fn check_http_method(method: &Method, enable_cors: bool) -> Option<Response<Full<Bytes>>> {
    match *method {
        Method::GET | Method::HEAD => None,
        Method::OPTIONS => Some(http::build_options_response(enable_cors)),
        _ => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Some(http::build_405_response())
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(parts: &Parts, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let size_str = header_str(parts, "content-length")?;
    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_error(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(http::build_413_response())
        }
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
        _ => None,
    }
}

/// Route request based on path
async fn route_request(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    let frontend = &state.config.frontend;

    match ctx.path {
        "/" => page::serve_index(ctx, state),
        DATA_PATH => serve_dataset(ctx, state),
        path if static_files::is_under_prefix(path, &frontend.static_prefix) => {
            static_files::serve_directory(ctx, &frontend.static_dir, &frontend.static_prefix).await
        }
        _ => http::build_404_response(),
    }
}

/// Serve the merged dataset as pre-serialized JSON
fn serve_dataset(ctx: &RequestContext<'_>, state: &AppState) -> Response<Full<Bytes>> {
    if cache::check_etag_match(ctx.if_none_match, &state.dataset_etag) {
        return http::build_304_response(&state.dataset_etag);
    }

    http::build_json_response(
        state.dataset_json.clone(),
        &state.dataset_etag,
        state.config.http.enable_cors,
        ctx.is_head,
    )
}

fn access_entry(
    parts: &Parts,
    response: &Response<Full<Bytes>>,
    peer_addr: SocketAddr,
    started: Instant,
) -> AccessLogEntry {
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        parts.method.to_string(),
        parts.uri.path().to_string(),
    );
    entry.query = parts.uri.query().map(ToString::to_string);
    entry.http_version = format!("{:?}", parts.version)
        .trim_start_matches("HTTP/")
        .to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = header_str(parts, "referer").map(ToString::to_string);
    entry.user_agent = header_str(parts, "user-agent").map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::dataset::{concat, tag, Dataset, Provenance, Value};
    use http_body_util::BodyExt;

    fn test_config() -> Config {
        let mut cfg = Config::load_from("does-not-exist").unwrap();
        cfg.logging.access_log = false;
        cfg.frontend.static_dir = std::env::temp_dir().join("lakecast-no-static-dir");
        cfg
    }

    fn test_dataset() -> Dataset {
        let columns = vec!["date".to_string(), "value".to_string()];
        let actual = Dataset::new(
            columns.clone(),
            vec![vec![Value::from("2024-01-01"), Value::Integer(10)]],
        );
        let forecast = Dataset::new(
            columns,
            vec![vec![Value::from("2024-01-02"), Value::Integer(12)]],
        );
        concat(
            tag(actual, Provenance::Actual),
            tag(forecast, Provenance::Forecast),
        )
    }

    fn test_state(config: Config) -> Arc<AppState> {
        Arc::new(
            AppState::new(
                config,
                Arc::new(test_dataset()),
                page::default_page(),
            )
            .unwrap(),
        )
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> (Response<Full<Bytes>>, Bytes) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let req = builder.body(()).unwrap();
        let peer: SocketAddr = "127.0.0.1:40000".parse().unwrap();

        let resp = handle_request(req, Arc::clone(state), peer).await.unwrap();
        let (parts, body) = resp.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (Response::from_parts(parts, Full::new(bytes.clone())), bytes)
    }

    #[tokio::test]
    async fn test_api_data_returns_merged_json() {
        let state = test_state(test_config());
        let (resp, body) = send(&state, Method::GET, "/api/data", &[]).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "application/json");
        assert_eq!(resp.headers()["server"], "lakecast");
        assert_eq!(
            body,
            r#"[{"date":"2024-01-01","value":10,"Source":"Actual"},{"date":"2024-01-02","value":12,"Source":"Forecast"}]"#
        );
    }

    #[tokio::test]
    async fn test_api_data_is_byte_identical_across_requests() {
        let state = test_state(test_config());
        let (first, first_body) = send(&state, Method::GET, "/api/data", &[]).await;
        let (second, second_body) = send(&state, Method::GET, "/api/data", &[]).await;

        assert_eq!(first_body, second_body);
        assert_eq!(first.headers()["etag"], second.headers()["etag"]);

        let parsed: serde_json::Value = serde_json::from_slice(&first_body).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), state.dataset.len());
    }

    #[tokio::test]
    async fn test_api_data_if_none_match_returns_304() {
        let state = test_state(test_config());
        let etag = state.dataset_etag.clone();
        let (resp, body) =
            send(&state, Method::GET, "/api/data", &[("If-None-Match", etag.as_str())]).await;

        assert_eq!(resp.status(), 304);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_head_api_data_has_no_body() {
        let state = test_state(test_config());
        let (resp, body) = send(&state, Method::HEAD, "/api/data", &[]).await;

        assert_eq!(resp.status(), 200);
        assert!(body.is_empty());
        assert_eq!(
            resp.headers()["content-length"],
            state.dataset_json.len().to_string().as_str()
        );
    }

    #[tokio::test]
    async fn test_index_page_is_html() {
        let state = test_state(test_config());
        let (resp, body) = send(&state, Method::GET, "/", &[]).await;

        assert_eq!(resp.status(), 200);
        assert_eq!(resp.headers()["content-type"], "text/html; charset=utf-8");
        assert!(!body.is_empty());
        assert!(String::from_utf8_lossy(&body).contains("<html"));
    }

    #[tokio::test]
    async fn test_index_page_ignores_dataset_content() {
        let state = Arc::new(
            AppState::new(test_config(), Arc::new(Dataset::default()), page::default_page())
                .unwrap(),
        );
        let (resp, body) = send(&state, Method::GET, "/", &[]).await;
        assert_eq!(resp.status(), 200);
        assert!(!body.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let state = test_state(test_config());
        for uri in ["/missing", "/api/data/", "/api"] {
            let (resp, _) = send(&state, Method::GET, uri, &[]).await;
            assert_eq!(resp.status(), 404, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_mutating_methods_are_rejected() {
        let state = test_state(test_config());
        for method in [Method::POST, Method::PUT, Method::DELETE] {
            let (resp, _) = send(&state, method, "/api/data", &[]).await;
            assert_eq!(resp.status(), 405);
            assert_eq!(resp.headers()["allow"], "GET, HEAD, OPTIONS");
        }
    }

    #[tokio::test]
    async fn test_options_with_cors() {
        let mut cfg = test_config();
        cfg.http.enable_cors = true;
        let state = test_state(cfg);

        let (resp, _) = send(&state, Method::OPTIONS, "/api/data", &[]).await;
        assert_eq!(resp.status(), 204);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");

        let (resp, _) = send(&state, Method::GET, "/api/data", &[]).await;
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_oversized_content_length_is_413() {
        let state = test_state(test_config());
        let (resp, _) = send(
            &state,
            Method::GET,
            "/api/data",
            &[("Content-Length", "999999999")],
        )
        .await;
        assert_eq!(resp.status(), 413);
    }

    #[test]
    fn test_access_entry_fields() {
        let req = Request::builder()
            .uri("/api/data?x=1")
            .header("user-agent", "curl/8.0")
            .body(())
            .unwrap();
        let resp = http::build_json_response(Bytes::from("[]"), "\"e\"", false, false);
        let peer: SocketAddr = "10.0.0.7:5555".parse().unwrap();

        let (parts, ()) = req.into_parts();
        let entry = access_entry(&parts, &resp, peer, Instant::now());
        assert_eq!(entry.remote_addr, "10.0.0.7");
        assert_eq!(entry.query.as_deref(), Some("x=1"));
        assert_eq!(entry.http_version, "1.1");
        assert_eq!(entry.body_bytes, 2);
        assert_eq!(entry.user_agent.as_deref(), Some("curl/8.0"));
    }
}
