//! HTTP API: `/api/bin` lookups and `/api/addresses` listings.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{RawQuery, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;
use url::form_urlencoded;

use binday_core::{
    LookupQuery, OutputFormat, TEXT_CONTENT_TYPE, Trace, render::render, service::BindayService,
};

const MISSING_QUERY_POSTCODE: &str = "Missing required query parameter: postcode";
const MISSING_BODY_POSTCODE: &str = "Missing required field: postcode";

#[derive(Clone)]
pub(crate) struct AppState {
    service: Arc<BindayService>,
}

pub(crate) fn router(service: Arc<BindayService>) -> Router {
    Router::new()
        .route("/api/bin", get(lookup_get).post(lookup_post))
        .route("/api/addresses", get(addresses_get))
        .with_state(AppState { service })
}

/// Query string of the `GET` routes.
#[derive(Debug, Default)]
struct LookupParams {
    postcode: Option<String>,
    address: Option<String>,
    format: Option<String>,
    debug: Option<String>,
}

impl LookupParams {
    /// Decode a query string; a repeated key keeps its first value.
    fn parse(raw: Option<&str>) -> Self {
        let mut params = Self::default();
        let pairs = form_urlencoded::parse(raw.unwrap_or_default().as_bytes());
        for (key, value) in pairs {
            let slot = match &*key {
                "postcode" => &mut params.postcode,
                "address" => &mut params.address,
                "format" => &mut params.format,
                "debug" => &mut params.debug,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }
}

/// JSON body of `POST /api/bin`.
#[derive(Debug, Default, Deserialize)]
struct LookupBody {
    postcode: Option<String>,
    address: Option<String>,
    format: Option<String>,
    debug: Option<Value>,
}

/// A validated lookup request.
struct LookupRequest {
    query: LookupQuery,
    format: OutputFormat,
    debug: bool,
}

impl LookupRequest {
    fn new(
        postcode: Option<&str>,
        address: Option<&str>,
        format: Option<&str>,
        debug: bool,
        missing: &'static str,
    ) -> Result<Self, &'static str> {
        let query = LookupQuery::new(postcode.unwrap_or_default(), address);
        if query.is_empty() {
            return Err(missing);
        }
        Ok(Self {
            query,
            format: OutputFormat::from_name(format.unwrap_or("text")),
            debug,
        })
    }
}

pub(crate) async fn lookup_get(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Response {
    let params = LookupParams::parse(raw.as_deref());
    let request = LookupRequest::new(
        params.postcode.as_deref(),
        params.address.as_deref(),
        params.format.as_deref(),
        params.debug.as_deref().is_some_and(is_truthy),
        MISSING_QUERY_POSTCODE,
    );
    match request {
        Ok(request) => run_lookup(&state.service, request).await,
        Err(message) => error_response(message, None),
    }
}

pub(crate) async fn lookup_post(State(state): State<AppState>, body: Bytes) -> Response {
    // an unreadable body counts as an empty one
    let body: LookupBody = serde_json::from_slice(&body).unwrap_or_default();
    let debug = body
        .debug
        .as_ref()
        .is_some_and(|flag| is_truthy(&flag_text(flag)));
    let request = LookupRequest::new(
        body.postcode.as_deref(),
        body.address.as_deref(),
        body.format.as_deref(),
        debug,
        MISSING_BODY_POSTCODE,
    );
    match request {
        Ok(request) => run_lookup(&state.service, request).await,
        Err(message) => error_response(message, None),
    }
}

pub(crate) async fn addresses_get(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Response {
    let params = LookupParams::parse(raw.as_deref());
    let query = LookupQuery::new(params.postcode.unwrap_or_default(), None::<&str>);
    if query.is_empty() {
        return error_response(MISSING_QUERY_POSTCODE, None);
    }
    let debug = params.debug.as_deref().is_some_and(is_truthy);

    let mut trace = Trace::new();
    match state.service.addresses(&query, &mut trace).await {
        Ok(addresses) => Json(addresses).into_response(),
        Err(err) => {
            tracing::warn!(
                postcode = %query.postcode,
                error = %err,
                "address listing failed"
            );
            error_response(&err.to_string(), debug.then_some(&trace))
        }
    }
}

async fn run_lookup(service: &BindayService, request: LookupRequest) -> Response {
    let mut trace = Trace::new();
    let outcome = service
        .schedule(&request.query, &mut trace)
        .await
        .and_then(|schedule| render(&schedule, request.format));

    match outcome {
        Ok(rendered) => (
            StatusCode::OK,
            [(CONTENT_TYPE, rendered.content_type)],
            rendered.body,
        )
            .into_response(),
        Err(err) => {
            tracing::warn!(
                postcode = %request.query.postcode,
                error = %err,
                "lookup failed"
            );
            error_response(&err.to_string(), request.debug.then_some(&trace))
        }
    }
}

fn error_response(message: &str, trace: Option<&Trace>) -> Response {
    let body = match trace {
        Some(trace) => format!(
            "Error: {message}\n--- debug trace ---\n{}",
            trace.render_tail()
        ),
        None => format!("Error: {message}"),
    };
    let headers = [(CONTENT_TYPE, TEXT_CONTENT_TYPE)];
    (StatusCode::BAD_REQUEST, headers, body).into_response()
}

fn is_truthy(flag: &str) -> bool {
    matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes")
}

fn flag_text(flag: &Value) -> String {
    match flag {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use wiremock::MockServer;

    use super::*;
    use crate::fixtures;

    const DEBUG_FAILURE: &str = "Error: No <form> found on page\n--- debug trace ---\n";
    const FALLBACK_LINE: &str = "trying street-based flow with: 5";

    fn state(server: &MockServer) -> State<AppState> {
        State(AppState {
            service: fixtures::service(server),
        })
    }

    fn query(raw: &str) -> RawQuery {
        RawQuery(Some(raw.to_owned()))
    }

    async fn read(response: Response) -> (StatusCode, String, String) {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = String::from_utf8_lossy(&bytes).into_owned();
        (status, content_type, body)
    }

    #[tokio::test]
    async fn get_renders_text_by_default() {
        let server = fixtures::council().await;
        let raw = "postcode=BT1+1AA&address=2+test";
        let response = lookup_get(state(&server), query(raw)).await;

        let (status, content_type, body) = read(response).await;
        assert_eq!(status, StatusCode::OK, "success");
        assert_eq!(content_type, TEXT_CONTENT_TYPE, "text");
        assert_eq!(
            body,
            "2 Test Street bin collections\nGeneral - 01/09/25\nRecycling - 08/09/25",
            "sorted text body"
        );
    }

    #[tokio::test]
    async fn repeated_query_keys_keep_the_first_value() {
        let server = fixtures::council().await;
        let raw = "postcode=BT1+1AA&postcode=BT9+9ZZ&format=json&format=text";
        let response = lookup_get(state(&server), query(raw)).await;

        let (status, content_type, _) = read(response).await;
        assert_eq!(status, StatusCode::OK, "not rejected");
        assert_eq!(content_type, "application/json", "first format wins");

        let params = LookupParams::parse(Some("postcode=BT1%201AA&postcode=&debug="));
        assert_eq!(params.postcode.as_deref(), Some("BT1 1AA"), "first");
        assert_eq!(params.debug.as_deref(), Some(""), "empty value");
        assert_eq!(params.address, None, "absent");
    }

    #[tokio::test]
    async fn post_renders_json() {
        let server = fixtures::council().await;
        let request = Bytes::from_static(br#"{"postcode": "BT1 1AA", "format": "JSON"}"#);
        let response = lookup_post(state(&server), request).await;

        let (status, content_type, body) = read(response).await;
        assert_eq!(status, StatusCode::OK, "success");
        assert_eq!(content_type, "application/json", "json");
        let value: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(value["address"], "2 Test Street", "address");
        assert_eq!(value["collections"][0]["type"], "General", "first bin");
        assert_eq!(value["collections"][0]["date"], "2025-09-01", "iso date");
    }

    #[tokio::test]
    async fn missing_postcode_is_a_bad_request() {
        let server = MockServer::start().await;
        let unused = state(&server);

        let by_query = lookup_get(unused.clone(), query("format=json")).await;
        let (status, _, body) = read(by_query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "get rejected");
        assert_eq!(
            body, "Error: Missing required query parameter: postcode",
            "get message"
        );

        let no_query = lookup_get(unused.clone(), RawQuery(None)).await;
        let (status, _, _) = read(no_query).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "no query string");

        let garbage = Bytes::from_static(b"not json");
        let by_body = lookup_post(unused, garbage).await;
        let (status, content_type, body) = read(by_body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "post rejected");
        assert_eq!(content_type, TEXT_CONTENT_TYPE, "plain text error");
        assert_eq!(
            body, "Error: Missing required field: postcode",
            "post message"
        );
    }

    #[tokio::test]
    async fn failures_append_the_trace_only_when_debugging() {
        let server = fixtures::council_down().await;

        let bare = "postcode=BT1+1AA";
        let quiet = lookup_get(state(&server), query(bare)).await;
        let (status, _, body) = read(quiet).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "a 400");
        assert_eq!(body, "Error: No <form> found on page", "bare message");

        let debugging = "postcode=BT1+1AA&address=5&debug=1";
        let loud = lookup_get(state(&server), query(debugging)).await;
        let (status, _, body) = read(loud).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "still a 400");
        assert!(body.starts_with(DEBUG_FAILURE), "get trace appended");
        assert!(body.contains(FALLBACK_LINE), "get fallback traced");

        let request = r#"{"postcode": "BT1 1AA", "address": "5", "debug": true}"#;
        let posted = lookup_post(state(&server), Bytes::from(request)).await;
        let (status, _, body) = read(posted).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "post is a 400");
        assert!(body.starts_with(DEBUG_FAILURE), "post trace appended");
        assert!(body.contains(FALLBACK_LINE), "post fallback traced");
    }

    #[tokio::test]
    async fn addresses_are_listed_as_json() {
        let server = fixtures::council().await;
        let raw = "postcode=BT1+1AA&postcode=BT9+9ZZ";
        let response = addresses_get(state(&server), query(raw)).await;

        let (status, _, body) = read(response).await;
        assert_eq!(status, StatusCode::OK, "success");
        let value: Value = serde_json::from_str(&body).expect("json body");
        assert_eq!(value[1]["value"], "2", "value");
        assert_eq!(value[1]["label"], "2 TEST STREET, BELFAST", "label");
    }

    #[test]
    fn debug_flags_follow_loose_truthiness() {
        assert!(
            is_truthy("YES") && is_truthy("1") && is_truthy("True"),
            "truthy"
        );
        assert!(!is_truthy("on") && !is_truthy(""), "falsy");
        assert_eq!(flag_text(&Value::Bool(true)), "true", "bool");
        assert_eq!(flag_text(&serde_json::json!(1)), "1", "number");
    }
}
