//! HTTP client wrapper: the single chokepoint for every outbound call.
//!
//! # Design
//! `ApiClient` splits each call into a deterministic `build_request` and a
//! deterministic `parse_response`; `send` joins them
//! through the injected `Transport`. Session handling stays explicit: a 401
//! on an authenticated request evicts the token through the shared
//! `SessionContext` and surfaces `ApiError::SessionExpired`. Navigation is
//! left to `SessionObserver`s.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ApiResult, HttpError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue, RequestBody};
use crate::session::{FileTokenStore, SessionContext};
use crate::transport::{Transport, UreqTransport};

/// Client for the admin REST API.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    session: SessionContext,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .field("session", &self.session)
            .finish()
    }
}

impl ApiClient {
    pub fn new(config: ClientConfig, session: SessionContext, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            session,
            transport,
        }
    }

    /// Production wiring: file-backed session restored from
    /// `config.token_path` and a blocking `ureq` transport.
    pub fn from_config(config: ClientConfig) -> ApiResult<Self> {
        let store = Arc::new(FileTokenStore::new(&config.token_path));
        let session = SessionContext::restore(store)?;
        let transport = Arc::new(UreqTransport::new(config.timeout));
        Ok(Self::new(config, session, transport))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Build a request for `endpoint` (a path relative to the base URL).
    ///
    /// Adds `Authorization: Bearer <token>` when a token is given and
    /// `Content-Type: application/json` unless the body is multipart.
    /// `overrides` replace headers of the same name; a multipart body never
    /// carries a caller-set content type.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<RequestBody>,
        token: Option<&str>,
        overrides: &[(String, String)],
    ) -> HttpRequest {
        let is_multipart = matches!(body, Some(RequestBody::Multipart(_)));
        let mut headers: Vec<(String, String)> = Vec::new();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        if !is_multipart {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        for (name, value) in overrides {
            headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        if is_multipart {
            headers.retain(|(name, _)| !name.eq_ignore_ascii_case("content-type"));
        }

        HttpRequest {
            method,
            path: format!("{}{}", self.config.base_url, endpoint),
            endpoint: endpoint.to_string(),
            headers,
            body,
        }
    }

    /// Interpret a response: the decoded payload on 2xx, a structured
    /// `HttpError` otherwise.
    pub fn parse_response(&self, response: &HttpResponse, endpoint: &str, method: HttpMethod) -> ApiResult<Value> {
        let payload = decode_payload(response);
        if response.is_success() {
            return Ok(payload);
        }
        let message = resolve_error_message(&payload, response.status, &response.status_text);
        Err(ApiError::Http(HttpError {
            message,
            status: response.status,
            status_text: response.status_text.clone(),
            payload,
            endpoint: endpoint.to_string(),
            method,
        }))
    }

    /// Issue a request and return the decoded success payload.
    pub fn send(&self, method: HttpMethod, endpoint: &str, body: Option<RequestBody>) -> ApiResult<Value> {
        self.send_with_headers(method, endpoint, body, &[])
    }

    #[tracing::instrument(name = "api_request", skip_all, fields(method = %method, endpoint = %endpoint))]
    pub fn send_with_headers(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: Option<RequestBody>,
        overrides: &[(String, String)],
    ) -> ApiResult<Value> {
        let token = self.session.token();
        let request = self.build_request(method, endpoint, body, token.as_deref(), overrides);
        log_outgoing(&request, token.is_some());

        let start = Instant::now();
        let response = self.transport.execute(&request).map_err(|e| {
            warn!(error = %e, base_url = %self.config.base_url, "Network error");
            ApiError::network(e.0)
        })?;
        let duration_ms = start.elapsed().as_millis() as u64;

        if response.status == 401 {
            if let Some(token) = token.as_deref() {
                self.session.evict_if_current(token, endpoint);
                return Err(ApiError::SessionExpired {
                    endpoint: endpoint.to_string(),
                });
            }
        }

        let result = self.parse_response(&response, endpoint, method);
        match &result {
            Ok(_) => info!(status = response.status, duration_ms, "Request completed"),
            Err(e) => warn!(status = response.status, duration_ms, error = %e, "Request failed"),
        }
        result
    }

    pub fn get(&self, endpoint: &str) -> ApiResult<Value> {
        self.send(HttpMethod::Get, endpoint, None)
    }

    pub fn delete(&self, endpoint: &str) -> ApiResult<Value> {
        self.send(HttpMethod::Delete, endpoint, None)
    }

    pub fn send_json<T: Serialize + ?Sized>(&self, method: HttpMethod, endpoint: &str, body: &T) -> ApiResult<Value> {
        self.send(method, endpoint, Some(json_body(body)?))
    }

    pub fn send_form(&self, method: HttpMethod, endpoint: &str, form: MultipartForm) -> ApiResult<Value> {
        self.send(method, endpoint, Some(RequestBody::Multipart(form)))
    }
}

/// Serialize `value` into a JSON request body.
pub fn json_body<T: Serialize + ?Sized>(value: &T) -> ApiResult<RequestBody> {
    serde_json::to_string(value)
        .map(RequestBody::Json)
        .map_err(|e| ApiError::Serialization(e.to_string()))
}

fn log_outgoing(request: &HttpRequest, has_auth: bool) {
    match &request.body {
        Some(RequestBody::Multipart(form)) => {
            for part in form.parts() {
                match &part.value {
                    PartValue::File(file) => debug!(
                        field = %part.name,
                        file_name = %file.file_name,
                        size = file.bytes.len(),
                        content_type = %file.content_type,
                        "Multipart file part"
                    ),
                    PartValue::Text(value) => debug!(field = %part.name, value = %value, "Multipart text part"),
                }
            }
            debug!(url = %request.path, has_auth, multipart = true, "Sending request");
        }
        Some(RequestBody::Json(json)) => debug!(url = %request.path, has_auth, bytes = json.len(), "Sending request"),
        None => debug!(url = %request.path, has_auth, "Sending request"),
    }
}

/// Decode a response body without ever failing.
///
/// JSON when declared; otherwise a best-effort JSON parse of the text, then
/// `{"message": text}`, then `{"success": <2xx>}` for an empty body.
pub fn decode_payload(response: &HttpResponse) -> Value {
    let body = response.body.trim();
    if body.is_empty() {
        return json!({ "success": response.is_success() });
    }

    let declared_json = response
        .header("content-type")
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    match serde_json::from_str::<Value>(body) {
        Ok(value) => value,
        Err(e) if declared_json => json!({
            "message": format!("Failed to parse response: {e}"),
            "status": response.status,
            "rawResponse": response.body,
        }),
        Err(_) => json!({ "message": response.body }),
    }
}

/// Human-readable message for an error payload: `message`, `error`, joined
/// `errors[]`, `details`, then `HTTP <status>: <statusText>`.
pub fn resolve_error_message(payload: &Value, status: u16, status_text: &str) -> String {
    if let Value::String(text) = payload {
        if !text.is_empty() {
            return text.clone();
        }
    }

    if let Some(message) = payload.get("message").and_then(text_of) {
        return message;
    }
    if let Some(error) = payload.get("error").and_then(text_of) {
        return error;
    }
    if let Some(errors) = payload.get("errors").and_then(Value::as_array) {
        let joined: Vec<String> = errors.iter().filter_map(text_of).collect();
        if !joined.is_empty() {
            return joined.join(", ");
        }
    }
    if let Some(details) = payload.get("details").and_then(text_of) {
        return details;
    }
    format!("HTTP {status}: {status_text}")
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::String(text) if text.is_empty() => None,
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FileUpload;
    use crate::session::SessionObserver;
    use crate::testing::scripted_client;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn build_request_attaches_bearer_and_json_content_type() {
        let (client, _, _) = scripted_client();
        let req = client.build_request(HttpMethod::Get, "/category", None, Some("tok"), &[]);
        assert_eq!(req.path, "http://api.test/category");
        assert_eq!(req.endpoint, "/category");
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
        assert_eq!(req.header("content-type"), Some("application/json"));
    }

    #[test]
    fn build_request_without_token_has_no_authorization() {
        let (client, _, _) = scripted_client();
        let req = client.build_request(HttpMethod::Get, "/blog", None, None, &[]);
        assert!(req.header("authorization").is_none());
    }

    #[test]
    fn multipart_request_never_sets_content_type() {
        let (client, _, _) = scripted_client();
        let mut form = MultipartForm::new();
        form.file("image", FileUpload::new("a.png", "image/png", vec![1]));
        let overrides = vec![("Content-Type".to_string(), "multipart/form-data".to_string())];
        let req = client.build_request(
            HttpMethod::Post,
            "/category/create",
            Some(RequestBody::Multipart(form)),
            Some("tok"),
            &overrides,
        );
        assert!(req.header("content-type").is_none());
        assert_eq!(req.header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn header_overrides_replace_defaults() {
        let (client, _, _) = scripted_client();
        let overrides = vec![("content-type".to_string(), "text/plain".to_string())];
        let req = client.build_request(HttpMethod::Post, "/x", None, None, &overrides);
        assert_eq!(req.header("Content-Type"), Some("text/plain"));
        assert_eq!(req.headers.len(), 1);
    }

    #[test]
    fn success_returns_payload_unchanged() {
        let (client, transport, _) = scripted_client();
        transport.push_json(200, json!({"data": {"categories": []}}));
        let payload = client.get("/category").unwrap();
        assert_eq!(payload, json!({"data": {"categories": []}}));
    }

    #[test]
    fn error_message_priority() {
        let both = json!({"message": "m", "error": "e", "errors": ["x"], "details": "d"});
        assert_eq!(resolve_error_message(&both, 400, "Bad Request"), "m");
        assert_eq!(resolve_error_message(&json!({"error": "e", "details": "d"}), 400, ""), "e");
        assert_eq!(
            resolve_error_message(&json!({"errors": ["name required", "code required"]}), 422, ""),
            "name required, code required"
        );
        assert_eq!(resolve_error_message(&json!({"details": "d"}), 400, ""), "d");
        assert_eq!(resolve_error_message(&json!({"foo": 1}), 502, "Bad Gateway"), "HTTP 502: Bad Gateway");
        assert_eq!(resolve_error_message(&json!("plain"), 500, ""), "plain");
    }

    #[test]
    fn non_2xx_becomes_structured_http_error() {
        let (client, transport, _) = scripted_client();
        transport.push_json(409, json!({"message": "Code exists"}));
        let err = client.send_json(HttpMethod::Post, "/discount", &json!({"code": "X"})).unwrap_err();
        match err {
            ApiError::Http(e) => {
                assert_eq!(e.message, "Code exists");
                assert_eq!(e.status, 409);
                assert_eq!(e.status_text, "Conflict");
                assert_eq!(e.endpoint, "/discount");
                assert_eq!(e.method, HttpMethod::Post);
                assert_eq!(e.payload, json!({"message": "Code exists"}));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn text_body_is_parsed_best_effort() {
        let (client, transport, _) = scripted_client();
        transport.push_text(200, "text/html", r#"{"ok":true}"#);
        assert_eq!(client.get("/x").unwrap(), json!({"ok": true}));

        transport.push_text(500, "text/html", "Internal meltdown");
        let err = client.get("/x").unwrap_err();
        assert_eq!(err.to_string(), "Internal meltdown");
        assert_eq!(err.payload(), Some(&json!({"message": "Internal meltdown"})));
    }

    #[test]
    fn empty_body_becomes_success_flag() {
        let (client, transport, _) = scripted_client();
        transport.push_text(204, "", "");
        assert_eq!(client.delete("/blog/delete/1").unwrap(), json!({"success": true}));
    }

    #[test]
    fn malformed_declared_json_is_wrapped_not_thrown() {
        let response = HttpResponse::json(200, "{broken");
        let payload = decode_payload(&response);
        assert!(payload["message"].as_str().unwrap().starts_with("Failed to parse response"));
        assert_eq!(payload["rawResponse"], "{broken");
    }

    #[test]
    fn transport_failure_is_network_error() {
        let (client, transport, _) = scripted_client();
        transport.push_network_failure("connection refused");
        let err = client.get("/order/all-orders").unwrap_err();
        assert!(err.is_network_error());
        assert_eq!(err.to_string(), crate::error::NETWORK_ERROR_MESSAGE);
    }

    #[derive(Default)]
    struct Navigations(AtomicUsize);

    impl SessionObserver for Navigations {
        fn session_expired(&self, _endpoint: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn unauthorized_with_token_evicts_session() {
        let (client, transport, session) = scripted_client();
        let nav = Arc::new(Navigations::default());
        session.subscribe(nav.clone());
        session.set_token("expired").unwrap();
        transport.push_json(401, json!({"message": "jwt expired"}));

        let err = client.get("/product/products").unwrap_err();
        assert!(err.is_session_expired());
        assert!(!session.is_authenticated());
        assert_eq!(nav.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unauthorized_without_token_is_plain_http_error() {
        let (client, transport, _) = scripted_client();
        transport.push_json(401, json!({"message": "Invalid credentials"}));
        let err = client.send_json(HttpMethod::Post, "/admin/login", &json!({})).unwrap_err();
        assert!(matches!(err, ApiError::Http(HttpError { status: 401, .. })));
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn concurrent_unauthorized_responses_evict_once() {
        let (client, transport, session) = scripted_client();
        let nav = Arc::new(Navigations::default());
        session.subscribe(nav.clone());
        session.set_token("stale").unwrap();
        transport.always_json(401, json!({"message": "Unauthorized"}));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let client = client.clone();
                std::thread::spawn(move || client.get("/order/all-orders"))
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap().is_err());
        }

        assert_eq!(nav.0.load(Ordering::SeqCst), 1);
        assert!(!session.is_authenticated());
    }
}
