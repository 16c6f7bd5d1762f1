//! Executes `HttpRequest` values against the network.
//!
//! The client core never performs I/O itself; it hands a fully built request
//! to a `Transport` and interprets the returned `HttpResponse`. Non-2xx
//! statuses are data, not errors: a transport only fails when no response
//! was obtained at all.

use std::io::Read;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;
use ureq::unversioned::multipart::{Form, Part};

use crate::http::{escape_disposition, HttpMethod, HttpRequest, HttpResponse, MultipartForm, PartValue, RequestBody};

/// No response was obtained (DNS, refused connection, timeout, TLS...).
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(pub String);

pub trait Transport: Send + Sync {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Body bytes plus the content type that goes with them.
struct EncodedBody {
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Encode a request body for the wire. Multipart boundaries are chosen by
/// ureq's form encoder and nowhere else.
fn encode_body(body: &RequestBody) -> Result<EncodedBody, TransportError> {
    match body {
        RequestBody::Json(json) => Ok(EncodedBody {
            content_type: None,
            bytes: json.as_bytes().to_vec(),
        }),
        RequestBody::Multipart(form) => encode_multipart(form),
    }
}

fn encode_multipart(form: &MultipartForm) -> Result<EncodedBody, TransportError> {
    // ureq writes names and file names verbatim, so they are escaped first.
    let names: Vec<String> = form.parts().iter().map(|part| escape_disposition(&part.name)).collect();

    let mut wire = Form::new();
    for (part, name) in form.parts().iter().zip(&names) {
        wire = match &part.value {
            PartValue::Text(value) => wire.text(name, value),
            PartValue::File(file) => {
                let upload = Part::bytes(&file.bytes)
                    .file_name(&escape_disposition(&file.file_name))
                    .mime_str(&file.content_type)
                    .map_err(|e| TransportError(format!("invalid content type for part {name}: {e}")))?;
                wire.part(name, upload)
            }
        };
    }

    let content_type = format!("multipart/form-data; boundary={}", wire.boundary());
    let mut bytes = Vec::new();
    wire.read_to_end(&mut bytes)
        .map_err(|e| TransportError(format!("failed to encode multipart body: {e}")))?;
    Ok(EncodedBody {
        content_type: Some(content_type),
        bytes,
    })
}

/// Blocking transport built on `ureq`.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        // Status codes are interpreted by the client, not by ureq.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build()
            .new_agent();
        Self { agent }
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.path.as_str();
        let mut headers = request.headers.clone();
        let encoded = request.body.as_ref().map(encode_body).transpose()?;
        if let Some(content_type) = encoded.as_ref().and_then(|body| body.content_type.clone()) {
            headers.push(("Content-Type".to_string(), content_type));
        }

        let result = match (request.method, encoded) {
            (HttpMethod::Get, _) => with_headers(self.agent.get(url), &headers).call(),
            (HttpMethod::Delete, _) => with_headers(self.agent.delete(url), &headers).call(),
            (HttpMethod::Post, Some(body)) => with_headers(self.agent.post(url), &headers).send(body.bytes.as_slice()),
            (HttpMethod::Post, None) => with_headers(self.agent.post(url), &headers).send_empty(),
            (HttpMethod::Put, Some(body)) => with_headers(self.agent.put(url), &headers).send(body.bytes.as_slice()),
            (HttpMethod::Put, None) => with_headers(self.agent.put(url), &headers).send_empty(),
            (HttpMethod::Patch, Some(body)) => with_headers(self.agent.patch(url), &headers).send(body.bytes.as_slice()),
            (HttpMethod::Patch, None) => with_headers(self.agent.patch(url), &headers).send_empty(),
        };

        let mut response = result.map_err(|e| TransportError(e.to_string()))?;
        let status = response.status();
        let response_headers = response
            .headers()
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), value.to_str().unwrap_or("").to_string()))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError(e.to_string()))?;

        debug!(status = status.as_u16(), bytes = body.len(), "Transport received response");
        Ok(HttpResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{FileUpload, MultipartForm};

    #[test]
    fn json_body_leaves_content_type_to_request_headers() {
        let encoded = encode_body(&RequestBody::Json("{}".to_string())).unwrap();
        assert!(encoded.content_type.is_none());
        assert_eq!(encoded.bytes, b"{}");
    }

    #[test]
    fn multipart_body_carries_its_own_boundary() {
        let mut form = MultipartForm::new();
        form.text("name", "Sweets")
            .file("image", FileUpload::new("s.jpg", "image/jpeg", b"JPEG".to_vec()));
        let encoded = encode_body(&RequestBody::Multipart(form)).unwrap();

        let content_type = encoded.content_type.unwrap();
        let boundary = content_type.strip_prefix("multipart/form-data; boundary=").unwrap();
        let text = String::from_utf8_lossy(&encoded.bytes);
        assert!(text.starts_with(&format!("--{boundary}\r\n")));
        assert!(text.contains("Content-Disposition: form-data; name=\"name\"\r\n\r\nSweets"));
        assert!(text.contains("name=\"image\"; filename=\"s.jpg\"\r\nContent-Type: image/jpeg\r\n\r\nJPEG"));
        assert!(text.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn multipart_names_cannot_inject_part_headers() {
        let mut form = MultipartForm::new();
        form.text("title\r\nX-Field: 1", "t")
            .file("image", FileUpload::new("a.png\r\nX-Injected: 1", "image/png", vec![1]));
        let encoded = encode_body(&RequestBody::Multipart(form)).unwrap();

        let text = String::from_utf8_lossy(&encoded.bytes);
        assert!(!text.contains("\r\nX-Injected: 1"));
        assert!(!text.contains("\r\nX-Field: 1"));
        assert!(text.contains("filename=\"a.png%0D%0AX-Injected: 1\""));
        assert!(text.contains("name=\"title%0D%0AX-Field: 1\""));
    }

    #[test]
    fn malformed_file_content_type_is_a_transport_error() {
        let mut form = MultipartForm::new();
        form.file("image", FileUpload::new("a.png", "not a mime\r\nX: 1", vec![1]));
        assert!(encode_body(&RequestBody::Multipart(form)).is_err());
    }
}
