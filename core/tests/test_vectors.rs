//! Verify request building and payload shaping against JSON test vectors
//! stored in `test-vectors/`.
//!
//! Comparing parsed JSON (not raw strings) avoids false negatives from
//! field-ordering differences. View comparisons check only the keys a vector
//! lists, so new fields on the view types don't break old vectors.

use backoffice_core::client::{decode_payload, resolve_error_message};
use backoffice_core::http::canonical_reason;
use backoffice_core::resources::discounts::{DiscountDraft, DiscountPayload, DiscountStatus, DiscountType};
use backoffice_core::testing::{scripted_client, ScriptedTransport};
use backoffice_core::{
    ApiClient, ClientConfig, HttpMethod, HttpResponse, MultipartForm, RequestBody, SessionContext,
};
use serde_json::Value;
use std::sync::Arc;

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn load(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap()
}

/// Every key in `expected` must be present in `actual` with the same value.
fn assert_subset(actual: &Value, expected: &Value, name: &str) {
    for (key, value) in expected.as_object().unwrap() {
        assert_eq!(&actual[key], value, "{name}: field {key}");
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[test]
fn request_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/requests.json"));
    let base_url = vectors["base_url"].as_str().unwrap();
    let client = ApiClient::new(
        ClientConfig::new(base_url),
        SessionContext::in_memory(),
        Arc::new(ScriptedTransport::new()),
    );

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let expected_req = &case["expected_request"];
        let body = if case["multipart"].as_bool().unwrap() {
            let mut form = MultipartForm::new();
            form.text("name", "Kaju Katli");
            Some(RequestBody::Multipart(form))
        } else {
            None
        };

        let req = client.build_request(
            parse_method(case["method"].as_str().unwrap()),
            case["endpoint"].as_str().unwrap(),
            body,
            case["token"].as_str(),
            &[],
        );
        assert_eq!(req.path, format!("{base_url}{}", expected_req["path"].as_str().unwrap()), "{name}: path");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");
    }
}

// ---------------------------------------------------------------------------
// Error messages
// ---------------------------------------------------------------------------

#[test]
fn error_message_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/error_messages.json"));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let response = HttpResponse {
            status,
            status_text: canonical_reason(status).to_string(),
            headers: vec![(
                "content-type".to_string(),
                case["content_type"].as_str().unwrap().to_string(),
            )],
            body: case["body"].as_str().unwrap().to_string(),
        };

        let message = resolve_error_message(&decode_payload(&response), status, &response.status_text);
        if let Some(expected) = case["expected_message"].as_str() {
            assert_eq!(message, expected, "{name}: message");
        } else {
            let prefix = case["expected_prefix"].as_str().unwrap();
            assert!(message.starts_with(prefix), "{name}: {message:?} should start with {prefix:?}");
        }
    }
}

// ---------------------------------------------------------------------------
// Discounts
// ---------------------------------------------------------------------------

fn draft_from_vector(v: &Value) -> DiscountDraft {
    DiscountDraft {
        code: v["code"].as_str().unwrap().to_string(),
        title: v["title"].as_str().unwrap().to_string(),
        kind: serde_json::from_value::<DiscountType>(v["type"].clone()).unwrap(),
        value: v["value"].as_f64().unwrap(),
        min_order_amount: v["minOrderAmount"].as_f64().unwrap(),
        max_discount: v["maxDiscount"].as_f64(),
        valid_from: v["validFrom"].as_str().unwrap().to_string(),
        valid_to: v["validTo"].as_str().unwrap().to_string(),
        usage_limit: v["usageLimit"].as_u64(),
        applicable_categories: serde_json::from_value(v["applicableCategories"].clone()).unwrap(),
        status: serde_json::from_value::<DiscountStatus>(v["status"].clone()).unwrap(),
    }
}

#[test]
fn discount_to_backend_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/discounts.json"));

    for case in vectors["to_backend"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let payload = DiscountPayload::from_draft(&draft_from_vector(&case["draft"])).unwrap();
        assert_eq!(serde_json::to_value(&payload).unwrap(), case["expected_body"], "{name}: body");
    }
}

#[test]
fn discount_from_backend_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/discounts.json"));

    for case in vectors["from_backend"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (client, transport, _) = scripted_client();
        transport.push_json(200, serde_json::json!({ "data": case["record"] }));

        let discount = client.discounts().get("any").unwrap();
        assert_subset(&serde_json::to_value(&discount).unwrap(), &case["expected_view"], name);
    }
}

// ---------------------------------------------------------------------------
// Blogs
// ---------------------------------------------------------------------------

#[test]
fn blog_normalization_test_vectors() {
    let vectors = load(include_str!("../../test-vectors/blogs.json"));

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let (client, transport, _) = scripted_client();
        transport.push_json(200, case["response"].clone());

        let blog = client.blogs().get("any").unwrap();
        assert_subset(&serde_json::to_value(&blog).unwrap(), &case["expected"], name);
    }
}
