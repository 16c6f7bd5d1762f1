use axum::body::Body;
use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, ADMIN_EMAIL, ADMIN_PASSWORD, BLOG_IMAGE_FIELD};
use serde_json::{json, Value};
use tower::ServiceExt;

const BOUNDARY: &str = "mock-boundary-7d1";

async fn body_json(response: axum::response::Response) -> Value {
    let bytes: bytes::Bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str),
}

fn multipart_request(method: &str, uri: &str, token: &str, parts: &[Part]) -> Request<Body> {
    let mut body = String::new();
    for part in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match part {
            Part::Text(name, value) => {
                body.push_str(&format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"));
            }
            Part::File(name, file_name) => {
                body.push_str(&format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n\
                     Content-Type: image/png\r\n\r\nPNGDATA\r\n"
                ));
            }
        }
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {token}"))
        .header(http::header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            None,
            json!({"email": ADMIN_EMAIL, "password": ADMIN_PASSWORD}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    body["data"]["accessToken"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn login_returns_token_inside_data() {
    let app = app();
    let token = login(&app).await;
    assert!(!token.is_empty());

    let resp = app.clone().oneshot(get("/admin/profile", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["email"], ADMIN_EMAIL);
}

#[tokio::test]
async fn wrong_password_is_401_with_message() {
    let resp = app()
        .oneshot(json_request(
            "POST",
            "/admin/login",
            None,
            json!({"email": ADMIN_EMAIL, "password": "nope"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "Invalid email or password");
}

#[tokio::test]
async fn protected_routes_require_bearer_token() {
    let resp = app()
        .oneshot(Request::builder().uri("/category").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app().oneshot(get("/category", "forged")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoked_sessions_get_401() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(Request::builder().method("POST").uri("/mock/revoke-sessions").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = app.clone().oneshot(get("/order/all-orders", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- products ---

#[tokio::test]
async fn product_multipart_lifecycle() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/product/create",
            &token,
            &[
                Part::Text("name", "Kaju Katli"),
                Part::Text("code", "KK1"),
                Part::Text("category", "c1"),
                Part::Text("price", "450"),
                Part::Text("tags", r#"["sweet","festive"]"#),
                Part::Text("weightNumber", "500"),
                Part::Text("weightUnit", "g"),
                Part::File("images", "front.png"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = body_json(resp).await;
    let id = created["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(created["data"]["weight"], json!({"number": 500.0, "unit": "g"}));
    assert_eq!(created["data"]["images"], json!(["/uploads/front.png"]));

    let resp = app
        .clone()
        .oneshot(get("/product/products?page=1&limit=12&search=kaju", &token))
        .await
        .unwrap();
    let page = body_json(resp).await;
    assert_eq!(page["data"]["total"], 1);
    assert_eq!(page["data"]["pages"], 1);

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "PATCH",
            &format!("/product/update/{id}"),
            &token,
            &[Part::Text("existingImages", "[]"), Part::File("images", "back.png")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["images"], json!(["/uploads/back.png"]));

    let resp = app.clone().oneshot(get("/product/category/c1", &token)).await.unwrap();
    assert_eq!(body_json(resp).await["data"]["products"][0]["_id"], id.as_str());

    let resp = app
        .clone()
        .oneshot(json_request("DELETE", &format!("/product/delete/{id}"), Some(&token), json!({})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app.clone().oneshot(get(&format!("/product/{id}"), &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn duplicate_product_code_is_400() {
    let app = app();
    let token = login(&app).await;
    let parts = [Part::Text("name", "A"), Part::Text("code", "DUP")];
    let first = app.clone().oneshot(multipart_request("POST", "/product/create", &token, &parts)).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);
    let second = app.clone().oneshot(multipart_request("POST", "/product/create", &token, &parts)).await.unwrap();
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(second).await["message"], "Product code already exists");
}

// --- categories ---

#[tokio::test]
async fn category_needs_an_image_on_create() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(multipart_request("POST", "/category/create", &token, &[Part::Text("name", "Sweets")]))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/category/create",
            &token,
            &[Part::Text("name", "Sweets"), Part::File("image", "s.png")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = app.clone().oneshot(get("/category", &token)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["categories"][0]["isActive"], true);
}

// --- discounts ---

#[tokio::test]
async fn discounts_page_and_expired_listing() {
    let app = app();
    let token = login(&app).await;
    for (code, until) in [("OLD10", "2024-06-30"), ("NEW20", "2030-01-01")] {
        let resp = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/discount",
                Some(&token),
                json!({"code": code, "discountType": "percentage", "value": 10, "validUntil": until}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = app.clone().oneshot(get("/discount/all?page=1&limit=1", &token)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["totalPages"], 2);
    assert_eq!(body["data"]["currentPage"], 1);

    let resp = app.clone().oneshot(get("/discount/expired", &token)).await.unwrap();
    let body = body_json(resp).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["code"], "OLD10");
}

// --- orders ---

#[tokio::test]
async fn order_status_is_validated() {
    let app = app();
    let token = login(&app).await;
    let resp = app.clone().oneshot(get("/order/all-orders", &token)).await.unwrap();
    let body = body_json(resp).await;
    let id = body["data"]["orders"][0]["_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request("PATCH", &format!("/order/{id}/status"), Some(&token), json!({"status": "lost"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(json_request("PATCH", &format!("/order/{id}/status"), Some(&token), json!({"status": "delivered"})))
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["data"]["status"], "delivered");
}

// --- blogs ---

#[tokio::test]
async fn empty_blog_list_is_404() {
    let app = app();
    let token = login(&app).await;
    let resp = app.clone().oneshot(get("/blog", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["message"], "No blogs found");
}

#[tokio::test]
async fn blog_upload_accepts_only_one_field_name() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/blog/create",
            &token,
            &[Part::Text("title", "Diwali"), Part::File("image", "d.png")],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app
        .clone()
        .oneshot(multipart_request(
            "POST",
            "/blog/create",
            &token,
            &[
                Part::Text("title", "Diwali"),
                Part::Text("tags[0]", "festive"),
                Part::File(BLOG_IMAGE_FIELD, "d.png"),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let blog = body_json(resp).await;
    assert_eq!(blog["data"]["blogName"], "Diwali");
    assert_eq!(blog["data"]["blogImgUrl"]["url"], "/uploads/d.png");
    assert_eq!(blog["data"]["tags"], json!(["festive"]));

    let resp = app.clone().oneshot(get("/blog", &token)).await.unwrap();
    assert_eq!(body_json(resp).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn blog_json_create_and_edit() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/blog/create",
            Some(&token),
            json!({"title": "Plain", "content": "<p>hi</p>", "status": "draft"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["data"]["_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request("PUT", &format!("/blog/edit/{id}"), Some(&token), json!({"status": "published"})))
        .await
        .unwrap();
    let blog = body_json(resp).await;
    assert_eq!(blog["data"]["status"], "published");
    assert_eq!(blog["data"]["blogContent"]["markup"], "<p>hi</p>");
}

// --- manufacturers ---

#[tokio::test]
async fn manufacturer_crud_uses_response_envelope() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/manufacturer",
            Some(&token),
            json!({"code": "HLD", "address": "Bikaner"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let id = body_json(resp).await["data"]["response"]["_id"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/manufacturer/{id}"),
            Some(&token),
            json!({"code": " ", "address": "Delhi"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = app.clone().oneshot(get("/manufacturer", &token)).await.unwrap();
    assert_eq!(body_json(resp).await["data"]["response"][0]["address"], "Bikaner");
}
