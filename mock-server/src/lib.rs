//! In-memory emulation of the back-office admin REST API.
//!
//! Documents are stored as JSON objects so each route can answer in exactly
//! the envelope the real backend uses (`{data: ...}`, `{data: {response}}`,
//! bare arrays for blogs). Every route except login requires a Bearer token
//! issued by `/admin/login`.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{FromRequest, Multipart, Path, Query, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub const ADMIN_EMAIL: &str = "admin@backoffice.test";
pub const ADMIN_PASSWORD: &str = "admin123";
/// The only multipart field name the blog routes accept for the image.
pub const BLOG_IMAGE_FIELD: &str = "blogImage";
/// Discounts ending before this date are listed as expired.
pub const MOCK_TODAY: &str = "2025-01-01";

pub const ORDER_STATUSES: [&str; 7] = [
    "pending",
    "processing",
    "shipped",
    "delivered",
    "cancelled",
    "failed",
    "returned",
];

type Doc = Map<String, Value>;

#[derive(Debug, Default)]
pub struct Store {
    tokens: HashSet<String>,
    profile: Doc,
    products: Vec<Doc>,
    categories: Vec<Doc>,
    discounts: Vec<Doc>,
    orders: Vec<Doc>,
    blogs: Vec<Doc>,
    manufacturers: Vec<Doc>,
}

pub type Db = Arc<RwLock<Store>>;

/// Error response in the backend's `{message}` shape.
#[derive(Debug)]
pub struct ApiFailure(StatusCode, String);

impl ApiFailure {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, message.into())
    }

    fn not_found(what: &str) -> Self {
        Self(StatusCode::NOT_FOUND, format!("{what} not found"))
    }

    fn unauthorized(message: &str) -> Self {
        Self(StatusCode::UNAUTHORIZED, message.to_string())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "message": self.1 }))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiFailure>;

fn doc(value: Value) -> Doc {
    match value {
        Value::Object(map) => map,
        _ => Doc::new(),
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn seed() -> Store {
    let mut store = Store {
        profile: doc(json!({"_id": new_id(), "name": "Store Admin", "email": ADMIN_EMAIL, "role": "admin"})),
        ..Store::default()
    };
    let orders = [
        ("ORD-1001", "pending", 1200.0, "Asha Rao", "9876543210"),
        ("ORD-1002", "shipped", 860.0, "Ravi Kumar", "9123456780"),
        ("ORD-1003", "cancelled", 450.0, "Meera Iyer", "9988776655"),
    ];
    for (number, status, total, name, phone) in orders {
        store.orders.push(doc(json!({
            "_id": new_id(),
            "orderNumber": number,
            "status": status,
            "total": total,
            "subtotal": total,
            "items": [{"productName": "Kaju Katli", "productCode": "KK1", "quantity": 1,
                        "priceAtPurchase": total, "itemTotal": total}],
            "shippingAddress": {"name": name, "phone": phone},
            "paymentMethod": "cod",
            "paymentStatus": "pending",
            "createdAt": "2024-10-01T10:00:00Z"
        })));
    }
    store
}

pub fn app() -> Router {
    app_with_store(seed())
}

pub fn app_with_store(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/admin/login", post(login))
        .route("/admin/profile", get(get_profile).patch(update_profile))
        .route("/product/products", get(list_products))
        .route("/product/category/{id}", get(list_products_by_category))
        .route("/product/create", post(create_product))
        .route("/product/update/{id}", patch(update_product))
        .route("/product/delete/{id}", delete(delete_product))
        .route("/product/{id}", get(get_product))
        .route("/category", get(list_categories))
        .route("/category/create", post(create_category))
        .route("/category/{id}", get(get_category).put(update_category).delete(delete_category))
        .route("/discount", post(create_discount))
        .route("/discount/all", get(list_discounts))
        .route("/discount/expired", get(expired_discounts))
        .route("/discount/{id}", get(get_discount).put(update_discount).delete(delete_discount))
        .route("/order/all-orders", get(list_orders))
        .route("/order/order/{id}", get(get_order))
        .route("/order/{id}/status", patch(update_order_status))
        .route("/blog", get(list_blogs))
        .route("/blog/create", post(create_blog))
        .route("/blog/edit/{id}", put(update_blog))
        .route("/blog/delete/{id}", delete(delete_blog))
        .route("/blog/{id}", get(get_blog))
        .route("/manufacturer", get(list_manufacturers).post(create_manufacturer))
        .route(
            "/manufacturer/{id}",
            get(get_manufacturer).put(update_manufacturer).delete(delete_manufacturer),
        )
        .route("/mock/revoke-sessions", post(revoke_sessions))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn authorize(headers: &HeaderMap, store: &Store) -> ApiResult<()> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiFailure::unauthorized("Not authorized, no token"))?;
    if store.tokens.contains(token) {
        Ok(())
    } else {
        Err(ApiFailure::unauthorized("Not authorized, token failed"))
    }
}

fn find<'a>(docs: &'a [Doc], id: &str) -> Option<&'a Doc> {
    docs.iter().find(|d| d.get("_id").and_then(Value::as_str) == Some(id))
}

fn find_mut<'a>(docs: &'a mut [Doc], id: &str) -> Option<&'a mut Doc> {
    docs.iter_mut().find(|d| d.get("_id").and_then(Value::as_str) == Some(id))
}

fn remove(docs: &mut Vec<Doc>, id: &str, what: &str) -> ApiResult<Doc> {
    let index = docs
        .iter()
        .position(|d| d.get("_id").and_then(Value::as_str) == Some(id))
        .ok_or_else(|| ApiFailure::not_found(what))?;
    Ok(docs.remove(index))
}

fn text<'a>(d: &'a Doc, key: &str) -> &'a str {
    d.get(key).and_then(Value::as_str).unwrap_or("")
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    page: Option<usize>,
    limit: Option<usize>,
    search: Option<String>,
    category: Option<String>,
}

/// Slice of `items` for the page, plus the page count.
fn paginate(items: Vec<Doc>, page: usize, limit: usize) -> (Vec<Doc>, usize) {
    let limit = limit.max(1);
    let pages = items.len().div_ceil(limit).max(1);
    let start = (page.max(1) - 1) * limit;
    (items.into_iter().skip(start).take(limit).collect(), pages)
}

#[derive(Debug, Default)]
struct FormData {
    texts: Vec<(String, String)>,
    files: Vec<(String, String)>,
}

impl FormData {
    fn text(&self, name: &str) -> Option<&str> {
        self.texts.iter().find(|(n, _)| n == name).map(|(_, v)| v.as_str())
    }

    fn file_urls(&self, name: &str) -> Vec<Value> {
        self.files
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, file)| Value::String(format!("/uploads/{file}")))
            .collect()
    }
}

async fn read_form(mut multipart: Multipart) -> ApiResult<FormData> {
    let mut form = FormData::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiFailure::bad_request(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                field.bytes().await.map_err(|e| ApiFailure::bad_request(e.body_text()))?;
                form.files.push((name, file_name));
            }
            None => {
                let value = field.text().await.map_err(|e| ApiFailure::bad_request(e.body_text()))?;
                form.texts.push((name, value));
            }
        }
    }
    Ok(form)
}

fn parse_number(form: &FormData, key: &str) -> ApiResult<Option<f64>> {
    form.text(key)
        .map(|v| v.parse::<f64>().map_err(|_| ApiFailure::bad_request(format!("{key} must be a number"))))
        .transpose()
}

fn parse_json_list(form: &FormData, key: &str) -> ApiResult<Option<Value>> {
    form.text(key)
        .map(|v| {
            serde_json::from_str::<Vec<String>>(v)
                .map(|list| json!(list))
                .map_err(|_| ApiFailure::bad_request(format!("{key} must be a JSON array")))
        })
        .transpose()
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

async fn login(State(db): State<Db>, Json(input): Json<LoginInput>) -> ApiResult<Json<Value>> {
    if input.email != ADMIN_EMAIL || input.password != ADMIN_PASSWORD {
        warn!(email = %input.email, "Rejected login");
        return Err(ApiFailure::unauthorized("Invalid email or password"));
    }
    let mut store = db.write().await;
    let token = new_id();
    store.tokens.insert(token.clone());
    let mut data = store.profile.clone();
    data.insert("accessToken".into(), Value::String(token));
    info!("Admin logged in");
    Ok(Json(json!({ "data": data })))
}

async fn get_profile(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(json!({ "data": store.profile })))
}

async fn update_profile(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    for key in ["name", "email"] {
        if let Some(value) = input.get(key).and_then(Value::as_str) {
            store.profile.insert(key.into(), Value::String(value.to_string()));
        }
    }
    Ok(Json(json!({ "data": store.profile })))
}

/// Invalidate every issued token so clients see 401 on their next call.
async fn revoke_sessions(State(db): State<Db>) -> StatusCode {
    db.write().await.tokens.clear();
    StatusCode::NO_CONTENT
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

fn product_page(items: Vec<Doc>, params: &PageParams) -> Value {
    let total = items.len();
    let page = params.page.unwrap_or(1);
    let (products, pages) = paginate(items, page, params.limit.unwrap_or(12));
    json!({"data": {"products": products, "page": page, "pages": pages, "total": total}})
}

async fn list_products(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let search = params.search.as_deref().unwrap_or("").to_lowercase();
    let items: Vec<Doc> = store
        .products
        .iter()
        .filter(|p| search.is_empty() || text(p, "name").to_lowercase().contains(&search))
        .filter(|p| params.category.as_deref().map_or(true, |c| text(p, "category") == c))
        .cloned()
        .collect();
    Ok(Json(product_page(items, &params)))
}

async fn list_products_by_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let items = store.products.iter().filter(|p| text(p, "category") == id).cloned().collect();
    Ok(Json(product_page(items, &params)))
}

async fn get_product(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let product = find(&store.products, &id).ok_or_else(|| ApiFailure::not_found("Product"))?;
    Ok(Json(json!({ "data": product })))
}

/// Fold the flat product form into a nested document.
fn apply_product_form(product: &mut Doc, form: &FormData) -> ApiResult<()> {
    for key in ["name", "code", "category", "description"] {
        if let Some(value) = form.text(key) {
            product.insert(key.into(), Value::String(value.to_string()));
        }
    }
    if let Some(price) = parse_number(form, "price")? {
        product.insert("price".into(), json!(price));
    }
    if let Some(stock) = parse_number(form, "stock")? {
        product.insert("stock".into(), json!(stock as i64));
    }
    if let Some(vegetarian) = form.text("vegetarian") {
        product.insert("vegetarian".into(), Value::Bool(vegetarian == "true"));
    }
    if let Some(tags) = parse_json_list(form, "tags")? {
        product.insert("tags".into(), tags);
    }
    if let Some(number) = parse_number(form, "weightNumber")? {
        let unit = form.text("weightUnit").unwrap_or("g");
        product.insert("weight".into(), json!({"number": number, "unit": unit}));
    }
    let mut dimensions = product.get("dimensions").cloned().map(doc).unwrap_or_default();
    for (field, key) in [("dimensionsL", "l"), ("dimensionsB", "b"), ("dimensionsH", "h")] {
        if let Some(value) = parse_number(form, field)? {
            dimensions.insert(key.into(), json!(value));
        }
    }
    if !dimensions.is_empty() {
        product.insert("dimensions".into(), Value::Object(dimensions));
    }
    Ok(())
}

async fn create_product(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&headers, &*db.read().await)?;
    let form = read_form(multipart).await?;
    let mut store = db.write().await;

    let code = form.text("code").unwrap_or_default();
    if form.text("name").unwrap_or_default().is_empty() || code.is_empty() {
        return Err(ApiFailure::bad_request("Name and code are required"));
    }
    if store.products.iter().any(|p| text(p, "code") == code) {
        return Err(ApiFailure::bad_request("Product code already exists"));
    }

    let mut product = doc(json!({"_id": new_id(), "tags": [], "images": form.file_urls("images")}));
    apply_product_form(&mut product, &form)?;
    info!(code, "Product created");
    store.products.push(product.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": product }))))
}

async fn update_product(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    authorize(&headers, &*db.read().await)?;
    let form = read_form(multipart).await?;
    let mut store = db.write().await;
    let product = find_mut(&mut store.products, &id).ok_or_else(|| ApiFailure::not_found("Product"))?;

    apply_product_form(product, &form)?;
    let uploaded = form.file_urls("images");
    let mut images = match parse_json_list(&form, "existingImages")? {
        Some(Value::Array(kept)) => kept,
        _ => product.get("images").and_then(Value::as_array).cloned().unwrap_or_default(),
    };
    images.extend(uploaded);
    product.insert("images".into(), Value::Array(images));
    Ok(Json(json!({ "data": product })))
}

async fn delete_product(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    remove(&mut store.products, &id, "Product")?;
    Ok(Json(json!({"message": "Product deleted"})))
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

async fn list_categories(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(json!({"data": {"categories": store.categories}})))
}

async fn get_category(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let category = find(&store.categories, &id).ok_or_else(|| ApiFailure::not_found("Category"))?;
    Ok(Json(json!({ "data": category })))
}

fn apply_category_form(category: &mut Doc, form: &FormData) {
    for key in ["name", "description", "hsn"] {
        if let Some(value) = form.text(key) {
            category.insert(key.into(), Value::String(value.to_string()));
        }
    }
    if let Some(active) = form.text("isActive") {
        category.insert("isActive".into(), Value::Bool(active == "true"));
    }
    if let Some(image) = form.file_urls("image").pop() {
        category.insert("image".into(), image);
    }
}

async fn create_category(
    State(db): State<Db>,
    headers: HeaderMap,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&headers, &*db.read().await)?;
    let form = read_form(multipart).await?;
    if form.text("name").unwrap_or_default().is_empty() {
        return Err(ApiFailure::bad_request("Category name is required"));
    }
    if form.file_urls("image").is_empty() {
        return Err(ApiFailure::bad_request("Category image is required"));
    }
    let mut category = doc(json!({"_id": new_id(), "isActive": true}));
    apply_category_form(&mut category, &form);
    db.write().await.categories.push(category.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": category }))))
}

async fn update_category(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Value>> {
    authorize(&headers, &*db.read().await)?;
    let form = read_form(multipart).await?;
    let mut store = db.write().await;
    let category = find_mut(&mut store.categories, &id).ok_or_else(|| ApiFailure::not_found("Category"))?;
    apply_category_form(category, &form);
    Ok(Json(json!({ "data": category })))
}

async fn delete_category(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    remove(&mut store.categories, &id, "Category")?;
    Ok(Json(json!({"message": "Category deleted"})))
}

// ---------------------------------------------------------------------------
// Discounts
// ---------------------------------------------------------------------------

fn discount_doc(id: String, input: Value) -> ApiResult<Doc> {
    let mut discount = doc(input);
    if text(&discount, "code").is_empty() {
        return Err(ApiFailure::bad_request("Discount code is required"));
    }
    discount.insert("_id".into(), Value::String(id));
    discount.entry("usedCount").or_insert(json!(0));
    Ok(discount)
}

async fn list_discounts(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let total = store.discounts.len();
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);
    let (discounts, pages) = paginate(store.discounts.clone(), page, limit);
    Ok(Json(json!({"data": {
        "discounts": discounts, "total": total, "totalPages": pages, "currentPage": page, "limit": limit
    }})))
}

async fn expired_discounts(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let expired: Vec<&Doc> = store
        .discounts
        .iter()
        .filter(|d| !text(d, "validUntil").is_empty() && text(d, "validUntil") < MOCK_TODAY)
        .collect();
    Ok(Json(json!({ "data": expired })))
}

async fn get_discount(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let discount = find(&store.discounts, &id).ok_or_else(|| ApiFailure::not_found("Discount"))?;
    Ok(Json(json!({ "data": discount })))
}

async fn create_discount(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let discount = discount_doc(new_id(), input)?;
    if store.discounts.iter().any(|d| text(d, "code") == text(&discount, "code")) {
        return Err(ApiFailure::bad_request("Discount code already exists"));
    }
    store.discounts.push(discount.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": discount }))))
}

async fn update_discount(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let existing = find_mut(&mut store.discounts, &id).ok_or_else(|| ApiFailure::not_found("Discount"))?;
    let used = existing.get("usedCount").cloned().unwrap_or(json!(0));
    let mut updated = discount_doc(id, input)?;
    updated.insert("usedCount".into(), used);
    *existing = updated.clone();
    Ok(Json(json!({ "data": updated })))
}

async fn delete_discount(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    remove(&mut store.discounts, &id, "Discount")?;
    Ok(Json(json!({"message": "Discount deleted"})))
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

async fn list_orders(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let total = store.orders.len();
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(10);
    let (orders, pages) = paginate(store.orders.clone(), page, limit);
    Ok(Json(json!({"data": {
        "orders": orders, "total": total, "totalPages": pages, "currentPage": page, "limit": limit
    }})))
}

async fn get_order(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let order = find(&store.orders, &id).ok_or_else(|| ApiFailure::not_found("Order"))?;
    Ok(Json(json!({ "data": order })))
}

#[derive(Deserialize)]
pub struct StatusInput {
    pub status: String,
}

async fn update_order_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<StatusInput>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    if !ORDER_STATUSES.contains(&input.status.as_str()) {
        return Err(ApiFailure::bad_request(format!("Invalid status: {}", input.status)));
    }
    let order = find_mut(&mut store.orders, &id).ok_or_else(|| ApiFailure::not_found("Order"))?;
    order.insert("status".into(), Value::String(input.status));
    Ok(Json(json!({ "data": order })))
}

// ---------------------------------------------------------------------------
// Blogs
// ---------------------------------------------------------------------------

/// Blogs are stored with the backend's legacy field names.
fn blog_from_fields(blog: &mut Doc, fields: &Doc) {
    for (key, value) in fields {
        match key.as_str() {
            "title" => {
                blog.insert("blogName".into(), value.clone());
            }
            "content" => {
                blog.insert("blogContent".into(), json!({"markup": value, "design": {}}));
            }
            "featuredImage" => {
                blog.insert("blogImgUrl".into(), json!({"url": value, "publicId": ""}));
            }
            _ => {
                blog.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Blog fields from either a JSON body or a multipart form. Multipart forms
/// must carry the image under [`BLOG_IMAGE_FIELD`].
async fn read_blog_request(request: Request) -> ApiResult<Doc> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    if !is_multipart {
        let Json(body) = Json::<Value>::from_request(request, &())
            .await
            .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
        return Ok(doc(body));
    }

    let multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ApiFailure::bad_request(e.body_text()))?;
    let form = read_form(multipart).await?;
    if let Some((field, _)) = form.files.iter().find(|(name, _)| name != BLOG_IMAGE_FIELD) {
        return Err(ApiFailure::bad_request(format!("Unexpected field: {field}")));
    }

    let mut fields = Doc::new();
    let mut tags = Vec::new();
    for (name, value) in &form.texts {
        if name.starts_with("tags[") {
            tags.push(Value::String(value.clone()));
        } else {
            fields.insert(name.clone(), Value::String(value.clone()));
        }
    }
    if !tags.is_empty() {
        fields.insert("tags".into(), Value::Array(tags));
    }
    if let Some(image) = form.file_urls(BLOG_IMAGE_FIELD).pop() {
        fields.insert("featuredImage".into(), image);
    }
    Ok(fields)
}

async fn list_blogs(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    if store.blogs.is_empty() {
        return Err(ApiFailure(StatusCode::NOT_FOUND, "No blogs found".into()));
    }
    Ok(Json(json!(store.blogs)))
}

async fn get_blog(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let blog = find(&store.blogs, &id).ok_or_else(|| ApiFailure::not_found("Blog"))?;
    Ok(Json(Value::Object(blog.clone())))
}

async fn create_blog(State(db): State<Db>, headers: HeaderMap, request: Request) -> ApiResult<(StatusCode, Json<Value>)> {
    authorize(&headers, &*db.read().await)?;
    let fields = read_blog_request(request).await?;
    let mut blog = doc(json!({"_id": new_id(), "views": 0, "likes": 0}));
    blog_from_fields(&mut blog, &fields);
    if text(&blog, "blogName").is_empty() {
        return Err(ApiFailure::bad_request("Blog title is required"));
    }
    db.write().await.blogs.push(blog.clone());
    Ok((StatusCode::CREATED, Json(json!({ "data": blog }))))
}

async fn update_blog(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    request: Request,
) -> ApiResult<Json<Value>> {
    authorize(&headers, &*db.read().await)?;
    let fields = read_blog_request(request).await?;
    let mut store = db.write().await;
    let blog = find_mut(&mut store.blogs, &id).ok_or_else(|| ApiFailure::not_found("Blog"))?;
    blog_from_fields(blog, &fields);
    Ok(Json(json!({ "data": blog })))
}

async fn delete_blog(State(db): State<Db>, headers: HeaderMap, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    remove(&mut store.blogs, &id, "Blog")?;
    Ok(Json(json!({"message": "Blog deleted"})))
}

// ---------------------------------------------------------------------------
// Manufacturers
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub struct ManufacturerInput {
    pub code: String,
    pub address: String,
}

impl ManufacturerInput {
    fn validate(&self) -> ApiResult<()> {
        if self.code.trim().is_empty() || self.address.trim().is_empty() {
            return Err(ApiFailure::bad_request("Code and address are required"));
        }
        Ok(())
    }
}

async fn list_manufacturers(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    Ok(Json(json!({"data": {"response": store.manufacturers}})))
}

async fn get_manufacturer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let store = db.read().await;
    authorize(&headers, &store)?;
    let manufacturer = find(&store.manufacturers, &id).ok_or_else(|| ApiFailure::not_found("Manufacturer"))?;
    Ok(Json(json!({"data": {"response": manufacturer}})))
}

async fn create_manufacturer(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ManufacturerInput>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    input.validate()?;
    let manufacturer = doc(json!({"_id": new_id(), "code": input.code, "address": input.address}));
    store.manufacturers.push(manufacturer.clone());
    Ok((StatusCode::CREATED, Json(json!({"data": {"response": manufacturer}}))))
}

async fn update_manufacturer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ManufacturerInput>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    input.validate()?;
    let manufacturer =
        find_mut(&mut store.manufacturers, &id).ok_or_else(|| ApiFailure::not_found("Manufacturer"))?;
    manufacturer.insert("code".into(), Value::String(input.code));
    manufacturer.insert("address".into(), Value::String(input.address));
    Ok(Json(json!({"data": {"response": manufacturer}})))
}

async fn delete_manufacturer(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let mut store = db.write().await;
    authorize(&headers, &store)?;
    let removed = remove(&mut store.manufacturers, &id, "Manufacturer")?;
    Ok(Json(json!({"data": {"response": removed}})))
}
