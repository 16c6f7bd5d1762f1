//! Resource API modules: one per admin resource.
//!
//! Each module translates domain calls into `ApiClient` requests. Payload
//! shaping is done by explicit mapping functions from a typed input struct
//! to a typed wire struct, so the field tables live in one place per
//! resource. Errors from the client are propagated untouched.

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod discounts;
pub mod manufacturers;
pub mod orders;
pub mod products;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};

pub use auth::AuthApi;
pub use blogs::BlogsApi;
pub use categories::CategoriesApi;
pub use discounts::DiscountsApi;
pub use manufacturers::ManufacturersApi;
pub use orders::OrdersApi;
pub use products::ProductsApi;

/// Throwaway origin used only to borrow `url`'s segment encoder.
const SEGMENT_BASE: &str = "http://segments.invalid/";

/// Normalized pagination metadata held by state containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub pages: u32,
    pub total: u64,
    pub limit: u32,
}

/// One page of a listed collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

/// `page`/`limit` query shared by the paginated list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub(crate) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi::new(self)
    }

    pub fn products(&self) -> ProductsApi<'_> {
        ProductsApi::new(self)
    }

    pub fn categories(&self) -> CategoriesApi<'_> {
        CategoriesApi::new(self)
    }

    pub fn discounts(&self) -> DiscountsApi<'_> {
        DiscountsApi::new(self)
    }

    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi::new(self)
    }

    pub fn blogs(&self) -> BlogsApi<'_> {
        BlogsApi::new(self)
    }

    pub fn manufacturers(&self) -> ManufacturersApi<'_> {
        ManufacturersApi::new(self)
    }
}

/// Join literal path parts and caller-supplied ids into an endpoint. Each
/// part is percent-encoded as one path segment.
pub(crate) fn resource_path(segments: &[&str]) -> String {
    Url::parse(SEGMENT_BASE)
        .ok()
        .and_then(|mut url| {
            url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
            Some(url.path().to_string())
        })
        .unwrap_or_else(|| format!("/{}", segments.join("/")))
}

/// Append a query string built from non-empty pairs.
pub(crate) fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    format!("{path}?{}", serializer.finish())
}

/// The `data` member of an envelope, or the payload itself when absent.
pub(crate) fn unwrap_data(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

/// Pagination in the `{total, totalPages, currentPage, limit}` shape used by
/// the discount and order listings.
pub(crate) fn server_pagination(data: &Value, default_limit: u32) -> Pagination {
    let number = |key: &str| data.get(key).and_then(Value::as_u64).filter(|n| *n > 0);
    Pagination {
        page: number("currentPage").unwrap_or(1) as u32,
        pages: number("totalPages").unwrap_or(1) as u32,
        total: number("total").unwrap_or(0),
        limit: number("limit").map_or(default_limit, |l| l as u32),
    }
}

pub(crate) fn decode<T: DeserializeOwned>(value: Value, what: &str) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| ApiError::Deserialization(format!("{what}: {e}")))
}

/// JSON-encode a list into a single form field value.
pub(crate) fn json_field<T: Serialize>(value: &T) -> ApiResult<String> {
    serde_json::to_string(value).map_err(|e| ApiError::Serialization(e.to_string()))
}

pub(crate) fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
