//! Discount coupons.
//!
//! The admin UI and the backend name discount fields differently. Translation
//! is explicit in both directions: [`DiscountPayload::from_draft`] builds the
//! request body and [`Discount::from`] converts a [`DiscountRecord`] into the
//! view held by the discounts store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, non_blank, resource_path, server_pagination, unwrap_data, with_query, Page, PageQuery};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Every discount created from the admin UI is a coupon.
const COUPON: &str = "coupon";
/// Selecting this category applies the discount everywhere.
const ALL_CATEGORIES: &str = "all";

/// Kind of discount. Types the admin UI cannot edit are carried through
/// verbatim so they survive a list and a resave.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountStatus {
    Active,
    Inactive,
}

impl DiscountStatus {
    pub fn toggled(self) -> Self {
        match self {
            DiscountStatus::Active => DiscountStatus::Inactive,
            DiscountStatus::Inactive => DiscountStatus::Active,
        }
    }
}

/// Discount as the backend stores it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub min_purchase: f64,
    #[serde(default)]
    pub max_discount: Option<f64>,
    #[serde(default)]
    pub valid_from: String,
    #[serde(default)]
    pub valid_until: String,
    #[serde(default)]
    pub usage_limit: Option<u64>,
    #[serde(default)]
    pub used_count: u64,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub applicable_categories: Vec<String>,
    #[serde(default)]
    pub excluded_products: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Discount as the admin UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub id: String,
    pub code: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: DiscountType,
    pub value: f64,
    pub min_order_amount: f64,
    pub max_discount: Option<f64>,
    pub valid_from: String,
    pub valid_to: String,
    pub usage_limit: Option<u64>,
    pub usage_count: u64,
    pub status: DiscountStatus,
    pub applicable_categories: Vec<String>,
    pub excluded_products: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<DiscountRecord> for Discount {
    fn from(record: DiscountRecord) -> Self {
        let title = record
            .title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| format!("{} Discount", record.code));
        Self {
            id: record.id,
            code: record.code,
            title,
            description: record.description.unwrap_or_default(),
            kind: record.discount_type,
            value: record.value,
            min_order_amount: record.min_purchase,
            max_discount: record.max_discount.filter(|v| *v != 0.0),
            valid_from: record.valid_from,
            valid_to: record.valid_until,
            usage_limit: record.usage_limit,
            usage_count: record.used_count,
            status: if record.is_active {
                DiscountStatus::Active
            } else {
                DiscountStatus::Inactive
            },
            applicable_categories: record.applicable_categories,
            excluded_products: record.excluded_products,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Form input for creating or editing a discount.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountDraft {
    pub code: String,
    pub title: String,
    pub kind: DiscountType,
    pub value: f64,
    pub min_order_amount: f64,
    pub max_discount: Option<f64>,
    pub valid_from: String,
    pub valid_to: String,
    pub usage_limit: Option<u64>,
    pub applicable_categories: Vec<String>,
    pub status: DiscountStatus,
}

/// Request body for `POST /discount` and `PUT /discount/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountPayload {
    pub code: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub discount_type: DiscountType,
    pub value: f64,
    pub min_purchase: f64,
    pub max_discount: Option<f64>,
    pub valid_from: String,
    pub valid_until: String,
    pub usage_limit: Option<u64>,
    pub applicable_categories: Vec<String>,
    pub excluded_products: Vec<String>,
    pub is_active: bool,
}

impl DiscountPayload {
    pub fn from_draft(draft: &DiscountDraft) -> ApiResult<Self> {
        let code = non_blank(&draft.code)
            .or_else(|| non_blank(&draft.title))
            .ok_or_else(|| ApiError::validation("code", "Discount code is required"))?;
        let applicable_categories = if draft.applicable_categories.iter().any(|c| c == ALL_CATEGORIES) {
            Vec::new()
        } else {
            draft.applicable_categories.clone()
        };

        Ok(Self {
            code: code.to_string(),
            kind: COUPON,
            discount_type: draft.kind.clone(),
            value: draft.value,
            min_purchase: draft.min_order_amount,
            max_discount: draft.max_discount.filter(|v| *v != 0.0),
            valid_from: draft.valid_from.clone(),
            valid_until: draft.valid_to.clone(),
            usage_limit: draft.usage_limit,
            applicable_categories,
            excluded_products: Vec::new(),
            is_active: draft.status == DiscountStatus::Active,
        })
    }
}

pub struct DiscountsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DiscountsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, query: &PageQuery) -> ApiResult<Page<Discount>> {
        let payload = self.client.get(&with_query("/discount/all", &query.pairs()))?;
        let data = unwrap_data(payload);
        let records: Vec<DiscountRecord> = match data.get("discounts") {
            Some(list) if !list.is_null() => decode(list.clone(), "discounts")?,
            _ => Vec::new(),
        };
        Ok(Page {
            items: records.into_iter().map(Discount::from).collect(),
            pagination: server_pagination(&data, query.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        })
    }

    pub fn expired(&self) -> ApiResult<Vec<Discount>> {
        let payload = self.client.get("/discount/expired")?;
        let records: Vec<DiscountRecord> = match unwrap_data(payload) {
            Value::Null => Vec::new(),
            list => decode(list, "expired discounts")?,
        };
        Ok(records.into_iter().map(Discount::from).collect())
    }

    pub fn get(&self, id: &str) -> ApiResult<Discount> {
        let payload = self.client.get(&resource_path(&["discount", id]))?;
        decode::<DiscountRecord>(unwrap_data(payload), "discount").map(Discount::from)
    }

    pub fn create(&self, draft: &DiscountDraft) -> ApiResult<Discount> {
        let body = DiscountPayload::from_draft(draft)?;
        let payload = self.client.send_json(HttpMethod::Post, "/discount", &body)?;
        decode::<DiscountRecord>(unwrap_data(payload), "created discount").map(Discount::from)
    }

    pub fn update(&self, id: &str, draft: &DiscountDraft) -> ApiResult<Discount> {
        let body = DiscountPayload::from_draft(draft)?;
        let payload = self
            .client
            .send_json(HttpMethod::Put, &resource_path(&["discount", id]), &body)?;
        decode::<DiscountRecord>(unwrap_data(payload), "updated discount").map(Discount::from)
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&resource_path(&["discount", id]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestBody;
    use crate::testing::scripted_client;
    use serde_json::json;

    fn draft() -> DiscountDraft {
        DiscountDraft {
            code: "DIWALI20".into(),
            title: "Diwali".into(),
            kind: DiscountType::Percentage,
            value: 20.0,
            min_order_amount: 500.0,
            max_discount: None,
            valid_from: "2024-10-01".into(),
            valid_to: "2024-11-01".into(),
            usage_limit: Some(100),
            applicable_categories: vec!["all".into(), "c1".into()],
            status: DiscountStatus::Active,
        }
    }

    fn record_json() -> Value {
        json!({
            "_id": "d1", "code": "DIWALI20", "discountType": "percentage", "value": 20.0,
            "minPurchase": 500.0, "validFrom": "2024-10-01", "validUntil": "2024-11-01",
            "usageLimit": 100, "usedCount": 7, "isActive": true
        })
    }

    #[test]
    fn draft_translates_to_backend_names() {
        let body = serde_json::to_value(DiscountPayload::from_draft(&draft()).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "code": "DIWALI20", "type": "coupon", "discountType": "percentage", "value": 20.0,
                "minPurchase": 500.0, "maxDiscount": null, "validFrom": "2024-10-01",
                "validUntil": "2024-11-01", "usageLimit": 100, "applicableCategories": [],
                "excludedProducts": [], "isActive": true
            })
        );
    }

    #[test]
    fn blank_code_falls_back_to_title() {
        let mut d = draft();
        d.code = "  ".into();
        assert_eq!(DiscountPayload::from_draft(&d).unwrap().code, "Diwali");
        d.title = String::new();
        let err = DiscountPayload::from_draft(&d).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "code", .. }));
    }

    #[test]
    fn record_translates_to_view() {
        let record: DiscountRecord = serde_json::from_value(record_json()).unwrap();
        let view = Discount::from(record);
        assert_eq!(view.id, "d1");
        assert_eq!(view.title, "DIWALI20 Discount");
        assert_eq!(view.kind, DiscountType::Percentage);
        assert_eq!(view.min_order_amount, 500.0);
        assert_eq!(view.valid_to, "2024-11-01");
        assert_eq!(view.usage_count, 7);
        assert_eq!(view.status, DiscountStatus::Active);
        assert!(view.applicable_categories.is_empty());
    }

    #[test]
    fn unrecognised_type_passes_through_untouched() {
        let (client, transport, _) = scripted_client();
        let mut bogo = record_json();
        bogo["_id"] = json!("d2");
        bogo["discountType"] = json!("bogo");
        transport.push_json(200, json!({"discounts": [record_json(), bogo]}));

        let page = client.discounts().list(&PageQuery::new(1, 10)).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].kind, DiscountType::Other("bogo".into()));

        let mut resave = draft();
        resave.kind = page.items[1].kind.clone();
        let body = serde_json::to_value(DiscountPayload::from_draft(&resave).unwrap()).unwrap();
        assert_eq!(body["discountType"], "bogo");
    }

    #[test]
    fn list_reads_server_pagination() {
        let (client, transport, _) = scripted_client();
        transport.push_json(
            200,
            json!({"data": {"discounts": [record_json()], "total": 11, "totalPages": 2, "currentPage": 2, "limit": 10}}),
        );
        let page = client.discounts().list(&PageQuery::new(2, 10)).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.pagination.page, 2);
        assert_eq!(page.pagination.pages, 2);
        assert_eq!(page.pagination.total, 11);
        assert_eq!(transport.last_request().unwrap().endpoint, "/discount/all?page=2&limit=10");
    }

    #[test]
    fn create_posts_translated_json() {
        let (client, transport, _) = scripted_client();
        transport.push_json(201, json!({"data": record_json()}));
        let created = client.discounts().create(&draft()).unwrap();
        assert_eq!(created.code, "DIWALI20");

        let req = transport.last_request().unwrap();
        assert_eq!(req.endpoint, "/discount");
        assert_eq!(req.header("content-type"), Some("application/json"));
        let Some(RequestBody::Json(body)) = req.body else {
            panic!("expected JSON body");
        };
        let sent: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sent["type"], "coupon");
        assert_eq!(sent["validUntil"], "2024-11-01");
    }

    #[test]
    fn expired_and_delete_paths() {
        let (client, transport, _) = scripted_client();
        transport.push_json(200, json!({"data": [record_json()]}));
        transport.push_json(200, json!({"message": "Discount deleted"}));
        assert_eq!(client.discounts().expired().unwrap().len(), 1);
        client.discounts().remove("d1").unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].endpoint, "/discount/expired");
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert_eq!(requests[1].endpoint, "/discount/d1");
    }
}
