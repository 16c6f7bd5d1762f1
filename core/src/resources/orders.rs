//! Customer orders. Read-mostly: the only mutation is a status change.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, resource_path, server_pagination, unwrap_data, with_query, Page, PageQuery};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::http::HttpMethod;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Failed,
    Returned,
    /// Any status this client does not know about.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// Statuses an admin can move an order to.
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Failed,
        OrderStatus::Returned,
    ];

    /// Orders in these states do not count towards revenue.
    pub fn is_void(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Failed | OrderStatus::Returned)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub product_image: Option<String>,
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub price_at_purchase: f64,
    #[serde(default)]
    pub item_total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub subtotal: Option<f64>,
    #[serde(default)]
    pub shipping_charge: Option<f64>,
    #[serde(default)]
    pub tax_amount: Option<f64>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub applied_coupon: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Order {
    /// Case-insensitive match on order number and customer name, plain
    /// substring match on phone.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.order_number.to_lowercase().contains(&needle)
            || self.shipping_address.name.to_lowercase().contains(&needle)
            || self
                .shipping_address
                .phone
                .as_deref()
                .is_some_and(|phone| phone.contains(term))
    }
}

#[derive(Debug, Serialize)]
struct StatusChange {
    status: OrderStatus,
}

pub struct OrdersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> OrdersApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, query: &PageQuery) -> ApiResult<Page<Order>> {
        let payload = self.client.get(&with_query("/order/all-orders", &query.pairs()))?;
        let data = unwrap_data(payload);
        let items = match data.get("orders") {
            Some(list) if !list.is_null() => decode(list.clone(), "orders")?,
            _ => Vec::new(),
        };
        Ok(Page {
            items,
            pagination: server_pagination(&data, query.limit.unwrap_or(DEFAULT_PAGE_SIZE)),
        })
    }

    pub fn get(&self, id: &str) -> ApiResult<Order> {
        let payload = self.client.get(&resource_path(&["order", "order", id]))?;
        decode(unwrap_data(payload), "order")
    }

    /// Returns the server's response payload; callers patch local state
    /// from the status they sent.
    pub fn update_status(&self, id: &str, status: OrderStatus) -> ApiResult<Value> {
        let payload = self.client.send_json(
            HttpMethod::Patch,
            &resource_path(&["order", id, "status"]),
            &StatusChange { status },
        )?;
        Ok(unwrap_data(payload))
    }
}
