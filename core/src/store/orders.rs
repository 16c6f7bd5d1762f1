//! Orders state container.
//!
//! # Design
//! Orders are never created or deleted from the admin. The only mutation is
//! a status change, which patches the list entry and the selected order
//! with the status that was sent. Search and dashboard counters are derived
//! from the loaded page and never hit the server.

use serde::Serialize;

use super::{Collection, Record, SharedCollection, Slot};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::orders::{Order, OrderStatus};
use crate::resources::PageQuery;

impl Record for Order {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Dashboard counters over the currently loaded page of orders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub pending: usize,
    /// Processing or shipped.
    pub in_progress: usize,
    pub delivered: usize,
    /// Sum of order totals, excluding cancelled, failed and returned orders.
    pub revenue: f64,
}

impl OrderStats {
    pub fn from_orders(orders: &[Order]) -> Self {
        let count = |pred: fn(OrderStatus) -> bool| orders.iter().filter(|o| pred(o.status)).count();
        Self {
            total: orders.len(),
            pending: count(|s| s == OrderStatus::Pending),
            in_progress: count(|s| matches!(s, OrderStatus::Processing | OrderStatus::Shipped)),
            delivered: count(|s| s == OrderStatus::Delivered),
            revenue: orders.iter().filter(|o| !o.status.is_void()).map(|o| o.total).sum(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderStore {
    client: ApiClient,
    orders: SharedCollection<Order>,
    selected: Slot<Order>,
}

impl OrderStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            orders: SharedCollection::new(),
            selected: Slot::default(),
        }
    }

    pub fn snapshot(&self) -> Collection<Order> {
        self.orders.snapshot()
    }

    pub fn orders(&self) -> Vec<Order> {
        self.orders.items()
    }

    pub fn selected_order(&self) -> Option<Order> {
        self.selected.get()
    }

    pub fn fetch(&self, query: PageQuery) -> ApiResult<bool> {
        self.orders.fetch_with("fetchOrders", || {
            let page = self.client.orders().list(&query)?;
            Ok((page.items, Some(page.pagination)))
        })
    }

    pub fn fetch_by_id(&self, id: &str) -> ApiResult<Order> {
        let order = self
            .orders
            .track("fetchOrderById", || self.client.orders().get(id), |_, _| {})?;
        self.selected.set(Some(order.clone()));
        Ok(order)
    }

    /// Send a status change and patch both the list entry and the selected
    /// order with the status that was sent.
    pub fn update_status(&self, id: &str, status: OrderStatus) -> ApiResult<()> {
        self.orders.track(
            "updateOrderStatus",
            || self.client.orders().update_status(id, status),
            |c, _| {
                if let Some(order) = c.find_mut(id) {
                    order.status = status;
                }
            },
        )?;
        self.selected.update(|order| {
            if order.id == id {
                order.status = status;
            }
        });
        Ok(())
    }

    pub fn clear_selected(&self) {
        self.selected.set(None);
    }

    pub fn set_page(&self, page: u32) {
        self.orders.update(|c| c.set_page(page));
    }

    pub fn clear_error(&self) {
        self.orders.update(Collection::clear_error);
    }

    /// Loaded orders matching a search term and an optional status.
    pub fn filtered(&self, search: &str, status: Option<OrderStatus>) -> Vec<Order> {
        self.orders.read(|c| {
            c.items()
                .iter()
                .filter(|o| search.is_empty() || o.matches_search(search))
                .filter(|o| status.map_or(true, |s| o.status == s))
                .cloned()
                .collect()
        })
    }

    pub fn stats(&self) -> OrderStats {
        self.orders.read(|c| OrderStats::from_orders(c.items()))
    }
}
