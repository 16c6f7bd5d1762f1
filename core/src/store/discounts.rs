//! Discounts state container: the paginated active list plus the expired
//! list, fetched separately.
//!
//! # Design
//! New discounts are prepended so they show first on the current page.
//! Status and usage changes made by the view are local and never sent.

use super::{Collection, Record, SharedCollection};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::discounts::{Discount, DiscountDraft};
use crate::resources::PageQuery;

impl Record for Discount {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Active discounts (paginated) and the separate expired list.
#[derive(Debug, Clone)]
pub struct DiscountStore {
    client: ApiClient,
    discounts: SharedCollection<Discount>,
    expired: SharedCollection<Discount>,
}

impl DiscountStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            discounts: SharedCollection::new(),
            expired: SharedCollection::new(),
        }
    }

    pub fn snapshot(&self) -> Collection<Discount> {
        self.discounts.snapshot()
    }

    pub fn discounts(&self) -> Vec<Discount> {
        self.discounts.items()
    }

    pub fn expired(&self) -> Vec<Discount> {
        self.expired.items()
    }

    pub fn fetch(&self, query: PageQuery) -> ApiResult<bool> {
        self.discounts.fetch_with("fetchDiscounts", || {
            let page = self.client.discounts().list(&query)?;
            Ok((page.items, Some(page.pagination)))
        })
    }

    pub fn fetch_expired(&self) -> ApiResult<bool> {
        self.expired
            .fetch_with("fetchExpiredDiscounts", || Ok((self.client.discounts().expired()?, None)))
    }

    /// New discounts go to the top of the list.
    pub fn create(&self, draft: &DiscountDraft) -> ApiResult<Discount> {
        self.discounts.track(
            "createDiscount",
            || self.client.discounts().create(draft),
            |c, created| c.insert_front(created.clone()),
        )
    }

    pub fn update(&self, id: &str, draft: &DiscountDraft) -> ApiResult<Discount> {
        self.discounts.track(
            "updateDiscount",
            || self.client.discounts().update(id, draft),
            |c, updated| {
                c.replace_by_id(updated.clone());
            },
        )
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.discounts.track(
            "deleteDiscount",
            || self.client.discounts().remove(id),
            |c, _| {
                c.remove_by_id(id);
            },
        )
    }

    /// Optimistic status flip; nothing is sent.
    pub fn toggle_status_local(&self, id: &str) {
        self.discounts.update(|c| {
            if let Some(discount) = c.find_mut(id) {
                discount.status = discount.status.toggled();
            }
        });
    }

    /// Optimistic usage bump; nothing is sent.
    pub fn increment_usage_local(&self, id: &str) {
        self.discounts.update(|c| {
            if let Some(discount) = c.find_mut(id) {
                discount.usage_count += 1;
            }
        });
    }

    pub fn clear_error(&self) {
        self.discounts.update(Collection::clear_error);
        self.expired.update(Collection::clear_error);
    }
}
