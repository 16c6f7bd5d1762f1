//! Products state container.
//!
//! # Design
//! Mutations do not splice the list. The backend owns ordering and
//! pagination for products, so create, update and delete each refetch with
//! the last list query. A failed refetch lands in the error slot without
//! failing the mutation that preceded it.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::warn;

use super::{Collection, Record, SharedCollection, Slot};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::products::{Product, ProductDraft, ProductQuery, ProductUpdate, DEFAULT_PAGE_SIZE};

impl Record for Product {
    fn record_id(&self) -> &str {
        &self.id
    }
}

/// Products list, the product open in the detail view and the query that
/// produced the list.
///
/// Every mutation is followed by a refetch with the last list query, so
/// between the two calls the list may reflect neither the old nor the new
/// state.
#[derive(Debug, Clone)]
pub struct ProductStore {
    client: ApiClient,
    products: SharedCollection<Product>,
    current: Slot<Product>,
    last_query: Arc<RwLock<ProductQuery>>,
}

impl ProductStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            products: SharedCollection::new(),
            current: Slot::default(),
            last_query: Arc::new(RwLock::new(ProductQuery::page(1, DEFAULT_PAGE_SIZE))),
        }
    }

    pub fn snapshot(&self) -> Collection<Product> {
        self.products.snapshot()
    }

    pub fn products(&self) -> Vec<Product> {
        self.products.items()
    }

    pub fn current_product(&self) -> Option<Product> {
        self.current.get()
    }

    pub fn last_query(&self) -> ProductQuery {
        self.last_query.read().clone()
    }

    pub fn fetch(&self, query: ProductQuery) -> ApiResult<bool> {
        *self.last_query.write() = query.clone();
        self.products.fetch_with("fetchProducts", || {
            let page = self.client.products().list(&query)?;
            Ok((page.items, Some(page.pagination)))
        })
    }

    pub fn fetch_by_category(&self, category_id: &str, query: ProductQuery) -> ApiResult<bool> {
        self.products.fetch_with("fetchProductsByCategory", || {
            let page = self.client.products().list_by_category(category_id, &query)?;
            Ok((page.items, Some(page.pagination)))
        })
    }

    pub fn fetch_by_id(&self, id: &str) -> ApiResult<Product> {
        let product = self
            .products
            .track("fetchProductById", || self.client.products().get(id), |_, _| {})?;
        self.current.set(Some(product.clone()));
        Ok(product)
    }

    pub fn create(&self, draft: &ProductDraft) -> ApiResult<Product> {
        let created = self
            .products
            .track("createProduct", || self.client.products().create(draft), |_, _| {})?;
        self.refetch();
        Ok(created)
    }

    pub fn update(&self, id: &str, update: &ProductUpdate) -> ApiResult<Product> {
        let updated = self
            .products
            .track("updateProduct", || self.client.products().update(id, update), |_, _| {})?;
        if self.current.get().is_some_and(|current| current.id == updated.id) {
            self.current.set(Some(updated.clone()));
        }
        self.refetch();
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.products
            .track("deleteProduct", || self.client.products().remove(id), |_, _| {})?;
        if self.current.get().is_some_and(|current| current.id == id) {
            self.current.set(None);
        }
        self.refetch();
        Ok(())
    }

    /// Patch the page number locally without fetching.
    pub fn set_page(&self, page: u32) {
        self.products.update(|c| c.set_page(page));
    }

    pub fn clear_error(&self) {
        self.products.update(Collection::clear_error);
    }

    pub fn clear_current(&self) {
        self.current.set(None);
    }

    /// A failed refetch is recorded in the error slot; the mutation itself
    /// already succeeded.
    fn refetch(&self) {
        if let Err(err) = self.fetch(self.last_query()) {
            warn!(error = %err, "Refetch after product mutation failed");
        }
    }
}
