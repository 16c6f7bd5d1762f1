//! Categories state container.
//!
//! # Design
//! The full list is small and unpaginated. Created categories are appended,
//! updates and server-side active toggles replace the entry in place, and
//! deletes drop it. `toggle_status_local` flips the flag without a request.

use super::{Collection, Record, SharedCollection};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::categories::{Category, CategoryDraft};

impl Record for Category {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct CategoryStore {
    client: ApiClient,
    categories: SharedCollection<Category>,
}

impl CategoryStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            categories: SharedCollection::new(),
        }
    }

    pub fn snapshot(&self) -> Collection<Category> {
        self.categories.snapshot()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.items()
    }

    pub fn fetch(&self) -> ApiResult<bool> {
        self.categories
            .fetch_with("fetchCategories", || Ok((self.client.categories().list()?, None)))
    }

    pub fn create(&self, draft: &CategoryDraft) -> ApiResult<Category> {
        self.categories.track(
            "createCategory",
            || self.client.categories().create(draft),
            |c, created| c.push(created.clone()),
        )
    }

    pub fn update(&self, id: &str, draft: &CategoryDraft) -> ApiResult<Category> {
        self.categories.track(
            "updateCategory",
            || self.client.categories().update(id, draft),
            |c, updated| {
                c.replace_by_id(updated.clone());
            },
        )
    }

    /// Flip a category's active flag on the server.
    pub fn toggle_active(&self, id: &str) -> ApiResult<Option<Category>> {
        let Some(category) = self.categories.read(|c| c.find(id).cloned()) else {
            return Ok(None);
        };
        self.categories
            .track(
                "updateCategory",
                || self.client.categories().toggle_active(&category),
                |c, updated| {
                    c.replace_by_id(updated.clone());
                },
            )
            .map(Some)
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.categories.track(
            "deleteCategory",
            || self.client.categories().remove(id),
            |c, _| {
                c.remove_by_id(id);
            },
        )
    }

    /// Flip the active flag locally without a request.
    pub fn toggle_status_local(&self, id: &str) {
        self.categories.update(|c| {
            if let Some(category) = c.find_mut(id) {
                category.is_active = !category.is_active;
            }
        });
    }

    pub fn clear_error(&self) {
        self.categories.update(Collection::clear_error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FileUpload;
    use crate::testing::scripted_client;
    use serde_json::json;

    fn seeded() -> (CategoryStore, std::sync::Arc<crate::testing::ScriptedTransport>) {
        let (client, transport, _) = scripted_client();
        transport.push_json(
            200,
            json!({"data": {"categories": [
                {"_id": "c1", "name": "Sweets", "isActive": true},
                {"_id": "c2", "name": "Namkeen", "isActive": false}
            ]}}),
        );
        let store = CategoryStore::new(client);
        store.fetch().unwrap();
        (store, transport)
    }

    #[test]
    fn create_appends_and_delete_removes() {
        let (store, transport) = seeded();
        transport.push_json(201, json!({"data": {"_id": "c3", "name": "Dry fruits"}}));
        transport.push_json(200, json!({"message": "deleted"}));

        let draft = CategoryDraft {
            name: "Dry fruits".into(),
            image: Some(FileUpload::new("d.png", "image/png", vec![0])),
            ..CategoryDraft::default()
        };
        store.create(&draft).unwrap();
        assert_eq!(store.categories().last().map(|c| c.id.as_str()), Some("c3"));

        store.remove("c1").unwrap();
        let ids: Vec<String> = store.categories().into_iter().map(|c| c.id).collect();
        assert_eq!(ids, vec!["c2", "c3"]);
    }

    #[test]
    fn toggle_active_replaces_record() {
        let (store, transport) = seeded();
        transport.push_json(200, json!({"data": {"_id": "c2", "name": "Namkeen", "isActive": true}}));
        let updated = store.toggle_active("c2").unwrap().unwrap();
        assert!(updated.is_active);
        assert!(store.categories()[1].is_active);
        assert_eq!(transport.last_request().unwrap().endpoint, "/category/c2");
    }

    #[test]
    fn toggle_unknown_id_sends_nothing() {
        let (store, transport) = seeded();
        assert!(store.toggle_active("nope").unwrap().is_none());
        assert_eq!(transport.request_count(), 1);
    }

    #[test]
    fn local_toggle_flips_flag() {
        let (store, _) = seeded();
        store.toggle_status_local("c1");
        assert!(!store.categories()[0].is_active);
    }

    #[test]
    fn validation_failure_lands_in_error_slot() {
        let (store, transport) = seeded();
        assert!(store.create(&CategoryDraft::default()).is_err());
        assert_eq!(
            store.snapshot().error().map(|e| e.message.as_str()),
            Some("Category name is required")
        );
        assert_eq!(transport.request_count(), 1);
    }
}
