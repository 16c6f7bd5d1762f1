//! Manufacturers state container with timed success and error banners.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::{Collection, Record, SharedCollection, Slot};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::manufacturers::{Manufacturer, ManufacturerDraft};

/// How long the success banner stays up.
pub const SUCCESS_TTL: Duration = Duration::from_secs(3);
/// How long the error banner stays up.
pub const ERROR_TTL: Duration = Duration::from_secs(5);

impl Record for Manufacturer {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Default)]
struct Flags {
    success_at: Option<Instant>,
    error_at: Option<Instant>,
}

/// Manufacturers plus transient success/error flags for the form banners.
///
/// The flags carry the instant they were raised; the view calls
/// [`ManufacturerStore::expire_flags`] on its own tick to clear them.
#[derive(Debug, Clone)]
pub struct ManufacturerStore {
    client: ApiClient,
    manufacturers: SharedCollection<Manufacturer>,
    current: Slot<Manufacturer>,
    flags: Arc<Mutex<Flags>>,
}

impl ManufacturerStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            manufacturers: SharedCollection::new(),
            current: Slot::default(),
            flags: Arc::new(Mutex::new(Flags::default())),
        }
    }

    pub fn snapshot(&self) -> Collection<Manufacturer> {
        self.manufacturers.snapshot()
    }

    pub fn manufacturers(&self) -> Vec<Manufacturer> {
        self.manufacturers.items()
    }

    pub fn current(&self) -> Option<Manufacturer> {
        self.current.get()
    }

    pub fn success(&self) -> bool {
        self.flags.lock().success_at.is_some()
    }

    pub fn fetch(&self) -> ApiResult<bool> {
        let result = self
            .manufacturers
            .fetch_with("fetchManufacturers", || Ok((self.client.manufacturers().list()?, None)));
        self.note_outcome(&result, false);
        result
    }

    pub fn fetch_by_id(&self, id: &str) -> ApiResult<Manufacturer> {
        let result = self
            .manufacturers
            .track("fetchManufacturerById", || self.client.manufacturers().get(id), |_, _| {});
        self.note_outcome(&result, false);
        let manufacturer = result?;
        self.current.set(Some(manufacturer.clone()));
        Ok(manufacturer)
    }

    pub fn create(&self, draft: &ManufacturerDraft) -> ApiResult<Manufacturer> {
        self.flags.lock().success_at = None;
        let result = self.manufacturers.track(
            "createManufacturer",
            || self.client.manufacturers().create(draft),
            |c, created| c.push(created.clone()),
        );
        self.note_outcome(&result, true);
        result
    }

    /// Replaces the list entry and makes it the current manufacturer.
    pub fn update(&self, id: &str, draft: &ManufacturerDraft) -> ApiResult<Manufacturer> {
        self.flags.lock().success_at = None;
        let result = self.manufacturers.track(
            "updateManufacturer",
            || self.client.manufacturers().update(id, draft),
            |c, updated| {
                c.replace_by_id(updated.clone());
            },
        );
        self.note_outcome(&result, true);
        let updated = result?;
        self.current.set(Some(updated.clone()));
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.flags.lock().success_at = None;
        let result = self.manufacturers.track(
            "deleteManufacturer",
            || self.client.manufacturers().remove(id),
            |c, _| {
                c.remove_by_id(id);
            },
        );
        self.note_outcome(&result, true);
        result
    }

    /// Case-insensitive search over code and address of loaded records.
    pub fn search(&self, term: &str) -> Vec<Manufacturer> {
        self.manufacturers.read(|c| {
            c.items()
                .iter()
                .filter(|m| term.is_empty() || m.matches_search(term))
                .cloned()
                .collect()
        })
    }

    /// Clear the success flag after [`SUCCESS_TTL`] and the error after
    /// [`ERROR_TTL`].
    pub fn expire_flags(&self, now: Instant) {
        let mut flags = self.flags.lock();
        if flags.success_at.is_some_and(|at| now.duration_since(at) >= SUCCESS_TTL) {
            flags.success_at = None;
        }
        if flags.error_at.is_some_and(|at| now.duration_since(at) >= ERROR_TTL) {
            flags.error_at = None;
            self.manufacturers.update(Collection::clear_error);
        }
    }

    pub fn clear_success(&self) {
        self.flags.lock().success_at = None;
    }

    pub fn clear_error(&self) {
        self.flags.lock().error_at = None;
        self.manufacturers.update(Collection::clear_error);
    }

    pub fn clear_current(&self) {
        self.current.set(None);
    }

    /// Stamp the success flag (mutations only) or the error flag.
    fn note_outcome<T>(&self, result: &ApiResult<T>, mutation: bool) {
        let now = Instant::now();
        let mut flags = self.flags.lock();
        match result {
            Ok(_) if mutation => flags.success_at = Some(now),
            Ok(_) => {}
            Err(_) => flags.error_at = Some(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted_client;
    use serde_json::json;

    fn seeded() -> (ManufacturerStore, std::sync::Arc<crate::testing::ScriptedTransport>) {
        let (client, transport, _) = scripted_client();
        transport.push_json(
            200,
            json!({"data": {"response": [
                {"_id": "m1", "code": "HLD", "address": "Bikaner"},
                {"_id": "m2", "code": "BKN", "address": "Delhi"}
            ]}}),
        );
        let store = ManufacturerStore::new(client);
        store.fetch().unwrap();
        (store, transport)
    }

    #[test]
    fn create_appends_and_raises_success() {
        let (store, transport) = seeded();
        transport.push_json(201, json!({"data": {"response": {"_id": "m3", "code": "AGR", "address": "Agra"}}}));
        store.create(&ManufacturerDraft::new("AGR", "Agra")).unwrap();
        assert_eq!(store.manufacturers().last().map(|m| m.id.as_str()), Some("m3"));
        assert!(store.success());
    }

    #[test]
    fn update_replaces_and_sets_current() {
        let (store, transport) = seeded();
        transport.push_json(200, json!({"data": {"response": {"_id": "m2", "code": "BKN", "address": "Noida"}}}));
        store.update("m2", &ManufacturerDraft::new("BKN", "Noida")).unwrap();
        assert_eq!(store.manufacturers()[1].address, "Noida");
        assert_eq!(store.current().map(|m| m.id), Some("m2".to_string()));
    }

    #[test]
    fn flags_expire_after_their_ttl() {
        let (store, transport) = seeded();
        transport.push_json(200, json!({"data": {"response": {}}}));
        store.remove("m1").unwrap();
        assert!(store.success());
        assert_eq!(store.manufacturers().len(), 1);

        let err = store.create(&ManufacturerDraft::new("", "x")).unwrap_err();
        assert!(err.to_string().contains("Code"));
        assert!(store.snapshot().error().is_some());

        let start = Instant::now();
        store.expire_flags(start + Duration::from_secs(1));
        assert!(store.snapshot().error().is_some());

        store.expire_flags(start + Duration::from_secs(6));
        assert!(store.snapshot().error().is_none());
    }

    #[test]
    fn success_clears_after_three_seconds() {
        let (store, transport) = seeded();
        transport.push_json(201, json!({"data": {"response": {"_id": "m3", "code": "AGR", "address": "Agra"}}}));
        store.create(&ManufacturerDraft::new("AGR", "Agra")).unwrap();
        let raised = Instant::now();
        store.expire_flags(raised);
        assert!(store.success());
        store.expire_flags(raised + Duration::from_secs(4));
        assert!(!store.success());
    }

    #[test]
    fn search_matches_code_and_address() {
        let (store, _) = seeded();
        assert_eq!(store.search("hld").len(), 1);
        assert_eq!(store.search("DELHI")[0].id, "m2");
        assert_eq!(store.search("").len(), 2);
    }
}
