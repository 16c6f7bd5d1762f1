//! State containers: one per resource, plus the auth store.
//!
//! # Overview
//! Each store owns the records fetched for its resource along with a phase,
//! an error slot, pagination and the status of the last action. Stores are
//! cheap to clone and share their state; every operation follows the same
//! shape: mark pending, release the lock, call the resource module, re-lock
//! and record the outcome.
//!
//! # Design
//! Overlapping fetches of the same collection are fenced by a monotonically
//! increasing generation. `begin_fetch` hands out a [`FetchTicket`]; a
//! completion whose ticket is older than the latest started fetch is dropped
//! and leaves the state untouched, so a slow stale response can never
//! overwrite a fresher one. Locks are never held across a network call.

pub mod auth;
pub mod blogs;
pub mod categories;
pub mod discounts;
pub mod manufacturers;
pub mod orders;
pub mod products;

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult, StoreError};
use crate::resources::Pagination;

pub use auth::AuthStore;
pub use blogs::BlogStore;
pub use categories::CategoryStore;
pub use discounts::DiscountStore;
pub use manufacturers::ManufacturerStore;
pub use orders::OrderStore;
pub use products::ProductStore;

/// A record with a server-assigned identifier.
pub trait Record {
    fn record_id(&self) -> &str;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    #[default]
    Idle,
    Loading,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionPhase {
    Pending,
    Fulfilled,
    Rejected,
}

/// Name and outcome of the most recent action on a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionStatus {
    pub action: &'static str,
    pub phase: ActionPhase,
}

/// Proof that a fetch was started; carries its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    action: &'static str,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn action(&self) -> &'static str {
        self.action
    }
}

/// Items and optional pagination produced by a list call.
pub type Loaded<T> = (Vec<T>, Option<Pagination>);

#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
    pagination: Option<Pagination>,
    phase: Phase,
    error: Option<StoreError>,
    last_action: Option<ActionStatus>,
    generation: u64,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
            phase: Phase::Idle,
            error: None,
            last_action: None,
            generation: 0,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn error(&self) -> Option<&StoreError> {
        self.error.as_ref()
    }

    pub fn last_action(&self) -> Option<ActionStatus> {
        self.last_action
    }

    pub fn find(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.record_id() == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.record_id() == id)
    }

    /// Start a fetch; supersedes any fetch already in flight.
    pub fn begin_fetch(&mut self, action: &'static str) -> FetchTicket {
        self.generation += 1;
        self.begin(action);
        FetchTicket {
            generation: self.generation,
            action,
        }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Record a fetch outcome. Returns `Ok(false)` when the ticket is stale
    /// and the result was discarded. Errors are returned either way, but
    /// only a current fetch records them.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, result: ApiResult<Loaded<T>>) -> ApiResult<bool> {
        let action = ticket.action;
        if !self.is_current(ticket) {
            warn!(
                action,
                stale = ticket.generation,
                current = self.generation,
                "Discarding stale fetch result"
            );
            return result.map(|_| false);
        }
        match result {
            Ok((items, pagination)) => {
                debug!(action, count = items.len(), "Fetch applied");
                self.items = items;
                if pagination.is_some() {
                    self.pagination = pagination;
                }
                self.succeed(action);
                Ok(true)
            }
            Err(err) => {
                self.fail(action, &err);
                Err(err)
            }
        }
    }

    /// Mark a non-fetch action as pending.
    pub fn begin(&mut self, action: &'static str) {
        self.phase = Phase::Loading;
        self.error = None;
        self.last_action = Some(ActionStatus {
            action,
            phase: ActionPhase::Pending,
        });
    }

    pub fn succeed(&mut self, action: &'static str) {
        self.phase = Phase::Succeeded;
        self.error = None;
        self.last_action = Some(ActionStatus {
            action,
            phase: ActionPhase::Fulfilled,
        });
    }

    /// Record a failure. Items are left as they were.
    pub fn fail(&mut self, action: &'static str, err: &ApiError) {
        self.phase = Phase::Failed;
        self.error = Some(StoreError::from(err));
        self.last_action = Some(ActionStatus {
            action,
            phase: ActionPhase::Rejected,
        });
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn set_page(&mut self, page: u32) {
        if let Some(pagination) = self.pagination.as_mut() {
            pagination.page = page;
        }
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    pub fn insert_front(&mut self, item: T) {
        self.items.insert(0, item);
    }

    /// Replace the item with the same id in place. Returns whether one matched.
    pub fn replace_by_id(&mut self, item: T) -> bool {
        match self.items.iter().position(|existing| existing.record_id() == item.record_id()) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => false,
        }
    }

    /// Remove the one item with `id`, keeping the order of the rest.
    pub fn remove_by_id(&mut self, id: &str) -> bool {
        match self.items.iter().position(|item| item.record_id() == id) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

/// A collection shared between clones of a store.
#[derive(Debug)]
pub struct SharedCollection<T> {
    inner: Arc<RwLock<Collection<T>>>,
}

impl<T> Clone for SharedCollection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for SharedCollection<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collection::default())),
        }
    }
}

impl<T: Record + Clone> SharedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> Collection<T> {
        self.inner.read().clone()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Collection<T>) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Collection<T>) -> R) -> R {
        f(&mut self.inner.write())
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.read().items.clone()
    }

    pub fn begin_fetch(&self, action: &'static str) -> FetchTicket {
        self.inner.write().begin_fetch(action)
    }

    pub fn complete_fetch(&self, ticket: FetchTicket, result: ApiResult<Loaded<T>>) -> ApiResult<bool> {
        self.inner.write().complete_fetch(ticket, result)
    }

    /// Run a fenced fetch. The lock is released while `load` runs.
    pub fn fetch_with(&self, action: &'static str, load: impl FnOnce() -> ApiResult<Loaded<T>>) -> ApiResult<bool> {
        let ticket = self.begin_fetch(action);
        let result = load();
        self.complete_fetch(ticket, result)
    }

    /// Run a mutation and apply its result to the collection on success.
    pub fn track<R>(
        &self,
        action: &'static str,
        op: impl FnOnce() -> ApiResult<R>,
        apply: impl FnOnce(&mut Collection<T>, &R),
    ) -> ApiResult<R> {
        self.inner.write().begin(action);
        let result = op();
        let mut state = self.inner.write();
        match &result {
            Ok(value) => {
                apply(&mut state, value);
                state.succeed(action);
            }
            Err(err) => state.fail(action, err),
        }
        result
    }
}

/// An optional record shared between clones of a store (current or selected
/// item of a detail view).
#[derive(Debug)]
pub struct Slot<T> {
    inner: Arc<RwLock<Option<T>>>,
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }
}

impl<T: Clone> Slot<T> {
    pub fn get(&self) -> Option<T> {
        self.inner.read().clone()
    }

    pub fn set(&self, value: Option<T>) {
        *self.inner.write() = value;
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        if let Some(value) = self.inner.write().as_mut() {
            f(value);
        }
    }
}
