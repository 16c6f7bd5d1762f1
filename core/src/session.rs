//! Session context: the one piece of state shared by every API call.
//!
//! # Design
//! The token lives in a `SessionContext` handle injected into `ApiClient`
//! rather than in ambient storage. The durable copy goes through a
//! `TokenStore`. Eviction on 401 is compare-and-clear: only the request that
//! still holds the current token evicts it, so concurrent 401s notify
//! observers once.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Well-known key the token is persisted under.
pub const TOKEN_STORAGE_KEY: &str = "adminToken";

/// Durable storage for the session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ApiResult<Option<String>>;
    fn save(&self, token: &str) -> ApiResult<()>;
    fn remove(&self) -> ApiResult<()>;
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ApiResult<Option<String>> {
        Ok(self.token.lock().clone())
    }

    fn save(&self, token: &str) -> ApiResult<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> ApiResult<()> {
        *self.token.lock() = None;
        Ok(())
    }
}

/// JSON file holding `{ "adminToken": "<token>" }`.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> ApiResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| ApiError::Storage(e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(ApiError::Storage(e.to_string())),
        }
    }

    fn write_entries(&self, entries: &HashMap<String, String>) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| ApiError::Storage(e.to_string()))?;
            }
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| ApiError::Storage(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| ApiError::Storage(e.to_string()))
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ApiResult<Option<String>> {
        Ok(self
            .read_entries()?
            .remove(TOKEN_STORAGE_KEY)
            .filter(|token| !token.is_empty()))
    }

    fn save(&self, token: &str) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        entries.insert(TOKEN_STORAGE_KEY.to_string(), token.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self) -> ApiResult<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(TOKEN_STORAGE_KEY).is_some() {
            self.write_entries(&entries)?;
        }
        Ok(())
    }
}

/// Notified after the session token has been evicted by a 401.
pub trait SessionObserver: Send + Sync {
    fn session_expired(&self, endpoint: &str);
}

struct SessionInner {
    token: RwLock<Option<String>>,
    store: Arc<dyn TokenStore>,
    observers: RwLock<Vec<Arc<dyn SessionObserver>>>,
}

/// Cloneable handle to the current session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("authenticated", &self.is_authenticated())
            .finish()
    }
}

impl SessionContext {
    /// Empty session backed by `store`; nothing is read from it.
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: RwLock::new(None),
                store,
                observers: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Session seeded from whatever token `store` holds.
    pub fn restore(store: Arc<dyn TokenStore>) -> ApiResult<Self> {
        let token = store.load()?;
        debug!(has_token = token.is_some(), "Restored session from token store");
        let session = Self::new(store);
        *session.inner.token.write() = token;
        Ok(session)
    }

    /// In-memory session, mostly for tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    pub fn token(&self) -> Option<String> {
        self.inner.token.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.token.read().is_some()
    }

    /// Persist and adopt a token after a successful login.
    ///
    /// The write guard is held across the store call so memory and disk
    /// change together with respect to `clear` and `evict_if_current`.
    pub fn set_token(&self, token: &str) -> ApiResult<()> {
        let mut current = self.inner.token.write();
        self.inner.store.save(token)?;
        *current = Some(token.to_string());
        Ok(())
    }

    /// Drop the token (logout). Persistence failures are logged, the
    /// in-memory token is cleared regardless.
    pub fn clear(&self) {
        let mut current = self.inner.token.write();
        current.take();
        if let Err(e) = self.inner.store.remove() {
            warn!(error = %e, "Failed to remove persisted token");
        }
    }

    /// Evict `token` if it is still the current one. Returns `true` for the
    /// single caller that performed the eviction; observers are notified only
    /// in that case.
    pub fn evict_if_current(&self, token: &str, endpoint: &str) -> bool {
        {
            let mut current = self.inner.token.write();
            if current.as_deref() != Some(token) {
                return false;
            }
            current.take();
            if let Err(e) = self.inner.store.remove() {
                warn!(error = %e, "Failed to remove persisted token during eviction");
            }
        }
        warn!(endpoint = %endpoint, "Session token rejected; evicted");

        let observers = self.inner.observers.read().clone();
        for observer in observers {
            observer.session_expired(endpoint);
        }
        true
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        self.inner.observers.write().push(observer);
    }
}
