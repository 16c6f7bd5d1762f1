//! Session state: the token lives in `SessionContext`, the profile here.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use super::Phase;
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult, StoreError};
use crate::resources::auth::{Credentials, Profile, ProfileUpdate};

#[derive(Debug, Default)]
struct AuthState {
    user: Option<Profile>,
    phase: Phase,
    error: Option<StoreError>,
}

#[derive(Debug, Clone)]
pub struct AuthStore {
    client: ApiClient,
    state: Arc<RwLock<AuthState>>,
}

/// Profile failures that mean the token itself is bad.
fn is_auth_failure(err: &ApiError) -> bool {
    let message = err.to_string();
    err.is_session_expired() || message.contains("token") || message.contains("auth")
}

impl AuthStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.client.session().token()
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.session().is_authenticated()
    }

    /// The loaded profile. Always `None` without a token.
    pub fn user(&self) -> Option<Profile> {
        if !self.is_authenticated() {
            return None;
        }
        self.state.read().user.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.read().phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase() == Phase::Loading
    }

    pub fn error(&self) -> Option<StoreError> {
        self.state.read().error.clone()
    }

    pub fn login(&self, credentials: &Credentials) -> ApiResult<Profile> {
        self.begin();
        match self.client.auth().login(credentials) {
            Ok(login) => {
                let mut state = self.state.write();
                state.user = Some(login.profile.clone());
                state.phase = Phase::Succeeded;
                Ok(login.profile)
            }
            Err(err) => {
                self.client.session().clear();
                let mut state = self.state.write();
                state.user = None;
                state.phase = Phase::Failed;
                state.error = Some(StoreError::from(&err));
                Err(err)
            }
        }
    }

    /// Load the profile for the current token. A failure that points at the
    /// token evicts the session.
    pub fn fetch_profile(&self) -> ApiResult<Profile> {
        self.state.write().phase = Phase::Loading;
        let result = self.client.auth().profile();
        if let Err(err) = &result {
            if is_auth_failure(err) {
                warn!(error = %err, "Profile rejected, clearing session");
                self.client.session().clear();
                self.state.write().user = None;
            }
        }
        self.merge_profile(result)
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        self.state.write().phase = Phase::Loading;
        let result = self.client.auth().update_profile(update);
        self.merge_profile(result)
    }

    /// Synchronous: drops the token and profile without any request.
    pub fn logout(&self) {
        self.client.session().clear();
        let mut state = self.state.write();
        state.user = None;
        state.error = None;
        state.phase = Phase::Idle;
        info!("Admin logged out");
    }

    pub fn clear_error(&self) {
        self.state.write().error = None;
    }

    fn begin(&self) {
        let mut state = self.state.write();
        state.phase = Phase::Loading;
        state.error = None;
    }

    /// Server fields overwrite the loaded profile's fields; others are kept.
    fn merge_profile(&self, result: ApiResult<Profile>) -> ApiResult<Profile> {
        let mut state = self.state.write();
        match result {
            Ok(fresh) => {
                let merged = match state.user.take() {
                    Some(mut user) => {
                        user.id = fresh.id.or(user.id);
                        user.name = fresh.name.or(user.name);
                        user.email = fresh.email.or(user.email);
                        user.role = fresh.role.or(user.role);
                        user.extra.extend(fresh.extra);
                        user
                    }
                    None => fresh,
                };
                state.user = Some(merged.clone());
                state.phase = Phase::Succeeded;
                state.error = None;
                Ok(merged)
            }
            Err(err) => {
                state.phase = Phase::Failed;
                state.error = Some(StoreError::from(&err));
                Err(err)
            }
        }
    }
}
