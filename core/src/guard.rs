//! Route-entry checks for protected views.
//!
//! `SessionGuard` decides whether a view may render from two facts: is there
//! a token, and has the profile for it been loaded. `LoginRedirect` is the
//! top-level `SessionObserver` that sends the user to the login entry point
//! when the client evicts an expired session.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::session::SessionObserver;
use crate::store::AuthStore;

pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GuardState {
    #[default]
    Unknown,
    Authenticated,
    Unauthenticated,
}

/// What the view layer should do on entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum GuardDecision {
    /// Render the protected content.
    Render,
    /// Token present, profile still loading: show a placeholder.
    Verifying,
    /// Go to the login page, remembering where the user was headed.
    RedirectToLogin { from: String },
}

#[derive(Debug)]
pub struct SessionGuard {
    auth: AuthStore,
    state: GuardState,
}

impl SessionGuard {
    pub fn new(auth: AuthStore) -> Self {
        Self {
            auth,
            state: GuardState::Unknown,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Decide from current state only; never issues a request.
    pub fn evaluate(&mut self, path: &str) -> GuardDecision {
        if !self.auth.is_authenticated() {
            self.state = GuardState::Unauthenticated;
            return GuardDecision::RedirectToLogin { from: path.to_string() };
        }
        if self.auth.user().is_some() {
            self.state = GuardState::Authenticated;
            GuardDecision::Render
        } else {
            self.state = GuardState::Unknown;
            GuardDecision::Verifying
        }
    }

    /// Evaluate, fetching the profile first when a token has none yet.
    ///
    /// A profile failure that evicts the session ends in a redirect. Any other
    /// failure leaves the guard verifying, with the error in the auth store.
    pub fn enter(&mut self, path: &str) -> GuardDecision {
        let decision = self.evaluate(path);
        if decision != GuardDecision::Verifying {
            return decision;
        }
        debug!(path, "Token without profile, fetching profile");
        if let Err(err) = self.auth.fetch_profile() {
            debug!(error = %err, "Profile fetch during route entry failed");
        }
        self.evaluate(path)
    }

    /// Synchronous logout: evicts the token and becomes unauthenticated.
    pub fn logout(&mut self) {
        self.auth.logout();
        self.state = GuardState::Unauthenticated;
    }
}

type Navigator = Box<dyn Fn(&str) + Send + Sync>;

/// Sends the user to [`LOGIN_PATH`] when a session is evicted.
///
/// Every eviction is recorded; the optional navigator lets the host perform
/// the actual navigation.
#[derive(Default)]
pub struct LoginRedirect {
    navigations: Mutex<Vec<String>>,
    navigator: Option<Navigator>,
}

impl std::fmt::Debug for LoginRedirect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRedirect")
            .field("navigations", &self.navigation_count())
            .finish()
    }
}

impl LoginRedirect {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_navigator(navigator: impl Fn(&str) + Send + Sync + 'static) -> Self {
        Self {
            navigations: Mutex::new(Vec::new()),
            navigator: Some(Box::new(navigator)),
        }
    }

    pub fn navigation_count(&self) -> usize {
        self.navigations.lock().len()
    }

    /// Endpoints whose 401 triggered a redirect, oldest first.
    pub fn triggers(&self) -> Vec<String> {
        self.navigations.lock().clone()
    }
}

impl SessionObserver for LoginRedirect {
    fn session_expired(&self, endpoint: &str) {
        info!(endpoint, target = LOGIN_PATH, "Redirecting to login");
        self.navigations.lock().push(endpoint.to_string());
        if let Some(navigate) = &self.navigator {
            navigate(LOGIN_PATH);
        }
    }
}
