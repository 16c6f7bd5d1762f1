//! Admin login and profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::{decode, unwrap_data};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Admin profile as returned by `/admin/profile`. Unknown fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Partial profile update; `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "currentPassword", skip_serializing_if = "Option::is_none")]
    pub current_password: Option<String>,
    #[serde(rename = "newPassword", skip_serializing_if = "Option::is_none")]
    pub new_password: Option<String>,
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Log in and persist the returned access token in the session.
    pub fn login(&self, credentials: &Credentials) -> ApiResult<LoginResponse> {
        if credentials.email.trim().is_empty() {
            return Err(ApiError::validation("email", "Email is required"));
        }
        if credentials.password.is_empty() {
            return Err(ApiError::validation("password", "Password is required"));
        }

        // A login replaces any previous session; the stale token must not be
        // sent, or a 401 here would be taken for an expired session.
        self.client.session().clear();
        let payload = self.client.send_json(HttpMethod::Post, "/admin/login", credentials)?;
        let login: LoginResponse = decode(unwrap_data(payload), "login response")?;
        self.client.session().set_token(&login.access_token)?;
        info!(email = %credentials.email, "Admin logged in");
        Ok(login)
    }

    pub fn profile(&self) -> ApiResult<Profile> {
        self.require_token()?;
        let payload = self.client.get("/admin/profile")?;
        decode(unwrap_data(payload), "profile")
    }

    pub fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<Profile> {
        self.require_token()?;
        let payload = self.client.send_json(HttpMethod::Patch, "/admin/profile", update)?;
        decode(unwrap_data(payload), "profile")
    }

    fn require_token(&self) -> ApiResult<()> {
        if self.client.session().is_authenticated() {
            Ok(())
        } else {
            Err(ApiError::validation("token", "No authentication token found"))
        }
    }
}
