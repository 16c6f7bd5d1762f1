//! Manufacturers: a code and an address, sent as plain JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, non_blank, resource_path, unwrap_data};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::http::HttpMethod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manufacturer {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Manufacturer {
    /// Case-insensitive match on code or address.
    pub fn matches_search(&self, term: &str) -> bool {
        let needle = term.to_lowercase();
        self.code.to_lowercase().contains(&needle) || self.address.to_lowercase().contains(&needle)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManufacturerDraft {
    pub code: String,
    pub address: String,
}

impl ManufacturerDraft {
    pub fn new(code: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            address: address.into(),
        }
    }

    /// Trimmed copy with both fields required.
    pub fn validated(&self) -> ApiResult<Self> {
        let code = non_blank(&self.code).ok_or_else(|| ApiError::validation("code", "Code is required"))?;
        let address =
            non_blank(&self.address).ok_or_else(|| ApiError::validation("address", "Address is required"))?;
        Ok(Self::new(code, address))
    }
}

pub struct ManufacturersApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ManufacturersApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> ApiResult<Vec<Manufacturer>> {
        let payload = self.client.get("/manufacturer")?;
        match unwrap_response(payload) {
            Value::Null => Ok(Vec::new()),
            list => decode(list, "manufacturers"),
        }
    }

    pub fn get(&self, id: &str) -> ApiResult<Manufacturer> {
        let payload = self.client.get(&resource_path(&["manufacturer", id]))?;
        decode(unwrap_response(payload), "manufacturer")
    }

    pub fn create(&self, draft: &ManufacturerDraft) -> ApiResult<Manufacturer> {
        let body = draft.validated()?;
        let payload = self.client.send_json(HttpMethod::Post, "/manufacturer", &body)?;
        decode(unwrap_response(payload), "created manufacturer")
    }

    pub fn update(&self, id: &str, draft: &ManufacturerDraft) -> ApiResult<Manufacturer> {
        let body = draft.validated()?;
        let payload = self
            .client
            .send_json(HttpMethod::Put, &resource_path(&["manufacturer", id]), &body)?;
        decode(unwrap_response(payload), "updated manufacturer")
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&resource_path(&["manufacturer", id]))?;
        Ok(())
    }
}

/// `data.response`, falling back to `data` and then the payload itself.
fn unwrap_response(payload: Value) -> Value {
    match unwrap_data(payload) {
        Value::Object(mut map) if map.contains_key("response") => map.remove("response").unwrap_or(Value::Null),
        other => other,
    }
}
