//! Product categories, submitted as multipart forms with an optional image.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, non_blank, resource_path, unwrap_data};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::http::{FileUpload, HttpMethod, MultipartForm};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hsn: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Missing means active.
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Form input for creating or editing a category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub hsn: String,
    /// Newly selected image file.
    pub image: Option<FileUpload>,
    /// URL of the image already stored for this category.
    pub existing_image: Option<String>,
    pub is_active: Option<bool>,
}

impl CategoryDraft {
    /// Name and an image (new or existing) are mandatory.
    pub fn validate(&self) -> ApiResult<()> {
        if non_blank(&self.name).is_none() {
            return Err(ApiError::validation("name", "Category name is required"));
        }
        let has_existing = self.existing_image.as_deref().and_then(non_blank).is_some();
        if self.image.is_none() && !has_existing {
            return Err(ApiError::validation("image", "Category image is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWire {
    pub name: String,
    pub description: String,
    pub hsn: String,
    pub is_active: Option<bool>,
    pub image: Option<FileUpload>,
}

impl CategoryWire {
    pub fn from_draft(draft: &CategoryDraft) -> Self {
        Self {
            name: draft.name.trim().to_string(),
            description: draft.description.clone(),
            hsn: draft.hsn.clone(),
            is_active: draft.is_active,
            image: draft.image.clone(),
        }
    }

    /// Full field set of a stored category with `isActive` flipped.
    pub fn toggled(category: &Category) -> Self {
        Self {
            name: category.name.clone(),
            description: category.description.clone(),
            hsn: category.hsn.clone(),
            is_active: Some(!category.is_active),
            image: None,
        }
    }

    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        form.text("name", self.name)
            .text("description", self.description)
            .text("hsn", self.hsn);
        if let Some(active) = self.is_active {
            form.text("isActive", active.to_string());
        }
        if let Some(image) = self.image {
            form.file("image", image);
        }
        form
    }
}

pub struct CategoriesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> CategoriesApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self) -> ApiResult<Vec<Category>> {
        let payload = self.client.get("/category")?;
        decode(extract_list(payload), "categories")
    }

    pub fn get(&self, id: &str) -> ApiResult<Category> {
        let payload = self.client.get(&resource_path(&["category", id]))?;
        decode(unwrap_data(payload), "category")
    }

    pub fn create(&self, draft: &CategoryDraft) -> ApiResult<Category> {
        draft.validate()?;
        let form = CategoryWire::from_draft(draft).into_form();
        let payload = self.client.send_form(HttpMethod::Post, "/category/create", form)?;
        decode(unwrap_data(payload), "created category")
    }

    pub fn update(&self, id: &str, draft: &CategoryDraft) -> ApiResult<Category> {
        draft.validate()?;
        self.put(id, CategoryWire::from_draft(draft))
    }

    /// Flip `isActive` by resubmitting the category's full field set.
    pub fn toggle_active(&self, category: &Category) -> ApiResult<Category> {
        self.put(&category.id, CategoryWire::toggled(category))
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&resource_path(&["category", id]))?;
        Ok(())
    }

    fn put(&self, id: &str, wire: CategoryWire) -> ApiResult<Category> {
        let payload = self
            .client
            .send_form(HttpMethod::Put, &resource_path(&["category", id]), wire.into_form())?;
        decode(unwrap_data(payload), "updated category")
    }
}

/// The list arrives as `data.categories`, `categories`, `data` or a bare array.
fn extract_list(payload: Value) -> Value {
    let candidates = [
        payload.pointer("/data/categories"),
        payload.get("categories"),
        payload.get("data"),
        Some(&payload),
    ];
    candidates
        .into_iter()
        .flatten()
        .find(|value| value.is_array())
        .cloned()
        .unwrap_or_else(|| Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestBody;
    use crate::testing::scripted_client;
    use serde_json::json;

    fn image() -> FileUpload {
        FileUpload::new("sweets.png", "image/png", vec![1, 2, 3])
    }

    #[test]
    fn list_accepts_every_envelope() {
        let (client, transport, _) = scripted_client();
        let one = json!([{"_id": "c1", "name": "Sweets"}]);
        transport.push_json(200, json!({"data": {"categories": one.clone()}}));
        transport.push_json(200, json!({"categories": one.clone()}));
        transport.push_json(200, json!({"data": one.clone()}));
        transport.push_json(200, one);
        transport.push_json(200, json!({"message": "ok"}));

        for _ in 0..4 {
            let list = client.categories().list().unwrap();
            assert_eq!(list.len(), 1);
            assert!(list[0].is_active);
        }
        assert!(client.categories().list().unwrap().is_empty());
    }

    #[test]
    fn create_requires_name_and_image() {
        let (client, transport, _) = scripted_client();
        let missing_name = CategoryDraft {
            image: Some(image()),
            ..CategoryDraft::default()
        };
        let err = client.categories().create(&missing_name).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "name", .. }));

        let missing_image = CategoryDraft {
            name: "Sweets".into(),
            ..CategoryDraft::default()
        };
        let err = client.categories().create(&missing_image).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "image", .. }));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn create_sends_image_part() {
        let (client, transport, _) = scripted_client();
        transport.push_json(201, json!({"data": {"_id": "c1", "name": "Sweets", "image": "https://cdn/s.png"}}));
        let draft = CategoryDraft {
            name: " Sweets ".into(),
            hsn: "1704".into(),
            image: Some(image()),
            ..CategoryDraft::default()
        };
        let created = client.categories().create(&draft).unwrap();
        assert_eq!(created.image.as_deref(), Some("https://cdn/s.png"));

        let req = transport.last_request().unwrap();
        assert_eq!(req.endpoint, "/category/create");
        let Some(RequestBody::Multipart(form)) = req.body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.text_value("name"), Some("Sweets"));
        assert_eq!(form.text_value("hsn"), Some("1704"));
        assert_eq!(form.files("image").len(), 1);
        assert!(!form.contains("isActive"));
    }

    #[test]
    fn update_accepts_existing_image() {
        let (client, transport, _) = scripted_client();
        transport.push_json(200, json!({"data": {"_id": "c1", "name": "Mithai"}}));
        let draft = CategoryDraft {
            name: "Mithai".into(),
            existing_image: Some("https://cdn/s.png".into()),
            ..CategoryDraft::default()
        };
        client.categories().update("c1", &draft).unwrap();
        let req = transport.last_request().unwrap();
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.endpoint, "/category/c1");
    }

    #[test]
    fn toggle_resubmits_full_field_set() {
        let (client, transport, _) = scripted_client();
        transport.push_json(200, json!({"data": {"_id": "c1", "name": "Sweets", "isActive": false}}));
        let category: Category =
            serde_json::from_value(json!({"_id": "c1", "name": "Sweets", "description": "d", "hsn": "1704"}))
                .unwrap();

        let updated = client.categories().toggle_active(&category).unwrap();
        assert!(!updated.is_active);

        let Some(RequestBody::Multipart(form)) = transport.last_request().unwrap().body else {
            panic!("expected multipart body");
        };
        assert_eq!(form.names(), vec!["name", "description", "hsn", "isActive"]);
        assert_eq!(form.text_value("isActive"), Some("false"));
    }
}
