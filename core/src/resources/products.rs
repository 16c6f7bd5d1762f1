//! Products: paginated listing plus multipart create/update.
//!
//! The backend expects a flat multipart form: nested weight and dimensions
//! become sibling scalar fields, tags are one JSON-encoded field, booleans are
//! the strings `"true"`/`"false"`, and images repeat under `images`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{decode, json_field, non_blank, resource_path, unwrap_data, with_query, Page, Pagination};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::http::{FileUpload, HttpMethod, MultipartForm};

pub const DEFAULT_PAGE_SIZE: u32 = 12;
const DEFAULT_WEIGHT_UNIT: &str = "g";

/// A product's category: either a bare id or a populated reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    Id(String),
    Populated {
        #[serde(rename = "_id")]
        id: String,
        #[serde(default)]
        name: String,
    },
}

impl CategoryRef {
    pub fn id(&self) -> &str {
        match self {
            CategoryRef::Id(id) => id,
            CategoryRef::Populated { id, .. } => id,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    #[serde(default)]
    pub number: f64,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default)]
    pub l: f64,
    #[serde(default)]
    pub b: f64,
    #[serde(default)]
    pub h: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub category: Option<CategoryRef>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub vegetarian: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub weight: Option<Weight>,
    #[serde(default)]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Filters for `GET /product/products`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ProductQuery {
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
            ..Self::default()
        }
    }

    fn pairs(&self, with_filters: bool) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page.filter(|p| *p > 0) {
            pairs.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            pairs.push(("limit", limit.to_string()));
        }
        if with_filters {
            if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
                pairs.push(("search", search.to_string()));
            }
            if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
                pairs.push(("category", category.to_string()));
            }
        }
        pairs
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductDraft {
    pub name: String,
    pub code: String,
    pub category: String,
    pub price: f64,
    pub stock: i64,
    pub vegetarian: bool,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub weight: Option<Weight>,
    pub dimensions: Option<Dimensions>,
    pub images: Vec<FileUpload>,
}

/// Input for updating a product. `None` fields are not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub vegetarian: Option<bool>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub weight: Option<Weight>,
    pub dimensions: Option<Dimensions>,
    /// URLs of existing images to keep.
    pub existing_images: Option<Vec<String>>,
    /// New files to upload.
    pub new_images: Vec<FileUpload>,
}

/// Flat multipart representation of a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductWire {
    pub name: Option<String>,
    pub code: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i64>,
    pub vegetarian: Option<bool>,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub weight_number: Option<f64>,
    pub weight_unit: Option<String>,
    pub dimensions_l: Option<f64>,
    pub dimensions_b: Option<f64>,
    pub dimensions_h: Option<f64>,
    pub existing_images: Option<String>,
    pub images: Vec<FileUpload>,
}

fn clean_tags(tags: &[String]) -> Vec<&str> {
    tags.iter().filter_map(|tag| non_blank(tag)).collect()
}

fn non_zero(value: f64) -> Option<f64> {
    (value != 0.0).then_some(value)
}

impl ProductWire {
    pub fn from_draft(draft: &ProductDraft) -> ApiResult<Self> {
        let tags = clean_tags(&draft.tags);
        let weight = draft.weight.as_ref().filter(|w| w.number != 0.0);
        let dimensions = draft.dimensions.unwrap_or_default();

        Ok(Self {
            name: Some(draft.name.clone()),
            code: Some(draft.code.clone()),
            category: Some(draft.category.clone()),
            price: Some(draft.price),
            stock: Some(draft.stock),
            vegetarian: Some(draft.vegetarian),
            description: draft.description.as_deref().and_then(non_blank).map(str::to_string),
            tags: if tags.is_empty() { None } else { Some(json_field(&tags)?) },
            weight_number: weight.map(|w| w.number),
            weight_unit: weight.map(|w| {
                non_blank(&w.unit).unwrap_or(DEFAULT_WEIGHT_UNIT).to_string()
            }),
            dimensions_l: non_zero(dimensions.l),
            dimensions_b: non_zero(dimensions.b),
            dimensions_h: non_zero(dimensions.h),
            existing_images: None,
            images: draft.images.clone(),
        })
    }

    pub fn from_update(update: &ProductUpdate) -> ApiResult<Self> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
        let tags = update.tags.as_deref().map(clean_tags).unwrap_or_default();
        let dimensions = update.dimensions.unwrap_or_default();

        Ok(Self {
            name: present(&update.name),
            code: present(&update.code),
            category: present(&update.category),
            price: update.price,
            stock: update.stock,
            vegetarian: update.vegetarian,
            description: update.description.clone(),
            tags: if tags.is_empty() { None } else { Some(json_field(&tags)?) },
            weight_number: update.weight.as_ref().and_then(|w| non_zero(w.number)),
            weight_unit: update.weight.as_ref().and_then(|w| non_blank(&w.unit)).map(str::to_string),
            dimensions_l: non_zero(dimensions.l),
            dimensions_b: non_zero(dimensions.b),
            dimensions_h: non_zero(dimensions.h),
            existing_images: update.existing_images.as_ref().map(json_field).transpose()?,
            images: update.new_images.clone(),
        })
    }

    /// Field-name table for the product form.
    pub fn into_form(self) -> MultipartForm {
        let mut form = MultipartForm::new();
        let text_fields = [
            ("name", self.name),
            ("code", self.code),
            ("category", self.category),
            ("price", self.price.map(|v| v.to_string())),
            ("stock", self.stock.map(|v| v.to_string())),
            ("vegetarian", self.vegetarian.map(|v| v.to_string())),
            ("description", self.description),
            ("tags", self.tags),
            ("weightNumber", self.weight_number.map(|v| v.to_string())),
            ("weightUnit", self.weight_unit),
            ("dimensionsL", self.dimensions_l.map(|v| v.to_string())),
            ("dimensionsB", self.dimensions_b.map(|v| v.to_string())),
            ("dimensionsH", self.dimensions_h.map(|v| v.to_string())),
            ("existingImages", self.existing_images),
        ];
        for (name, value) in text_fields {
            if let Some(value) = value {
                form.text(name, value);
            }
        }
        for image in self.images {
            form.file("images", image);
        }
        form
    }
}

pub struct ProductsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProductsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn list(&self, query: &ProductQuery) -> ApiResult<Page<Product>> {
        let payload = self.client.get(&with_query("/product/products", &query.pairs(true)))?;
        parse_page(payload, query.limit)
    }

    pub fn list_by_category(&self, category_id: &str, query: &ProductQuery) -> ApiResult<Page<Product>> {
        let endpoint = with_query(&resource_path(&["product", "category", category_id]), &query.pairs(false));
        let payload = self.client.get(&endpoint)?;
        parse_page(payload, query.limit)
    }

    pub fn get(&self, id: &str) -> ApiResult<Product> {
        let payload = self.client.get(&resource_path(&["product", id]))?;
        decode(unwrap_data(payload), "product")
    }

    pub fn create(&self, draft: &ProductDraft) -> ApiResult<Product> {
        let form = ProductWire::from_draft(draft)?.into_form();
        let payload = self.client.send_form(HttpMethod::Post, "/product/create", form)?;
        decode(unwrap_data(payload), "created product")
    }

    pub fn update(&self, id: &str, update: &ProductUpdate) -> ApiResult<Product> {
        let form = ProductWire::from_update(update)?.into_form();
        let payload = self
            .client
            .send_form(HttpMethod::Patch, &resource_path(&["product", "update", id]), form)?;
        decode(unwrap_data(payload), "updated product")
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&resource_path(&["product", "delete", id]))?;
        Ok(())
    }
}

/// `{data: {products, page, pages, total}}` with the request's limit.
fn parse_page(payload: Value, limit: Option<u32>) -> ApiResult<Page<Product>> {
    let data = unwrap_data(payload);
    let items = match data.get("products") {
        Some(products) if !products.is_null() => decode(products.clone(), "products")?,
        _ => Vec::new(),
    };
    let number = |key: &str| data.get(key).and_then(Value::as_u64).filter(|n| *n > 0);

    Ok(Page {
        items,
        pagination: Pagination {
            page: number("page").unwrap_or(1) as u32,
            pages: number("pages").unwrap_or(1) as u32,
            total: number("total").unwrap_or(0),
            limit: limit.filter(|l| *l > 0).unwrap_or(DEFAULT_PAGE_SIZE),
        },
    })
}
