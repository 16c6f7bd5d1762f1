//! Blog posts.
//!
//! Posts go out as JSON when the image is a URL and as multipart when a file
//! is attached. The backend's file field name is not fixed, so uploads walk
//! the configured candidate names in order (see [`ImageFieldStrategy`]).
//! Records come back in two generations of field names and are normalized
//! into [`Blog`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{decode, non_blank, resource_path, unwrap_data};
use crate::client::ApiClient;
use crate::error::{ApiError, ApiResult};
use crate::http::{FileUpload, HttpMethod, MultipartForm};

const DEFAULT_AUTHOR: &str = "Admin";
const DEFAULT_CATEGORY: &str = "General";
const NO_BLOGS_MESSAGE: &str = "No blogs found";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogStatus {
    #[default]
    Published,
    Draft,
}

impl BlogStatus {
    fn parse(value: &str) -> Self {
        match value {
            "draft" => BlogStatus::Draft,
            _ => BlogStatus::Published,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BlogStatus::Published => "published",
            BlogStatus::Draft => "draft",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            BlogStatus::Published => BlogStatus::Draft,
            BlogStatus::Draft => BlogStatus::Published,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct BlogContent {
    #[serde(default)]
    markup: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageRef {
    #[serde(default)]
    url: Option<String>,
}

/// Blog as the backend returns it, old and new field names alike.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlogRecord {
    #[serde(rename = "_id", alias = "id")]
    id: Option<String>,
    title: Option<String>,
    blog_name: Option<String>,
    content: Option<String>,
    blog_content: Option<BlogContent>,
    author: Option<String>,
    category: Option<String>,
    featured_image: Option<String>,
    blog_img_url: Option<ImageRef>,
    status: Option<String>,
    excerpt: Option<String>,
    // Legacy records carry explicit nulls here.
    tags: Option<Vec<String>>,
    views: Option<u64>,
    likes: Option<u64>,
    meta_title: Option<String>,
    meta_description: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    pub id: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub featured_image: String,
    pub status: BlogStatus,
    pub excerpt: String,
    pub tags: Vec<String>,
    pub views: u64,
    pub likes: u64,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn first_present(candidates: [Option<String>; 2]) -> Option<String> {
    candidates.into_iter().flatten().find(|value| !value.is_empty())
}

impl From<BlogRecord> for Blog {
    fn from(record: BlogRecord) -> Self {
        let markup = record.blog_content.and_then(|c| c.markup);
        let image_url = record.blog_img_url.and_then(|i| i.url);
        Self {
            id: record.id.unwrap_or_default(),
            title: first_present([record.title, record.blog_name]).unwrap_or_default(),
            content: first_present([record.content, markup]).unwrap_or_default(),
            author: first_present([record.author, None]).unwrap_or_else(|| DEFAULT_AUTHOR.to_string()),
            category: first_present([record.category, None]).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            featured_image: first_present([record.featured_image, image_url]).unwrap_or_default(),
            status: record
                .status
                .as_deref()
                .filter(|s| !s.is_empty())
                .map_or(BlogStatus::Published, BlogStatus::parse),
            excerpt: record.excerpt.unwrap_or_default(),
            tags: record.tags.unwrap_or_default(),
            views: record.views.unwrap_or_default(),
            likes: record.likes.unwrap_or_default(),
            meta_title: record.meta_title,
            meta_description: record.meta_description,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Form input for creating or editing a post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogDraft {
    pub title: String,
    pub content: String,
    pub author: String,
    pub category: String,
    pub status: Option<BlogStatus>,
    pub excerpt: String,
    /// Image given as a URL.
    pub featured_image: String,
    /// Image given as a file. Switches the request to multipart.
    pub image_file: Option<FileUpload>,
    pub meta_title: String,
    pub meta_description: String,
    pub tags: Vec<String>,
}

/// JSON body for URL-image posts. `None` fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogJson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

fn filled(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl BlogJson {
    /// Create body: every field, empty ones included.
    pub fn for_create(draft: &BlogDraft) -> Self {
        Self {
            title: Some(draft.title.clone()),
            content: Some(draft.content.clone()),
            author: Some(draft.author.clone()),
            category: Some(draft.category.clone()),
            status: draft.status,
            excerpt: Some(draft.excerpt.clone()),
            featured_image: Some(draft.featured_image.clone()),
            meta_title: Some(draft.meta_title.clone()),
            meta_description: Some(draft.meta_description.clone()),
            tags: Some(draft.tags.clone()),
        }
    }

    /// Update body: only fields carrying a value.
    pub fn for_update(draft: &BlogDraft) -> Self {
        Self {
            title: filled(&draft.title),
            content: filled(&draft.content),
            author: filled(&draft.author),
            category: filled(&draft.category),
            status: draft.status,
            excerpt: filled(&draft.excerpt),
            featured_image: filled(&draft.featured_image),
            meta_title: filled(&draft.meta_title),
            meta_description: filled(&draft.meta_description),
            tags: (!draft.tags.is_empty()).then(|| draft.tags.clone()),
        }
    }
}

/// Multipart text fields of a post, without the image part.
pub fn blog_form(draft: &BlogDraft, creating: bool) -> MultipartForm {
    let mut form = MultipartForm::new();
    let core = [
        ("title", &draft.title),
        ("content", &draft.content),
        ("author", &draft.author),
        ("category", &draft.category),
    ];
    for (name, value) in core {
        if creating || !value.is_empty() {
            form.text(name, value.as_str());
        }
    }
    match (draft.status, creating) {
        (Some(status), _) => {
            form.text("status", status.as_str());
        }
        (None, true) => {
            form.text("status", BlogStatus::Draft.as_str());
        }
        (None, false) => {}
    }
    for (name, value) in [
        ("excerpt", &draft.excerpt),
        ("metaTitle", &draft.meta_title),
        ("metaDescription", &draft.meta_description),
    ] {
        if !value.is_empty() {
            form.text(name, value.as_str());
        }
    }
    // Indices follow the input list, so blank tags leave gaps.
    for (index, tag) in draft.tags.iter().enumerate() {
        if let Some(tag) = non_blank(tag) {
            form.text(format!("tags[{index}]"), tag);
        }
    }
    form
}

/// Ordered candidate field names for the image file part.
///
/// Each name is tried once, and the next only after the server rejected the
/// previous attempt with an HTTP error. Network and session failures end the
/// sequence immediately. When every name fails, the last HTTP error is
/// returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFieldStrategy {
    candidates: Vec<String>,
}

impl ImageFieldStrategy {
    pub fn new(candidates: Vec<String>) -> Self {
        Self { candidates }
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn upload(
        &self,
        client: &ApiClient,
        method: HttpMethod,
        endpoint: &str,
        base: &MultipartForm,
        image: &FileUpload,
    ) -> ApiResult<Value> {
        let mut last_error = None;
        for field in &self.candidates {
            let mut form = base.clone();
            form.file(field.as_str(), image.clone());
            debug!(field = %field, endpoint, "Uploading blog image");
            match client.send_form(method, endpoint, form) {
                Ok(payload) => return Ok(payload),
                Err(err @ ApiError::Http(_)) => {
                    warn!(field = %field, error = %err, "Image field rejected, trying next candidate");
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }
        Err(last_error.unwrap_or_else(|| ApiError::validation("image", "No image field names configured")))
    }
}

pub struct BlogsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BlogsApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    fn image_strategy(&self) -> ImageFieldStrategy {
        ImageFieldStrategy::new(self.client.config().blog_image_fields.clone())
    }

    /// All posts. A 404 or "No blogs found" means an empty list.
    pub fn list(&self) -> ApiResult<Vec<Blog>> {
        let payload = match self.client.get("/blog") {
            Ok(payload) => payload,
            Err(ApiError::Http(err)) if err.status == 404 || err.message == NO_BLOGS_MESSAGE => {
                debug!("No blogs on server");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };
        let list = [Some(&payload), payload.get("data"), payload.get("blogs")]
            .into_iter()
            .flatten()
            .find(|value| value.is_array())
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        let records: Vec<BlogRecord> = decode(list, "blogs")?;
        Ok(records.into_iter().map(Blog::from).collect())
    }

    pub fn get(&self, id: &str) -> ApiResult<Blog> {
        let payload = self.client.get(&resource_path(&["blog", id]))?;
        to_blog(payload, "blog")
    }

    pub fn create(&self, draft: &BlogDraft) -> ApiResult<Blog> {
        let payload = match &draft.image_file {
            Some(image) => self.image_strategy().upload(
                self.client,
                HttpMethod::Post,
                "/blog/create",
                &blog_form(draft, true),
                image,
            )?,
            None => self
                .client
                .send_json(HttpMethod::Post, "/blog/create", &BlogJson::for_create(draft))?,
        };
        to_blog(payload, "created blog")
    }

    pub fn update(&self, id: &str, draft: &BlogDraft) -> ApiResult<Blog> {
        let endpoint = resource_path(&["blog", "edit", id]);
        let payload = match &draft.image_file {
            Some(image) => {
                self.image_strategy()
                    .upload(self.client, HttpMethod::Put, &endpoint, &blog_form(draft, false), image)?
            }
            None => self
                .client
                .send_json(HttpMethod::Put, &endpoint, &BlogJson::for_update(draft))?,
        };
        to_blog(payload, "updated blog")
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.client.delete(&resource_path(&["blog", "delete", id]))?;
        Ok(())
    }
}

fn to_blog(payload: Value, what: &str) -> ApiResult<Blog> {
    decode::<BlogRecord>(unwrap_data(payload), what).map(Blog::from)
}
