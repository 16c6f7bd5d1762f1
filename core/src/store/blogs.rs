//! Blogs state container. New posts are prepended, edits replace in place
//! and also refresh the open post.

use super::{Collection, Record, SharedCollection, Slot};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::resources::blogs::{Blog, BlogDraft};

impl Record for Blog {
    fn record_id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone)]
pub struct BlogStore {
    client: ApiClient,
    blogs: SharedCollection<Blog>,
    current: Slot<Blog>,
}

impl BlogStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            blogs: SharedCollection::new(),
            current: Slot::default(),
        }
    }

    pub fn snapshot(&self) -> Collection<Blog> {
        self.blogs.snapshot()
    }

    pub fn blogs(&self) -> Vec<Blog> {
        self.blogs.items()
    }

    pub fn current_blog(&self) -> Option<Blog> {
        self.current.get()
    }

    pub fn fetch(&self) -> ApiResult<bool> {
        self.blogs
            .fetch_with("fetchBlogs", || Ok((self.client.blogs().list()?, None)))
    }

    pub fn fetch_by_id(&self, id: &str) -> ApiResult<Blog> {
        let blog = self
            .blogs
            .track("fetchBlogById", || self.client.blogs().get(id), |_, _| {})?;
        self.current.set(Some(blog.clone()));
        Ok(blog)
    }

    /// New posts go to the top of the list.
    pub fn create(&self, draft: &BlogDraft) -> ApiResult<Blog> {
        self.blogs.track(
            "createBlog",
            || self.client.blogs().create(draft),
            |c, created| c.insert_front(created.clone()),
        )
    }

    pub fn update(&self, id: &str, draft: &BlogDraft) -> ApiResult<Blog> {
        let updated = self.blogs.track(
            "updateBlog",
            || self.client.blogs().update(id, draft),
            |c, updated| {
                c.replace_by_id(updated.clone());
            },
        )?;
        if self.current.get().is_some_and(|current| current.id == updated.id) {
            self.current.set(Some(updated.clone()));
        }
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> ApiResult<()> {
        self.blogs.track(
            "deleteBlog",
            || self.client.blogs().remove(id),
            |c, _| {
                c.remove_by_id(id);
            },
        )
    }

    /// Flip published/draft locally without a request.
    pub fn toggle_status_local(&self, id: &str) {
        self.blogs.update(|c| {
            if let Some(blog) = c.find_mut(id) {
                blog.status = blog.status.toggled();
            }
        });
    }

    pub fn clear_current(&self) {
        self.current.set(None);
    }

    pub fn clear_error(&self) {
        self.blogs.update(Collection::clear_error);
    }
}
