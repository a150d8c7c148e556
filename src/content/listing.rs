//! Accumulating post listing ("load more" pagination)

use crate::cms::{CmsResult, ContentSource};

use super::post::{PostSummary, PostsPage};

/// Posts displayed so far plus the cursor of the next page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostListing {
    posts: Vec<PostSummary>,
    next_page: Option<String>,
}

impl PostListing {
    /// Start from the initial page load
    pub fn new(page: PostsPage) -> Self {
        Self {
            posts: page.results,
            next_page: page.next_page,
        }
    }

    pub fn posts(&self) -> &[PostSummary] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref()
    }

    /// Whether a "load more" control should be shown
    pub fn has_more(&self) -> bool {
        self.next_page.is_some()
    }

    /// Append a fetched page and take over its cursor
    pub fn append(&mut self, page: PostsPage) {
        self.posts.extend(page.results);
        self.next_page = page.next_page;
    }

    /// Fetch the page at the cursor and append it.
    ///
    /// Returns the fetched page, or `None` without touching the backend when
    /// the listing is exhausted. On failure the listing is left unchanged.
    pub async fn load_more(&mut self, source: &dyn ContentSource) -> CmsResult<Option<PostsPage>> {
        let Some(cursor) = self.next_page.as_deref() else {
            return Ok(None);
        };

        let page = source.fetch_page(cursor).await?;
        tracing::debug!(
            "Loaded {} more posts (more: {})",
            page.results.len(),
            page.next_page.is_some()
        );
        self.append(page.clone());
        Ok(Some(page))
    }

    /// Follow the cursor chain to the end, returning every fetched page
    pub async fn load_all(&mut self, source: &dyn ContentSource) -> CmsResult<Vec<PostsPage>> {
        let mut pages = Vec::new();
        while let Some(page) = self.load_more(source).await? {
            pages.push(page);
        }
        Ok(pages)
    }

    pub fn into_posts(self) -> Vec<PostSummary> {
        self.posts
    }
}
