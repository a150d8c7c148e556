//! Generator module - renders the blog into static files
//!
//! Output layout:
//! - `index.html` with the first listing page
//! - `api/posts/<n>.json` for every further page, chained through `next_page`
//! - `post/<uid>/index.html` for every listed post
//! - `404.html`, `css/style.css`, `js/load-more.js` and the copied source dir

use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use crate::cms::{resolve_adjacent, ContentSource, SearchQuery};
use crate::content::{PostListing, PostSummary, PostsPage};
use crate::templates::{CardPage, TemplateRenderer, LOAD_MORE_JS, STYLE_CSS};
use crate::Blog;

/// Directory of the load-more JSON pages, relative to the public dir
pub const PAGES_DIR: &str = "api/posts";

/// Summary of a generation run
#[derive(Debug, Clone, Serialize)]
pub struct GenerateReport {
    /// Listing pages written (index plus JSON pages)
    pub pages: usize,
    /// Post pages written
    pub posts: usize,
    /// Posts listed but missing from the CMS
    pub skipped: usize,
    /// Stale post pages removed
    pub removed: usize,
    #[serde(skip)]
    pub duration: Duration,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        let renderer = TemplateRenderer::new(&blog.config)?;

        Ok(Self {
            blog: blog.clone(),
            source,
            renderer,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        let start = Instant::now();
        let public_dir = &self.blog.public_dir;

        fs::create_dir_all(public_dir)
            .with_context(|| format!("Failed to create {:?}", public_dir))?;

        self.write_assets()?;
        self.copy_source_assets()?;

        let document_type = &self.blog.config.cms.document_type;
        let query = SearchQuery::listing(document_type, self.blog.config.per_page);
        let first = self
            .source
            .search(&query, None)
            .await
            .context("Failed to fetch the first listing page")?;
        tracing::info!("Fetched {} posts for the home page", first.results.len());

        let mut listing = PostListing::new(first.clone());
        let rest = listing
            .load_all(self.source.as_ref())
            .await
            .context("Failed to follow the listing cursor")?;

        self.generate_index(&first)?;
        self.generate_listing_pages(&rest)?;
        self.generate_not_found()?;

        let written = self.generate_post_pages(listing.posts()).await?;
        let removed = self.remove_stale_posts(&written)?;

        let report = GenerateReport {
            pages: rest.len() + 1,
            posts: written.len(),
            skipped: listing.posts().len() - written.len(),
            removed,
            duration: start.elapsed(),
        };
        tracing::info!(
            "Generated {} listing pages and {} posts in {:.2}s",
            report.pages,
            report.posts,
            report.duration.as_secs_f64()
        );

        Ok(report)
    }

    /// URL of the `n`th listing page (n >= 2)
    fn page_url(&self, n: usize) -> String {
        self.renderer
            .helpers()
            .url_for(&format!("{}/{}.json", PAGES_DIR, n))
    }

    fn generate_index(&self, first: &PostsPage) -> Result<()> {
        let next_page = first.next_page.as_ref().map(|_| self.page_url(2));
        let html = self
            .renderer
            .render_home(&first.results, next_page.as_deref(), false)?;
        write_file(&self.blog.public_dir.join("index.html"), &html)?;
        tracing::debug!("Generated index.html");
        Ok(())
    }

    /// Write the pages after the first as a chain of JSON files.
    ///
    /// Pages are replaced in place; files past the end of the new chain are
    /// removed afterwards, so a page a client already points at never
    /// disappears mid-run.
    fn generate_listing_pages(&self, pages: &[PostsPage]) -> Result<()> {
        let pages_dir = self.blog.public_dir.join(PAGES_DIR);

        for (i, page) in pages.iter().enumerate() {
            let n = i + 2;
            let results = page
                .results
                .iter()
                .map(|post| self.renderer.render_card(post))
                .collect::<Result<Vec<_>>>()?;
            let card_page = CardPage {
                results,
                next_page: page.next_page.as_ref().map(|_| self.page_url(n + 1)),
            };

            let json = serde_json::to_string(&card_page)?;
            write_file(&pages_dir.join(format!("{}.json", n)), &json)?;
            tracing::debug!("Generated {}/{}.json", PAGES_DIR, n);
        }

        let last = pages.len() + 1;
        if let Ok(entries) = fs::read_dir(&pages_dir) {
            for entry in entries.filter_map(|e| e.ok()) {
                let path = entry.path();
                let stale = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .and_then(|stem| stem.parse::<usize>().ok())
                    .is_some_and(|n| n > last);
                if stale && path.extension().is_some_and(|ext| ext == "json") {
                    fs::remove_file(&path)
                        .with_context(|| format!("Failed to remove {:?}", path))?;
                    tracing::debug!("Removed stale page {:?}", path);
                }
            }
        }

        Ok(())
    }

    fn generate_not_found(&self) -> Result<()> {
        let html = self.renderer.render_not_found()?;
        write_file(&self.blog.public_dir.join("404.html"), &html)
    }

    /// Render every listed post; returns the uids written
    async fn generate_post_pages(&self, posts: &[PostSummary]) -> Result<HashSet<String>> {
        let document_type = &self.blog.config.cms.document_type;
        let mut written = HashSet::new();

        for summary in posts {
            let Some(dir) = post_dir(&self.blog.public_dir, &summary.uid) else {
                tracing::warn!("Skipping post with unusable uid {:?}", summary.uid);
                continue;
            };

            let post = self
                .source
                .get_by_uid(&summary.uid, None)
                .await
                .with_context(|| format!("Failed to fetch post {:?}", summary.uid))?;
            let Some(post) = post else {
                tracing::warn!("Post {:?} is listed but not found", summary.uid);
                continue;
            };

            let adjacent = resolve_adjacent(
                self.source.as_ref(),
                document_type,
                &post.summary(),
                None,
            )
            .await
            .with_context(|| format!("Failed to resolve neighbours of {:?}", post.uid))?;

            let html = self
                .renderer
                .render_post(&post, &adjacent, false)
                .with_context(|| format!("Failed to render post {:?}", post.uid))?;
            write_file(&dir.join("index.html"), &html)?;
            tracing::debug!("Generated post: {:?}", dir);
            written.insert(post.uid);
        }

        Ok(written)
    }

    /// Delete `post/<uid>/` directories of posts no longer in the CMS
    fn remove_stale_posts(&self, keep: &HashSet<String>) -> Result<usize> {
        let posts_dir = self.blog.public_dir.join("post");
        let Ok(entries) = fs::read_dir(&posts_dir) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let listed = entry.file_name().to_str().is_some_and(|uid| keep.contains(uid));
            if listed || !path.is_dir() {
                continue;
            }

            fs::remove_dir_all(&path).with_context(|| format!("Failed to remove {:?}", path))?;
            tracing::info!("Removed stale post {:?}", path);
            removed += 1;
        }

        Ok(removed)
    }

    fn write_assets(&self) -> Result<()> {
        let public_dir = &self.blog.public_dir;
        write_file(&public_dir.join("css").join("style.css"), STYLE_CSS)?;
        write_file(&public_dir.join("js").join("load-more.js"), LOAD_MORE_JS)?;
        Ok(())
    }

    /// Copy source assets (images, etc.) to public directory
    fn copy_source_assets(&self) -> Result<()> {
        let source_dir = &self.blog.source_dir;
        if !source_dir.exists() {
            return Ok(());
        }

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() {
                // Skip hidden files
                if path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'))
                {
                    continue;
                }

                let relative = path.strip_prefix(source_dir)?;
                let dest = self.blog.public_dir.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }

                fs::copy(path, &dest)
                    .with_context(|| format!("Failed to copy {:?} to {:?}", path, dest))?;
            }
        }

        Ok(())
    }
}

/// Output directory of a post, or `None` when the uid is not a plain segment
pub fn post_dir(public_dir: &Path, uid: &str) -> Option<PathBuf> {
    if uid.is_empty() || uid == "." || uid == ".." || uid.contains(['/', '\\']) {
        return None;
    }
    Some(public_dir.join("post").join(uid))
}

/// Write through a temporary sibling and rename it over `path`, so readers
/// see either the old or the new contents
fn write_file(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("No parent directory for {:?}", path))?;
    fs::create_dir_all(parent)
        .map_err(|e| anyhow::anyhow!("Failed to create dir {:?}: {}", parent, e))?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name {:?}", path))?;
    let tmp = parent.join(format!(".{}.tmp", file_name));

    fs::write(&tmp, contents).map_err(|e| anyhow::anyhow!("Failed to write {:?}: {}", tmp, e))?;
    fs::rename(&tmp, path)
        .map_err(|e| anyhow::anyhow!("Failed to move {:?} to {:?}: {}", tmp, path, e))
}
