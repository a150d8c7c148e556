//! List site content

use anyhow::{Context, Result};

use crate::cms::{ContentSource, SearchQuery};
use crate::content::{PostListing, PostSummary};
use crate::generator::PAGES_DIR;
use crate::helpers::{post_path, Helpers};
use crate::Blog;

/// List site content by type
pub async fn run(blog: &Blog, content_type: &str) -> Result<()> {
    let source = blog.content_source()?;

    let lines = match content_type {
        "post" | "posts" => list_posts(blog, source.as_ref()).await?,
        "route" | "routes" => list_routes(blog, source.as_ref()).await?,
        _ => {
            anyhow::bail!("Unknown type: {}. Available: post, route", content_type);
        }
    };

    for line in lines {
        println!("{}", line);
    }

    Ok(())
}

/// Every listed post, newest first
async fn load_posts(blog: &Blog, source: &dyn ContentSource) -> Result<(Vec<PostSummary>, usize)> {
    let query = SearchQuery::listing(&blog.config.cms.document_type, blog.config.per_page);
    let first = source
        .search(&query, None)
        .await
        .context("Failed to fetch posts")?;

    let mut listing = PostListing::new(first);
    let pages = listing.load_all(source).await?.len() + 1;
    Ok((listing.into_posts(), pages))
}

async fn list_posts(blog: &Blog, source: &dyn ContentSource) -> Result<Vec<String>> {
    let helpers = Helpers::new(blog.config.clone());
    let (posts, _) = load_posts(blog, source).await?;

    let mut lines = vec![format!("Posts ({}):", posts.len())];
    for post in posts {
        let date = helpers.date(post.first_publication_date.as_ref());
        lines.push(format!("  {} - {} [{}]", date, post.title, post.uid));
    }
    Ok(lines)
}

async fn list_routes(blog: &Blog, source: &dyn ContentSource) -> Result<Vec<String>> {
    let (posts, pages) = load_posts(blog, source).await?;

    let mut routes = vec![String::new()];
    routes.extend((2..=pages).map(|n| format!("{}/{}.json", PAGES_DIR, n)));
    routes.extend(posts.iter().map(|p| post_path(&p.uid)));

    let mut lines = vec![format!("Routes ({}):", routes.len())];
    lines.extend(routes.into_iter().map(|r| format!("  /{}", r)));
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::sample_source;
    use crate::config::SiteConfig;

    #[tokio::test]
    async fn test_list_posts() {
        let blog = Blog::with_config("/tmp/blog", SiteConfig::default());
        let lines = list_posts(&blog, &sample_source(2)).await.unwrap();
        assert_eq!(
            lines,
            vec![
                "Posts (2):",
                "  2 mar 2021 - Post 2 [post-2]",
                "  1 mar 2021 - Post 1 [post-1]",
            ]
        );
    }

    #[tokio::test]
    async fn test_list_routes() {
        let blog = Blog::with_config("/tmp/blog", SiteConfig::default());
        let lines = list_routes(&blog, &sample_source(6)).await.unwrap();
        assert_eq!(lines[0], "Routes (8):");
        assert_eq!(lines[1], "  /");
        assert_eq!(lines[2], "  /api/posts/2.json");
        assert_eq!(lines[3], "  /post/post-6/");
        assert_eq!(lines[8], "  /post/post-1/");
    }
}
