//! spacetraveling: a static blog backed by a headless CMS
//!
//! Posts are fetched from Prismic (or a JSON export), rendered with an
//! embedded Tera theme and written to a public directory. A small axum server
//! serves the output and renders drafts live in preview mode.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentSource, FixtureSource, PrismicClient};

/// A blog site rooted at a directory
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Source directory (static files)
    pub source_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Blog {
    /// Load a blog from a directory: `.env`, then `_config.yml`, then
    /// environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();

        let env_path = base_dir.join(".env");
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("Failed to load {:?}", env_path))?;
        }

        let config_path = base_dir.join("_config.yml");
        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Build a blog from an already resolved configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let source_dir = base_dir.join(&config.source_dir);
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            source_dir,
            public_dir,
        }
    }

    /// The configured content backend
    pub fn content_source(&self) -> Result<Arc<dyn ContentSource>> {
        let cms = &self.config.cms;

        if let Some(fixture) = cms.fixture.as_deref().filter(|f| !f.is_empty()) {
            let path = self.base_dir.join(fixture);
            tracing::info!("Reading posts from {:?}", path);
            let source = FixtureSource::load(&path, &cms.document_type)
                .with_context(|| format!("Failed to load fixture {:?}", path))?;
            return Ok(Arc::new(source));
        }

        if cms.endpoint.trim().is_empty() {
            anyhow::bail!(
                "No CMS endpoint configured: set cms.endpoint in _config.yml or {}",
                config::ENV_CMS_ENDPOINT
            );
        }

        let client = PrismicClient::new(cms).context("Failed to create CMS client")?;
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_config_file() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.public_dir, dir.path().join("public"));
        assert_eq!(blog.source_dir, dir.path().join("source"));
        assert_eq!(blog.config.per_page, 5);
    }

    #[test]
    fn test_config_file_dirs() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Space\npublic_dir: out\nper_page: 3\n",
        )
        .unwrap();

        let blog = Blog::new(dir.path()).unwrap();
        assert_eq!(blog.config.title, "Space");
        assert_eq!(blog.public_dir, dir.path().join("out"));
        assert_eq!(blog.config.per_page, 3);
    }

    #[tokio::test]
    async fn test_fixture_source() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("posts.json"),
            r#"[{"id": "A", "uid": "hello", "type": "posts",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "data": {"title": "Hello"}}]"#,
        )
        .unwrap();

        let mut config = config::SiteConfig::default();
        config.cms.fixture = Some("posts.json".to_string());
        let blog = Blog::with_config(dir.path(), config);

        let source = blog.content_source().unwrap();
        let post = source.get_by_uid("hello", None).await.unwrap().unwrap();
        assert_eq!(post.title, "Hello");
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut config = config::SiteConfig::default();
        config.cms.endpoint = String::new();
        let blog = Blog::with_config(dir.path(), config);
        assert!(blog.content_source().is_err());
    }
}
