//! Site configuration (_config.yml)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `cms.endpoint`
pub const ENV_CMS_ENDPOINT: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ENV_CMS_TOKEN: &str = "PRISMIC_ACCESS_TOKEN";
/// Environment variable overriding `comments.repo`
pub const ENV_COMMENTS_REPO: &str = "UTTERANCES_REPO";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub source_dir: String,
    pub public_dir: String,

    // Listing
    pub per_page: usize,

    // Incremental static regeneration interval, in seconds (0 disables)
    pub revalidate: u64,

    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "spacetraveling".to_string(),
            description: String::new(),
            language: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),

            url: "http://localhost:3000".to_string(),
            root: "/".to_string(),

            source_dir: "source".to_string(),
            public_dir: "public".to_string(),

            per_page: 5,
            revalidate: 60,

            cms: CmsConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {:?}", path))?;
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary lookup; empty values are ignored
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = get(ENV_CMS_ENDPOINT) {
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = get(ENV_CMS_TOKEN) {
            self.cms.access_token = Some(token);
        }
        if let Some(repo) = get(ENV_COMMENTS_REPO) {
            self.comments.repo = Some(repo);
        }
    }

    /// Parsed display time zone, UTC when unknown
    pub fn tz(&self) -> chrono_tz::Tz {
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                if !self.timezone.is_empty() {
                    tracing::warn!("Unknown timezone {:?}, using UTC", self.timezone);
                }
                chrono_tz::UTC
            }
        }
    }
}

/// Headless CMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://my-repo.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    /// Custom type holding blog posts
    pub document_type: String,
    /// Read documents from a JSON export instead of the API
    pub fixture: Option<String>,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            fixture: None,
            timeout: 15,
        }
    }
}

/// utterances comments widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    /// `owner/name` of the GitHub repository backing the comments
    pub repo: Option<String>,
    pub issue_term: String,
    pub label: String,
    pub theme: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            repo: None,
            issue_term: "pathname".to_string(),
            label: "blog-comment".to_string(),
            theme: "photon-dark".to_string(),
        }
    }
}

/// Preview mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub cookie_name: String,
    /// Cookie lifetime in minutes
    pub max_age: i64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            cookie_name: "io.prismic.preview".to_string(),
            max_age: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.per_page, 5);
        assert_eq!(config.revalidate, 60);
        assert_eq!(config.language, "pt-BR");
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.comments.issue_term, "pathname");
        assert!(config.comments.repo.is_none());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: My Blog
per_page: 3
cms:
  endpoint: https://blog.cdn.prismic.io/api/v2
comments:
  repo: owner/blog
  theme: github-light
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "My Blog");
        assert_eq!(config.per_page, 3);
        assert_eq!(config.revalidate, 60);
        assert_eq!(config.cms.endpoint, "https://blog.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.comments.repo.as_deref(), Some("owner/blog"));
        assert_eq!(config.comments.theme, "github-light");
        assert_eq!(config.comments.label, "blog-comment");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            (ENV_CMS_ENDPOINT, "https://other.cdn.prismic.io/api/v2"),
            (ENV_CMS_TOKEN, "secret"),
            (ENV_COMMENTS_REPO, "  "),
        ]
        .into_iter()
        .collect();

        let mut config = SiteConfig::default();
        config.comments.repo = Some("owner/blog".to_string());
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.cms.endpoint, "https://other.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.access_token.as_deref(), Some("secret"));
        assert_eq!(config.comments.repo.as_deref(), Some("owner/blog"));
    }

    #[test]
    fn test_timezone_fallback() {
        let mut config = SiteConfig::default();
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);
        config.timezone = "Mars/Olympus".to_string();
        assert_eq!(config.tz(), chrono_tz::UTC);
    }
}
