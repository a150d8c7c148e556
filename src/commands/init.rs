//! Initialize a new blog

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config::{ENV_CMS_ENDPOINT, ENV_CMS_TOKEN, ENV_COMMENTS_REPO};

const CONFIG_TEMPLATE: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
description: ''
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:3000
root: /

# Directory
source_dir: source
public_dir: public

# Listing
per_page: 5
# Regenerate the site every N seconds while serving (0 disables)
revalidate: 60

# Content
cms:
  # Overridden by PRISMIC_API_ENDPOINT
  endpoint: ''
  document_type: posts
  # Read posts from a JSON export instead of the API
  # fixture: posts.json
  timeout: 15

# utterances
comments:
  # Overridden by UTTERANCES_REPO
  # repo: owner/name
  issue_term: pathname
  label: blog-comment
  theme: photon-dark

preview:
  cookie_name: io.prismic.preview
  max_age: 30
"#;

const LOGO_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="239" height="26" viewBox="0 0 239 26"><text x="0" y="21" fill="#F8F8F8" font-family="Inter, sans-serif" font-size="24" font-weight="700">spacetraveling<tspan fill="#FF57B2">.</tspan></text></svg>
"##;

/// Initialize a new blog in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir.join("source/images"))
        .with_context(|| format!("Failed to create {:?}", target_dir))?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;

    let env_example = format!(
        "{}=https://your-repo.cdn.prismic.io/api/v2\n{}=\n{}=\n",
        ENV_CMS_ENDPOINT, ENV_CMS_TOKEN, ENV_COMMENTS_REPO
    );
    fs::write(target_dir.join(".env.example"), env_example)?;

    let logo = target_dir.join("source/images/logo.svg");
    if !logo.exists() {
        fs::write(&logo, LOGO_SVG)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use tempfile::TempDir;

    #[test]
    fn test_init_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.per_page, 5);
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.comments.theme, "photon-dark");

        let env = fs::read_to_string(dir.path().join(".env.example")).unwrap();
        assert!(env.contains("PRISMIC_API_ENDPOINT="));
        assert!(dir.path().join("source/images/logo.svg").exists());
    }

    #[test]
    fn test_init_refuses_existing_site() {
        let dir = TempDir::new().unwrap();
        init_site(dir.path()).unwrap();
        assert!(init_site(dir.path()).is_err());
    }
}
