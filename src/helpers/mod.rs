//! Helper functions for templates
//!
//! These functions compute the display values templates need: URLs, dates,
//! escaped markup and the comments widget.

mod comments;
mod date;
mod html;
mod url;

pub use comments::*;
pub use date::*;
pub use html::*;
pub use url::*;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::config::SiteConfig;

/// Collection of helper functions bound to a site configuration
pub struct Helpers {
    config: SiteConfig,
    tz: Tz,
}

impl Helpers {
    /// Create a new helpers instance
    pub fn new(config: SiteConfig) -> Self {
        let tz = config.tz();
        Self { config, tz }
    }

    /// Get url_for helper
    pub fn url_for(&self, path: &str) -> String {
        url_for(&self.config, path)
    }

    /// Get full_url_for helper
    pub fn full_url_for(&self, path: &str) -> String {
        full_url_for(&self.config, path)
    }

    /// Rooted URL of a post page
    pub fn post_url(&self, uid: &str) -> String {
        url_for(&self.config, &post_path(uid))
    }

    /// Get css helper
    pub fn css(&self, path: &str) -> String {
        css(&self.config, path)
    }

    /// Get js helper
    pub fn js(&self, path: &str) -> String {
        js(&self.config, path)
    }

    /// Format a publication date; empty for unpublished documents
    pub fn date(&self, date: Option<&DateTime<Utc>>) -> String {
        date.map(|d| format_date(d, self.tz, &self.config.language))
            .unwrap_or_default()
    }

    /// Format an edit marker
    pub fn edited(&self, date: &DateTime<Utc>) -> String {
        format_edited(date, self.tz, &self.config.language)
    }

    /// Comments widget markup, if configured
    pub fn comments(&self) -> Option<String> {
        utterances_script(&self.config.comments)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.config
    }
}
