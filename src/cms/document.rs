//! Wire format of CMS documents and search responses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::content::{null_as_default, Banner, ContentSection, Post, PostSummary, PostsPage};

/// A document as returned by the search API
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default, deserialize_with = "deserialize_cms_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_cms_date")]
    pub last_publication_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub data: PostFields,
}

/// Custom-type fields of a blog post; absent when not fetched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostFields {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    #[serde(deserialize_with = "null_as_default")]
    pub banner: Banner,
    #[serde(deserialize_with = "null_as_default")]
    pub content: Vec<ContentSection>,
}

impl Document {
    /// Listing view; `None` for documents without a uid
    pub fn into_summary(self) -> Option<PostSummary> {
        let Some(uid) = self.uid else {
            tracing::warn!("Skipping document {} without uid", self.id);
            return None;
        };
        Some(PostSummary {
            uid,
            first_publication_date: self.first_publication_date,
            title: self.data.title,
            subtitle: self.data.subtitle,
            author: self.data.author,
        })
    }

    /// Full post; `None` for documents without a uid
    pub fn into_post(self) -> Option<Post> {
        let Some(uid) = self.uid else {
            tracing::warn!("Skipping document {} without uid", self.id);
            return None;
        };
        Some(Post {
            id: self.id,
            uid,
            first_publication_date: self.first_publication_date,
            last_publication_date: self.last_publication_date,
            title: self.data.title,
            subtitle: self.data.subtitle,
            author: self.data.author,
            banner: self.data.banner,
            content: self.data.content,
        })
    }
}

/// Body of a `documents/search` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub total_pages: usize,
    #[serde(default)]
    pub total_results_size: usize,
    #[serde(default)]
    pub next_page: Option<String>,
    #[serde(default)]
    pub results: Vec<Document>,
}

impl SearchResponse {
    /// Listing page with routable documents only
    pub fn into_page(self) -> PostsPage {
        PostsPage {
            results: self
                .results
                .into_iter()
                .filter_map(Document::into_summary)
                .collect(),
            next_page: self.next_page.filter(|cursor| !cursor.is_empty()),
        }
    }
}

/// Parse a CMS timestamp (`2021-03-15T19:25:28+0000`, or RFC 3339)
pub fn parse_cms_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

fn deserialize_cms_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(value) => parse_cms_date(&value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date {:?}", value))),
    }
}
