//! Content backend access
//!
//! Blog content lives in a headless CMS. [`ContentSource`] is the seam the
//! generator and the preview server talk to; [`PrismicClient`] speaks the
//! Prismic REST API and [`FixtureSource`] answers the same queries from a
//! JSON export.

mod adjacent;
mod document;
mod error;
mod fixture;
mod prismic;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use adjacent::resolve_adjacent;
pub use document::{parse_cms_date, Document, PostFields, SearchResponse};
pub use error::{CmsError, CmsResult};
pub use fixture::FixtureSource;
pub use prismic::PrismicClient;

#[cfg(test)]
pub(crate) use fixture::tests::sample_source;

use crate::content::{Post, PostsPage};

/// Read access to blog posts
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a listing query, optionally against a preview ref
    async fn search(&self, query: &SearchQuery, preview: Option<&str>) -> CmsResult<PostsPage>;

    /// Follow a cursor returned by an earlier page
    async fn fetch_page(&self, cursor: &str) -> CmsResult<PostsPage>;

    /// Fetch one post by its uid
    async fn get_by_uid(&self, uid: &str, preview: Option<&str>) -> CmsResult<Option<Post>>;

    /// Fetch one post by its document id
    async fn get_by_id(&self, id: &str, preview: Option<&str>) -> CmsResult<Option<Post>>;
}

/// Field the listing and neighbour queries order by
pub const PUBLICATION_DATE: &str = "document.first_publication_date";
/// Tie-break for documents published at the same instant
pub const DOCUMENT_ID: &str = "document.id";

/// A single query predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    At { path: String, value: String },
    DateAfter { path: String, millis: i64 },
    DateBefore { path: String, millis: i64 },
}

impl Predicate {
    /// Predicate in the API's query syntax
    pub fn to_query(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                format!("[at({}, \"{}\")]", path, escape_query_string(value))
            }
            Predicate::DateAfter { path, millis } => format!("[date.after({}, {})]", path, millis),
            Predicate::DateBefore { path, millis } => {
                format!("[date.before({}, {})]", path, millis)
            }
        }
    }
}

/// Quote-safe string literal body for the predicate syntax
fn escape_query_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Sort order by publication date, then document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Ordering {
    PublishedAsc,
    PublishedDesc,
}

impl Ordering {
    pub fn to_query(self) -> String {
        match self {
            Ordering::PublishedAsc => format!("[{},{}]", PUBLICATION_DATE, DOCUMENT_ID),
            Ordering::PublishedDesc => {
                format!("[{} desc,{} desc]", PUBLICATION_DATE, DOCUMENT_ID)
            }
        }
    }
}

/// A field-filtered search over the CMS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub predicates: Vec<Predicate>,
    pub page_size: usize,
    pub ordering: Option<Ordering>,
    pub fetch: Vec<String>,
    /// 1-based page number
    pub page: usize,
}

impl SearchQuery {
    /// All documents of a custom type
    pub fn documents(document_type: &str) -> Self {
        Self {
            predicates: vec![Predicate::At {
                path: "document.type".to_string(),
                value: document_type.to_string(),
            }],
            page_size: 20,
            ordering: None,
            fetch: Vec::new(),
            page: 1,
        }
    }

    /// Home page listing: summary fields only, newest first
    pub fn listing(document_type: &str, page_size: usize) -> Self {
        Self::documents(document_type)
            .page_size(page_size)
            .ordering(Ordering::PublishedDesc)
            .fetch(
                ["title", "subtitle", "author"]
                    .iter()
                    .map(|field| format!("{}.{}", document_type, field)),
            )
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn ordering(mut self, ordering: Ordering) -> Self {
        self.ordering = Some(ordering);
        self
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Documents first published strictly after `date`
    pub fn published_after(self, date: DateTime<Utc>) -> Self {
        self.with_predicate(Predicate::DateAfter {
            path: PUBLICATION_DATE.to_string(),
            millis: date.timestamp_millis(),
        })
    }

    /// Documents first published strictly before `date`
    pub fn published_before(self, date: DateTime<Utc>) -> Self {
        self.with_predicate(Predicate::DateBefore {
            path: PUBLICATION_DATE.to_string(),
            millis: date.timestamp_millis(),
        })
    }

    /// Documents first published at or after `date` (millisecond precision)
    pub fn published_since(self, date: DateTime<Utc>) -> Self {
        self.with_predicate(Predicate::DateAfter {
            path: PUBLICATION_DATE.to_string(),
            millis: date.timestamp_millis() - 1,
        })
    }

    /// Documents first published at or before `date` (millisecond precision)
    pub fn published_until(self, date: DateTime<Utc>) -> Self {
        self.with_predicate(Predicate::DateBefore {
            path: PUBLICATION_DATE.to_string(),
            millis: date.timestamp_millis() + 1,
        })
    }

    /// The `q` parameter
    pub fn to_query(&self) -> String {
        let predicates: String = self.predicates.iter().map(Predicate::to_query).collect();
        format!("[{}]", predicates)
    }
}
