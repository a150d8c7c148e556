//! In-memory content source backed by a JSON export of documents

use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering as CmpOrdering;
use std::fs;
use std::path::Path;

use super::document::{Document, SearchResponse};
use super::error::{CmsError, CmsResult};
use super::{ContentSource, Ordering, Predicate, SearchQuery, PUBLICATION_DATE};
use crate::content::{Post, PostsPage};

/// Prefix of cursors issued by [`FixtureSource`]
const CURSOR_PREFIX: &str = "fixture:";

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureFile {
    List(Vec<Document>),
    Export { results: Vec<Document> },
}

/// Answers CMS queries from a fixed set of documents.
///
/// Preview refs are ignored: a fixture only holds one version of each
/// document.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    documents: Vec<Document>,
    document_type: String,
}

impl FixtureSource {
    /// Create a source from already-parsed documents
    pub fn new(documents: Vec<Document>, document_type: &str) -> Self {
        Self {
            documents,
            document_type: document_type.to_string(),
        }
    }

    /// Parse a fixture: either a document array or a `{"results": [...]}` export
    pub fn from_json(json: &str, document_type: &str) -> CmsResult<Self> {
        let documents = match serde_json::from_str::<FixtureFile>(json)? {
            FixtureFile::List(documents) => documents,
            FixtureFile::Export { results } => results,
        };
        Ok(Self::new(documents, document_type))
    }

    /// Load a fixture file
    pub fn load<P: AsRef<Path>>(path: P, document_type: &str) -> CmsResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| CmsError::Fixture(format!("{}: {}", path.display(), e)))?;
        let source = Self::from_json(&json, document_type)?;
        tracing::info!(
            "Loaded {} documents from fixture {:?}",
            source.documents.len(),
            path
        );
        Ok(source)
    }

    fn matches(&self, doc: &Document, predicate: &Predicate) -> bool {
        let uid_path = format!("my.{}.uid", self.document_type);
        match predicate {
            Predicate::At { path, value } => match path.as_str() {
                "document.type" => doc.doc_type == *value,
                "document.id" => doc.id == *value,
                p if p == uid_path => doc.uid.as_deref() == Some(value.as_str()),
                _ => false,
            },
            Predicate::DateAfter { path, millis } if path == PUBLICATION_DATE => doc
                .first_publication_date
                .is_some_and(|d| d.timestamp_millis() > *millis),
            Predicate::DateBefore { path, millis } if path == PUBLICATION_DATE => doc
                .first_publication_date
                .is_some_and(|d| d.timestamp_millis() < *millis),
            _ => false,
        }
    }

    fn run(&self, query: &SearchQuery) -> SearchResponse {
        let mut hits: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| query.predicates.iter().all(|p| self.matches(doc, p)))
            .collect();

        if let Some(ordering) = query.ordering {
            // Undated documents sort last either way; ties break on id
            hits.sort_by(|a, b| {
                match (a.first_publication_date, b.first_publication_date) {
                    (Some(x), Some(y)) => match ordering {
                        Ordering::PublishedAsc => x.cmp(&y).then_with(|| a.id.cmp(&b.id)),
                        Ordering::PublishedDesc => y.cmp(&x).then_with(|| b.id.cmp(&a.id)),
                    },
                    (Some(_), None) => CmpOrdering::Less,
                    (None, Some(_)) => CmpOrdering::Greater,
                    (None, None) => CmpOrdering::Equal,
                }
            });
        }

        let page_size = query.page_size.max(1);
        let page = query.page.max(1);
        let total = hits.len();
        let total_pages = total.div_ceil(page_size);
        let start = (page - 1).saturating_mul(page_size).min(total);
        let end = (start + page_size).min(total);

        let next_page = (page < total_pages).then(|| {
            let mut next = query.clone();
            next.page = page + 1;
            encode_cursor(&next)
        });

        SearchResponse {
            page,
            total_pages,
            total_results_size: total,
            next_page,
            results: hits[start..end].iter().map(|doc| (*doc).clone()).collect(),
        }
    }

    fn single(&self, predicate: Predicate) -> Option<Post> {
        let query = SearchQuery::documents(&self.document_type)
            .with_predicate(predicate)
            .page_size(1);
        self.run(&query)
            .results
            .into_iter()
            .next()
            .and_then(Document::into_post)
    }
}

fn encode_cursor(query: &SearchQuery) -> String {
    // SearchQuery holds only strings and integers, serialization cannot fail
    format!(
        "{}{}",
        CURSOR_PREFIX,
        serde_json::to_string(query).unwrap_or_default()
    )
}

fn decode_cursor(cursor: &str) -> CmsResult<SearchQuery> {
    cursor
        .strip_prefix(CURSOR_PREFIX)
        .and_then(|json| serde_json::from_str(json).ok())
        .ok_or_else(|| CmsError::InvalidCursor(cursor.to_string()))
}

#[async_trait]
impl ContentSource for FixtureSource {
    async fn search(&self, query: &SearchQuery, _preview: Option<&str>) -> CmsResult<PostsPage> {
        Ok(self.run(query).into_page())
    }

    async fn fetch_page(&self, cursor: &str) -> CmsResult<PostsPage> {
        let query = decode_cursor(cursor)?;
        Ok(self.run(&query).into_page())
    }

    async fn get_by_uid(&self, uid: &str, _preview: Option<&str>) -> CmsResult<Option<Post>> {
        Ok(self.single(Predicate::At {
            path: format!("my.{}.uid", self.document_type),
            value: uid.to_string(),
        }))
    }

    async fn get_by_id(&self, id: &str, _preview: Option<&str>) -> CmsResult<Option<Post>> {
        Ok(self.single(Predicate::At {
            path: "document.id".to_string(),
            value: id.to_string(),
        }))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// `count` posts, `post-1` oldest, published one day apart
    pub(crate) fn sample_source(count: usize) -> FixtureSource {
        let documents: Vec<serde_json::Value> = (1..=count)
            .map(|i| {
                serde_json::json!({
                    "id": format!("ID{}", i),
                    "uid": format!("post-{}", i),
                    "type": "posts",
                    "first_publication_date": format!("2021-03-{:02}T12:00:00+0000", i),
                    "last_publication_date": format!("2021-03-{:02}T12:00:00+0000", i),
                    "data": {
                        "title": format!("Post {}", i),
                        "subtitle": format!("Subtitle {}", i),
                        "author": "Ana",
                        "banner": { "url": format!("https://images.example.com/{}.png", i) },
                        "content": [
                            {
                                "heading": format!("Heading {}", i),
                                "body": [ { "type": "paragraph", "text": "lorem ipsum dolor", "spans": [] } ]
                            }
                        ]
                    }
                })
            })
            .collect();
        FixtureSource::from_json(&serde_json::Value::Array(documents).to_string(), "posts")
            .unwrap()
    }

    fn uids(page: &PostsPage) -> Vec<&str> {
        page.results.iter().map(|p| p.uid.as_str()).collect()
    }

    #[tokio::test]
    async fn test_listing_is_newest_first_and_paginated() {
        let source = sample_source(7);
        let page = source
            .search(&SearchQuery::listing("posts", 5), None)
            .await
            .unwrap();
        assert_eq!(
            uids(&page),
            vec!["post-7", "post-6", "post-5", "post-4", "post-3"]
        );

        let cursor = page.next_page.expect("second page");
        let second = source.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["post-2", "post-1"]);
        assert!(second.next_page.is_none());
    }

    #[tokio::test]
    async fn test_exact_page_has_no_cursor() {
        let source = sample_source(5);
        let page = source
            .search(&SearchQuery::listing("posts", 5), None)
            .await
            .unwrap();
        assert_eq!(page.results.len(), 5);
        assert!(page.next_page.is_none());
    }

    #[tokio::test]
    async fn test_get_by_uid_and_id() {
        let source = sample_source(3);
        let post = source.get_by_uid("post-2", None).await.unwrap().unwrap();
        assert_eq!(post.id, "ID2");
        assert_eq!(post.content[0].heading, "Heading 2");

        let by_id = source.get_by_id("ID3", None).await.unwrap().unwrap();
        assert_eq!(by_id.uid, "post-3");

        assert!(source.get_by_uid("missing", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let source = sample_source(1);
        for cursor in ["https://blog.cdn.prismic.io/api/v2", "fixture:not-json"] {
            assert!(matches!(
                source.fetch_page(cursor).await,
                Err(CmsError::InvalidCursor(_))
            ));
        }
    }

    #[test]
    fn test_export_format() {
        let source = FixtureSource::from_json(
            r#"{ "results": [ { "id": "A", "uid": "a", "type": "posts" } ] }"#,
            "posts",
        )
        .unwrap();
        assert_eq!(source.documents.len(), 1);
    }
}
