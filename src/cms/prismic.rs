//! Prismic REST API client

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::document::SearchResponse;
use super::error::{CmsError, CmsResult};
use super::{ContentSource, Predicate, SearchQuery};
use crate::config::CmsConfig;
use crate::content::{Post, PostsPage};

/// How long a resolved master ref is reused
const REF_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct ApiRootDto {
    #[serde(default)]
    refs: Vec<ApiRefDto>,
}

#[derive(Debug, Deserialize)]
struct ApiRefDto {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master: bool,
}

/// HTTP client for a Prismic repository
#[derive(Debug)]
pub struct PrismicClient {
    endpoint: String,
    access_token: Option<String>,
    document_type: String,
    client: Client,
    master_ref: Mutex<Option<(String, Instant)>>,
}

impl PrismicClient {
    /// Create a client for the configured API root
    pub fn new(config: &CmsConfig) -> CmsResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout.max(1)))
            .build()?;

        Ok(Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            document_type: config.document_type.clone(),
            client,
            master_ref: Mutex::new(None),
        })
    }

    /// Whether a cursor points at this repository
    pub fn owns_cursor(&self, cursor: &str) -> bool {
        cursor
            .strip_prefix(&self.endpoint)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    fn with_token(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.query(&[("access_token", token.as_str())]),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> CmsResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::from_status(status, body));
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The preview ref when given, the (briefly cached) master ref otherwise
    async fn content_ref(&self, preview: Option<&str>) -> CmsResult<String> {
        if let Some(preview) = preview {
            return Ok(preview.to_string());
        }

        if let Ok(cached) = self.master_ref.lock() {
            if let Some((reference, at)) = cached.as_ref() {
                if at.elapsed() < REF_TTL {
                    return Ok(reference.clone());
                }
            }
        }

        let root: ApiRootDto = self
            .get_json(self.with_token(self.client.get(&self.endpoint)))
            .await?;
        let reference = root
            .refs
            .into_iter()
            .find(|r| r.is_master)
            .map(|r| r.reference)
            .ok_or_else(|| CmsError::MissingRef(self.endpoint.clone()))?;

        tracing::debug!("Resolved master ref {}", reference);
        if let Ok(mut cached) = self.master_ref.lock() {
            *cached = Some((reference.clone(), Instant::now()));
        }
        Ok(reference)
    }

    async fn search_documents(
        &self,
        query: &SearchQuery,
        preview: Option<&str>,
    ) -> CmsResult<SearchResponse> {
        let reference = self.content_ref(preview).await?;

        let mut params: Vec<(&str, String)> = vec![
            ("ref", reference),
            ("q", query.to_query()),
            ("pageSize", query.page_size.to_string()),
        ];
        if let Some(ordering) = query.ordering {
            params.push(("orderings", ordering.to_query()));
        }
        if !query.fetch.is_empty() {
            params.push(("fetch", query.fetch.join(",")));
        }
        if query.page > 1 {
            params.push(("page", query.page.to_string()));
        }

        tracing::debug!("CMS search {}", query.to_query());
        let request = self
            .client
            .get(self.endpoint("documents/search"))
            .query(&params);
        self.get_json(self.with_token(request)).await
    }

    async fn get_single(
        &self,
        predicate: Predicate,
        preview: Option<&str>,
    ) -> CmsResult<Option<Post>> {
        let query = SearchQuery::documents(&self.document_type)
            .with_predicate(predicate)
            .page_size(1);
        let response = self.search_documents(&query, preview).await?;
        Ok(response
            .results
            .into_iter()
            .next()
            .and_then(|doc| doc.into_post()))
    }
}

#[async_trait]
impl ContentSource for PrismicClient {
    async fn search(&self, query: &SearchQuery, preview: Option<&str>) -> CmsResult<PostsPage> {
        Ok(self.search_documents(query, preview).await?.into_page())
    }

    async fn fetch_page(&self, cursor: &str) -> CmsResult<PostsPage> {
        if !self.owns_cursor(cursor) {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }

        let mut request = self.client.get(cursor);
        if !cursor.contains("access_token=") {
            request = self.with_token(request);
        }
        let response: SearchResponse = self.get_json(request).await?;
        Ok(response.into_page())
    }

    async fn get_by_uid(&self, uid: &str, preview: Option<&str>) -> CmsResult<Option<Post>> {
        let predicate = Predicate::At {
            path: format!("my.{}.uid", self.document_type),
            value: uid.to_string(),
        };
        self.get_single(predicate, preview).await
    }

    async fn get_by_id(&self, id: &str, preview: Option<&str>) -> CmsResult<Option<Post>> {
        let predicate = Predicate::At {
            path: "document.id".to_string(),
            value: id.to_string(),
        };
        self.get_single(predicate, preview).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PrismicClient {
        PrismicClient::new(&CmsConfig {
            endpoint: "https://blog.cdn.prismic.io/api/v2/".to_string(),
            ..CmsConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_owns_cursor() {
        let client = client();
        assert!(client.owns_cursor(
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=X&page=2"
        ));
        assert!(!client.owns_cursor("https://evil.example.com/api/v2/documents/search"));
        assert!(!client.owns_cursor("https://blog.cdn.prismic.io/api/v2.evil.com/x"));
        assert!(!client.owns_cursor("fixture:{}"));
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(
            client().endpoint("/documents/search"),
            "https://blog.cdn.prismic.io/api/v2/documents/search"
        );
    }

    #[tokio::test]
    async fn test_foreign_cursor_is_rejected_without_request() {
        let result = client().fetch_page("http://169.254.169.254/latest").await;
        assert!(matches!(result, Err(CmsError::InvalidCursor(_))));
    }
}
