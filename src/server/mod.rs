//! Blog server with preview mode
//!
//! Generated files are served as they are. Requests carrying the preview
//! cookie are rendered live against the preview ref, as are posts published
//! after the last generation.

mod error;

pub use error::{AppError, AppResult};

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::get,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{services::ServeDir, services::ServeFile, trace::TraceLayer};

use crate::cms::{resolve_adjacent, ContentSource, SearchQuery};
use crate::generator::{post_dir, Generator};
use crate::helpers::post_path;
use crate::templates::{CardPage, TemplateRenderer};
use crate::Blog;

/// Server state shared by all handlers
pub struct AppState {
    blog: Blog,
    source: Arc<dyn ContentSource>,
    renderer: TemplateRenderer,
}

impl AppState {
    pub fn new(blog: &Blog, source: Arc<dyn ContentSource>) -> Result<Self> {
        Ok(Self {
            renderer: TemplateRenderer::new(&blog.config)?,
            blog: blog.clone(),
            source,
        })
    }

    fn document_type(&self) -> &str {
        &self.blog.config.cms.document_type
    }

    /// Preview ref carried by the request, if any
    fn preview_ref(&self, jar: &CookieJar) -> Option<String> {
        jar.get(&self.blog.config.preview.cookie_name)
            .map(|cookie| percent_decode_str(cookie.value()).decode_utf8_lossy().into_owned())
            .filter(|token| !token.is_empty())
    }

    fn preview_cookie(&self, token: &str) -> AppResult<Cookie<'static>> {
        let preview = &self.blog.config.preview;
        let raw = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            preview.cookie_name,
            utf8_percent_encode(token, NON_ALPHANUMERIC),
            preview.max_age.max(0) * 60
        );
        Cookie::parse(raw)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Invalid preview cookie: {}", e)))
    }

    /// Live "load more" URL for a CMS cursor
    fn cursor_url(&self, cursor: &str) -> String {
        format!(
            "{}?cursor={}",
            self.renderer.helpers().url_for("api/posts"),
            utf8_percent_encode(cursor, NON_ALPHANUMERIC)
        )
    }

    fn not_found(&self) -> AppResult<Response> {
        let html = self.renderer.render_not_found()?;
        Ok((StatusCode::NOT_FOUND, Html(html)).into_response())
    }
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    let public_dir = state.blog.public_dir.clone();
    let static_files = ServeDir::new(&public_dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(public_dir.join("404.html")));

    Router::new()
        .route("/", get(home_handler))
        .route("/post/:slug", get(post_handler))
        .route("/post/:slug/", get(post_handler))
        .route("/api/posts", get(load_more_handler))
        .route("/api/preview", get(preview_handler))
        .route("/api/exit-preview", get(exit_preview_handler))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, source: Arc<dyn ContentSource>, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(AppState::new(blog, source.clone())?);
    let app = router(state);

    if blog.config.revalidate > 0 {
        spawn_revalidation(
            blog.clone(),
            source,
            Duration::from_secs(blog.config.revalidate),
        );
    }

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Regenerate the site in the background every `interval`
pub fn spawn_revalidation(
    blog: Blog,
    source: Arc<dyn ContentSource>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tracing::info!("Revalidating every {}s", interval.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let generator = match Generator::new(&blog, source.clone()) {
                Ok(generator) => generator,
                Err(e) => {
                    tracing::error!("Revalidation failed: {:#}", e);
                    continue;
                }
            };
            match generator.generate().await {
                Ok(report) => tracing::info!("Revalidated {} posts", report.posts),
                Err(e) => tracing::error!("Revalidation failed: {:#}", e),
            }
        }
    })
}

async fn home_handler(State(state): State<Arc<AppState>>, jar: CookieJar) -> AppResult<Response> {
    let preview = state.preview_ref(&jar);

    if preview.is_none() {
        let index = state.blog.public_dir.join("index.html");
        if let Ok(html) = tokio::fs::read_to_string(&index).await {
            return Ok(Html(html).into_response());
        }
    }

    let query = SearchQuery::listing(state.document_type(), state.blog.config.per_page);
    let page = state.source.search(&query, preview.as_deref()).await?;
    let next_page = page.next_page.as_deref().map(|c| state.cursor_url(c));

    let html = state
        .renderer
        .render_home(&page.results, next_page.as_deref(), preview.is_some())?;
    Ok(Html(html).into_response())
}

async fn post_handler(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> AppResult<Response> {
    let preview = state.preview_ref(&jar);

    let Some(dir) = post_dir(&state.blog.public_dir, &slug) else {
        return state.not_found();
    };

    if preview.is_none() {
        if let Ok(html) = tokio::fs::read_to_string(dir.join("index.html")).await {
            return Ok(Html(html).into_response());
        }
    }

    let Some(post) = state.source.get_by_uid(&slug, preview.as_deref()).await? else {
        tracing::debug!("Post {:?} not found", slug);
        return state.not_found();
    };

    let adjacent = resolve_adjacent(
        state.source.as_ref(),
        state.document_type(),
        &post.summary(),
        preview.as_deref(),
    )
    .await?;

    let html = state
        .renderer
        .render_post(&post, &adjacent, preview.is_some())?;
    Ok(Html(html).into_response())
}

#[derive(Debug, Deserialize)]
struct LoadMoreParams {
    cursor: Option<String>,
}

async fn load_more_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LoadMoreParams>,
) -> AppResult<Json<CardPage>> {
    let cursor = params
        .cursor
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing cursor".to_string()))?;

    let page = state.source.fetch_page(&cursor).await?;
    let results = page
        .results
        .iter()
        .map(|post| state.renderer.render_card(post))
        .collect::<Result<Vec<_>>>()?;

    Ok(Json(CardPage {
        results,
        next_page: page.next_page.as_deref().map(|c| state.cursor_url(c)),
    }))
}

#[derive(Debug, Deserialize)]
struct PreviewParams {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

async fn preview_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PreviewParams>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    let token = params
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing preview token".to_string()))?;

    let helpers = state.renderer.helpers();
    let mut location = helpers.url_for("");
    if let Some(id) = params.document_id.as_deref().filter(|id| !id.is_empty()) {
        match state.source.get_by_id(id, Some(&token)).await? {
            Some(post) => location = helpers.url_for(&post_path(&post.uid)),
            None => tracing::warn!("Preview document {:?} not found", id),
        }
    }

    tracing::info!("Entering preview mode, redirecting to {}", location);
    let cookie = state.preview_cookie(&token)?;
    Ok((jar.add(cookie), Redirect::to(&location)))
}

async fn exit_preview_handler(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Redirect) {
    let mut cookie = Cookie::build((state.blog.config.preview.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();
    cookie.make_removal();

    let root = state.renderer.helpers().url_for("");
    (jar.add(cookie), Redirect::to(&root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::sample_source;
    use crate::config::SiteConfig;
    use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
    use tempfile::TempDir;

    struct TestServer {
        base: String,
        client: reqwest::Client,
        source: Arc<dyn ContentSource>,
        blog: Blog,
        _dir: TempDir,
    }

    async fn generate(blog: &Blog, source: Arc<dyn ContentSource>) {
        Generator::new(blog, source)
            .unwrap()
            .generate()
            .await
            .unwrap();
    }

    async fn serve(count: usize, generate_first: bool) -> TestServer {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        let source: Arc<dyn ContentSource> = Arc::new(sample_source(count));

        if generate_first {
            generate(&blog, source.clone()).await;
        }

        serve_blog(dir, blog, source).await
    }

    async fn serve_blog(dir: TempDir, blog: Blog, source: Arc<dyn ContentSource>) -> TestServer {
        let state = Arc::new(AppState::new(&blog, source.clone()).unwrap());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        TestServer {
            base: format!("http://{}", addr),
            client,
            source,
            blog,
            _dir: dir,
        }
    }

    impl TestServer {
        async fn get(&self, path: &str) -> reqwest::Response {
            self.client
                .get(format!("{}{}", self.base, path))
                .send()
                .await
                .unwrap()
        }

        async fn get_with_preview(&self, path: &str, token: &str) -> reqwest::Response {
            self.client
                .get(format!("{}{}", self.base, path))
                .header(COOKIE, format!("io.prismic.preview={}", token))
                .send()
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn test_serves_generated_pages() {
        let server = serve(3, true).await;

        let home = server.get("/").await;
        assert_eq!(home.status(), StatusCode::OK);
        assert!(home.text().await.unwrap().contains("Post 3"));

        let post = server.get("/post/post-2/").await;
        assert_eq!(post.status(), StatusCode::OK);
        assert!(post.text().await.unwrap().contains("<h2>Heading 2</h2>"));

        let css = server.get("/css/style.css").await;
        assert_eq!(css.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_renders_live_without_output() {
        let server = serve(7, false).await;

        let home = server.get("/").await.text().await.unwrap();
        assert!(home.contains("Post 7"));
        assert!(home.contains(r#"data-next-page="/api/posts?cursor=fixture"#));

        let post = server.get("/post/post-4").await;
        assert_eq!(post.status(), StatusCode::OK);
        let html = post.text().await.unwrap();
        assert!(html.contains(r#"href="/post/post-3/""#));
        assert!(html.contains(r#"href="/post/post-5/""#));
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let server = serve(2, false).await;
        let response = server.get("/post/nope/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.text().await.unwrap().contains("Post não encontrado"));
    }

    #[tokio::test]
    async fn test_deleted_post_is_gone_after_regeneration() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        generate(&blog, Arc::new(sample_source(3))).await;

        let server = serve_blog(dir, blog, Arc::new(sample_source(2))).await;
        generate(&server.blog, server.source.clone()).await;

        let response = server.get("/post/post-3/").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(server.get("/post/post-2/").await.status(), StatusCode::OK);
    }

    #[tokio::test(start_paused = true)]
    async fn test_revalidation_regenerates_on_tick() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::with_config(dir.path(), SiteConfig::default());
        let source: Arc<dyn ContentSource> = Arc::new(sample_source(2));
        let index = blog.public_dir.join("index.html");

        let task = spawn_revalidation(blog.clone(), source, Duration::from_secs(60));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!index.exists());

        for _ in 0..10 {
            if index.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        assert!(index.exists());
        assert!(blog.public_dir.join("post/post-2/index.html").exists());

        task.abort();
    }

    #[tokio::test]
    async fn test_load_more() {
        let server = serve(7, false).await;
        let first = server
            .source
            .search(&SearchQuery::listing("posts", 5), None)
            .await
            .unwrap();
        let cursor = first.next_page.unwrap();

        let response = server
            .client
            .get(format!("{}/api/posts", server.base))
            .query(&[("cursor", cursor.as_str())])
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let page: serde_json::Value = response.json().await.unwrap();
        let uids: Vec<&str> = page["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["uid"].as_str().unwrap())
            .collect();
        assert_eq!(uids, vec!["post-2", "post-1"]);
        assert!(page["next_page"].is_null());
    }

    #[tokio::test]
    async fn test_load_more_rejects_bad_cursors() {
        let server = serve(2, false).await;

        let foreign = server
            .get("/api/posts?cursor=https%3A%2F%2Fevil.example.com%2Fapi")
            .await;
        assert_eq!(foreign.status(), StatusCode::BAD_REQUEST);

        let missing = server.get("/api/posts").await;
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_flow() {
        let server = serve(3, true).await;

        let enter = server.get("/api/preview?token=draft-ref&documentId=ID2").await;
        assert!(enter.status().is_redirection());
        assert_eq!(enter.headers()[LOCATION], "/post/post-2/");
        let cookie = enter.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("io.prismic.preview=draft%2Dref"));
        assert!(cookie.contains("Max-Age=1800"));

        let home = server
            .get_with_preview("/", "draft%2Dref")
            .await
            .text()
            .await
            .unwrap();
        assert!(home.contains("Sair do modo Preview"));

        let post = server
            .get_with_preview("/post/post-2/", "draft%2Dref")
            .await
            .text()
            .await
            .unwrap();
        assert!(post.contains("Sair do modo Preview"));

        let exit = server.get("/api/exit-preview").await;
        assert!(exit.status().is_redirection());
        assert_eq!(exit.headers()[LOCATION], "/");
        let cleared = exit.headers()[SET_COOKIE].to_str().unwrap();
        assert!(cleared.starts_with("io.prismic.preview="));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_preview_requires_token() {
        let server = serve(1, false).await;
        let response = server.get("/api/preview?documentId=ID1").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview_unknown_document_redirects_home() {
        let server = serve(1, false).await;
        let response = server.get("/api/preview?token=t&documentId=missing").await;
        assert_eq!(response.headers()[LOCATION], "/");
    }
}
