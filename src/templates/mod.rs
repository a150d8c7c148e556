//! Built-in spacetraveling theme using the Tera template engine
//!
//! Templates and static assets are embedded in the binary. Autoescaping is
//! off: every value coming from the CMS is escaped while building the view
//! structs below, and pre-rendered markup (rich text, widget scripts) is
//! passed through untouched.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::content::{self, richtext, Adjacent, Post, PostLink, PostSummary};
use crate::helpers::{date_xml, escape_html, open_graph, post_path, Helpers};

/// Stylesheet written to `css/style.css`
pub const STYLE_CSS: &str = include_str!("spacetraveling/assets/style.css");
/// Load-more client written to `js/load-more.js`
pub const LOAD_MORE_JS: &str = include_str!("spacetraveling/assets/load-more.js");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
    helpers: Helpers,
    site: SiteData,
    labels: Labels,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            (
                "not_found.html",
                include_str!("spacetraveling/not_found.html"),
            ),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("spacetraveling/partials/post_card.html"),
            ),
            (
                "partials/post_nav.html",
                include_str!("spacetraveling/partials/post_nav.html"),
            ),
            (
                "partials/preview_button.html",
                include_str!("spacetraveling/partials/preview_button.html"),
            ),
        ])?;

        let helpers = Helpers::new(config.clone());
        let site = SiteData {
            title: escape_html(&config.title),
            description: escape_html(&config.description),
            language: escape_html(&config.language),
            root: helpers.url_for(""),
            logo: helpers.url_for("images/logo.svg"),
            exit_preview: helpers.url_for("api/exit-preview"),
            stylesheet: helpers.css("style.css"),
            script: helpers.js("load-more.js"),
        };

        Ok(Self {
            tera,
            labels: Labels::for_language(&config.language),
            helpers,
            site,
        })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    pub fn helpers(&self) -> &Helpers {
        &self.helpers
    }

    fn base_context(&self, preview: bool) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("labels", &self.labels);
        context.insert("preview", &preview);
        context
    }

    /// Listing card for a post summary
    pub fn post_card(&self, post: &PostSummary) -> PostCard {
        PostCard {
            uid: post.uid.clone(),
            url: escape_html(&self.helpers.post_url(&post.uid)),
            title: escape_html(&post.title),
            subtitle: escape_html(&post.subtitle),
            author: escape_html(&post.author),
            date: self.helpers.date(post.first_publication_date.as_ref()),
        }
    }

    /// Card markup as inserted by the load-more client
    pub fn render_card(&self, post: &PostSummary) -> Result<RenderedCard> {
        let card = self.post_card(post);
        let mut context = self.base_context(false);
        context.insert("post", &card);
        let html = self.render("partials/post_card.html", &context)?;
        Ok(RenderedCard { card, html })
    }

    /// Home page: the first listing page and, when more pages exist, a
    /// load-more control pointing at `next_page`
    pub fn render_home(
        &self,
        posts: &[PostSummary],
        next_page: Option<&str>,
        preview: bool,
    ) -> Result<String> {
        let cards: Vec<PostCard> = posts.iter().map(|p| self.post_card(p)).collect();

        let mut context = self.base_context(preview);
        context.insert("posts", &cards);
        context.insert("next_page", &next_page.map(escape_html));
        self.render("index.html", &context)
    }

    /// A post page with neighbour links and comments
    pub fn render_post(&self, post: &Post, adjacent: &Adjacent, preview: bool) -> Result<String> {
        let view = self.post_view(post);
        let og = open_graph(
            &post.title,
            &post.subtitle,
            &self.helpers.full_url_for(&post_path(&post.uid)),
            post.banner.url.as_deref(),
            &self.helpers.config().title,
        );

        let mut context = self.base_context(preview);
        context.insert("post", &view);
        context.insert("open_graph", &og);
        context.insert("prev_post", &adjacent.prev.as_ref().map(|p| self.nav(p)));
        context.insert("next_post", &adjacent.next.as_ref().map(|p| self.nav(p)));
        context.insert("comments", &self.helpers.comments());
        self.render("post.html", &context)
    }

    /// Page shown for unknown posts
    pub fn render_not_found(&self) -> Result<String> {
        self.render("not_found.html", &self.base_context(false))
    }

    fn post_view(&self, post: &Post) -> PostView {
        let sections = post
            .content
            .iter()
            .map(|section| SectionView {
                heading: escape_html(&section.heading),
                html: richtext::as_html(&section.body),
            })
            .collect();

        let edited = post
            .last_publication_date
            .as_ref()
            .filter(|_| post.is_edited())
            .map(|d| escape_html(&self.helpers.edited(d)));

        PostView {
            uid: post.uid.clone(),
            title: escape_html(&post.title),
            subtitle: escape_html(&post.subtitle),
            author: escape_html(&post.author),
            date: self.helpers.date(post.first_publication_date.as_ref()),
            datetime: post
                .first_publication_date
                .as_ref()
                .map(date_xml)
                .unwrap_or_default(),
            edited,
            reading_time: content::reading_time(&post.content),
            banner_url: post.banner.url.as_deref().map(escape_html),
            banner_alt: escape_html(post.banner.alt.as_deref().unwrap_or(&post.title)),
            sections,
        }
    }

    fn nav(&self, link: &PostLink) -> NavPost {
        NavPost {
            title: escape_html(&link.title),
            url: escape_html(&self.helpers.post_url(&link.uid)),
        }
    }
}

/// UI strings
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub load_more: &'static str,
    pub load_failed: &'static str,
    pub previous: &'static str,
    pub next: &'static str,
    pub exit_preview: &'static str,
    pub not_found: &'static str,
    pub back_home: &'static str,
}

impl Labels {
    pub fn for_language(language: &str) -> Self {
        if language.to_ascii_lowercase().starts_with("pt") {
            Self {
                load_more: "Carregar mais posts",
                load_failed: "Falha ao carregar posts, tente novamente",
                previous: "Post anterior",
                next: "Próximo post",
                exit_preview: "Sair do modo Preview",
                not_found: "Post não encontrado",
                back_home: "Voltar para a home",
            }
        } else {
            Self {
                load_more: "Load more posts",
                load_failed: "Failed to load posts, try again",
                previous: "Previous post",
                next: "Next post",
                exit_preview: "Exit preview mode",
                not_found: "Post not found",
                back_home: "Back to home",
            }
        }
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub description: String,
    pub language: String,
    pub root: String,
    pub logo: String,
    pub exit_preview: String,
    pub stylesheet: String,
    pub script: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostCard {
    pub uid: String,
    pub url: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
}

/// A card plus its markup, as served to the load-more client
#[derive(Debug, Clone, Serialize)]
pub struct RenderedCard {
    #[serde(flatten)]
    pub card: PostCard,
    pub html: String,
}

/// One page of the load-more feed
#[derive(Debug, Clone, Serialize)]
pub struct CardPage {
    pub results: Vec<RenderedCard>,
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub uid: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub edited: Option<String>,
    pub reading_time: usize,
    pub banner_url: Option<String>,
    pub banner_alt: String,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionView {
    pub heading: String,
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub url: String,
}
