//! HTML helper functions

use super::url::url_for;
use crate::config::SiteConfig;

/// Generate a CSS link tag
///
/// # Examples
/// ```ignore
/// css(&config, "style.css") // -> <link rel="stylesheet" href="/blog/css/style.css">
/// ```
pub fn css(config: &SiteConfig, path: &str) -> String {
    let path = if is_absolute(path) {
        path.to_string()
    } else {
        let path = if path.ends_with(".css") {
            path.to_string()
        } else {
            format!("{}.css", path)
        };
        url_for(config, &format!("css/{}", path.trim_start_matches('/')))
    };

    format!(r#"<link rel="stylesheet" href="{}">"#, path)
}

/// Generate a JavaScript script tag
///
/// # Examples
/// ```ignore
/// js(&config, "load-more.js") // -> <script src="/blog/js/load-more.js" defer></script>
/// ```
pub fn js(config: &SiteConfig, path: &str) -> String {
    let path = if is_absolute(path) {
        path.to_string()
    } else {
        let path = if path.ends_with(".js") {
            path.to_string()
        } else {
            format!("{}.js", path)
        };
        url_for(config, &format!("js/{}", path.trim_start_matches('/')))
    };

    format!(r#"<script src="{}" defer></script>"#, path)
}

/// Generate Open Graph meta tags
pub fn open_graph(
    title: &str,
    description: &str,
    url: &str,
    image: Option<&str>,
    site_name: &str,
) -> String {
    let mut tags = vec![
        r#"<meta property="og:type" content="article">"#.to_string(),
        format!(
            r#"<meta property="og:title" content="{}">"#,
            escape_html(title)
        ),
        format!(r#"<meta property="og:url" content="{}">"#, escape_html(url)),
        format!(
            r#"<meta property="og:site_name" content="{}">"#,
            escape_html(site_name)
        ),
    ];

    if !description.is_empty() {
        tags.push(format!(
            r#"<meta property="og:description" content="{}">"#,
            escape_html(description)
        ));
    }

    if let Some(img) = image {
        tags.push(format!(
            r#"<meta property="og:image" content="{}">"#,
            escape_html(img)
        ));
    }

    tags.join("\n")
}

/// Escape HTML special characters
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://") || path.starts_with("//")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css() {
        let config = SiteConfig::default();
        assert_eq!(
            css(&config, "style"),
            r#"<link rel="stylesheet" href="/css/style.css">"#
        );
        assert!(css(&config, "https://cdn.example.com/a.css").contains("https://cdn"));
    }

    #[test]
    fn test_js() {
        let config = SiteConfig::default();
        assert_eq!(
            js(&config, "load-more"),
            r#"<script src="/js/load-more.js" defer></script>"#
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_open_graph() {
        let tags = open_graph(
            "Hooks",
            "",
            "https://example.com/post/hooks/",
            Some("https://images.example.com/a.png"),
            "spacetraveling",
        );
        assert!(tags.contains(r#"<meta property="og:title" content="Hooks">"#));
        assert!(tags.contains("og:image"));
        assert!(!tags.contains("og:description"));
    }
}
