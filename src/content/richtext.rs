//! Rich-text blocks as delivered by the CMS, and their HTML rendering

use serde::{Deserialize, Serialize};

use crate::helpers::escape_html;

/// A single rich-text block (paragraph, heading, list item, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
    pub spans: Vec<Span>,

    /// Image blocks only
    pub url: Option<String>,
    pub alt: Option<String>,
}

impl RichTextBlock {
    /// Plain paragraph with no formatting
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            kind: "paragraph".to_string(),
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Inline formatting over a character range of a block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanData {
    pub url: Option<String>,
    pub label: Option<String>,
}

/// Plain text of all blocks, one block per line
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render blocks to HTML, grouping consecutive list items
pub fn as_html(blocks: &[RichTextBlock]) -> String {
    let mut html = String::new();
    let mut open_list: Option<&'static str> = None;

    for block in blocks {
        let list = match block.kind.as_str() {
            "list-item" => Some("ul"),
            "o-list-item" => Some("ol"),
            _ => None,
        };

        if open_list != list {
            if let Some(tag) = open_list {
                html.push_str(&format!("</{}>", tag));
            }
            if let Some(tag) = list {
                html.push_str(&format!("<{}>", tag));
            }
            open_list = list;
        }

        match block.kind.as_str() {
            "heading1" | "heading2" | "heading3" | "heading4" | "heading5" | "heading6" => {
                let level = &block.kind["heading".len()..];
                html.push_str(&format!(
                    "<h{level}>{}</h{level}>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "preformatted" => {
                html.push_str(&format!("<pre>{}</pre>", escape_html(&block.text)));
            }
            "list-item" | "o-list-item" => {
                html.push_str(&format!(
                    "<li>{}</li>",
                    render_spans(&block.text, &block.spans)
                ));
            }
            "image" => {
                if let Some(url) = &block.url {
                    html.push_str(&format!(
                        r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                        escape_html(url),
                        escape_html(block.alt.as_deref().unwrap_or(""))
                    ));
                }
            }
            other => {
                if other != "paragraph" {
                    tracing::debug!("Rendering unknown block type {:?} as paragraph", other);
                }
                html.push_str(&format!(
                    "<p>{}</p>",
                    render_spans(&block.text, &block.spans)
                ));
            }
        }
    }

    if let Some(tag) = open_list {
        html.push_str(&format!("</{}>", tag));
    }

    html
}

/// Apply spans to a block's text. Offsets count UTF-16 code units.
fn render_spans(text: &str, spans: &[Span]) -> String {
    let mut chars: Vec<(usize, char)> = Vec::with_capacity(text.len());
    let mut len = 0;
    for c in text.chars() {
        chars.push((len, c));
        len += c.len_utf16();
    }

    let mut spans: Vec<&Span> = spans
        .iter()
        .filter(|s| s.start < s.end && s.start < len)
        .collect();
    // Outer spans first when two start at the same offset
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    // Offsets may fall inside a surrogate pair; those snap to the next char
    let ends_at = |span: &Span, pos: usize| span.end.min(len) <= pos;

    let mut out = String::with_capacity(text.len());
    let mut open: Vec<&Span> = Vec::new();
    let mut next = 0;

    for i in 0..=chars.len() {
        let pos = chars.get(i).map_or(len, |(pos, _)| *pos);

        if open.iter().any(|s| ends_at(s, pos)) {
            // Unwind to the deepest span ending here, then reopen survivors
            let mut reopen = Vec::new();
            while let Some(span) = open.pop() {
                out.push_str(close_tag(span));
                if !ends_at(span, pos) {
                    reopen.push(span);
                }
                if !open.iter().any(|s| ends_at(s, pos)) {
                    break;
                }
            }
            for span in reopen.into_iter().rev() {
                out.push_str(&open_tag(span));
                open.push(span);
            }
        }

        let Some(&(_, c)) = chars.get(i) else {
            break;
        };

        while next < spans.len() && spans[next].start <= pos {
            let span = spans[next];
            if !ends_at(span, pos) {
                out.push_str(&open_tag(span));
                open.push(span);
            }
            next += 1;
        }

        match c {
            '\n' => out.push_str("<br />"),
            c => out.push_str(&escape_html(c.encode_utf8(&mut [0; 4]))),
        }
    }

    out
}

fn open_tag(span: &Span) -> String {
    match span.kind.as_str() {
        "strong" => "<strong>".to_string(),
        "em" => "<em>".to_string(),
        "hyperlink" => {
            let url = span
                .data
                .as_ref()
                .and_then(|d| d.url.as_deref())
                .unwrap_or("#");
            format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">"#,
                escape_html(url)
            )
        }
        _ => {
            let label = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or(&span.kind);
            format!(r#"<span class="{}">"#, escape_html(label))
        }
    }
}

fn close_tag(span: &Span) -> &'static str {
    match span.kind.as_str() {
        "strong" => "</strong>",
        "em" => "</em>",
        "hyperlink" => "</a>",
        _ => "</span>",
    }
}
