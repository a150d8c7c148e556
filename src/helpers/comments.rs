//! utterances comments widget

use super::html::escape_html;
use crate::config::CommentsConfig;

/// Script loaded by the widget
pub const UTTERANCES_CLIENT: &str = "https://utteranc.es/client.js";

/// Script element embedding the comments widget; `None` when no repository is
/// configured
pub fn utterances_script(config: &CommentsConfig) -> Option<String> {
    let repo = config.repo.as_deref().map(str::trim).filter(|r| !r.is_empty())?;

    Some(format!(
        r#"<script src="{}" repo="{}" issue-term="{}" label="{}" theme="{}" crossorigin="anonymous" async></script>"#,
        UTTERANCES_CLIENT,
        escape_html(repo),
        escape_html(&config.issue_term),
        escape_html(&config.label),
        escape_html(&config.theme),
    ))
}
