//! Previous/next post resolution

use chrono::{DateTime, Utc};

use super::error::CmsResult;
use super::{ContentSource, Ordering, SearchQuery};
use crate::content::{Adjacent, PostLink, PostSummary, PostsPage};

/// Posts fetched around the current one, enough to step over publication ties
const NEIGHBOUR_WINDOW: usize = 10;

/// Find the posts published immediately before and after `post`.
///
/// Posts are ordered by publication date, then by document id, so posts
/// published at the same instant still link to each other. Each side is
/// `None` at the ends of the chronology. A post without a publication date
/// (an unpublished preview) has no neighbours.
pub async fn resolve_adjacent(
    source: &dyn ContentSource,
    document_type: &str,
    post: &PostSummary,
    preview: Option<&str>,
) -> CmsResult<Adjacent> {
    let Some(published) = post.first_publication_date else {
        return Ok(Adjacent::default());
    };

    // Both queries include the current post and its ties
    let base = SearchQuery::documents(document_type)
        .page_size(NEIGHBOUR_WINDOW)
        .fetch([format!("{}.title", document_type)]);
    let next_query = base
        .clone()
        .published_since(published)
        .ordering(Ordering::PublishedAsc);
    let prev_query = base
        .published_until(published)
        .ordering(Ordering::PublishedDesc);

    let (next, prev) = tokio::try_join!(
        source.search(&next_query, preview),
        source.search(&prev_query, preview)
    )?;

    Ok(Adjacent {
        prev: following(prev, &post.uid, |date| *date < published),
        next: following(next, &post.uid, |date| *date > published),
    })
}

/// The entry after `uid` in an ordered page. When `uid` is not in the page,
/// the first entry published strictly beyond it.
fn following<F>(page: PostsPage, uid: &str, beyond: F) -> Option<PostLink>
where
    F: Fn(&DateTime<Utc>) -> bool,
{
    let results = page.results;
    let candidate = match results.iter().position(|c| c.uid == uid) {
        Some(pos) => results.get(pos + 1),
        None => results.iter().find(|c| {
            c.uid != uid && c.first_publication_date.as_ref().is_some_and(&beyond)
        }),
    };
    candidate.map(PostLink::from)
}
