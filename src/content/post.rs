//! Post models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::richtext::RichTextBlock;

/// A post as shown in the listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    /// URL identifier (slug)
    pub uid: String,

    /// First publication, absent for never-published documents
    pub first_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// CMS document id
    pub id: String,

    /// URL identifier (slug)
    pub uid: String,

    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,

    pub title: String,
    pub subtitle: String,
    pub author: String,

    /// Banner image
    pub banner: Banner,

    /// Ordered content sections
    pub content: Vec<ContentSection>,
}

impl Post {
    /// Listing view of this post
    pub fn summary(&self) -> PostSummary {
        PostSummary {
            uid: self.uid.clone(),
            first_publication_date: self.first_publication_date,
            title: self.title.clone(),
            subtitle: self.subtitle.clone(),
            author: self.author.clone(),
        }
    }

    /// Whether the post was republished after its first publication
    pub fn is_edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => last > first,
            _ => false,
        }
    }
}

/// Banner image reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Banner {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// A heading followed by rich-text body blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    #[serde(deserialize_with = "null_as_default")]
    pub heading: String,
    #[serde(deserialize_with = "null_as_default")]
    pub body: Vec<RichTextBlock>,
}

/// Deserialize `null` as the type's default (empty CMS fields come back as null)
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One page of listing results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostsPage {
    pub results: Vec<PostSummary>,

    /// Cursor of the following page, `None` when exhausted
    pub next_page: Option<String>,
}

/// A neighbouring post used for navigation links
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostLink {
    pub uid: String,
    pub title: String,
}

impl From<&PostSummary> for PostLink {
    fn from(post: &PostSummary) -> Self {
        Self {
            uid: post.uid.clone(),
            title: post.title.clone(),
        }
    }
}

/// Posts immediately before and after a post in publication order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Adjacent {
    pub prev: Option<PostLink>,
    pub next: Option<PostLink>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn post(first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) -> Post {
        Post {
            id: "X1".to_string(),
            uid: "hello".to_string(),
            first_publication_date: first,
            last_publication_date: last,
            title: "Hello".to_string(),
            subtitle: "World".to_string(),
            author: "Ana".to_string(),
            banner: Banner::default(),
            content: Vec::new(),
        }
    }

    #[test]
    fn test_is_edited() {
        let first = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        let later = Utc.with_ymd_and_hms(2021, 3, 19, 18, 49, 0).unwrap();

        assert!(post(Some(first), Some(later)).is_edited());
        assert!(!post(Some(first), Some(first)).is_edited());
        assert!(!post(None, Some(later)).is_edited());
    }

    #[test]
    fn test_summary_keeps_listing_fields() {
        let first = Utc.with_ymd_and_hms(2021, 3, 15, 19, 25, 28).unwrap();
        let summary = post(Some(first), None).summary();
        assert_eq!(summary.uid, "hello");
        assert_eq!(summary.first_publication_date, Some(first));
        assert_eq!(summary.author, "Ana");
    }
}
