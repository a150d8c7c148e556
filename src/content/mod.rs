//! Content module - post models, listing state and derived values

pub mod listing;
mod post;
pub mod reading;
pub mod richtext;

pub use listing::PostListing;
pub use post::{
    null_as_default, Adjacent, Banner, ContentSection, Post, PostLink, PostSummary, PostsPage,
};
pub use reading::reading_time;
pub use richtext::{RichTextBlock, Span, SpanData};
