//! Reading-time estimate

use super::post::ContentSection;
use super::richtext;

/// Average reading speed, in words per minute
pub const WORDS_PER_MINUTE: usize = 200;

/// Number of whitespace-separated words across all headings and bodies
pub fn word_count(content: &[ContentSection]) -> usize {
    content
        .iter()
        .map(|section| {
            section.heading.split_whitespace().count()
                + richtext::as_text(&section.body).split_whitespace().count()
        })
        .sum()
}

/// Estimated reading time in whole minutes, rounded up
pub fn reading_time(content: &[ContentSection]) -> usize {
    word_count(content).div_ceil(WORDS_PER_MINUTE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RichTextBlock;

    fn section(heading: &str, paragraphs: &[&str]) -> ContentSection {
        ContentSection {
            heading: heading.to_string(),
            body: paragraphs
                .iter()
                .map(|p| RichTextBlock::paragraph(*p))
                .collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_empty_content_reads_in_zero_minutes() {
        assert_eq!(reading_time(&[]), 0);
        assert_eq!(reading_time(&[section("", &[])]), 0);
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(reading_time(&[section("", &[&words(1)])]), 1);
        assert_eq!(reading_time(&[section("", &[&words(200)])]), 1);
        assert_eq!(reading_time(&[section("", &[&words(201)])]), 2);
    }

    #[test]
    fn test_counts_headings_and_all_blocks() {
        let body = words(150);
        let content = vec![
            section("Uma introdução", &[&body]),
            section("Conclusão", &["one two", "three"]),
        ];
        assert_eq!(word_count(&content), 2 + 150 + 1 + 3);
        assert_eq!(reading_time(&content), 1);
    }

    #[test]
    fn test_block_boundaries_split_words() {
        let content = vec![section("", &["end", "start"])];
        assert_eq!(word_count(&content), 2);
    }
}
