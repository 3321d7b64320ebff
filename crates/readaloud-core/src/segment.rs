//! Paragraph segmentation.
//!
//! Narration is synthesized paragraph-by-paragraph; a paragraph is a line of
//! sanitized text with more than one character of content. The full list is
//! held in memory — documents are article-sized, and the playback pipeline
//! needs a restartable sequence.

/// Split sanitized text into its ordered sequence of narratable paragraphs.
///
/// Entries are trimmed; empty and single-character lines are dropped so that
/// whitespace or stray punctuation is never sent to the synthesis service.
#[must_use]
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 1)
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_lines_and_drops_blanks() {
        assert_eq!(split_paragraphs("A1\n\nB2\nC3"), vec!["A1", "B2", "C3"]);
    }

    #[test]
    fn preserves_document_order() {
        let paragraphs = split_paragraphs("first line\nsecond line\nthird line");
        assert_eq!(paragraphs, vec!["first line", "second line", "third line"]);
    }

    #[test]
    fn drops_single_character_lines() {
        assert_eq!(split_paragraphs("A\nok\n.\n!\nfine"), vec!["ok", "fine"]);
    }

    #[test]
    fn drops_whitespace_only_lines() {
        assert_eq!(split_paragraphs("   \n\t\nreal text"), vec!["real text"]);
    }

    #[test]
    fn empty_input_yields_no_paragraphs() {
        assert!(split_paragraphs("").is_empty());
    }
}
