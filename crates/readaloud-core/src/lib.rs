//! Core text domain for readaloud.
//!
//! Pure text transformations that prepare a rendered article for narration:
//! markup sanitization, paragraph segmentation, and reading-time estimation.
//! No I/O, no async, no adapter dependencies — the narration pipeline in
//! `readaloud-voice` composes these with the synthesis and playback layers.

#![deny(unused_crate_dependencies)]

pub mod reading_time;
pub mod sanitize;
pub mod segment;

// Re-export commonly used items for convenience
pub use reading_time::{ReadingTime, WORDS_PER_MINUTE};
pub use sanitize::{SanitizeOptions, sanitize};
pub use segment::split_paragraphs;
