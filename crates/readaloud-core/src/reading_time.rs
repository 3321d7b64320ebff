//! Reading-time estimation.
//!
//! Display-only: the estimate is computed once per document view from the
//! sanitized full text and surfaced near the article header. It plays no
//! part in playback control flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Assumed reading pace for the estimate.
pub const WORDS_PER_MINUTE: usize = 200;

/// An estimated narration/reading duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingTime {
    pub minutes: usize,
    pub seconds: usize,
}

impl ReadingTime {
    /// Estimate reading time from a whitespace word count at
    /// [`WORDS_PER_MINUTE`].
    ///
    /// Minutes truncate; the remainder becomes seconds rounded to the
    /// nearest 10-second increment, carrying into the minute at 60.
    #[must_use]
    pub fn estimate(text: &str) -> Self {
        let words = text.split_whitespace().count();

        let minutes = words / WORDS_PER_MINUTE;
        let remainder = words % WORDS_PER_MINUTE;

        // remainder/WPM minutes → seconds, rounded half-up to a 10 s step
        let seconds = (remainder * 60 + WORDS_PER_MINUTE * 5) / (WORDS_PER_MINUTE * 10) * 10;

        if seconds == 60 {
            Self {
                minutes: minutes + 1,
                seconds: 0,
            }
        } else {
            Self { minutes, seconds }
        }
    }
}

impl fmt::Display for ReadingTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m {}s", self.minutes, self.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn exact_minute() {
        assert_eq!(ReadingTime::estimate(&words(200)), ReadingTime { minutes: 1, seconds: 0 });
    }

    #[test]
    fn rounds_to_nearest_ten_seconds() {
        // 50 words → 15 s exact → rounds up to 20 s
        assert_eq!(ReadingTime::estimate(&words(50)), ReadingTime { minutes: 0, seconds: 20 });
    }

    #[test]
    fn empty_text_is_zero() {
        assert_eq!(ReadingTime::estimate(""), ReadingTime { minutes: 0, seconds: 0 });
    }

    #[test]
    fn sixty_seconds_carries_into_minutes() {
        // 197 words → 59.1 s remainder → rounds to 60 s → 1m 0s
        assert_eq!(ReadingTime::estimate(&words(197)), ReadingTime { minutes: 1, seconds: 0 });
    }

    #[test]
    fn long_document() {
        // 1030 words → 5m + 9 s remainder → 10 s
        assert_eq!(ReadingTime::estimate(&words(1030)), ReadingTime { minutes: 5, seconds: 10 });
    }

    #[test]
    fn display_format() {
        assert_eq!(ReadingTime { minutes: 3, seconds: 20 }.to_string(), "3m 20s");
    }
}
