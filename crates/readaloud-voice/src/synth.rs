//! Synthesis seam — the backend trait and the audio clip it produces.

use std::io::Cursor;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::error::NarrationError;

/// Fully materialised synthesized audio for one paragraph.
///
/// A clip is independently playable with no further network access. Its
/// byte buffer is reference-counted: cloning shares the buffer (the playback
/// layer holds one reference while the pipeline's slot retains another), and
/// the bytes are freed when the last reference drops — so clearing a slot is
/// the release.
#[derive(Debug, Clone)]
pub struct AudioClip {
    bytes: Bytes,
}

impl AudioClip {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Seekable reader over the encoded audio, for the decoder.
    pub(crate) fn into_reader(self) -> Cursor<Bytes> {
        Cursor::new(self.bytes)
    }
}

/// Backend-agnostic speech synthesis engine.
///
/// The pipeline operates on trait objects (`Arc<dyn SpeechSynthesizer>`) so
/// the service can be swapped — or mocked in tests — without touching the
/// playback logic.
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize one paragraph into a locally playable clip.
    ///
    /// Performs exactly one outbound request; there are no automatic
    /// retries — a failed synthesis aborts the playback session rather than
    /// skipping ahead. Fails with [`NarrationError::Cancelled`] if `cancel`
    /// fires before the clip is fully materialised.
    async fn synthesize(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, NarrationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_shares_bytes_across_clones() {
        let clip = AudioClip::new(vec![1u8, 2, 3]);
        let other = clip.clone();
        assert_eq!(clip.as_bytes(), other.as_bytes());
        assert_eq!(clip.len(), 3);
        assert!(!clip.is_empty());
    }

    #[test]
    fn empty_clip() {
        let clip = AudioClip::new(Vec::<u8>::new());
        assert!(clip.is_empty());
        assert_eq!(clip.len(), 0);
    }
}
