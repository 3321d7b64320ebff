//! Narration error types.

/// Errors that can occur in the narration pipeline.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    /// Synthesis service rejected or failed the request.
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    /// Network-level failure talking to the synthesis service.
    #[error("Synthesis request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The local audio layer refused or failed to play a clip.
    #[error("Audio playback failed: {0}")]
    Playback(String),

    /// Failed to open the audio output stream.
    #[error("Failed to open audio output stream: {0}")]
    OutputStream(String),

    /// The playback thread's command channel closed unexpectedly.
    #[error("Audio thread died")]
    AudioThreadDied,

    /// The session was cancelled (user stop or view unmount).
    #[error("Narration cancelled")]
    Cancelled,
}

impl NarrationError {
    /// Whether this is the expected outcome of a stop/unmount, to be
    /// swallowed rather than surfaced.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
