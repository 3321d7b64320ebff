//! Streaming narration pipeline for readaloud.
//!
//! Turns a rendered article into spoken audio, paragraph by paragraph:
//! text is sanitized and segmented (via `readaloud-core`), each paragraph is
//! synthesized through an external TTS service, and playback runs with a
//! one-paragraph look-ahead prefetch. A single toggle starts and stops the
//! whole pipeline; stopping cancels in-flight requests, silences audio, and
//! releases every buffered clip.

#![deny(unused_crate_dependencies)]

pub mod buffer;
pub mod elevenlabs;
pub mod error;
pub mod pipeline;
pub mod playback;
pub mod synth;

// Re-export key types for convenience
pub use buffer::{PlaybackBuffer, PreparedParagraph};
pub use elevenlabs::{ElevenLabsConfig, ElevenLabsSynthesizer};
pub use error::NarrationError;
pub use pipeline::{NarrationConfig, NarrationEvent, NarrationPipeline, NarrationState};
pub use playback::{AudioOutput, RodioOutput};
pub use synth::{AudioClip, SpeechSynthesizer};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
