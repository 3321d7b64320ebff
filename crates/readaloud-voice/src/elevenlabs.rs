//! ElevenLabs synthesis client.
//!
//! One POST per paragraph to the streaming endpoint, with a fixed
//! voice/model profile. The response body is fully materialised before the
//! clip is handed back, so playback never touches the network.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::error::NarrationError;
use crate::synth::{AudioClip, SpeechSynthesizer};

/// Voice the site narrates with.
pub const DEFAULT_VOICE_ID: &str = "6WKnjxyhfi8k86ffrkFz";

/// Multilingual model — articles mix Korean and English prose.
pub const DEFAULT_MODEL_ID: &str = "eleven_multilingual_v2";

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`ElevenLabsSynthesizer`].
#[derive(Debug, Clone)]
pub struct ElevenLabsConfig {
    /// API credential sent in the `xi-api-key` header.
    pub api_key: String,

    /// Voice identifier in the synthesis endpoint path.
    pub voice_id: String,

    /// Synthesis model identifier.
    pub model_id: String,

    /// Service base URL (overridable for tests).
    pub base_url: String,

    /// Voice stability, pinned at maximum for steady narration.
    pub stability: f32,

    /// Similarity boost, pinned at maximum.
    pub similarity_boost: f32,
}

impl ElevenLabsConfig {
    /// The fixed narration profile with the given credential.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            stability: 1.0,
            similarity_boost: 1.0,
        }
    }
}

/// Speech synthesis via the ElevenLabs HTTP API.
pub struct ElevenLabsSynthesizer {
    client: reqwest::Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsSynthesizer {
    #[must_use]
    pub fn new(config: ElevenLabsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create HTTP client");

        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/text-to-speech/{}/stream",
            self.config.base_url.trim_end_matches('/'),
            self.config.voice_id
        )
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<AudioClip, NarrationError> {
        let request = self
            .client
            .post(self.endpoint())
            .header("xi-api-key", &self.config.api_key)
            .json(&json!({
                "text": text,
                "model_id": self.config.model_id,
                "voice_settings": {
                    "stability": self.config.stability,
                    "similarity_boost": self.config.similarity_boost,
                },
            }));

        let response = tokio::select! {
            res = request.send() => res?,
            () = cancel.cancelled() => return Err(NarrationError::Cancelled),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, "Synthesis request rejected");
            return Err(NarrationError::Synthesis(format!(
                "service returned {status}: {body}"
            )));
        }

        let bytes = tokio::select! {
            res = response.bytes() => res?,
            () = cancel.cancelled() => return Err(NarrationError::Cancelled),
        };

        tracing::debug!(chars = text.len(), audio_bytes = bytes.len(), "Synthesised paragraph");
        Ok(AudioClip::new(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_carries_fixed_profile() {
        let config = ElevenLabsConfig::new("key");
        assert_eq!(config.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(config.model_id, DEFAULT_MODEL_ID);
        assert!((config.stability - 1.0).abs() < f32::EPSILON);
        assert!((config.similarity_boost - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoint_includes_voice_and_stream_path() {
        let synthesizer = ElevenLabsSynthesizer::new(ElevenLabsConfig::new("key"));
        assert_eq!(
            synthesizer.endpoint(),
            "https://api.elevenlabs.io/v1/text-to-speech/6WKnjxyhfi8k86ffrkFz/stream"
        );
    }

    #[test]
    fn endpoint_tolerates_trailing_slash_in_base_url() {
        let mut config = ElevenLabsConfig::new("key");
        config.base_url = "http://localhost:8080/".to_string();
        let synthesizer = ElevenLabsSynthesizer::new(config);
        assert_eq!(
            synthesizer.endpoint(),
            "http://localhost:8080/v1/text-to-speech/6WKnjxyhfi8k86ffrkFz/stream"
        );
    }
}
