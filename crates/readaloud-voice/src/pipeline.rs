//! Narration pipeline orchestrator — the toggle-driven state machine.
//!
//! ```text
//!   Idle ──toggle-on──▶ Loading ──clip ready──▶ Playing ──last paragraph──▶ Idle
//!                          │                       │
//!                          └──────toggle-off───────┴──▶ Stopped ──▶ Idle
//! ```
//!
//! While a paragraph plays, the next one is synthesized concurrently and
//! parked in the second buffer slot — the pipeline's only overlap, bounded
//! to exactly one paragraph of look-ahead. Stopping cancels the session
//! token, which reaches both the in-flight synthesis request and the
//! playback layer; both buffer slots are then cleared so no clip survives
//! the session.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use readaloud_core::{SanitizeOptions, sanitize, split_paragraphs};

use crate::buffer::{PlaybackBuffer, PreparedParagraph};
use crate::error::NarrationError;
use crate::playback::AudioOutput;
use crate::synth::{AudioClip, SpeechSynthesizer};

// ── Narration state machine ────────────────────────────────────────

/// Current state of the narration pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarrationState {
    /// Nothing active — narration not started, or finished naturally.
    Idle,

    /// First paragraph's audio is being fetched; nothing audible yet.
    Loading,

    /// A clip is actively producing sound.
    Playing,

    /// A stop (user toggle, unmount, or fatal error) completed.
    Stopped,
}

// ── Events emitted by the pipeline ─────────────────────────────────

/// Events emitted by the pipeline to the UI / application layer.
#[derive(Debug, Clone)]
pub enum NarrationEvent {
    /// Pipeline state changed.
    StateChanged(NarrationState),

    /// Playback of a paragraph began.
    ParagraphStarted {
        /// Paragraph position in document order.
        index: usize,
    },

    /// Playback of a paragraph drained naturally.
    ParagraphFinished {
        /// Paragraph position in document order.
        index: usize,
    },

    /// The final paragraph finished and the pipeline returned to idle.
    Finished,

    /// A fatal error stopped the session.
    Error(String),
}

// ── Pipeline configuration ─────────────────────────────────────────

/// Configuration for the narration pipeline.
#[derive(Debug, Clone, Default)]
pub struct NarrationConfig {
    /// Sanitizer options applied to the document snapshot on every
    /// toggle-on.
    pub sanitize: SanitizeOptions,
}

// ── Narration pipeline ─────────────────────────────────────────────

/// The narration pipeline controller.
///
/// Owns the pipeline state and the two buffer slots, drives
/// paragraph-by-paragraph playback with one-paragraph look-ahead, and
/// exposes a single idempotent [`toggle`](Self::toggle). Emits
/// [`NarrationEvent`]s via a channel for the UI layer to consume.
pub struct NarrationPipeline {
    config: NarrationConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    shared: Shared,
    session: Option<Session>,
}

/// State cell + event channel shared with the session task.
#[derive(Clone)]
struct Shared {
    state: Arc<Mutex<NarrationState>>,
    event_tx: mpsc::UnboundedSender<NarrationEvent>,
}

/// An active (or unwinding) playback session.
struct Session {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl NarrationPipeline {
    /// Create a new pipeline.
    ///
    /// Returns the pipeline and a receiver for [`NarrationEvent`]s.
    #[must_use]
    pub fn new(
        config: NarrationConfig,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        output: Arc<dyn AudioOutput>,
    ) -> (Self, mpsc::UnboundedReceiver<NarrationEvent>) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let pipeline = Self {
            config,
            synthesizer,
            output,
            shared: Shared {
                state: Arc::new(Mutex::new(NarrationState::Idle)),
                event_tx,
            },
            session: None,
        };

        (pipeline, event_rx)
    }

    /// Get the current pipeline state.
    #[must_use]
    pub fn state(&self) -> NarrationState {
        self.shared.state()
    }

    /// Whether a playback session is active (loading or audible).
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(
            self.state(),
            NarrationState::Loading | NarrationState::Playing
        )
    }

    // ── User control surface ───────────────────────────────────────

    /// The single narration control: starts a session when idle/stopped,
    /// stops the active one when loading/playing.
    ///
    /// Safe under rapid repeated invocation — stopping awaits full teardown
    /// before returning, so no network call or audio outlives the toggle,
    /// and consecutive toggles alternate deterministically.
    pub async fn toggle(&mut self, text: &str) {
        if self.is_active() {
            self.stop().await;
        } else {
            self.start(text).await;
        }
    }

    /// Start a fresh session from paragraph 0.
    ///
    /// The document snapshot is sanitized and segmented anew on every start
    /// (the content may have re-rendered since the last session). With no
    /// narratable paragraphs the pipeline stays idle — that is not an
    /// error.
    pub async fn start(&mut self, text: &str) {
        if self.is_active() {
            return;
        }

        // A session that ended in error may still be unwinding; make sure
        // it is fully torn down before a new one begins.
        if let Some(session) = self.session.take() {
            session.token.cancel();
            let _ = session.task.await;
        }

        let sanitized = sanitize(text, &self.config.sanitize);
        let paragraphs = split_paragraphs(&sanitized);
        if paragraphs.is_empty() {
            tracing::debug!("No narratable text — staying idle");
            self.shared.set_state(NarrationState::Idle);
            return;
        }

        tracing::info!(paragraphs = paragraphs.len(), "Starting narration session");

        let token = CancellationToken::new();
        self.shared.set_state(NarrationState::Loading);

        let task = tokio::spawn(run_session(
            paragraphs,
            Arc::clone(&self.synthesizer),
            Arc::clone(&self.output),
            token.clone(),
            self.shared.clone(),
        ));
        self.session = Some(Session { token, task });
    }

    /// Stop the active session: cancel in-flight synthesis, silence audio,
    /// clear both buffer slots, and reset to idle.
    ///
    /// A later toggle-on starts over from paragraph 0 — there are no
    /// resume semantics.
    pub async fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        tracing::info!("Stopping narration session");
        session.token.cancel();
        if !session.task.is_finished() {
            self.shared.set_state(NarrationState::Stopped);
        }

        // The session task unwinds promptly — every await inside it is
        // cancellation-aware.
        if let Err(e) = session.task.await {
            tracing::warn!(error = %e, "Narration session task failed during teardown");
        }

        self.shared.set_state(NarrationState::Idle);
    }
}

impl Drop for NarrationPipeline {
    fn drop(&mut self) {
        // Unmount is an implicit stop. The task cannot be awaited here, but
        // cancellation alone stops audio, aborts the in-flight request, and
        // clears both slots as the task unwinds.
        if let Some(session) = self.session.take() {
            session.token.cancel();
        }
    }
}

impl Shared {
    fn state(&self) -> NarrationState {
        *self.state.lock().expect("state lock poisoned")
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&self, new_state: NarrationState) {
        let mut state = self.state.lock().expect("state lock poisoned");
        if *state != new_state {
            tracing::debug!(old = ?*state, new = ?new_state, "Narration state transition");
            *state = new_state;
            drop(state);
            self.emit(NarrationEvent::StateChanged(new_state));
        }
    }

    /// Emit an event (best-effort — if the receiver is dropped, log and
    /// move on).
    fn emit(&self, event: NarrationEvent) {
        if self.event_tx.send(event).is_err() {
            tracing::warn!("Narration event receiver dropped");
        }
    }
}

// ── Session task ───────────────────────────────────────────────────

/// Outcome of racing the current paragraph's playback against the next
/// paragraph's synthesis.
enum Raced {
    Played(Result<(), NarrationError>),
    Prefetched(Result<Result<AudioClip, NarrationError>, tokio::task::JoinError>),
}

/// Drive one playback session to completion, cancellation, or failure.
async fn run_session(
    paragraphs: Vec<String>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    output: Arc<dyn AudioOutput>,
    token: CancellationToken,
    shared: Shared,
) {
    let total = paragraphs.len();
    let mut buffer = PlaybackBuffer::new();

    // Paragraph 0 — nothing audible until this clip lands.
    match synthesizer.synthesize(&paragraphs[0], &token).await {
        Ok(clip) => buffer.set_current(PreparedParagraph { index: 0, clip }),
        Err(e) => return teardown(e, None, &mut buffer, &token, &shared).await,
    }

    shared.set_state(NarrationState::Playing);

    let mut index = 0;
    loop {
        // Look-ahead: synthesize the next paragraph while the current one
        // plays. Bounded to exactly one paragraph.
        let mut prefetch: Option<JoinHandle<Result<AudioClip, NarrationError>>> =
            if index + 1 < total {
                let synthesizer = Arc::clone(&synthesizer);
                let text = paragraphs[index + 1].clone();
                let token = token.clone();
                Some(tokio::spawn(async move {
                    synthesizer.synthesize(&text, &token).await
                }))
            } else {
                None
            };
        let mut prefetch_error: Option<NarrationError> = None;

        shared.emit(NarrationEvent::ParagraphStarted { index });

        let clip = buffer
            .current()
            .expect("current slot populated before playback")
            .clip
            .clone();
        let play = output.play(clip, &token);
        tokio::pin!(play);

        let raced = match prefetch.as_mut() {
            Some(handle) => tokio::select! {
                res = &mut play => Raced::Played(res),
                joined = handle => Raced::Prefetched(joined),
            },
            None => Raced::Played(play.as_mut().await),
        };

        let played = match raced {
            // Playback finished first; any prefetch is still in flight.
            Raced::Played(res) => res,

            // The prefetched clip landed mid-playback: park it (or defer
            // its error — it must not interrupt the audible paragraph),
            // then let playback run out.
            Raced::Prefetched(joined) => {
                prefetch = None;
                match flatten_join(joined) {
                    Ok(clip) => buffer.set_next(PreparedParagraph {
                        index: index + 1,
                        clip,
                    }),
                    Err(e) => prefetch_error = Some(e),
                }
                play.await
            }
        };

        if let Err(e) = played {
            return teardown(e, prefetch, &mut buffer, &token, &shared).await;
        }

        shared.emit(NarrationEvent::ParagraphFinished { index });
        buffer.clear_current(); // played — release the clip

        if index + 1 >= total {
            shared.emit(NarrationEvent::Finished);
            shared.set_state(NarrationState::Idle);
            return;
        }

        // Advance: surface a deferred prefetch failure, promote the parked
        // clip, or wait for the in-flight synthesis (the only stall case).
        if let Some(e) = prefetch_error {
            return teardown(e, prefetch, &mut buffer, &token, &shared).await;
        }
        if !buffer.promote() {
            let handle = prefetch
                .take()
                .expect("prefetch in flight when next paragraph exists");
            match flatten_join(handle.await) {
                Ok(clip) => buffer.set_current(PreparedParagraph {
                    index: index + 1,
                    clip,
                }),
                Err(e) => return teardown(e, None, &mut buffer, &token, &shared).await,
            }
        }
        index += 1;
    }
}

/// Common exit path for cancellation and fatal errors.
///
/// Cancels the session token (so a still-running prefetch fails fast),
/// drains the prefetch task, and clears both buffer slots — a late
/// completion can never repopulate a slot or play audio. `Cancelled` is the
/// expected stop/unmount outcome and exits silently; anything else is
/// surfaced and parks the pipeline in `Stopped`.
async fn teardown(
    error: NarrationError,
    prefetch: Option<JoinHandle<Result<AudioClip, NarrationError>>>,
    buffer: &mut PlaybackBuffer,
    token: &CancellationToken,
    shared: &Shared,
) {
    token.cancel();
    if let Some(handle) = prefetch {
        let _ = handle.await;
    }
    buffer.clear();

    if error.is_cancelled() {
        tracing::debug!("Narration session cancelled");
        return;
    }

    tracing::error!(error = %error, "Narration session failed");
    shared.emit(NarrationEvent::Error(error.to_string()));
    shared.set_state(NarrationState::Stopped);
}

fn flatten_join(
    joined: Result<Result<AudioClip, NarrationError>, tokio::task::JoinError>,
) -> Result<AudioClip, NarrationError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(NarrationError::Synthesis(format!(
            "synthesis task failed: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopSynthesizer;

    #[async_trait::async_trait]
    impl SpeechSynthesizer for NoopSynthesizer {
        async fn synthesize(
            &self,
            text: &str,
            _cancel: &CancellationToken,
        ) -> Result<AudioClip, NarrationError> {
            Ok(AudioClip::new(text.as_bytes().to_vec()))
        }
    }

    struct NoopOutput;

    #[async_trait::async_trait]
    impl AudioOutput for NoopOutput {
        async fn play(
            &self,
            _clip: AudioClip,
            _cancel: &CancellationToken,
        ) -> Result<(), NarrationError> {
            Ok(())
        }
    }

    fn pipeline() -> (
        NarrationPipeline,
        mpsc::UnboundedReceiver<NarrationEvent>,
    ) {
        NarrationPipeline::new(
            NarrationConfig::default(),
            Arc::new(NoopSynthesizer),
            Arc::new(NoopOutput),
        )
    }

    #[test]
    fn pipeline_creates_in_idle_state() {
        let (pipeline, _rx) = pipeline();
        assert_eq!(pipeline.state(), NarrationState::Idle);
        assert!(!pipeline.is_active());
    }

    #[tokio::test]
    async fn toggle_with_no_narratable_text_stays_idle() {
        let (mut pipeline, _rx) = pipeline();
        pipeline.toggle("![only markup](https://x/y.png)\n```\ncode\n```").await;
        assert_eq!(pipeline.state(), NarrationState::Idle);
        assert!(!pipeline.is_active());
    }

    #[tokio::test]
    async fn stop_without_session_is_a_noop() {
        let (mut pipeline, _rx) = pipeline();
        pipeline.stop().await;
        assert_eq!(pipeline.state(), NarrationState::Idle);
    }
}
