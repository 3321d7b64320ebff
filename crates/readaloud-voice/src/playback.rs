//! Audio playback — a dedicated thread owning `rodio`, with an async seam
//! in front.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so the stream is
//! confined to a single OS thread and driven through a command channel; the
//! [`RodioOutput`] handle is the `Send + Sync` proxy the pipeline holds.

use std::sync::Arc;
use std::sync::mpsc;
use std::thread;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::NarrationError;
use crate::synth::AudioClip;

/// Playback layer the pipeline drives.
#[async_trait::async_trait]
pub trait AudioOutput: Send + Sync {
    /// Play one clip to completion.
    ///
    /// Resolves `Ok(())` when the clip drains naturally. If `cancel` fires
    /// first, sound stops immediately and the call fails with
    /// [`NarrationError::Cancelled`]. Decode or device failures are
    /// [`NarrationError::Playback`]. The clip reference is released on every
    /// exit path.
    async fn play(&self, clip: AudioClip, cancel: &CancellationToken)
    -> Result<(), NarrationError>;
}

// ── Commands ───────────────────────────────────────────────────────

/// A command sent from the pipeline to the playback thread.
enum PlaybackCommand {
    /// Decode and play a clip; `done` fires when the sink drains.
    Play {
        clip: AudioClip,
        done: oneshot::Sender<Result<(), NarrationError>>,
    },

    /// Stop any active playback immediately (fire-and-forget).
    Stop,

    /// Shut down the playback thread, releasing the output device.
    Shutdown,
}

// ── Handle (Send + Sync proxy) ─────────────────────────────────────

/// `Send + Sync` handle to the dedicated playback thread.
pub struct RodioOutput {
    cmd_tx: mpsc::Sender<PlaybackCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl RodioOutput {
    /// Spawn the playback thread and open the default output device.
    ///
    /// Device errors are propagated back through a one-shot init channel.
    pub fn spawn() -> Result<Self, NarrationError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<PlaybackCommand>();
        let (init_tx, init_rx) = mpsc::channel::<Result<(), NarrationError>>();

        let thread = thread::Builder::new()
            .name("readaloud-playback".into())
            .spawn(move || run(&cmd_rx, &init_tx))
            .map_err(|e| {
                NarrationError::OutputStream(format!("failed to spawn playback thread: {e}"))
            })?;

        // Wait for the playback thread to finish initialisation.
        init_rx.recv().map_err(|_| NarrationError::AudioThreadDied)??;

        Ok(Self {
            cmd_tx,
            thread: Some(thread),
        })
    }

    fn stop_playback(&self) {
        let _ = self.cmd_tx.send(PlaybackCommand::Stop);
    }
}

#[async_trait::async_trait]
impl AudioOutput for RodioOutput {
    async fn play(
        &self,
        clip: AudioClip,
        cancel: &CancellationToken,
    ) -> Result<(), NarrationError> {
        let (done_tx, done_rx) = oneshot::channel();
        self.cmd_tx
            .send(PlaybackCommand::Play {
                clip,
                done: done_tx,
            })
            .map_err(|_| NarrationError::AudioThreadDied)?;

        tokio::select! {
            res = done_rx => res.map_err(|_| NarrationError::AudioThreadDied)?,
            () = cancel.cancelled() => {
                self.stop_playback();
                Err(NarrationError::Cancelled)
            }
        }
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        // Best-effort shutdown — the thread may already be dead.
        let _ = self.cmd_tx.send(PlaybackCommand::Shutdown);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

// ── Playback thread event loop ─────────────────────────────────────

/// Body of the dedicated playback thread. Owns the `rodio` output stream for
/// its entire lifetime — it never crosses a thread boundary.
fn run(
    cmd_rx: &mpsc::Receiver<PlaybackCommand>,
    init_tx: &mpsc::Sender<Result<(), NarrationError>>,
) {
    let (stream, stream_handle) = match rodio::OutputStream::try_default() {
        Ok(pair) => pair,
        Err(e) => {
            let _ = init_tx.send(Err(NarrationError::OutputStream(e.to_string())));
            return;
        }
    };
    // The stream must outlive every sink created from its handle.
    let _stream = stream;

    if init_tx.send(Ok(())).is_err() {
        // Caller dropped — nothing to do.
        return;
    }

    tracing::info!("Audio playback initialized on default output device");

    let mut current: Option<Arc<rodio::Sink>> = None;

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            PlaybackCommand::Play { clip, done } => {
                // Replace any leftover sink
                if let Some(sink) = current.take() {
                    sink.stop();
                }

                let sink = match rodio::Sink::try_new(&stream_handle) {
                    Ok(sink) => Arc::new(sink),
                    Err(e) => {
                        let _ = done.send(Err(NarrationError::Playback(e.to_string())));
                        continue;
                    }
                };

                let source = match rodio::Decoder::new(clip.into_reader()) {
                    Ok(source) => source,
                    Err(e) => {
                        let _ = done.send(Err(NarrationError::Playback(e.to_string())));
                        continue;
                    }
                };

                sink.append(source);
                current = Some(Arc::clone(&sink));

                // Watcher thread blocks until the sink drains (or an external
                // stop empties it — the receiver side has already moved on by
                // then, so the late `done` is simply dropped).
                thread::spawn(move || {
                    sink.sleep_until_end();
                    let _ = done.send(Ok(()));
                });
            }

            PlaybackCommand::Stop => {
                if let Some(sink) = current.take() {
                    sink.stop();
                }
                tracing::debug!("Audio playback stopped");
            }

            PlaybackCommand::Shutdown => break,
        }
    }

    // The output stream is dropped here, on the playback thread.
    tracing::debug!("Playback thread shutting down");
}
