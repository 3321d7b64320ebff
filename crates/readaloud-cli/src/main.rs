//! CLI entry point — the composition root.
//!
//! This is the only place where infrastructure is wired together: the
//! ElevenLabs synthesizer and the local audio output are injected into the
//! narration pipeline here. The reading-time estimate is printed once, and
//! the narration toggle is bound to Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use readaloud_core::{ReadingTime, SanitizeOptions, sanitize};
use readaloud_voice::elevenlabs::{DEFAULT_MODEL_ID, DEFAULT_VOICE_ID};
use readaloud_voice::{
    ElevenLabsConfig, ElevenLabsSynthesizer, NarrationConfig, NarrationEvent, NarrationPipeline,
    NarrationState, RodioOutput,
};

#[derive(Debug, Parser)]
#[command(
    name = "readaloud",
    version,
    about = "Narrate a document aloud with streaming TTS"
)]
struct Cli {
    /// Document to narrate (plain text or markdown)
    document: PathBuf,

    /// Print the estimated reading time and exit without narrating
    #[arg(long)]
    estimate_only: bool,

    /// ElevenLabs API credential
    #[arg(long, env = "ELEVENLABS_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Voice to synthesize with
    #[arg(long, default_value = DEFAULT_VOICE_ID)]
    voice_id: String,

    /// Synthesis model
    #[arg(long, default_value = DEFAULT_MODEL_ID)]
    model_id: String,

    /// Extra citation label to strip from the text (repeatable)
    #[arg(long = "citation-label")]
    citation_labels: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "readaloud=info".into()),
        )
        .init();

    run(Cli::parse()).await
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&cli.document)
        .with_context(|| format!("failed to read {}", cli.document.display()))?;

    let mut sanitize_options = SanitizeOptions::default();
    sanitize_options
        .citation_labels
        .extend(cli.citation_labels.iter().cloned());

    // Display-only, computed once over the sanitized full text.
    let estimate = ReadingTime::estimate(&sanitize(&text, &sanitize_options));
    println!("Estimated reading time: {estimate}");

    if cli.estimate_only {
        return Ok(());
    }

    let api_key = cli
        .api_key
        .context("no API key: pass --api-key or set ELEVENLABS_API_KEY")?;

    let mut synth_config = ElevenLabsConfig::new(api_key);
    synth_config.voice_id = cli.voice_id;
    synth_config.model_id = cli.model_id;

    let synthesizer = Arc::new(ElevenLabsSynthesizer::new(synth_config));
    let output = Arc::new(RodioOutput::spawn()?);

    let (mut pipeline, mut events) = NarrationPipeline::new(
        NarrationConfig {
            sanitize: sanitize_options,
        },
        synthesizer,
        output,
    );

    pipeline.toggle(&text).await;
    if !pipeline.is_active() {
        println!("Nothing to narrate.");
        return Ok(());
    }

    println!("Narrating — press Ctrl-C to stop.");

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                pipeline.toggle(&text).await;
                println!("Narration stopped.");
                break;
            }
            event = events.recv() => match event {
                Some(NarrationEvent::StateChanged(NarrationState::Playing)) => {
                    tracing::info!("Playback started");
                }
                Some(NarrationEvent::ParagraphStarted { index }) => {
                    tracing::debug!(paragraph = index, "Paragraph started");
                }
                Some(NarrationEvent::Error(message)) => {
                    eprintln!("Narration failed: {message}");
                    break;
                }
                Some(NarrationEvent::Finished) => {
                    println!("Narration finished.");
                    break;
                }
                Some(_) => {}
                None => break,
            }
        }
    }

    Ok(())
}
