use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use watson_stt::{
    AudioFormat, ClientConfig, ModelRef, RecognitionEvent, RecognizeOptions, SpeechToText,
};

/// Speech-to-text client for the Watson v1 API
#[derive(Parser, Debug)]
#[command(name = "watson-stt")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the models the service offers
    Models,

    /// Show one model
    Model {
        /// Model name, e.g. en-US_BroadbandModel
        name: String,
    },

    /// Create a session, print its status and delete it
    Session {
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Transcribe a file with a single request
    Recognize {
        file: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        /// Request per-word timestamps
        #[arg(long)]
        timestamps: bool,

        /// Request per-word confidence
        #[arg(long)]
        word_confidence: bool,
    },

    /// Transcribe a file over a streaming channel
    Stream {
        file: PathBuf,

        #[arg(short, long)]
        model: Option<String>,

        /// Print interim results as they arrive
        #[arg(long)]
        interim: bool,

        /// Give up if no final result arrives within this many seconds
        #[arg(long, default_value_t = 60)]
        timeout_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Must be installed before any TLS connection is attempted
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::from_env()?,
    };
    let client = SpeechToText::new(config)?;

    match cli.command {
        Commands::Models => {
            for model in client.sessions().list_models().await? {
                println!(
                    "{:<32} {:>6} Hz  {}",
                    model.name,
                    model.rate,
                    model.description.unwrap_or_default()
                );
            }
        }
        Commands::Model { name } => {
            let model = client.sessions().get_model(&name).await?;
            println!("{}", serde_json::to_string_pretty(&model)?);
        }
        Commands::Session { model } => {
            let model = model.map(ModelRef::from).or_else(|| client.default_model().cloned());
            let guard = client.sessions().create_guarded(model).await?;
            println!("session {}", guard.id());

            let status = client.sessions().get_recognition_status(&guard).await;
            guard.close().await?;

            let status = status?;
            println!("model {} state {}", status.model_name(), status.state);
        }
        Commands::Recognize {
            file,
            model,
            timestamps,
            word_confidence,
        } => {
            let options = options_for(&client, model)
                .timestamps(timestamps)
                .word_confidence(word_confidence);
            let results = client
                .recognizer()
                .recognize_file(&file, Some(options))
                .await?;
            println!("{}", results.best_transcript());
        }
        Commands::Stream {
            file,
            model,
            interim,
            timeout_secs,
        } => {
            let format = AudioFormat::from_path(&file)
                .with_context(|| format!("cannot infer audio format of {}", file.display()))?;
            let audio = tokio::fs::File::open(&file)
                .await
                .with_context(|| format!("cannot open {}", file.display()))?;
            let options = options_for(&client, model)
                .continuous(true)
                .interim_results(interim)
                .audio_format(format);

            let mut stream = client.streaming().recognize(audio, options);
            let deadline = tokio::time::sleep(Duration::from_secs(timeout_secs));
            tokio::pin!(deadline);

            loop {
                let event = tokio::select! {
                    event = stream.next_event() => event,
                    _ = &mut deadline => {
                        stream.close().await;
                        return Err(anyhow!("no final result within {timeout_secs}s"));
                    }
                };
                match event {
                    Some(RecognitionEvent::Interim(results)) => {
                        eprintln!("... {}", results.best_transcript());
                    }
                    Some(RecognitionEvent::Final(results)) => {
                        println!("{}", results.best_transcript());
                        break;
                    }
                    Some(RecognitionEvent::Error(error)) => return Err(error.into()),
                    Some(RecognitionEvent::Disconnected) | None => {
                        return Err(anyhow!("channel closed before a final result"));
                    }
                    Some(RecognitionEvent::Connected) => info!("Connected"),
                }
            }
        }
    }

    Ok(())
}

fn options_for(client: &SpeechToText, model: Option<String>) -> RecognizeOptions {
    match model {
        Some(model) => RecognizeOptions::new().model(model),
        None => client.default_options(),
    }
}
