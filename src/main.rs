mod client;
mod clipboard;
mod credential;
mod error;
mod gemini;
mod image;
mod prompt;
mod transcript;

use clap::{Parser, Subcommand};
use client::InferenceClient;
use credential::CredentialStore;
use error::ClientError;
use image::ImagePayload;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, Level};
use transcript::Transcription;

#[derive(Parser, Debug)]
#[command(name = "handscribe")]
#[command(about = "Transcribe handwritten text from images with the Gemini API")]
struct Args {
    /// Path to the credential file (default: the platform config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// trace, debug, info, warn, error
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate and save the Gemini API key
    SetKey {
        /// The key, as copied from aistudio.google.com/apikey
        key: String,
    },
    /// Transcribe one image and print the text
    Transcribe {
        /// Image file (JPG, PNG, WEBP); omit when piping with --stdin
        image: Option<PathBuf>,

        /// Read the image bytes from stdin instead of a file
        #[arg(long)]
        stdin: bool,

        /// Copy the transcription to the system clipboard
        #[arg(long)]
        copy: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Parse log level
    let log_level = Level::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level: {}. Using WARN level.", args.log_level);
        Level::WARN
    });
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let store = match args.config {
        Some(path) => CredentialStore::new(path),
        None => CredentialStore::new(CredentialStore::default_path()?),
    };

    match args.command {
        Command::SetKey { key } => set_key(&store, &key),
        Command::Transcribe { image, stdin, copy } => {
            transcribe(&store, image.as_deref(), stdin, copy).await
        }
    }
}

fn set_key(store: &CredentialStore, raw: &str) -> anyhow::Result<()> {
    let key = match credential::normalize_key(raw) {
        Ok(key) => key,
        Err(e) => fail(&e),
    };
    store.save(&key)?;
    info!("Credential stored at {}", store.path().display());
    println!("API key saved — ready to transcribe.");
    Ok(())
}

async fn transcribe(
    store: &CredentialStore,
    image: Option<&std::path::Path>,
    stdin: bool,
    copy: bool,
) -> anyhow::Result<()> {
    let payload = if stdin {
        ImagePayload::from_reader(&mut std::io::stdin().lock())?
    } else {
        let path = image
            .ok_or_else(|| anyhow::anyhow!("supply an image path, or pipe one with --stdin"))?;
        ImagePayload::from_path(path)?
    };

    let credential = store.load()?;
    let client = InferenceClient::new(Arc::new(reqwest::Client::new()), credential);

    let request = match client.build_request(&payload) {
        Ok(request) => request,
        Err(e) => fail(&e),
    };
    let text = match client.execute(&request).await {
        Ok(text) => text,
        Err(e) => fail(&e),
    };

    let transcription = Transcription::new(text);
    println!("{}", transcription.text);
    eprintln!("{}", transcription.summary());

    if copy {
        clipboard::copy_text(&transcription.text)?;
        eprintln!("Copied to clipboard.");
    }

    Ok(())
}

/// Render a classified error (with its contextual hint, when one exists) and
/// exit non-zero.
fn fail(e: &ClientError) -> ! {
    eprintln!("Error: {}", e);
    if let Some(hint) = e.hint() {
        eprintln!("{}", hint);
    }
    std::process::exit(1);
}
