//! Stream a reply from the chat backend, stopping on Ctrl-C.
//!
//! Run with:
//! ```bash
//! export EIMEMES_BACKEND_URL="https://chat.example.com/api"
//! export EIMEMES_BACKEND_TOKEN="id-token-from-identity-provider"
//! cargo run --example stream_chat -- "Write a haiku about Rust programming."
//! ```

use std::io::Write;

use eimemes::backend::BackendClient;
use eimemes::client::StreamingClient;
use eimemes::options::{ModelOptions, TransportOptions};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let message = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Hello!".to_string());

    let client = BackendClient::new(ModelOptions::default(), TransportOptions::from_env()?);

    let models = client.list_models().await?;
    println!("Available models: {}", models.len());

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let mut print_delta = |delta: &str| {
        print!("{}", delta);
        let _ = std::io::stdout().flush();
    };

    match client.chat_stream(&message, &mut print_delta, &cancel).await {
        Ok(done) => {
            println!("\n\n=== Stream Complete ===");
            println!("Termination: {:?}", done.termination);
            println!("Deltas: {}", done.deltas);
        }
        Err(e) if e.is_cancelled() => println!("\n\n=== Stopped ==="),
        Err(e) => {
            eprintln!("\nSorry, I encountered an error. Please try again. ({})", e);
            return Err(e.into());
        }
    }

    Ok(())
}
