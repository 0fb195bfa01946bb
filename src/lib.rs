//! # eimemes - chat backend client
//!
//! An async client for the Eimemes chat backend, built around an
//! incremental reader for its streamed (Server-Sent Events) replies.
//!
//! ## Features
//! - Async-first, tokio compatible
//! - Streaming replies delivered as text deltas to a caller-supplied sink
//! - Cooperative cancellation via [`CancellationToken`](tokio_util::sync::CancellationToken)
//! - UTF-8 and line framing that survive arbitrary chunk boundaries
//!
//! ## Example
//! ```no_run
//! use eimemes::backend::BackendClient;
//! use eimemes::client::StreamingClient;
//! use eimemes::options::{ModelOptions, TransportOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport_options = TransportOptions::new("https://chat.example.com/api".to_string())
//!         .with_token("id-token-from-identity-provider");
//!     let client = BackendClient::new(ModelOptions::default(), transport_options);
//!
//!     let cancel = CancellationToken::new();
//!     let done = client
//!         .chat_stream("Hello!", &mut |delta: &str| print!("{}", delta), &cancel)
//!         .await?;
//!
//!     println!("\n{:?}", done.termination);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod sse;
pub mod stream;

// Re-exports for convenience
pub use backend::BackendClient;
pub use client::{Client, ClientError, StreamingClient};
pub use model::Response;
pub use stream::{ReaderState, StreamCompletion, StreamingResponseReader, Termination};
