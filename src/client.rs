//! Core client traits and error types.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::model::Response;
use crate::options::ModelOptions;
use crate::stream::StreamCompletion;

/// Errors that can occur during client operations.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The response body failed while it was being streamed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The response body was not valid UTF-8.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Stream cancelled")]
    StreamCancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl ClientError {
    /// Whether this error is a user-initiated stop rather than a failure.
    ///
    /// Callers use this to leave partial output on screen without an error message.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::StreamCancelled)
    }
}

/// Client trait for chat backends returning complete responses.
///
/// # Required Methods
/// - `request`: sends one message with explicit model options
/// - `model_options`: accessor for the stored default options
///
/// # Provided Methods
/// - `chat`: uses the stored default options
#[async_trait]
pub trait Client: Send + Sync {
    /// Send a single user message and wait for the complete reply.
    async fn request(
        &self,
        message: &str,
        model_options: &ModelOptions,
    ) -> Result<Response, ClientError>;

    /// Get reference to the default model options.
    fn model_options(&self) -> &ModelOptions;

    /// Instance method that uses the default model options stored in the client.
    async fn chat(&self, message: &str) -> Result<Response, ClientError> {
        self.request(message, self.model_options()).await
    }
}

/// Extension trait for streaming support.
///
/// Deltas are pushed into `sink` in arrival order while the reply streams in.
/// Firing `cancel` stops the stream within one chunk wait and yields
/// [`ClientError::StreamCancelled`].
///
/// # Example
/// ```rust,ignore
/// let cancel = CancellationToken::new();
/// let done = client
///     .chat_stream("Hello!", &mut |delta| print!("{delta}"), &cancel)
///     .await?;
/// println!("\n{:?}", done.termination);
/// ```
#[async_trait]
pub trait StreamingClient: Client {
    /// Send a single user message and stream the reply into `sink`.
    async fn request_stream(
        &self,
        message: &str,
        model_options: &ModelOptions,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
        cancel: &CancellationToken,
    ) -> Result<StreamCompletion, ClientError>;

    /// Streaming with the default model options.
    async fn chat_stream(
        &self,
        message: &str,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
        cancel: &CancellationToken,
    ) -> Result<StreamCompletion, ClientError> {
        self.request_stream(message, self.model_options(), sink, cancel)
            .await
    }
}
