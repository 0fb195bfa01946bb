//! Chat backend client.
//!
//! Implements [`Client`] and [`StreamingClient`] against the chat backend's
//! REST endpoints:
//!
//! - `POST /chat/completion` with `stream: false` returns `{"response": "..."}`
//! - `POST /chat/completion` with `stream: true` returns an SSE body
//! - `GET /chat/models` returns `{"models": [{"id", "name"}]}`

use std::future::Future;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio_util::sync::CancellationToken;

use crate::client::{Client, ClientError, StreamingClient};
use crate::http::{add_extra_headers, authorize, build_http_client};
use crate::model::{ChatRequest, ErrorBody, ModelInfo, ModelList, Response};
use crate::options::{ModelOptions, TransportOptions};
use crate::stream::{StreamCompletion, StreamingResponseReader};

const COMPLETION_PATH: &str = "chat/completion";
const MODELS_PATH: &str = "chat/models";

/// Client for the chat backend using HTTP transport.
pub struct BackendClient {
    model_options: ModelOptions,
    transport_options: TransportOptions,
}

impl BackendClient {
    /// Create a new backend client with default options.
    pub fn new(model_options: ModelOptions, transport_options: TransportOptions) -> Self {
        Self {
            model_options,
            transport_options,
        }
    }

    pub fn transport_options(&self) -> &TransportOptions {
        &self.transport_options
    }

    /// List the models the backend offers.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, ClientError> {
        let http_client = build_http_client(&self.transport_options)?;

        let mut req = http_client.get(self.transport_options.endpoint(MODELS_PATH));
        req = authorize(req, &self.transport_options)?;
        req = add_extra_headers(req, &self.transport_options.extra_headers);

        let response = Self::check_status(req.send().await?).await?;
        let list: ModelList = response.json().await?;
        Ok(list.models)
    }

    /// Build an authorized `POST /chat/completion` request.
    fn completion_request(
        &self,
        message: &str,
        model_options: &ModelOptions,
        stream: bool,
    ) -> Result<reqwest::RequestBuilder, ClientError> {
        let http_client = build_http_client(&self.transport_options)?;

        let mut req = http_client
            .post(self.transport_options.endpoint(COMPLETION_PATH))
            .header(CONTENT_TYPE, "application/json");
        req = authorize(req, &self.transport_options)?;
        req = add_extra_headers(req, &self.transport_options.extra_headers);

        Ok(req.json(&ChatRequest::from((message, model_options, stream))))
    }

    /// Turn non-success statuses into provider errors.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::handle_error_response(status, &body))
    }

    /// Handle backend error responses.
    fn handle_error_response(status: reqwest::StatusCode, body: &str) -> ClientError {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(error_body) => ClientError::ProviderError(error_body.error),
            Err(_) => ClientError::ProviderError(format!("HTTP {}: {}", status, body)),
        }
    }
}

/// Run `fut` unless `cancel` fires first.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ClientError::StreamCancelled),
        result = fut => result,
    }
}

#[async_trait]
impl Client for BackendClient {
    async fn request(
        &self,
        message: &str,
        model_options: &ModelOptions,
    ) -> Result<Response, ClientError> {
        let req = self.completion_request(message, model_options, false)?;
        let response = Self::check_status(req.send().await?).await?;
        Ok(response.json().await?)
    }

    fn model_options(&self) -> &ModelOptions {
        &self.model_options
    }
}

#[async_trait]
impl StreamingClient for BackendClient {
    async fn request_stream(
        &self,
        message: &str,
        model_options: &ModelOptions,
        sink: &mut (dyn for<'a> FnMut(&'a str) + Send),
        cancel: &CancellationToken,
    ) -> Result<StreamCompletion, ClientError> {
        let req = self.completion_request(message, model_options, true)?;

        // Dropping the pending request aborts it.
        let response =
            until_cancelled(cancel, async { req.send().await.map_err(ClientError::from) }).await?;
        let response = until_cancelled(cancel, Self::check_status(response)).await?;

        tracing::debug!(model = %model_options.model, "streaming completion");

        let mut reader = StreamingResponseReader::new();
        reader.read(response.bytes_stream(), sink, cancel).await
    }
}
