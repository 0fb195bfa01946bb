//! HTTP client utilities for talking to the chat backend.

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder};
use std::collections::HashMap;

use crate::client::ClientError;
use crate::options::TransportOptions;

/// reqwest client for one backend call, with the configured timeout and proxy.
///
/// An unparseable proxy URL is logged and skipped rather than failing the call.
pub fn build_http_client(transport_options: &TransportOptions) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder();

    if let Some(timeout) = transport_options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(proxy_url) = &transport_options.proxy {
        match reqwest::Proxy::all(proxy_url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => tracing::warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy"),
        }
    }

    builder.build()
}

/// Copy the configured extra headers (tracing ids, gateway keys) onto `request`.
pub fn add_extra_headers(
    request: RequestBuilder,
    extra_headers: &Option<HashMap<String, String>>,
) -> RequestBuilder {
    extra_headers
        .iter()
        .flatten()
        .fold(request, |request, (key, value)| request.header(key, value))
}

/// Attach the bearer token, failing before any I/O when none is configured.
pub fn authorize(
    request: RequestBuilder,
    transport_options: &TransportOptions,
) -> Result<RequestBuilder, ClientError> {
    let token = transport_options
        .token
        .as_ref()
        .ok_or_else(|| ClientError::Config("Not authenticated".to_string()))?;

    Ok(request.header(AUTHORIZATION, format!("Bearer {}", token.expose_secret())))
}
