use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::{config::WidgetConfig, message::ChatRequest};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("response body is not json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request was abandoned before it completed")]
    Abandoned,
}

/// One outbound chat call. Implementations perform exactly one request per call
/// and never retry.
pub trait ChatTransport {
    fn send(&self, request: &ChatRequest) -> impl Future<Output = Result<Value, TransportError>> + Send;
}

/// Client context built once at startup: the HTTP client plus where to send.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: reqwest::Client,
    config: WidgetConfig,
}

impl HttpTransport {
    pub fn new(config: WidgetConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(http: reqwest::Client, config: WidgetConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }
}

impl ChatTransport for HttpTransport {
    async fn send(&self, request: &ChatRequest) -> Result<Value, TransportError> {
        let res = self
            .http
            .post(self.config.endpoint_url.clone())
            .bearer_auth(&self.config.credential)
            .json(request)
            .send()
            .await?;

        // Status is not checked; an error envelope still parses and falls
        // through to the reply-shape check.
        let bytes = res.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
