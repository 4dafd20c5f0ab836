// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use bytes::Bytes;
use core::time::Duration;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, error};

use crate::config::Config;
use crate::errors::ShippingError;

/// Span ingest path, relative to the collector base URI.
pub const SPANS_PATH: &str = "/api/v1/spans";

/// Content type of a thrift encoded span list.
pub const THRIFT_CONTENT_TYPE: &str = "application/x-thrift";

/// Destination of flushed batches.
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Delivers one batch. Implementations report failures and never retry.
    async fn ship(&self, batch: Bytes) -> Result<(), ShippingError>;
}

/// Posts batches to the span ingest endpoint of a collector.
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: reqwest::Client,
    spans_url: String,
}

impl HttpCollector {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let client = build_client(
            config.https_proxy.as_deref(),
            config.collector_timeout,
            config.collector_connect_timeout,
        )
        .unwrap_or_else(|e| {
            error!(
                "Unable to parse proxy configuration: {}, no proxy will be used",
                e
            );
            reqwest::Client::new()
        });
        HttpCollector {
            client,
            spans_url: config.spans_url(),
        }
    }

    pub fn spans_url(&self) -> &str {
        &self.spans_url
    }
}

#[async_trait]
impl BatchSink for HttpCollector {
    async fn ship(&self, batch: Bytes) -> Result<(), ShippingError> {
        debug!("Posting {} bytes to {}", batch.len(), self.spans_url);
        let response = self
            .client
            .post(&self.spans_url)
            .header(CONTENT_TYPE, THRIFT_CONTENT_TYPE)
            .body(batch)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        match response.text().await {
            Ok(body) => Err(ShippingError::Rejected { status, body }),
            Err(source) => Err(ShippingError::UnreadableBody { status, source }),
        }
    }
}

fn build_client(
    https_proxy: Option<&str>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy) = https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    builder.build()
}

/// Sink that keeps every batch it is given, optionally answering each one with a rejection.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingSink {
    batches: std::sync::Mutex<Vec<Bytes>>,
    reject: bool,
}

#[cfg(test)]
impl RecordingSink {
    pub(crate) fn rejecting() -> Self {
        RecordingSink {
            batches: std::sync::Mutex::default(),
            reject: true,
        }
    }

    pub(crate) fn batches(&self) -> Vec<Bytes> {
        self.batches.lock().expect("lock poisoned").clone()
    }
}

#[cfg(test)]
#[async_trait]
impl BatchSink for RecordingSink {
    async fn ship(&self, batch: Bytes) -> Result<(), ShippingError> {
        self.batches.lock().expect("lock poisoned").push(batch);
        if self.reject {
            return Err(ShippingError::Rejected {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "collector unavailable".to_string(),
            });
        }
        Ok(())
    }
}
