// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;
use thiserror::Error;

/// Failure to deliver one batch to the collector. Never retried.
#[derive(Debug, Error)]
pub enum ShippingError {
    /// The request could not be sent or no response came back.
    #[error("post error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The collector answered with a status outside of 2xx.
    #[error("post error[{status}] {body}")]
    Rejected { status: StatusCode, body: String },
    /// The collector rejected the batch and its response body could not be read either.
    #[error("post error[{status}] {source}")]
    UnreadableBody {
        status: StatusCode,
        source: reqwest::Error,
    },
}

/// Connection-level error reported by a subscription source.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Raised by broker clients feeding a [`crate::Subscription`] when the broker drops the session.
    #[error("disconnected: {0}")]
    Disconnected(String),
    /// Raised by broker clients feeding a [`crate::Subscription`] on an unexpected frame.
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}
