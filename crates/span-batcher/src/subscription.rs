// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Contract between a subscription source and the ingress relay.
//!
//! A source (broker client, datagram listener, ...) owns a [`SubscriptionSender`] and pushes two
//! independent streams through it: opaque span payloads in delivery order, and connection level
//! errors. The relay consumes the matching [`Subscription`].

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::errors::BrokerError;

pub struct Subscription {
    pub payloads: mpsc::Receiver<Bytes>,
    pub errors: mpsc::Receiver<BrokerError>,
}

impl Subscription {
    /// Creates both streams, each buffering up to `capacity` events.
    pub fn channel(capacity: usize) -> (SubscriptionSender, Subscription) {
        let (payloads_tx, payloads) = mpsc::channel(capacity);
        let (errors_tx, errors) = mpsc::channel(capacity);
        (
            SubscriptionSender {
                payloads: payloads_tx,
                errors: errors_tx,
            },
            Subscription { payloads, errors },
        )
    }
}

#[derive(Clone)]
pub struct SubscriptionSender {
    payloads: mpsc::Sender<Bytes>,
    errors: mpsc::Sender<BrokerError>,
}

impl SubscriptionSender {
    /// Delivers one payload, waiting while the stream is full.
    pub async fn payload(&self, payload: Bytes) -> Result<(), mpsc::error::SendError<Bytes>> {
        self.payloads.send(payload).await
    }

    pub async fn error(&self, error: BrokerError) -> Result<(), mpsc::error::SendError<BrokerError>> {
        self.errors.send(error).await
    }
}
