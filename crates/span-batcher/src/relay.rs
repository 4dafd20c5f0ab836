// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::consumer::IngressQueue;
use crate::subscription::Subscription;

/// Forwards subscription payloads into the ingress queue and logs subscription errors.
///
/// A full queue suspends the relay, which in turn stalls delivery from the source. Errors never
/// stop the relay; nothing is retried or reconnected here.
pub struct IngressRelay {
    queue: IngressQueue,
}

impl IngressRelay {
    #[must_use]
    pub fn new(queue: IngressQueue) -> Self {
        IngressRelay { queue }
    }

    /// Runs until cancelled, until both subscription streams end, or until the consumer is gone.
    pub async fn run(self, subscription: Subscription, cancel: CancellationToken) {
        let Subscription {
            mut payloads,
            mut errors,
        } = subscription;
        let mut payloads_open = true;
        let mut errors_open = true;

        while payloads_open || errors_open {
            tokio::select! {
                () = cancel.cancelled() => break,
                payload = payloads.recv(), if payloads_open => match payload {
                    Some(payload) => {
                        trace!("Relaying payload of {} bytes", payload.len());
                        if self.queue.send(payload).await.is_err() {
                            error!("Ingress queue closed, stopping relay");
                            break;
                        }
                    }
                    None => {
                        debug!("Subscription payload stream ended");
                        payloads_open = false;
                    }
                },
                broker_error = errors.recv(), if errors_open => match broker_error {
                    Some(e) => error!("Subscription error: {e}"),
                    None => {
                        debug!("Subscription error stream ended");
                        errors_open = false;
                    }
                },
            }
        }

        debug!("Ingress relay stopped");
    }
}
