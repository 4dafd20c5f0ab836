// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::batcher::Batcher;
use crate::collector::BatchSink;
use crate::config::Config;

/// Producer side of the bounded queue feeding the consumer. Sends wait while the queue is full.
pub type IngressQueue = mpsc::Sender<Bytes>;

/// Single task owning the batch buffer.
///
/// Waits on whichever comes first of a queued payload (appended, which may flush when the batch
/// is past its threshold) or a flush interval tick (flushes whatever is buffered).
pub struct BatchConsumer {
    batcher: Batcher,
    rx: mpsc::Receiver<Bytes>,
    flush_interval: Duration,
}

impl BatchConsumer {
    pub fn new(
        max_elements: u32,
        flush_interval: Duration,
        queue_capacity: usize,
        sink: Arc<dyn BatchSink>,
    ) -> (Self, IngressQueue) {
        let (tx, rx) = mpsc::channel(queue_capacity);
        let consumer = BatchConsumer {
            batcher: Batcher::new(max_elements, sink),
            rx,
            flush_interval,
        };
        (consumer, tx)
    }

    pub fn from_config(config: &Config, sink: Arc<dyn BatchSink>) -> (Self, IngressQueue) {
        Self::new(
            config.max_batch_elements,
            config.flush_interval,
            config.queue_capacity,
            sink,
        )
    }

    /// Runs until cancelled. Buffered spans are not flushed on cancellation.
    ///
    /// Once every producer is gone the loop keeps flushing on ticks only.
    pub async fn run(mut self, cancel: CancellationToken) {
        debug!(
            "Batch consumer started, flushing past {} spans or every {:?}",
            self.batcher.buffer().max_elements(),
            self.flush_interval
        );

        let mut flush_interval = interval(self.flush_interval);
        flush_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        flush_interval.tick().await; // discard first tick, which is instantaneous

        let mut queue_open = true;
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                payload = self.rx.recv(), if queue_open => match payload {
                    Some(payload) => self.batcher.append(&payload).await,
                    None => {
                        debug!("Ingress queue closed, flushing on interval only");
                        queue_open = false;
                    }
                },
                _ = flush_interval.tick() => self.batcher.flush().await,
            }
        }

        debug!(
            "Batch consumer stopped with {} unsent spans",
            self.batcher.buffer().element_count()
        );
    }
}
