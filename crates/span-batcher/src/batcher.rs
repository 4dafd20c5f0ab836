// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::collector::BatchSink;
use crate::wire::BatchBuffer;

/// Batch buffer bound to the sink it flushes into.
///
/// Not shareable on purpose: the owning task is the only one allowed to append or flush.
pub struct Batcher {
    buffer: BatchBuffer,
    sink: Arc<dyn BatchSink>,
}

impl Batcher {
    pub fn new(max_elements: u32, sink: Arc<dyn BatchSink>) -> Self {
        Batcher {
            buffer: BatchBuffer::new(max_elements),
            sink,
        }
    }

    /// Adds one span, flushing first when the buffer is already past its threshold.
    pub async fn append(&mut self, payload: &[u8]) {
        if self.buffer.is_over_threshold() {
            self.flush().await;
        }
        self.buffer.push(payload);
    }

    /// Sends the buffered batch, if any, and starts a new one whatever the outcome.
    ///
    /// Failures are logged and the batch is dropped; nothing is retried.
    pub async fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let element_count = self.buffer.element_count();
        let batch = self.buffer.take();

        let start = Instant::now();
        match self.sink.ship(batch).await {
            Ok(()) => info!(
                "Submitted {} spans in {:?}",
                element_count,
                start.elapsed()
            ),
            Err(e) => error!("Dropped batch of {element_count} spans: {e}"),
        }
    }

    /// Discards buffered spans without sending them.
    pub fn reset(&mut self) {
        self.buffer.reset();
    }

    pub fn buffer(&self) -> &BatchBuffer {
        &self.buffer
    }
}
