// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! In-progress batch in the collector's wire format.
//!
//! A batch is a bare thrift list header followed by the span structs, already encoded by the
//! producers:
//!
//! ```text
//!   +------+----------------------+-----------+-----------+-----
//!   | 0x0c | element count (u32be) | payload 1 | payload 2 | ...
//!   +------+----------------------+-----------+-----------+-----
//! ```
//!
//! Payloads are copied in arrival order with no delimiter or padding between them.

use bytes::{BufMut, Bytes, BytesMut};

/// Thrift `TType::Struct`, the element type of the span list.
pub const LIST_ELEMENT_TAG: u8 = 12;

/// Tag byte plus the big-endian element count.
pub const HEADER_LEN: usize = 5;

const INITIAL_CAPACITY: usize = 64 * 1024;

/// Wire bytes and element count of the batch being built.
///
/// Only element count governs flushing; the byte length is unbounded.
#[derive(Debug)]
pub struct BatchBuffer {
    element_count: u32,
    max_elements: u32,
    buf: BytesMut,
}

impl BatchBuffer {
    pub fn new(max_elements: u32) -> Self {
        let mut buffer = BatchBuffer {
            element_count: 0,
            max_elements,
            buf: BytesMut::with_capacity(INITIAL_CAPACITY),
        };
        buffer.write_header();
        buffer
    }

    /// True once more than `max_elements` spans are buffered.
    ///
    /// The comparison is strict, so a batch reaches `max_elements + 1` spans before the next
    /// append flushes it. Senders observe batches of up to `max_elements + 1` elements.
    pub fn is_over_threshold(&self) -> bool {
        self.element_count > self.max_elements
    }

    /// Appends one encoded span and rewrites the count in the header.
    pub fn push(&mut self, payload: &[u8]) {
        self.element_count += 1;
        self.buf[1..HEADER_LEN].copy_from_slice(&self.element_count.to_be_bytes());
        self.buf.extend_from_slice(payload);
    }

    /// Drops every buffered span, keeping only the header.
    pub fn reset(&mut self) {
        self.buf.truncate(HEADER_LEN);
        self.element_count = 0;
        self.buf[1..HEADER_LEN].copy_from_slice(&0u32.to_be_bytes());
    }

    /// Hands out the current batch and leaves an empty one behind.
    pub fn take(&mut self) -> Bytes {
        let batch = self.buf.split().freeze();
        self.element_count = 0;
        self.write_header();
        batch
    }

    pub fn element_count(&self) -> u32 {
        self.element_count
    }

    pub fn max_elements(&self) -> u32 {
        self.max_elements
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// Length of the wire bytes, header included.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    fn write_header(&mut self) {
        self.buf.put_u8(LIST_ELEMENT_TAG);
        self.buf.put_u32(self.element_count);
    }
}

/// Reads the element count out of a batch header.
///
/// Returns `None` when the bytes are too short or do not start with a struct list tag.
pub fn read_element_count(batch: &[u8]) -> Option<u32> {
    match batch {
        [LIST_ELEMENT_TAG, a, b, c, d, ..] => Some(u32::from_be_bytes([*a, *b, *c, *d])),
        _ => None,
    }
}
