// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Relays opaque, thrift-encoded spans from a subscription source to an HTTP span collector.
//!
//! ```text
//!   Subscription ──> IngressRelay ──> bounded queue ──> BatchConsumer ──> Batcher ──> BatchSink
//!   (payloads,        (forwards,                        (queue pop vs.     (wire       (HTTP POST
//!    errors)           logs errors)                      timer tick)        buffer)     /api/v1/spans)
//! ```
//!
//! The consumer task is the only owner of the batch buffer. Flushes are best effort: whatever the
//! outcome of the POST, the batch is dropped and the buffer starts over.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod batcher;
pub mod collector;
pub mod config;
pub mod consumer;
pub mod errors;
pub mod relay;
pub mod subscription;
pub mod udp;
pub mod wire;

pub use batcher::Batcher;
pub use collector::{BatchSink, HttpCollector};
pub use config::Config;
pub use consumer::{BatchConsumer, IngressQueue};
pub use relay::IngressRelay;
pub use subscription::{Subscription, SubscriptionSender};
pub use udp::UdpSource;
pub use wire::BatchBuffer;
