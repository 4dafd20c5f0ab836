// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::{env, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use span_batcher::{
    BatchConsumer, Config, HttpCollector, IngressRelay, Subscription, UdpSource,
};

#[tokio::main]
pub async fn main() {
    let log_level = env::var("SPAN_RELAY_LOG_LEVEL")
        .map(|val| val.to_lowercase())
        .unwrap_or("info".to_string());

    let env_filter = format!("h2=off,hyper=off,hyper_util=off,reqwest=off,rustls=off,{}", log_level);

    #[allow(clippy::expect_used)]
    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).expect("could not parse log level in configuration"),
        )
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .without_time()
        .finish();

    #[allow(clippy::expect_used)]
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    debug!("Logging subsystem enabled");

    let config = match Config::new() {
        Ok(c) => c,
        Err(e) => {
            error!("Error creating config on span relay startup: {e}");
            return;
        }
    };

    let source = match UdpSource::bind(&config.listen_addr()).await {
        Ok(source) => source,
        Err(e) => {
            error!("Unable to listen on {}: {e}", config.listen_addr());
            return;
        }
    };

    let collector = Arc::new(HttpCollector::new(&config));
    info!("Forwarding span batches to {}", collector.spans_url());

    let cancel = CancellationToken::new();
    let (consumer, queue) = BatchConsumer::from_config(&config, collector);
    let (sender, subscription) = Subscription::channel(config.queue_capacity);

    let consumer_task = tokio::spawn(consumer.run(cancel.clone()));
    tokio::spawn(IngressRelay::new(queue).run(subscription, cancel.clone()));
    tokio::spawn(source.spin(sender, cancel.clone()));
    info!("span-relay: listening for spans on {}", config.listen_addr());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Unable to listen for shutdown signal: {e}");
        // keep relaying until the process is killed
        std::future::pending::<()>().await;
    }

    info!("Shutting down, buffered spans are not flushed");
    cancel.cancel();
    if let Err(e) = consumer_task.await {
        error!("Batch consumer task failed: {e}");
    }
}
