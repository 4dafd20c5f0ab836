// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Datagram subscription source: every datagram received is one encoded span.

use bytes::Bytes;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::errors::BrokerError;
use crate::subscription::SubscriptionSender;

// Largest payload a UDP datagram can carry
const BUFFER_SIZE: usize = 65_535;

pub struct UdpSource {
    socket: UdpSocket,
}

impl UdpSource {
    pub async fn bind(addr: &str) -> std::io::Result<UdpSource> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(UdpSource { socket })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives datagrams until cancelled or until the subscription is dropped.
    ///
    /// Socket errors are reported on the error stream and receiving continues.
    pub async fn spin(self, sender: SubscriptionSender, cancel: CancellationToken) {
        let mut buf = vec![0u8; BUFFER_SIZE];
        loop {
            let received = tokio::select! {
                () = cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buf) => received,
            };

            let delivered = match received {
                Ok((0, src)) => {
                    trace!("Ignoring empty datagram from {}", src);
                    continue;
                }
                Ok((amt, src)) => {
                    trace!("Received {} bytes from {}", amt, src);
                    sender
                        .payload(Bytes::copy_from_slice(&buf[..amt]))
                        .await
                        .is_ok()
                }
                Err(e) => sender.error(BrokerError::Io(e)).await.is_ok(),
            };
            if !delivered {
                debug!("Subscription dropped, closing datagram source");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::Subscription;

    #[tokio::test]
    async fn test_datagrams_become_payloads() {
        let source = UdpSource::bind("127.0.0.1:0").await.expect("failed to bind");
        let addr = source.local_addr().expect("no local addr");
        let (sender, mut subscription) = Subscription::channel(16);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(source.spin(sender, cancel.clone()));

        let client = UdpSocket::bind("127.0.0.1:0").await.expect("failed to bind");
        client.send_to(b"", addr).await.expect("send failed");
        client.send_to(b"span-1", addr).await.expect("send failed");
        client.send_to(b"span-2", addr).await.expect("send failed");

        assert_eq!(
            subscription.payloads.recv().await,
            Some(Bytes::from_static(b"span-1"))
        );
        assert_eq!(
            subscription.payloads.recv().await,
            Some(Bytes::from_static(b"span-2"))
        );

        cancel.cancel();
        task.await.expect("source task failed");
        assert!(subscription.errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stops_when_subscription_dropped() {
        let source = UdpSource::bind("127.0.0.1:0").await.expect("failed to bind");
        let addr = source.local_addr().expect("no local addr");
        let (sender, subscription) = Subscription::channel(16);
        drop(subscription);
        let task = tokio::spawn(source.spin(sender, CancellationToken::new()));

        let client = UdpSocket::bind("127.0.0.1:0").await.expect("failed to bind");
        client.send_to(b"orphan", addr).await.expect("send failed");

        task.await.expect("source task failed");
    }
}
