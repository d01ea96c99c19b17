// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! One-shot UDP request/response exchange.
//!
//! [`exchange`] sends exactly one datagram and waits for exactly one reply
//! or the deadline, whichever comes first. The ephemeral socket exists
//! only for the duration of the call and is released on every exit path
//! (success, timeout, or error) when it drops.
//!
//! There is no retransmission here; retry policy belongs to callers (the
//! executor retries, discovery re-probes inside its own window).

use crate::config::MAX_PACKET_SIZE;
use crate::error::{Error, Result};
use crate::protocol::{Request, Response};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time;

/// Send `request` to `addr` and await a single parsed reply.
///
/// The reply is accepted from any source: lamps answer from their own
/// address, which may differ from the probed one when NAT-ish home
/// routers rewrite broadcast traffic.
pub async fn exchange(addr: SocketAddr, request: &Request, timeout: Duration) -> Result<Response> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    let payload = request.to_bytes()?;
    socket.send_to(&payload, addr).await?;
    log::debug!(
        "[transport] sent {} -> {} len={}",
        request.method(),
        addr,
        payload.len()
    );

    let mut buf = [0u8; MAX_PACKET_SIZE];
    match time::timeout(timeout, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, from))) => {
            log::debug!("[transport] reply from {} len={}", from, len);
            Response::parse(&buf[..len])
        }
        Ok(Err(e)) => Err(e.into()),
        Err(_) => {
            log::debug!(
                "[transport] {} -> {} timed out after {:?}",
                request.method(),
                addr,
                timeout
            );
            Err(Error::Timeout)
        }
    }
}
