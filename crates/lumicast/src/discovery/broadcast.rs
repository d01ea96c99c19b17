// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Broadcast discovery: one probe to the subnet broadcast address,
//! collect replies, match on the embedded identifier.
//!
//! The probe is retransmitted once partway through the window to cover
//! loss of the initial packet. Replies naming a different device are
//! discarded and collection continues. Garbled replies are likewise
//! discarded: a misbehaving third-party responder must not abort the
//! window.
//!
//! Home switches and access points commonly suppress or rate-limit
//! broadcast frames, which is why this strategy races against the subnet
//! scan in the coordinator instead of being trusted on its own.

use crate::config::{BROADCAST_REPROBE_MS, BROADCAST_WINDOW_MS, MAX_PACKET_SIZE};
use crate::error::{Error, Result};
use crate::protocol::{mac_matches, normalize_mac, Request, Response};
use socket2::{Domain, Protocol, Socket, Type};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{self, Instant};

/// Find the device with the given identifier via a broadcast probe.
///
/// Returns the source address of the first matching reply, or
/// [`Error::NotFoundOnNetwork`] when the window closes without one.
/// Fails immediately with [`Error::NoNetworkInterface`] when no
/// broadcast-capable interface exists; that condition is non-retryable
/// and must not be confused with an absent device.
pub async fn find_by_broadcast(
    mac: &str,
    broadcast_addr: Ipv4Addr,
    port: u16,
) -> Result<SocketAddr> {
    find_by_broadcast_with(
        mac,
        broadcast_addr,
        port,
        Duration::from_millis(BROADCAST_WINDOW_MS),
        Duration::from_millis(BROADCAST_REPROBE_MS),
    )
    .await
}

/// [`find_by_broadcast`] with an explicit window and retransmit point.
pub async fn find_by_broadcast_with(
    mac: &str,
    broadcast_addr: Ipv4Addr,
    port: u16,
    window: Duration,
    reprobe_after: Duration,
) -> Result<SocketAddr> {
    let target = normalize_mac(mac);
    let socket = probe_socket(broadcast_addr)?;
    let dest = SocketAddr::from((broadcast_addr, port));
    let probe = Request::registration().to_bytes()?;
    socket.send_to(&probe, dest).await?;
    log::debug!("[broadcast] probe sent to {} for {}", dest, target);

    let started = Instant::now();
    let deadline = started + window;
    let reprobe_at = started + reprobe_after;
    let mut reprobed = false;
    let mut buf = [0u8; MAX_PACKET_SIZE];

    loop {
        let now = Instant::now();
        if now >= deadline {
            log::debug!("[broadcast] window closed without a match for {}", target);
            return Err(Error::NotFoundOnNetwork(target));
        }
        // Checked every iteration, not just on recv timeout: a steady
        // stream of foreign replies must not starve the retransmission
        if !reprobed && now >= reprobe_at {
            socket.send_to(&probe, dest).await?;
            reprobed = true;
            log::debug!("[broadcast] probe retransmitted to {}", dest);
        }
        let next_event = if reprobed { deadline } else { reprobe_at.min(deadline) };

        match time::timeout(
            next_event.saturating_duration_since(Instant::now()),
            socket.recv_from(&mut buf),
        )
        .await
        {
            Ok(Ok((len, from))) => match Response::parse(&buf[..len]) {
                Ok(resp) => match resp.mac() {
                    Some(ref reply_mac) if mac_matches(reply_mac, &target) => {
                        log::info!("[broadcast] {} answered from {}", target, from);
                        return Ok(from);
                    }
                    Some(other) => {
                        log::debug!("[broadcast] discarding reply from {} (mac {})", from, other);
                    }
                    None => {
                        log::debug!("[broadcast] discarding reply from {} (no mac)", from);
                    }
                },
                Err(e) => {
                    log::debug!("[broadcast] discarding garbled reply from {}: {}", from, e);
                }
            },
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {}
        }
    }
}

/// Enumerate every device answering a broadcast probe within the window.
///
/// This is a discovery primitive, not fleet orchestration: it collects
/// the full window and returns identifier -> source address, last reply
/// winning per identifier (duplicates are routine with a retransmitted
/// probe).
pub async fn enumerate(broadcast_addr: Ipv4Addr, port: u16) -> Result<HashMap<String, SocketAddr>> {
    enumerate_with(
        broadcast_addr,
        port,
        Duration::from_millis(BROADCAST_WINDOW_MS),
        Duration::from_millis(BROADCAST_REPROBE_MS),
    )
    .await
}

/// [`enumerate`] with an explicit window and retransmit point.
pub async fn enumerate_with(
    broadcast_addr: Ipv4Addr,
    port: u16,
    window: Duration,
    reprobe_after: Duration,
) -> Result<HashMap<String, SocketAddr>> {
    let socket = probe_socket(broadcast_addr)?;
    let dest = SocketAddr::from((broadcast_addr, port));
    let probe = Request::registration().to_bytes()?;
    socket.send_to(&probe, dest).await?;

    let started = Instant::now();
    let deadline = started + window;
    let reprobe_at = started + reprobe_after;
    let mut reprobed = false;
    let mut found: HashMap<String, SocketAddr> = HashMap::new();
    let mut buf = [0u8; MAX_PACKET_SIZE];

    loop {
        let now = Instant::now();
        if now >= deadline {
            log::info!("[broadcast] enumeration found {} device(s)", found.len());
            return Ok(found);
        }
        // Same schedule discipline as find_by_broadcast_with: a busy
        // segment answering continuously must not starve the retransmission
        if !reprobed && now >= reprobe_at {
            socket.send_to(&probe, dest).await?;
            reprobed = true;
        }
        let next_event = if reprobed { deadline } else { reprobe_at.min(deadline) };

        match time::timeout(
            next_event.saturating_duration_since(Instant::now()),
            socket.recv_from(&mut buf),
        )
        .await
        {
            Ok(Ok((len, from))) => {
                if let Ok(resp) = Response::parse(&buf[..len]) {
                    if let Some(reply_mac) = resp.mac() {
                        log::debug!("[broadcast] {} at {}", reply_mac, from);
                        found.insert(reply_mac, from);
                    }
                }
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {}
        }
    }
}

/// Build the broadcast-enabled probe socket.
///
/// Loopback targets need no broadcast-capable interface; everything else
/// requires at least one non-loopback IPv4 interface or the call fails
/// with [`Error::NoNetworkInterface`] before any packet is sent.
fn probe_socket(broadcast_addr: Ipv4Addr) -> Result<UdpSocket> {
    if !broadcast_addr.is_loopback() && !has_usable_interface() {
        return Err(Error::NoNetworkInterface);
    }

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    socket.set_broadcast(true)?;
    socket.set_nonblocking(true)?;
    let bind_addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
    socket.bind(&bind_addr.into())?;
    UdpSocket::from_std(socket.into()).map_err(Error::from)
}

/// Any non-loopback IPv4 interface present?
fn has_usable_interface() -> bool {
    let interfaces = match local_ip_address::list_afinet_netifas() {
        Ok(ifs) => ifs,
        Err(e) => {
            log::debug!("[broadcast] interface enumeration failed: {}", e);
            return false;
        }
    };
    interfaces.iter().any(|(_name, ip)| match ip {
        std::net::IpAddr::V4(v4) => !v4.is_loopback(),
        std::net::IpAddr::V6(_) => false,
    })
}
