// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Discovery: locating a device by identifier on the local network.
//!
//! Two strategies run as a structured race:
//!
//! - [`broadcast`] probes the subnet broadcast address and waits for the
//!   device to announce itself.
//! - [`scan`] unicast-probes every host in the local /24.
//!
//! The coordinator starts broadcast immediately and holds the scan back
//! for a grace period so a responsive broadcast path wins without paying
//! the scan's traffic. The first verified match settles the race and the
//! loser is aborted, closing its sockets; overall failure is declared
//! only after both strategies have independently failed.

pub mod broadcast;
pub mod scan;

use crate::config::COORDINATOR_GRACE_MS;
use crate::error::{Error, Result};
use crate::protocol::normalize_mac;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;

/// How an address binding was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMethod {
    /// The device answered a subnet broadcast probe.
    Broadcast,
    /// The device was found by exhaustively probing the local /24.
    SubnetScan,
    /// A previously learned address revalidated successfully.
    Cached,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Broadcast => write!(f, "broadcast"),
            Self::SubnetScan => write!(f, "subnet-scan"),
            Self::Cached => write!(f, "cached"),
        }
    }
}

/// An identifier -> address binding produced by discovery.
///
/// Bindings are created here, revalidated on each use by the cache layer,
/// and replaced whenever stale. The transport layer never owns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Canonical (lowercase hex, no separators) hardware identifier.
    pub mac: String,
    /// Network address the device currently answers at.
    pub addr: SocketAddr,
    /// Strategy that produced the address.
    pub method: DiscoveryMethod,
}

/// Race both strategies and resolve to the first verified match.
///
/// `skip_broadcast` goes straight to the subnet scan with no grace delay;
/// it is set by the cache layer when a previous resolution showed the
/// broadcast path to be suppressed on this network.
///
/// Failure is reported only once both strategies have failed: the scan
/// failing while a broadcast reply is still possible (or vice versa) must
/// not end the race early. [`Error::NoNetworkInterface`] takes precedence
/// over [`Error::NotFoundOnNetwork`] in the combined outcome so callers
/// can distinguish "no network" from "no device".
pub async fn resolve(
    mac: &str,
    broadcast_addr: Ipv4Addr,
    port: u16,
    skip_broadcast: bool,
) -> Result<Binding> {
    let target = normalize_mac(mac);

    if skip_broadcast {
        log::debug!("[discovery] broadcast suppressed on this network, scanning directly");
        let addr = scan::find_by_scan(&target, port).await?;
        return Ok(Binding {
            mac: target,
            addr,
            method: DiscoveryMethod::SubnetScan,
        });
    }

    let (tx, mut rx) = mpsc::channel::<(DiscoveryMethod, Result<SocketAddr>)>(2);

    let broadcast_task = {
        let tx = tx.clone();
        let target = target.clone();
        tokio::spawn(async move {
            let outcome = broadcast::find_by_broadcast(&target, broadcast_addr, port).await;
            let _ = tx.send((DiscoveryMethod::Broadcast, outcome)).await;
        })
    };
    let scan_task = {
        let target = target.clone();
        tokio::spawn(async move {
            // Give a responsive broadcast path a fair chance before the
            // scan floods the subnet with probes
            time::sleep(Duration::from_millis(COORDINATOR_GRACE_MS)).await;
            let outcome = scan::find_by_scan(&target, port).await;
            let _ = tx.send((DiscoveryMethod::SubnetScan, outcome)).await;
        })
    };

    let mut failures = 0u8;
    let mut saw_no_interface = false;

    while let Some((method, outcome)) = rx.recv().await {
        match outcome {
            Ok(addr) => {
                // Abandon the loser: aborting drops its future, which
                // closes its sockets. One abort is a no-op on the winner.
                broadcast_task.abort();
                scan_task.abort();
                log::info!("[discovery] {} resolved to {} via {}", target, addr, method);
                return Ok(Binding {
                    mac: target,
                    addr,
                    method,
                });
            }
            Err(e) => {
                log::debug!("[discovery] {} strategy failed: {}", method, e);
                if matches!(e, Error::NoNetworkInterface) {
                    saw_no_interface = true;
                }
                failures += 1;
                if failures == 2 {
                    break;
                }
            }
        }
    }

    if saw_no_interface {
        Err(Error::NoNetworkInterface)
    } else {
        Err(Error::NotFoundOnNetwork(target))
    }
}
