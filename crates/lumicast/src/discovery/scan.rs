// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Subnet scan: exhaustive concurrent unicast probing of the local /24.
//!
//! Every host address (.1 through .254) receives a lightweight `getPilot`
//! probe with a short deadline. Probes run in fixed-width batches so the
//! number of outstanding sockets and in-flight datagrams stays bounded;
//! this is the layer's backpressure policy, not an incidental limit.
//! Once a matching reply arrives no further batches are issued.
//!
//! The /24 is derived from the active non-loopback IPv4 interface, with
//! the [`crate::config::SCAN_IF_ENV`] environment variable as an override
//! for multi-homed machines.

use crate::config::{SCAN_BATCH_WIDTH, SCAN_IF_ENV, SCAN_PROBE_TIMEOUT_MS};
use crate::error::{Error, Result};
use crate::protocol::{mac_matches, normalize_mac, Request};
use crate::transport;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::task::JoinSet;

/// Find the device with the given identifier by probing the local /24.
pub async fn find_by_scan(mac: &str, port: u16) -> Result<SocketAddr> {
    find_by_scan_with_progress(mac, port, |_, _| {}).await
}

/// [`find_by_scan`] reporting batch progress as `(processed, total)` for
/// UI consumption.
pub async fn find_by_scan_with_progress<F>(mac: &str, port: u16, progress: F) -> Result<SocketAddr>
where
    F: FnMut(usize, usize),
{
    let iface = scan_interface_ip()?;
    let hosts = subnet_hosts(iface);
    log::info!(
        "[scan] probing {} hosts on {}/24 for {}",
        hosts.len(),
        iface,
        normalize_mac(mac)
    );
    match scan_hosts(
        mac,
        &hosts,
        port,
        Duration::from_millis(SCAN_PROBE_TIMEOUT_MS),
        progress,
    )
    .await?
    {
        Some(addr) => Ok(addr),
        None => Err(Error::NotFoundOnNetwork(normalize_mac(mac))),
    }
}

/// Probe an explicit host list in bounded batches.
///
/// Returns the first matching source address, or `None` when every batch
/// is exhausted. Probe failures (timeout, garbled reply, unreachable
/// host) are expected in bulk and never abort the sweep.
pub(crate) async fn scan_hosts<F>(
    mac: &str,
    hosts: &[Ipv4Addr],
    port: u16,
    probe_timeout: Duration,
    mut progress: F,
) -> Result<Option<SocketAddr>>
where
    F: FnMut(usize, usize),
{
    let target = normalize_mac(mac);
    let total = hosts.len();
    let mut processed = 0usize;

    for batch in hosts.chunks(SCAN_BATCH_WIDTH) {
        let mut set = JoinSet::new();
        for &host in batch {
            let target = target.clone();
            set.spawn(async move { probe_host(host, port, &target, probe_timeout).await });
        }

        let mut found = None;
        while let Some(joined) = set.join_next().await {
            if let Ok(Some(addr)) = joined {
                found = Some(addr);
                break;
            }
        }
        // Dropping the set aborts the rest of the batch; in-flight sends
        // are fire-and-forget and need no cancellation.
        drop(set);

        if let Some(addr) = found {
            log::info!("[scan] {} answered from {}", target, addr);
            return Ok(Some(addr));
        }

        processed += batch.len();
        progress(processed, total);
        log::debug!("[scan] batch complete: {}/{} hosts probed", processed, total);
    }

    log::debug!("[scan] all {} hosts exhausted without a match", total);
    Ok(None)
}

/// One `getPilot` probe. Any failure means "not this host".
async fn probe_host(
    host: Ipv4Addr,
    port: u16,
    target: &str,
    probe_timeout: Duration,
) -> Option<SocketAddr> {
    let addr = SocketAddr::from((host, port));
    match transport::exchange(addr, &Request::get_pilot(), probe_timeout).await {
        Ok(resp) => match resp.mac() {
            Some(ref reply_mac) if mac_matches(reply_mac, target) => Some(addr),
            _ => None,
        },
        Err(_) => None,
    }
}

/// The IPv4 address of the interface whose /24 gets scanned.
fn scan_interface_ip() -> Result<Ipv4Addr> {
    if let Ok(var) = std::env::var(SCAN_IF_ENV) {
        match var.parse::<Ipv4Addr>() {
            Ok(addr) => {
                log::debug!("[scan] using {} override: {}", SCAN_IF_ENV, addr);
                return Ok(addr);
            }
            Err(_) => {
                log::warn!(
                    "[scan] invalid {}='{}', falling back to auto-detect",
                    SCAN_IF_ENV,
                    var
                );
            }
        }
    }

    if let Ok(IpAddr::V4(ip)) = local_ip_address::local_ip() {
        if !ip.is_loopback() {
            return Ok(ip);
        }
    }

    // local_ip() follows the default route; fall back to plain interface
    // enumeration on machines without one (e.g. link-local only)
    let interfaces = local_ip_address::list_afinet_netifas().map_err(|e| {
        log::debug!("[scan] interface enumeration failed: {}", e);
        Error::NoNetworkInterface
    })?;
    interfaces
        .into_iter()
        .find_map(|(_name, ip)| match ip {
            IpAddr::V4(v4) if !v4.is_loopback() => Some(v4),
            _ => None,
        })
        .ok_or(Error::NoNetworkInterface)
}

/// All 254 host addresses of the /24 containing `iface`.
fn subnet_hosts(iface: Ipv4Addr) -> Vec<Ipv4Addr> {
    let [a, b, c, _] = iface.octets();
    (1..=254).map(|host| Ipv4Addr::new(a, b, c, host)).collect()
}
