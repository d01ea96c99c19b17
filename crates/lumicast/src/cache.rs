// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Address cache: reuse a previously learned binding before rediscovering.
//!
//! A cached address gets one short-deadline `getSystemConfig` probe; a
//! reply naming the expected identifier means the binding is still good
//! and no discovery traffic is generated at all. Anything else (timeout,
//! garbled reply, or a different device now squatting the address after a
//! DHCP reshuffle) falls through to the full coordinator race.
//!
//! Persistence is an injected collaborator: this layer decides *what* to
//! persist (address plus a skip-broadcast hint), never how or where.

use crate::config::CACHE_PROBE_TIMEOUT_MS;
use crate::discovery::{self, Binding, DiscoveryMethod};
use crate::error::Result;
use crate::protocol::{mac_matches, normalize_mac, Request};
use crate::transport;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// A persisted identifier -> address binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedBinding {
    /// Last known address of the device.
    pub addr: SocketAddr,
    /// Broadcast was suppressed when this binding was learned; skip it
    /// (and its grace delay) on the next full resolution.
    pub skip_broadcast: bool,
}

/// Persistence collaborator, injected by the caller. Implementations own
/// the storage format (file, keyring, in-memory); the core only pushes
/// values through this seam.
pub trait BindingStore: Send + Sync {
    /// The binding from a previous run, if any.
    fn load_binding(&self) -> Option<CachedBinding>;
    /// Persist a fresh binding.
    fn save_binding(&self, binding: &CachedBinding);
}

/// Resolve an identifier, preferring a validated cached address.
///
/// A coordinator-resolved address that differs from the cache (or a first
/// resolution) is written back through `store` together with the
/// skip-broadcast hint when the subnet scan was what found the device.
pub async fn resolve_cached(
    mac: &str,
    store: &dyn BindingStore,
    broadcast_addr: Ipv4Addr,
    port: u16,
) -> Result<Binding> {
    let target = normalize_mac(mac);
    let cached = store.load_binding();

    if let Some(cached) = cached {
        if validate(&target, cached.addr).await {
            log::info!("[cache] {} still answers at {}", target, cached.addr);
            return Ok(Binding {
                mac: target,
                addr: cached.addr,
                method: DiscoveryMethod::Cached,
            });
        }
        log::debug!("[cache] binding for {} at {} is stale", target, cached.addr);
    }

    let skip_broadcast = cached.is_some_and(|c| c.skip_broadcast);
    let binding = discovery::resolve(&target, broadcast_addr, port, skip_broadcast).await?;

    if cached.map(|c| c.addr) != Some(binding.addr) {
        let fresh = CachedBinding {
            addr: binding.addr,
            skip_broadcast: binding.method == DiscoveryMethod::SubnetScan,
        };
        log::debug!(
            "[cache] persisting {} -> {} (skip_broadcast={})",
            target,
            fresh.addr,
            fresh.skip_broadcast
        );
        store.save_binding(&fresh);
    }

    Ok(binding)
}

/// One quick identity probe: does the device at `addr` still carry the
/// expected identifier? A mismatching reply is discarded silently; it is
/// some other device's address now, not an error.
async fn validate(target: &str, addr: SocketAddr) -> bool {
    let probe = Request::get_system_config();
    let timeout = Duration::from_millis(CACHE_PROBE_TIMEOUT_MS);
    match transport::exchange(addr, &probe, timeout).await {
        Ok(resp) => match resp.mac() {
            Some(ref reply_mac) if mac_matches(reply_mac, target) => true,
            Some(other) => {
                log::debug!("[cache] {} now held by {} (wanted {})", addr, other, target);
                false
            }
            None => false,
        },
        Err(e) => {
            log::debug!("[cache] validation probe to {} failed: {}", addr, e);
            false
        }
    }
}
