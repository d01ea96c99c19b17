// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Client facade: the crate's entry point.
//!
//! A [`Client`] bundles the network parameters (device port, broadcast
//! address, timeouts, retry policy) and exposes the core operations:
//! resolve an address for an identifier, execute a verified command at an
//! address, and enumerate the devices answering on the segment.
//!
//! Every parameter is injectable through the builder; the defaults in
//! [`crate::config`] are the firmware's real-world values.

use crate::cache::{self, BindingStore};
use crate::config::{
    BROADCAST_ADDR, DEVICE_PORT, EXCHANGE_TIMEOUT_MS, RETRY_DELAY_MS, SEND_RETRIES,
};
use crate::discovery::{self, broadcast, scan, Binding};
use crate::error::Result;
use crate::executor::{self, CommandOutcome};
use crate::protocol::{Command, Pilot, Request, SystemConfig};
use crate::transport;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Entry point for discovery and verified control.
///
/// # Example
///
/// ```rust,no_run
/// use lumicast::{Client, Command};
///
/// # async fn example() -> lumicast::Result<()> {
/// let client = Client::builder().build();
/// let binding = client.resolve_address("a8:bb:50:d4:6a:1c").await?;
/// let outcome = client
///     .execute_verified(binding.addr, &Command::SetBrightness { dimming: 40 })
///     .await?;
/// assert!(outcome.acked);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    port: u16,
    broadcast_addr: Ipv4Addr,
    exchange_timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

/// Builder for [`Client`]. All setters are optional.
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    port: u16,
    broadcast_addr: Ipv4Addr,
    exchange_timeout: Duration,
    retries: u32,
    retry_delay: Duration,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            port: DEVICE_PORT,
            broadcast_addr: BROADCAST_ADDR,
            exchange_timeout: Duration::from_millis(EXCHANGE_TIMEOUT_MS),
            retries: SEND_RETRIES,
            retry_delay: Duration::from_millis(RETRY_DELAY_MS),
        }
    }
}

impl ClientBuilder {
    /// Device UDP port (default 38899).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Broadcast destination for discovery probes (default 255.255.255.255).
    #[must_use]
    pub fn broadcast_addr(mut self, addr: Ipv4Addr) -> Self {
        self.broadcast_addr = addr;
        self
    }

    /// Deadline for a single request/response exchange.
    #[must_use]
    pub fn exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    /// Total `setPilot` attempts (default 3).
    #[must_use]
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Flat delay between attempts (default 500 ms).
    #[must_use]
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub fn build(self) -> Client {
        Client {
            port: self.port,
            broadcast_addr: self.broadcast_addr,
            exchange_timeout: self.exchange_timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }
}

impl Client {
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// Resolve an identifier to an address via the discovery race
    /// (broadcast immediately, subnet scan after the grace delay).
    pub async fn resolve_address(&self, mac: &str) -> Result<Binding> {
        discovery::resolve(mac, self.broadcast_addr, self.port, false).await
    }

    /// Resolve an identifier, validating and reusing a cached binding
    /// through the injected persistence collaborator.
    pub async fn resolve_cached(&self, mac: &str, store: &dyn BindingStore) -> Result<Binding> {
        cache::resolve_cached(mac, store, self.broadcast_addr, self.port).await
    }

    /// Execute a command at a known address with bounded retry, then
    /// verify the device converged within the command's tolerance.
    pub async fn execute_verified(
        &self,
        addr: SocketAddr,
        command: &Command,
    ) -> Result<CommandOutcome> {
        executor::execute_verified(
            addr,
            command,
            self.retries,
            self.retry_delay,
            self.exchange_timeout,
        )
        .await
    }

    /// Send a command without the verification step.
    pub async fn send_command(&self, addr: SocketAddr, command: &Command) -> Result<()> {
        executor::send_with_retry(
            addr,
            command,
            self.retries,
            self.retry_delay,
            self.exchange_timeout,
        )
        .await
    }

    /// Enumerate every device answering a broadcast probe:
    /// identifier -> address.
    pub async fn enumerate(&self) -> Result<HashMap<String, SocketAddr>> {
        broadcast::enumerate(self.broadcast_addr, self.port).await
    }

    /// Subnet-scan for an identifier with a progress callback
    /// (`processed, total` per batch), bypassing broadcast.
    pub async fn scan_with_progress<F>(&self, mac: &str, progress: F) -> Result<SocketAddr>
    where
        F: FnMut(usize, usize),
    {
        scan::find_by_scan_with_progress(mac, self.port, progress).await
    }

    /// Fetch a fresh state snapshot.
    pub async fn pilot(&self, addr: SocketAddr) -> Result<Pilot> {
        let resp = transport::exchange(addr, &Request::get_pilot(), self.exchange_timeout).await?;
        resp.pilot()
    }

    /// Fetch identifier, firmware, and module metadata.
    pub async fn system_config(&self, addr: SocketAddr) -> Result<SystemConfig> {
        let resp =
            transport::exchange(addr, &Request::get_system_config(), self.exchange_timeout).await?;
        resp.system_config()
    }
}
