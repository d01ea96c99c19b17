// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Protocol constants - single source of truth.
//!
//! This module centralizes every port, timeout, and width used by the
//! discovery and command layers. **Never hardcode these elsewhere!**
//!
//! All timing values are fixed and non-adaptive: the wire protocol is a
//! lossy LAN exchange where flat retries and bounded windows behave better
//! than backoff (the device either answers within milliseconds or not at
//! all).

use std::net::Ipv4Addr;

// =======================================================================
// Wire protocol
// =======================================================================

/// UDP port the lamp listens on for every method (fixed by firmware).
pub const DEVICE_PORT: u16 = 38899;

/// Maximum reply datagram size (bytes).
///
/// Device replies are small JSON envelopes; the largest observed
/// (`getSystemConfig` on newer firmware) stays well under 512 bytes.
pub const MAX_PACKET_SIZE: usize = 1024;

/// Default deadline for a single unicast request/response exchange.
pub const EXCHANGE_TIMEOUT_MS: u64 = 1_000;

// =======================================================================
// Broadcast discovery
// =======================================================================

/// Subnet-wide broadcast destination for the `registration` probe.
pub const BROADCAST_ADDR: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 255);

/// Total reply-collection window for a broadcast probe (milliseconds).
pub const BROADCAST_WINDOW_MS: u64 = 3_000;

/// When to retransmit the probe within the window (milliseconds).
///
/// One retransmission covers loss of the initial packet; more would only
/// multiply duplicate replies.
pub const BROADCAST_REPROBE_MS: u64 = 1_000;

/// Synthetic caller identity carried by the `registration` probe.
///
/// The device echoes a reply to any registration request; the identity
/// fields only need to be well-formed, not real.
pub const REGISTRATION_PHONE_MAC: &str = "aaaaaaaaaaaa";
/// See [`REGISTRATION_PHONE_MAC`].
pub const REGISTRATION_PHONE_IP: &str = "1.2.3.4";

// =======================================================================
// Subnet scan
// =======================================================================

/// Host addresses probed in a /24 scan (.1 through .254).
pub const SCAN_HOST_COUNT: usize = 254;

/// Per-host probe deadline (milliseconds).
///
/// A lamp on the local segment answers in single-digit milliseconds;
/// 200 ms is already generous for a congested network.
pub const SCAN_PROBE_TIMEOUT_MS: u64 = 200;

/// Concurrent probes per batch.
///
/// Bounds outstanding sockets and in-flight datagrams. This is a
/// deliberate backpressure policy to avoid saturating the local network,
/// not an incidental limit.
pub const SCAN_BATCH_WIDTH: usize = 50;

/// Environment variable forcing the scan interface address
/// (e.g. `LUMICAST_IF=192.168.1.22`). Overrides auto-detection.
pub const SCAN_IF_ENV: &str = "LUMICAST_IF";

// =======================================================================
// Coordinator
// =======================================================================

/// Delay before the subnet scan joins the discovery race (milliseconds).
///
/// A responsive broadcast path answers well within this window, so the
/// common case never pays the scan's traffic or latency.
pub const COORDINATOR_GRACE_MS: u64 = 500;

// =======================================================================
// Command executor
// =======================================================================

/// Total `setPilot` attempts before surfacing the transport error.
pub const SEND_RETRIES: u32 = 3;

/// Flat delay between attempts (milliseconds).
pub const RETRY_DELAY_MS: u64 = 500;

/// Deadline for the cached-address validation probe (milliseconds).
///
/// Shorter than [`EXCHANGE_TIMEOUT_MS`]: a stale cache entry should fail
/// fast into full discovery rather than stall the caller.
pub const CACHE_PROBE_TIMEOUT_MS: u64 = 500;

/// Accepted deviation between requested and reported dimming.
///
/// Firmware rounds dimming internally; exact-match verification would
/// flag successful commands as failed.
pub const DIMMING_TOLERANCE: u8 = 2;

// =======================================================================
// Command constraints (firmware quirks)
// =======================================================================

/// Minimum dimming the firmware accepts in color mode.
pub const MIN_DIMMING_COLOR: u8 = 10;

/// Minimum dimming the firmware accepts in temperature mode.
pub const MIN_DIMMING_TEMP: u8 = 1;

/// Maximum dimming in any mode.
pub const MAX_DIMMING: u8 = 100;
