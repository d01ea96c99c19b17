// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! # lumicast - LAN discovery and verified control for JSON-over-UDP smart lamps
//!
//! Locates a lamp on the local network by its stable hardware identifier,
//! then mutates and verifies its state over an unauthenticated,
//! connectionless, lossy transport. The crate tolerates broadcast
//! suppression by network hardware, silent packet loss, garbled replies,
//! and device-side value clamping, while bounding its own traffic and
//! avoiding rescans once an address is known.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lumicast::{Client, Command, Rgb};
//!
//! # async fn example() -> lumicast::Result<()> {
//! let client = Client::builder().build();
//!
//! // Resolve the lamp's current address by its hardware identifier
//! let binding = client.resolve_address("a8:bb:50:d4:6a:1c").await?;
//!
//! // Mutate and verify
//! let outcome = client
//!     .execute_verified(
//!         binding.addr,
//!         &Command::SetColor { color: Rgb::new(255, 120, 0), dimming: 80 },
//!     )
//!     .await?;
//!
//! if outcome.acked && !outcome.verified {
//!     eprintln!("sent, but the lamp clamped the requested values");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                        Client (facade)                       |
//! |  resolve_address | execute_verified | enumerate | queries    |
//! +--------------------------------------------------------------+
//! |  AddressCache          |  CommandExecutor                    |
//! |  validate-then-reuse   |  bounded retry + tolerance verify   |
//! +--------------------------------------------------------------+
//! |  DiscoveryCoordinator: broadcast vs. subnet scan race        |
//! +--------------------------------------------------------------+
//! |  Transport: one datagram out, one reply in, fixed deadline   |
//! +--------------------------------------------------------------+
//! ```
//!
//! Rendering, CLI parsing, and on-disk persistence live outside this
//! crate; persistence plugs in through [`BindingStore`].

/// Address cache with injected persistence.
pub mod cache;
/// Client facade and builder.
pub mod client;
/// Protocol constants (ports, windows, widths) - single source of truth.
pub mod config;
/// Discovery strategies and their coordinator.
pub mod discovery;
/// Error taxonomy.
pub mod error;
/// Command executor: bounded retry and verification.
pub mod executor;
/// Wire protocol: envelopes, state snapshots, commands.
pub mod protocol;
/// One-shot UDP request/response exchange.
pub mod transport;

pub use cache::{BindingStore, CachedBinding};
pub use client::{Client, ClientBuilder};
pub use discovery::{Binding, DiscoveryMethod};
pub use error::{Error, Result};
pub use executor::CommandOutcome;
pub use protocol::{normalize_mac, Command, Pilot, PilotParams, Rgb, SystemConfig};
