// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Error taxonomy for discovery and command execution.
//!
//! Every fatal condition is a distinct variant so callers can give
//! targeted guidance: no usable network vs. device absent vs. device
//! refused are different problems with different fixes.
//!
//! A reply naming a different device (mac mismatch) is *not* represented
//! here: discovery and cache validation silently discard such replies and
//! keep going.

use std::fmt;
use std::io;

/// Result type for all lumicast operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the discovery and command layers.
#[derive(Debug)]
pub enum Error {
    /// No usable non-loopback IPv4 interface. Fatal, non-retryable.
    NoNetworkInterface,

    /// No reply arrived before the per-call deadline. Retryable at the
    /// executor's retry boundary.
    Timeout,

    /// A reply arrived but could not be parsed as a protocol envelope.
    /// Treated identically to [`Error::Timeout`] for retry purposes.
    Malformed(String),

    /// Both discovery strategies exhausted without a matching reply.
    NotFoundOnNetwork(String),

    /// The device acknowledged the command and declined it. Fatal and
    /// never retried: re-sending a rejected command risks duplicate side
    /// effects without changing the outcome.
    DeviceRejected(String),

    /// Socket-level I/O failure.
    Io(io::Error),
}

impl Error {
    /// Whether the executor's retry loop may absorb this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout | Self::Malformed(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNetworkInterface => {
                write!(f, "no usable IPv4 network interface (check network)")
            }
            Self::Timeout => write!(f, "device did not reply before the deadline"),
            Self::Malformed(msg) => write!(f, "malformed device reply: {}", msg),
            Self::NotFoundOnNetwork(mac) => {
                write!(f, "device {} not found on the local network", mac)
            }
            Self::DeviceRejected(msg) => write!(f, "device rejected the command: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
