// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Command executor: bounded retry plus post-command verification.
//!
//! The send loop absorbs transport-level transient failures (timeout,
//! garbled reply) up to a fixed bound with a flat delay, then surfaces
//! the original error kind. An application-level rejection (the ack
//! arrived and says no) is different in kind: it is surfaced immediately
//! and never retried, since re-sending a rejected command is unlikely to
//! change the outcome and risks duplicate side effects.
//!
//! Verification is a separate step, orchestrated by the caller through
//! [`execute_verified`], not folded into the retry loop: it re-queries
//! the device and applies the command's tolerance predicate.
//!
//! Policy: an acked-but-unverified command counts as success with a
//! degraded flag ([`CommandOutcome::verified`] false). The ack is the
//! device's authoritative acceptance; a verification miss usually means
//! firmware clamping, which callers can inspect and report.

use crate::error::{Error, Result};
use crate::protocol::{Command, Request};
use crate::transport;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time;

/// Outcome of a verified command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// The device acknowledged the mutation.
    pub acked: bool,
    /// A post-command snapshot matched the request within tolerance.
    pub verified: bool,
}

impl CommandOutcome {
    /// Success per the crate's policy: the ack decides, verification only
    /// degrades.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.acked
    }
}

/// Send `command` with bounded retry.
///
/// `retries` is the total attempt count. Only retryable errors
/// ([`Error::Timeout`], [`Error::Malformed`]) re-enter the loop; the
/// final failure surfaces as the original error kind. A reply whose ack
/// indicates failure (or that carries a device error payload) is
/// [`Error::DeviceRejected`], immediately.
pub async fn send_with_retry(
    addr: SocketAddr,
    command: &Command,
    retries: u32,
    delay: Duration,
    exchange_timeout: Duration,
) -> Result<()> {
    let request = Request::set_pilot(command.params());
    let mut last_err = Error::Timeout;

    for attempt in 1..=retries.max(1) {
        match transport::exchange(addr, &request, exchange_timeout).await {
            Ok(resp) => {
                if let Some(err) = resp.error {
                    let msg = err.message.unwrap_or_else(|| format!("code {}", err.code));
                    log::warn!("[executor] {} rejected by {}: {}", command.name(), addr, msg);
                    return Err(Error::DeviceRejected(msg));
                }
                match resp.ack_success() {
                    Some(true) => {
                        log::debug!(
                            "[executor] {} acked by {} (attempt {}/{})",
                            command.name(),
                            addr,
                            attempt,
                            retries
                        );
                        return Ok(());
                    }
                    Some(false) => {
                        log::warn!("[executor] {} declined by {}", command.name(), addr);
                        return Err(Error::DeviceRejected("ack reported failure".into()));
                    }
                    // An envelope with neither ack nor error is garbled
                    None => last_err = Error::Malformed("ack carries no success flag".into()),
                }
            }
            Err(e) if e.is_retryable() => {
                log::debug!(
                    "[executor] {} attempt {}/{} failed: {}",
                    command.name(),
                    attempt,
                    retries,
                    e
                );
                last_err = e;
            }
            Err(e) => return Err(e),
        }

        if attempt < retries {
            time::sleep(delay).await;
        }
    }

    Err(last_err)
}

/// Re-query device state and apply the command's tolerance predicate.
pub async fn verify(
    addr: SocketAddr,
    command: &Command,
    exchange_timeout: Duration,
) -> Result<bool> {
    let resp = transport::exchange(addr, &Request::get_pilot(), exchange_timeout).await?;
    let pilot = resp.pilot()?;
    let ok = command.verify(&pilot);
    if !ok {
        log::info!(
            "[executor] {} acked but snapshot diverges (dimming={:?} temp={:?} rgb=({:?},{:?},{:?}))",
            command.name(),
            pilot.dimming,
            pilot.temp,
            pilot.r,
            pilot.g,
            pilot.b
        );
    }
    Ok(ok)
}

/// Send with retry, then verify.
///
/// Send-side failures propagate as errors. Verification failures never
/// escalate: the result is `acked: true, verified: false` ("sent but
/// unverified"), including when the verification query itself fails.
pub async fn execute_verified(
    addr: SocketAddr,
    command: &Command,
    retries: u32,
    delay: Duration,
    exchange_timeout: Duration,
) -> Result<CommandOutcome> {
    send_with_retry(addr, command, retries, delay, exchange_timeout).await?;

    let verified = match verify(addr, command, exchange_timeout).await {
        Ok(ok) => ok,
        Err(e) => {
            log::warn!("[executor] verification query failed: {}", e);
            false
        }
    };

    Ok(CommandOutcome {
        acked: true,
        verified,
    })
}
