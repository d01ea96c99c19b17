// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Wire protocol: JSON request/response envelopes.
//!
//! The lamp speaks a fixed set of JSON-RPC-flavored methods over UDP:
//!
//! | Method | Direction | Purpose |
//! |---|---|---|
//! | `registration` | broadcast | discovery probe with a synthetic caller identity |
//! | `getPilot` | unicast | read current state |
//! | `setPilot` | unicast | mutate power/brightness/color/temperature |
//! | `getSystemConfig` | unicast | read mac, firmware, module metadata |
//!
//! Replies are an envelope with a `result` payload; discovery and status
//! replies carry the device mac for correlation, `setPilot` acks carry a
//! `success` flag. There is no authentication: the protocol assumes a
//! trusted LAN.

pub mod command;

pub use command::{Command, PilotParams, Rgb};

use crate::config::{REGISTRATION_PHONE_IP, REGISTRATION_PHONE_MAC};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =======================================================================
// Identifier handling
// =======================================================================

/// Normalize a hardware identifier to canonical form: lowercase hex, no
/// separators. Accepts `AA:BB:CC:DD:EE:FF`, `aa-bb-...`, `aabb.ccdd.eeff`,
/// or the canonical form itself.
#[must_use]
pub fn normalize_mac(mac: &str) -> String {
    mac.chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Compare two identifiers in canonical form.
#[must_use]
pub fn mac_matches(a: &str, b: &str) -> bool {
    let a = normalize_mac(a);
    !a.is_empty() && a == normalize_mac(b)
}

// =======================================================================
// Requests
// =======================================================================

/// Parameter payloads, one shape per method that carries any.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Params {
    Registration(RegistrationParams),
    Pilot(PilotParams),
}

/// Synthetic caller identity for the `registration` probe.
#[derive(Debug, Clone, Serialize)]
struct RegistrationParams {
    #[serde(rename = "phoneMac")]
    phone_mac: &'static str,
    register: bool,
    #[serde(rename = "phoneIp")]
    phone_ip: &'static str,
    id: &'static str,
}

/// A single outbound datagram payload.
#[derive(Debug, Clone, Serialize)]
pub struct Request {
    method: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Params>,
}

impl Request {
    /// Discovery probe. `register: false` asks the lamp to reply once
    /// without persisting the caller as a registered controller.
    #[must_use]
    pub fn registration() -> Self {
        Self {
            method: "registration",
            params: Some(Params::Registration(RegistrationParams {
                phone_mac: REGISTRATION_PHONE_MAC,
                register: false,
                phone_ip: REGISTRATION_PHONE_IP,
                id: "1",
            })),
        }
    }

    /// State query.
    #[must_use]
    pub fn get_pilot() -> Self {
        Self {
            method: "getPilot",
            params: None,
        }
    }

    /// Identifier/firmware/module query.
    #[must_use]
    pub fn get_system_config() -> Self {
        Self {
            method: "getSystemConfig",
            params: None,
        }
    }

    /// State mutation.
    #[must_use]
    pub fn set_pilot(params: PilotParams) -> Self {
        Self {
            method: "setPilot",
            params: Some(Params::Pilot(params)),
        }
    }

    /// Method name, for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Encode to a datagram payload.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| Error::Malformed(format!("encode {}: {}", self.method, e)))
    }
}

// =======================================================================
// Responses
// =======================================================================

/// Device-side error payload (`{"error":{"code":...,"message":...}}`).
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
}

/// A parsed reply envelope.
///
/// `result` stays untyped here; callers extract the shape they expect via
/// [`Response::pilot`] / [`Response::system_config`] / [`Response::ack_success`].
/// Devices reuse one envelope for every method, so a kitchen-sink struct
/// would mislabel absent fields as protocol violations.
#[derive(Debug, Clone, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub env: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<ErrorPayload>,
}

impl Response {
    /// Parse a received datagram. Garbled payloads are [`Error::Malformed`].
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| Error::Malformed(e.to_string()))
    }

    /// The device identifier embedded in the reply, normalized.
    /// `None` when the reply carries no `result.mac` field.
    #[must_use]
    pub fn mac(&self) -> Option<String> {
        self.result
            .as_ref()
            .and_then(|r| r.get("mac"))
            .and_then(|m| m.as_str())
            .map(normalize_mac)
    }

    /// `setPilot` acknowledgment flag. `None` when the reply is not an ack.
    #[must_use]
    pub fn ack_success(&self) -> Option<bool> {
        self.result
            .as_ref()
            .and_then(|r| r.get("success"))
            .and_then(serde_json::Value::as_bool)
    }

    /// Extract a [`Pilot`] state snapshot from a `getPilot` reply.
    pub fn pilot(&self) -> Result<Pilot> {
        let result = self
            .result
            .clone()
            .ok_or_else(|| Error::Malformed("reply carries no result payload".into()))?;
        serde_json::from_value(result).map_err(|e| Error::Malformed(format!("pilot payload: {}", e)))
    }

    /// Extract a [`SystemConfig`] from a `getSystemConfig` reply.
    pub fn system_config(&self) -> Result<SystemConfig> {
        let result = self
            .result
            .clone()
            .ok_or_else(|| Error::Malformed("reply carries no result payload".into()))?;
        serde_json::from_value(result)
            .map_err(|e| Error::Malformed(format!("system config payload: {}", e)))
    }
}

// =======================================================================
// State snapshots
// =======================================================================

/// The lamp's operational state as reported by `getPilot`.
///
/// `temp` and `r`/`g`/`b` are mutually exclusive in any snapshot: the lamp
/// is either in temperature mode or in color mode. When `state` is false
/// the remaining fields are whatever the lamp will restore on power-on,
/// not the current output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Pilot {
    /// Power flag. `false` means off regardless of dimming.
    #[serde(default)]
    pub state: bool,
    /// Brightness 1..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimming: Option<u8>,
    /// Color temperature in Kelvin (temperature mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<u8>,
    /// Cool-white channel (auxiliary scalar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub c: Option<u8>,
    /// Warm-white channel (auxiliary scalar).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u8>,
    #[serde(default, rename = "sceneId", skip_serializing_if = "Option::is_none")]
    pub scene_id: Option<u16>,
    /// Received signal strength at the lamp, dBm.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
}

/// Module metadata reported by `getSystemConfig`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SystemConfig {
    #[serde(default)]
    pub mac: String,
    #[serde(default, rename = "moduleName", skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
    #[serde(default, rename = "fwVersion", skip_serializing_if = "Option::is_none")]
    pub fw_version: Option<String>,
    #[serde(default, rename = "homeId", skip_serializing_if = "Option::is_none")]
    pub home_id: Option<u32>,
    #[serde(default, rename = "roomId", skip_serializing_if = "Option::is_none")]
    pub room_id: Option<u32>,
}
