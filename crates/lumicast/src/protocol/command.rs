// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Commands: a closed set of state mutations with per-operation
//! verification tolerances.
//!
//! Each variant produces its `setPilot` parameters as plain data and
//! knows how to check a post-command [`Pilot`] snapshot against what was
//! requested, allowing for firmware-side clamping and rounding.
//!
//! Firmware quirks enforced here, at parameter construction:
//!
//! - Color commands zero both auxiliary white channels (`c`, `w`);
//!   otherwise the white LEDs visibly contaminate the color output.
//! - Color mode refuses dimming below 10; temperature mode below 1.
//! - `temp` and explicit `r`/`g`/`b` never co-occur in one command.
//! - Power-off is the explicit `state: false` field. `dimming: 0` is not
//!   defined as "off" by the firmware and is never emitted.

use crate::config::{DIMMING_TOLERANCE, MAX_DIMMING, MIN_DIMMING_COLOR, MIN_DIMMING_TEMP};
use crate::protocol::Pilot;
use serde::Serialize;

/// An RGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// `setPilot` parameter set. Absent fields are omitted from the wire
/// payload entirely; the firmware treats present-but-null as malformed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PilotParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimming: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub g: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub b: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub w: Option<u8>,
}

/// The closed set of supported mutations.
///
/// Requested values outside the firmware's accepted range are clamped at
/// parameter construction, and verification compares against the clamped
/// value (what we actually asked for on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Turn the lamp on, restoring its previous mode.
    PowerOn,
    /// Turn the lamp off via the explicit power flag.
    PowerOff,
    /// Set brightness in the lamp's current mode.
    SetBrightness { dimming: u8 },
    /// Switch to color mode with the given RGB and brightness.
    SetColor { color: Rgb, dimming: u8 },
    /// Switch to temperature mode with the given Kelvin and brightness.
    SetTemperature { kelvin: u16, dimming: u8 },
}

impl Command {
    /// Operation name, for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerOn => "power-on",
            Self::PowerOff => "power-off",
            Self::SetBrightness { .. } => "set-brightness",
            Self::SetColor { .. } => "set-color",
            Self::SetTemperature { .. } => "set-temperature",
        }
    }

    /// Build the `setPilot` parameter set, applying the firmware quirks
    /// documented at module level.
    #[must_use]
    pub fn params(&self) -> PilotParams {
        match *self {
            Self::PowerOn => PilotParams {
                state: Some(true),
                ..PilotParams::default()
            },
            Self::PowerOff => PilotParams {
                state: Some(false),
                ..PilotParams::default()
            },
            Self::SetBrightness { dimming } => PilotParams {
                state: Some(true),
                dimming: Some(clamp_dimming(dimming, MIN_DIMMING_TEMP)),
                ..PilotParams::default()
            },
            Self::SetColor { color, dimming } => PilotParams {
                state: Some(true),
                dimming: Some(clamp_dimming(dimming, MIN_DIMMING_COLOR)),
                r: Some(color.r),
                g: Some(color.g),
                b: Some(color.b),
                // Zeroing both white channels is mandatory: leaving them at
                // their previous values bleeds white into the color output.
                c: Some(0),
                w: Some(0),
                ..PilotParams::default()
            },
            Self::SetTemperature { kelvin, dimming } => PilotParams {
                state: Some(true),
                dimming: Some(clamp_dimming(dimming, MIN_DIMMING_TEMP)),
                temp: Some(kelvin),
                ..PilotParams::default()
            },
        }
    }

    /// Verification predicate: does a post-command snapshot match what the
    /// command requested, within the operation's tolerance?
    ///
    /// Dimming is accepted within [`DIMMING_TOLERANCE`] of the clamped
    /// request; temperature and RGB must match exactly; power must match
    /// exactly.
    #[must_use]
    pub fn verify(&self, pilot: &Pilot) -> bool {
        let params = self.params();
        match *self {
            Self::PowerOn => pilot.state,
            Self::PowerOff => !pilot.state,
            Self::SetBrightness { .. } => pilot.state && dimming_close(params.dimming, pilot.dimming),
            Self::SetColor { color, .. } => {
                pilot.state
                    && pilot.r == Some(color.r)
                    && pilot.g == Some(color.g)
                    && pilot.b == Some(color.b)
                    && dimming_close(params.dimming, pilot.dimming)
            }
            Self::SetTemperature { .. } => {
                pilot.state && pilot.temp == params.temp && dimming_close(params.dimming, pilot.dimming)
            }
        }
    }
}

fn clamp_dimming(requested: u8, min: u8) -> u8 {
    requested.clamp(min, MAX_DIMMING)
}

fn dimming_close(requested: Option<u8>, reported: Option<u8>) -> bool {
    match (requested, reported) {
        (Some(req), Some(rep)) => req.abs_diff(rep) <= DIMMING_TOLERANCE,
        (None, _) => true,
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_fields(cmd: &Command) -> serde_json::Value {
        serde_json::to_value(cmd.params()).unwrap()
    }

    #[test]
    fn test_color_zeroes_white_channels() {
        let v = wire_fields(&Command::SetColor {
            color: Rgb::new(255, 10, 0),
            dimming: 80,
        });
        assert_eq!(v["c"], 0);
        assert_eq!(v["w"], 0);
        assert_eq!(v["r"], 255);
        assert!(v.get("temp").is_none(), "color and temp must never co-occur");
    }

    #[test]
    fn test_temperature_never_carries_color() {
        let v = wire_fields(&Command::SetTemperature {
            kelvin: 2700,
            dimming: 50,
        });
        assert_eq!(v["temp"], 2700);
        for ch in ["r", "g", "b", "c", "w"] {
            assert!(v.get(ch).is_none(), "{} must be absent in temperature mode", ch);
        }
    }

    #[test]
    fn test_power_off_is_state_false_not_dimming_zero() {
        let v = wire_fields(&Command::PowerOff);
        assert_eq!(v["state"], false);
        assert!(v.get("dimming").is_none());
    }

    #[test]
    fn test_mode_minimum_dimming() {
        let color = Command::SetColor {
            color: Rgb::new(1, 2, 3),
            dimming: 3,
        };
        assert_eq!(color.params().dimming, Some(10));

        let temp = Command::SetTemperature {
            kelvin: 4000,
            dimming: 0,
        };
        assert_eq!(temp.params().dimming, Some(1));
    }

    #[test]
    fn test_dimming_clamped_to_100() {
        let cmd = Command::SetBrightness { dimming: 255 };
        assert_eq!(cmd.params().dimming, Some(100));
    }

    #[test]
    fn test_verify_brightness_within_tolerance() {
        let cmd = Command::SetBrightness { dimming: 40 };
        let mut pilot = Pilot {
            state: true,
            dimming: Some(42),
            ..Pilot::default()
        };
        assert!(cmd.verify(&pilot));

        // Scenario: device clamps 40 -> 55; outside the +/-2 window
        pilot.dimming = Some(55);
        assert!(!cmd.verify(&pilot));
    }

    #[test]
    fn test_verify_temperature_exact() {
        let cmd = Command::SetTemperature {
            kelvin: 2700,
            dimming: 50,
        };
        let mut pilot = Pilot {
            state: true,
            dimming: Some(50),
            temp: Some(2700),
            ..Pilot::default()
        };
        assert!(cmd.verify(&pilot));

        pilot.temp = Some(2699);
        assert!(!cmd.verify(&pilot));
    }

    #[test]
    fn test_verify_color_requires_exact_rgb_and_power() {
        let cmd = Command::SetColor {
            color: Rgb::new(255, 0, 128),
            dimming: 60,
        };
        let mut pilot = Pilot {
            state: true,
            dimming: Some(61),
            r: Some(255),
            g: Some(0),
            b: Some(128),
            ..Pilot::default()
        };
        assert!(cmd.verify(&pilot));

        pilot.state = false;
        assert!(!cmd.verify(&pilot), "powered-off snapshots are not authoritative");
    }

    #[test]
    fn test_verify_power_ignores_dimming() {
        let pilot = Pilot {
            state: false,
            dimming: Some(100),
            ..Pilot::default()
        };
        assert!(Command::PowerOff.verify(&pilot));
        assert!(!Command::PowerOn.verify(&pilot));
    }
}
