// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

//! Simulated lamp: a loopback UDP responder speaking the device protocol.
//!
//! Options model the field conditions the crate must survive: a mute
//! device (packet loss), a device that rejects mutations, firmware that
//! clamps dimming, and a network that eats the first broadcast probe.

#![allow(dead_code)] // each integration crate uses a subset of the sim

use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::UdpSocket;

pub struct SimOptions {
    mac: String,
    silent: bool,
    reject_set: bool,
    clamp_dimming: Option<u8>,
    drop_probes: u32,
}

impl SimOptions {
    pub fn new(mac: &str) -> Self {
        Self {
            mac: mac.to_string(),
            silent: false,
            reject_set: false,
            clamp_dimming: None,
            drop_probes: 0,
        }
    }

    /// Never reply to anything.
    pub fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    /// Answer `setPilot` with a device error envelope.
    pub fn reject_set(mut self) -> Self {
        self.reject_set = true;
        self
    }

    /// Firmware-style clamping: every applied dimming becomes `value`.
    pub fn clamp_dimming(mut self, value: u8) -> Self {
        self.clamp_dimming = Some(value);
        self
    }

    /// Ignore the first `n` registration probes (lossy broadcast path).
    pub fn drop_probes(mut self, n: u32) -> Self {
        self.drop_probes = n;
        self
    }
}

pub struct DeviceSim {
    pub addr: SocketAddr,
    pub port: u16,
}

impl DeviceSim {
    pub async fn spawn(mac: &str) -> Self {
        Self::spawn_with(SimOptions::new(mac)).await
    }

    pub async fn spawn_with(options: SimOptions) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        tokio::spawn(run_device(socket, options));
        Self {
            addr,
            port: addr.port(),
        }
    }
}

async fn run_device(socket: UdpSocket, options: SimOptions) {
    let mut probes_dropped = 0u32;
    // Power-on defaults of a warm-white lamp
    let mut pilot = json!({
        "mac": options.mac,
        "rssi": -58,
        "state": true,
        "sceneId": 0,
        "temp": 2700,
        "dimming": 100,
    });

    let mut buf = [0u8; 1024];
    loop {
        let (len, from) = match socket.recv_from(&mut buf).await {
            Ok(r) => r,
            Err(_) => return,
        };
        if options.silent {
            continue;
        }
        let request: Value = match serde_json::from_slice(&buf[..len]) {
            Ok(v) => v,
            Err(_) => continue,
        };

        let reply = match request["method"].as_str() {
            Some("registration") => {
                if probes_dropped < options.drop_probes {
                    probes_dropped += 1;
                    continue;
                }
                json!({
                    "method": "registration",
                    "env": "pro",
                    "result": {"mac": options.mac, "success": true},
                })
            }
            Some("getPilot") => {
                let mut result = pilot.clone();
                result["mac"] = Value::from(options.mac.clone());
                json!({"method": "getPilot", "env": "pro", "result": result})
            }
            Some("setPilot") => {
                if options.reject_set {
                    json!({
                        "method": "setPilot",
                        "env": "pro",
                        "error": {"code": -32600, "message": "Invalid Request"},
                    })
                } else {
                    apply_set_pilot(&mut pilot, &request["params"], options.clamp_dimming);
                    json!({"method": "setPilot", "env": "pro", "result": {"success": true}})
                }
            }
            Some("getSystemConfig") => json!({
                "method": "getSystemConfig",
                "env": "pro",
                "result": {
                    "mac": options.mac,
                    "homeId": 651,
                    "roomId": 2,
                    "moduleName": "ESP01_SHRGB1C_31",
                    "fwVersion": "1.25.0",
                },
            }),
            _ => continue,
        };

        let bytes = serde_json::to_vec(&reply).unwrap();
        socket.send_to(&bytes, from).await.unwrap();
    }
}

/// Mirror the firmware's application of `setPilot` params, including its
/// temperature/color mode exclusivity.
fn apply_set_pilot(pilot: &mut Value, params: &Value, clamp_dimming: Option<u8>) {
    let Some(params) = params.as_object() else {
        return;
    };
    if params.contains_key("temp") {
        for ch in ["r", "g", "b", "c", "w"] {
            pilot.as_object_mut().unwrap().remove(ch);
        }
    }
    if params.contains_key("r") || params.contains_key("g") || params.contains_key("b") {
        pilot.as_object_mut().unwrap().remove("temp");
    }
    for (key, value) in params {
        if key == "dimming" {
            let applied = clamp_dimming
                .map(u64::from)
                .or_else(|| value.as_u64())
                .unwrap_or(100);
            pilot["dimming"] = Value::from(applied);
        } else {
            pilot[key] = value.clone();
        }
    }
}
