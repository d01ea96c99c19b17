// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 lumicast contributors

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::missing_panics_doc)] // Tests panic on failure
#![allow(clippy::items_after_statements)] // Test helpers
#![allow(clippy::module_name_repetitions)] // Test modules

//! Command execution integration tests against a simulated lamp: retry
//! exhaustion under total packet loss, immediate surfacing of device
//! rejections, and verification outcomes including firmware clamping.

mod sim;

use lumicast::{Client, Command, Error, Rgb};
use sim::{DeviceSim, SimOptions};
use std::time::{Duration, Instant};

const LAMP_MAC: &str = "a8bb50d46a1c";

fn fast_client() -> Client {
    Client::builder()
        .exchange_timeout(Duration::from_millis(100))
        .retries(3)
        .retry_delay(Duration::from_millis(200))
        .build()
}

#[tokio::test]
async fn test_mute_device_exhausts_retries_with_flat_delay() {
    let lamp = DeviceSim::spawn_with(SimOptions::new(LAMP_MAC).silent()).await;
    let client = fast_client();

    let started = Instant::now();
    let err = client
        .send_command(lamp.addr, &Command::PowerOn)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    // Three 100 ms exchange deadlines plus two inter-attempt delays
    assert!(started.elapsed() >= Duration::from_millis(700));
}

#[tokio::test]
async fn test_device_rejection_surfaces_without_retry() {
    let lamp = DeviceSim::spawn_with(SimOptions::new(LAMP_MAC).reject_set()).await;
    let client = fast_client();

    let started = Instant::now();
    let err = client
        .send_command(lamp.addr, &Command::SetBrightness { dimming: 50 })
        .await
        .unwrap_err();

    assert!(matches!(err, Error::DeviceRejected(_)));
    // No retry delay may elapse for a rejection
    assert!(started.elapsed() < Duration::from_millis(200));
}

#[tokio::test]
async fn test_clamping_firmware_yields_acked_but_unverified() {
    let lamp = DeviceSim::spawn_with(SimOptions::new(LAMP_MAC).clamp_dimming(55)).await;
    let client = fast_client();

    let outcome = client
        .execute_verified(lamp.addr, &Command::SetBrightness { dimming: 40 })
        .await
        .unwrap();

    assert!(outcome.acked);
    assert!(!outcome.verified, "55 is outside the +/-2 window around 40");
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_color_command_verifies_and_zeroes_white_channels() {
    let lamp = DeviceSim::spawn(LAMP_MAC).await;
    let client = fast_client();

    let outcome = client
        .execute_verified(
            lamp.addr,
            &Command::SetColor {
                color: Rgb::new(255, 0, 128),
                dimming: 60,
            },
        )
        .await
        .unwrap();
    assert!(outcome.acked && outcome.verified);

    let pilot = client.pilot(lamp.addr).await.unwrap();
    assert_eq!(pilot.r, Some(255));
    assert_eq!(pilot.g, Some(0));
    assert_eq!(pilot.b, Some(128));
    assert_eq!(pilot.c, Some(0));
    assert_eq!(pilot.w, Some(0));
    assert_eq!(pilot.temp, None, "color mode must displace temperature");
}

#[tokio::test]
async fn test_temperature_command_verifies_exactly() {
    let lamp = DeviceSim::spawn(LAMP_MAC).await;
    let client = fast_client();

    let outcome = client
        .execute_verified(
            lamp.addr,
            &Command::SetTemperature {
                kelvin: 4200,
                dimming: 50,
            },
        )
        .await
        .unwrap();
    assert!(outcome.verified);

    let pilot = client.pilot(lamp.addr).await.unwrap();
    assert_eq!(pilot.temp, Some(4200));
    assert_eq!(pilot.r, None, "temperature mode must displace color");
}

#[tokio::test]
async fn test_power_off_leaves_dimming_untouched() {
    let lamp = DeviceSim::spawn(LAMP_MAC).await;
    let client = fast_client();

    client
        .execute_verified(lamp.addr, &Command::SetBrightness { dimming: 70 })
        .await
        .unwrap();
    let outcome = client
        .execute_verified(lamp.addr, &Command::PowerOff)
        .await
        .unwrap();
    assert!(outcome.verified);

    let pilot = client.pilot(lamp.addr).await.unwrap();
    assert!(!pilot.state);
    assert_eq!(pilot.dimming, Some(70), "off is state, never dimming 0");
}

#[tokio::test]
async fn test_system_config_query() {
    let lamp = DeviceSim::spawn(LAMP_MAC).await;
    let client = fast_client();

    let config = client.system_config(lamp.addr).await.unwrap();
    assert_eq!(config.mac, LAMP_MAC);
    assert_eq!(config.module_name.as_deref(), Some("ESP01_SHRGB1C_31"));
}
