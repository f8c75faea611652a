// SPDX-License-Identifier: GPL-3.0-only

//! Sensor-to-display orientation math
//!
//! Pure functions, unit-testable without any camera hardware. The sensor
//! mounting angle comes from the frame source; the device rotation comes
//! from whatever orientation signal the embedder feeds the registry.

use crate::backends::types::{DeviceRotation, Direction};

/// Quarter-turns a frame must be rotated to appear upright on the display.
///
/// Front cameras add the device rotation (the preview is mirrored), back
/// cameras subtract it.
pub fn quarter_turns(
    sensor_orientation: u32,
    device_rotation: DeviceRotation,
    direction: Direction,
) -> u8 {
    let sensor = sensor_orientation % 360;
    let device = device_rotation.degrees();

    let rotation = match direction {
        Direction::Front => (sensor + device) % 360,
        Direction::Back => (sensor + 360 - device) % 360,
    };

    (rotation / 90) as u8
}

/// Whether a quarter-turn count swaps reported width and height
pub fn swaps_dimensions(quarter_turns: u8) -> bool {
    quarter_turns % 2 == 1
}
