// SPDX-License-Identifier: GPL-3.0-only

//! Texture-coordinate transforms for preview rendering
//!
//! Column-major 4x4 matrices, composed the way GL texture matrices are:
//! the right-most factor applies to the coordinate first. Rotations are
//! restricted to quarter turns so all entries stay exact.

use crate::backends::types::Direction;

/// Column-major 4x4 matrix
pub type Mat4 = [f32; 16];

/// The identity transform
pub const IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Column-major product `a * b`
pub fn mul(a: &Mat4, b: &Mat4) -> Mat4 {
    let mut out = [0.0; 16];
    for col in 0..4 {
        for row in 0..4 {
            let mut sum = 0.0;
            for k in 0..4 {
                sum += a[k * 4 + row] * b[col * 4 + k];
            }
            out[col * 4 + row] = sum;
        }
    }
    out
}

/// Translation by `(x, y)`
pub fn translation(x: f32, y: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[12] = x;
    m[13] = y;
    m
}

/// Scale by `(x, y)`
pub fn scaling(x: f32, y: f32) -> Mat4 {
    let mut m = IDENTITY;
    m[0] = x;
    m[5] = y;
    m
}

/// Rotation about z by `turns` quarter-turns (counter-clockwise for
/// positive values), with exact matrix entries.
pub fn rotation_quarters(turns: i32) -> Mat4 {
    let (cos, sin): (f32, f32) = match turns.rem_euclid(4) {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    };
    let mut m = IDENTITY;
    m[0] = cos;
    m[1] = sin;
    m[4] = -sin;
    m[5] = cos;
    m
}

/// Transform the texture coordinate `(x, y)`
pub fn apply(m: &Mat4, x: f32, y: f32) -> (f32, f32) {
    (
        m[0] * x + m[4] * y + m[12],
        m[1] * x + m[5] * y + m[13],
    )
}

/// Texture transform for one direction at the given display quarter-turns.
///
/// Front previews counter-rotate so the mirrored image tracks the display;
/// back previews rotate with the display and mirror horizontally. The
/// rotation and mirror pivot around the texture center.
pub fn preview_transform(direction: Direction, quarter_turns: u8) -> Mat4 {
    let turns = match direction {
        Direction::Front => -(quarter_turns as i32),
        Direction::Back => quarter_turns as i32,
    };

    let mut m = translation(0.5, 0.5);
    m = mul(&m, &rotation_quarters(turns));
    if direction == Direction::Back {
        m = mul(&m, &scaling(-1.0, 1.0));
    }
    mul(&m, &translation(-0.5, -0.5))
}
