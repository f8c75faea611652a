// SPDX-License-Identifier: GPL-3.0-only

//! RGBA downscaling for recognition frames
//!
//! Recognition runs on a scaled-down copy of the preview frame; detectors
//! never see full-resolution data. Bilinear sampling keeps small features
//! (barcode bars, text strokes) readable at low factors.

use crate::backends::types::{CameraFrame, FrameData};

/// Downscale `frame` by `factor` with bilinear interpolation.
///
/// Factors of 1.0 or more return a packed copy at the original size.
pub fn downscale(frame: &CameraFrame, factor: f32) -> CameraFrame {
    if factor >= 1.0 {
        let packed = frame.packed_rgba();
        return CameraFrame {
            data: FrameData::from_vec(packed),
            stride: frame.width * 4,
            ..frame.clone()
        };
    }

    let dst_width = ((frame.width as f32 * factor) as u32).max(1);
    let dst_height = ((frame.height as f32 * factor) as u32).max(1);

    let src_width = frame.width as usize;
    let src_height = frame.height as usize;
    let stride = frame.stride as usize;
    let data = frame.data.as_ref();

    let mut out = Vec::with_capacity((dst_width * dst_height * 4) as usize);

    let x_ratio = src_width as f32 / dst_width as f32;
    let y_ratio = src_height as f32 / dst_height as f32;

    for y in 0..dst_height {
        for x in 0..dst_width {
            let src_x = x as f32 * x_ratio;
            let src_y = y as f32 * y_ratio;

            let x0 = src_x as usize;
            let y0 = src_y as usize;
            let x1 = (x0 + 1).min(src_width - 1);
            let y1 = (y0 + 1).min(src_height - 1);

            let x_frac = src_x - x0 as f32;
            let y_frac = src_y - y0 as f32;

            let get = |px: usize, py: usize, channel: usize| -> f32 {
                let offset = py * stride + px * 4 + channel;
                data.get(offset).copied().unwrap_or(0) as f32
            };

            for channel in 0..4 {
                let p00 = get(x0, y0, channel);
                let p01 = get(x1, y0, channel);
                let p10 = get(x0, y1, channel);
                let p11 = get(x1, y1, channel);

                let value = p00 * (1.0 - x_frac) * (1.0 - y_frac)
                    + p01 * x_frac * (1.0 - y_frac)
                    + p10 * (1.0 - x_frac) * y_frac
                    + p11 * x_frac * y_frac;

                out.push(value as u8);
            }
        }
    }

    CameraFrame {
        data: FrameData::from_vec(out),
        width: dst_width,
        height: dst_height,
        stride: dst_width * 4,
        exposure: frame.exposure,
        captured_at: frame.captured_at,
    }
}
