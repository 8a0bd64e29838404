//! RGB ↔ HSV conversion.
//!
//! Hue is expressed in degrees `[0, 360)`, saturation and value in percent
//! `[0, 100]`, the scale the rule-based model bins on.

use serde::{Deserialize, Serialize};

use super::Color;

/// A color in HSV space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hsv {
    /// Hue in degrees, `[0, 360)`
    pub h: f32,
    /// Saturation in percent, `[0, 100]`
    pub s: f32,
    /// Value in percent, `[0, 100]`
    pub v: f32,
}

/// Convert 8-bit RGB to HSV.
///
/// When two channels tie for the maximum, red wins over green and green
/// over blue. Achromatic colors get hue 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let max_channel = r.max(g).max(b);
    let min_channel = r.min(g).min(b);

    let rf = r as f32 / 255.0;
    let gf = g as f32 / 255.0;
    let bf = b as f32 / 255.0;
    let max = max_channel as f32 / 255.0;
    let delta = (max_channel - min_channel) as f32 / 255.0;

    if max_channel == min_channel {
        return Hsv {
            h: 0.0,
            s: 0.0,
            v: max * 100.0,
        };
    }

    let hue_sector = if max_channel == r {
        ((gf - bf) / delta).rem_euclid(6.0)
    } else if max_channel == g {
        (bf - rf) / delta + 2.0
    } else {
        (rf - gf) / delta + 4.0
    };

    let mut h = hue_sector * 60.0;
    if h >= 360.0 {
        h -= 360.0;
    }

    Hsv {
        h,
        s: delta / max * 100.0,
        v: max * 100.0,
    }
}

/// Convert HSV (degrees, percent, percent) back to 8-bit RGB, rounding each channel.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Color {
    let sector = (h / 60.0).rem_euclid(6.0);
    let value = (v / 100.0).clamp(0.0, 1.0);
    let saturation = (s / 100.0).clamp(0.0, 1.0);

    let c = value * saturation;
    let x = c * (1.0 - ((sector % 2.0) - 1.0).abs());
    let m = value - c;

    let (r1, g1, b1) = if sector < 1.0 {
        (c, x, 0.0)
    } else if sector < 2.0 {
        (x, c, 0.0)
    } else if sector < 3.0 {
        (0.0, c, x)
    } else if sector < 4.0 {
        (0.0, x, c)
    } else if sector < 5.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    let to_channel = |unit: f32| ((unit + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Color::new(to_channel(r1), to_channel(g1), to_channel(b1))
}

impl From<Hsv> for Color {
    fn from(hsv: Hsv) -> Self {
        hsv_to_rgb(hsv.h, hsv.s, hsv.v)
    }
}
