//! Color values, color-space conversion and pair sampling.

pub mod hsv;
pub mod sampler;

pub use hsv::{hsv_to_rgb, rgb_to_hsv, Hsv};
pub use sampler::ColorSampler;

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::error::{PreferenceError, PreferenceResult};

/// An RGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a color from wider integers, rejecting channels outside [0, 255].
    pub fn from_channels(r: i64, g: i64, b: i64) -> PreferenceResult<Self> {
        let channel = |name: &str, value: i64| {
            u8::try_from(value)
                .map_err(|_| PreferenceError::invalid_input(name, value, "channel in [0, 255]"))
        };
        Ok(Self::new(channel("r", r)?, channel("g", g)?, channel("b", b)?))
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    /// Channels scaled to [0, 1].
    pub fn normalized(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }

    /// Per-channel complement (`255 - c`).
    pub fn complement(&self) -> Self {
        Self::new(255 - self.r, 255 - self.g, 255 - self.b)
    }

    /// Euclidean distance in RGB space.
    pub fn distance(&self, other: &Color) -> f32 {
        let dr = self.r as f32 - other.r as f32;
        let dg = self.g as f32 - other.g as f32;
        let db = self.b as f32 - other.b as f32;
        (dr * dr + dg * dg + db * db).sqrt()
    }

    pub fn to_hsv(&self) -> Hsv {
        rgb_to_hsv(self.r, self.g, self.b)
    }
}

impl From<[u8; 3]> for Color {
    fn from(rgb: [u8; 3]) -> Self {
        Self::new(rgb[0], rgb[1], rgb[2])
    }
}

impl TryFrom<[i64; 3]> for Color {
    type Error = PreferenceError;

    fn try_from(rgb: [i64; 3]) -> PreferenceResult<Self> {
        Self::from_channels(rgb[0], rgb[1], rgb[2])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// The two colors shown in one trial, addressed by index 0 (left) and 1 (right).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair(pub [Color; 2]);

impl ColorPair {
    pub fn new(first: Color, second: Color) -> Self {
        Self([first, second])
    }

    pub fn first(&self) -> Color {
        self.0[0]
    }

    pub fn second(&self) -> Color {
        self.0[1]
    }

    pub fn distance(&self) -> f32 {
        self.0[0].distance(&self.0[1])
    }

    /// Split into `(preferred, rejected)` for a user pick of 0 or 1.
    pub fn split_by_pick(&self, picked_index: usize) -> PreferenceResult<(Color, Color)> {
        match picked_index {
            0 => Ok((self.0[0], self.0[1])),
            1 => Ok((self.0[1], self.0[0])),
            other => Err(PreferenceError::invalid_input(
                "picked_index",
                other,
                "index in {0, 1}",
            )),
        }
    }
}

impl Index<usize> for ColorPair {
    type Output = Color;

    fn index(&self, index: usize) -> &Color {
        &self.0[index]
    }
}

impl From<(Color, Color)> for ColorPair {
    fn from((first, second): (Color, Color)) -> Self {
        Self::new(first, second)
    }
}
