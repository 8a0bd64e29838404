//! Read-only diagnostics over a session's weights and metric history.
//!
//! Every function here is pure; [`crate::session::TrainingSession::insights`]
//! gathers the inputs under the session lock and calls them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::session::history::{linear_slope, TrainingHistoryEntry};

/// Examples after which the model is considered reasonably trained.
pub const RECOMMENDED_EXAMPLES: usize = 20;

/// Number of history entries the learning pattern looks at.
pub const PATTERN_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RgbChannel {
    Red,
    Green,
    Blue,
}

impl fmt::Display for RgbChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RgbChannel::Red => "Red",
            RgbChannel::Green => "Green",
            RgbChannel::Blue => "Blue",
        })
    }
}

/// Mean absolute first-layer weight fanning out of each input channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorSensitivity {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub dominant: RgbChannel,
}

/// `weights` is the row-major `[3, width]` input kernel. `None` when it
/// cannot be split into three equal non-empty rows.
pub fn color_sensitivity(weights: &[f32]) -> Option<ColorSensitivity> {
    if weights.is_empty() || weights.len() % 3 != 0 {
        return None;
    }
    let width = weights.len() / 3;
    let mean_abs = |row: &[f32]| row.iter().map(|w| w.abs()).sum::<f32>() / width as f32;

    let red = mean_abs(&weights[..width]);
    let green = mean_abs(&weights[width..2 * width]);
    let blue = mean_abs(&weights[2 * width..]);

    // Ties resolve red, then green.
    let dominant = if red >= green && red >= blue {
        RgbChannel::Red
    } else if green >= blue {
        RgbChannel::Green
    } else {
        RgbChannel::Blue
    };

    Some(ColorSensitivity {
        red,
        green,
        blue,
        dominant,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Level {
    Low,
    Medium,
    High,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Low => "Low",
            Level::Medium => "Medium",
            Level::High => "High",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightChange {
    pub mean_abs_change: f32,
    pub level: Level,
}

/// Mean absolute difference between two snapshots of equal length.
pub fn weight_change(previous: &[f32], current: &[f32]) -> Option<WeightChange> {
    if previous.is_empty() || previous.len() != current.len() {
        return None;
    }
    let mean_abs_change = previous
        .iter()
        .zip(current)
        .map(|(a, b)| (a - b).abs())
        .sum::<f32>()
        / previous.len() as f32;

    let level = if mean_abs_change > 0.1 {
        Level::High
    } else if mean_abs_change > 0.05 {
        Level::Medium
    } else {
        Level::Low
    };

    Some(WeightChange {
        mean_abs_change,
        level,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossTrend {
    Decreasing,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyTrend {
    Improving,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LearningPattern {
    pub loss: LossTrend,
    pub accuracy: AccuracyTrend,
    /// Least-squares loss slope per step over the window
    pub loss_slope: f32,
}

/// Compares the newest of the last [`PATTERN_WINDOW`] entries with the oldest.
pub fn learning_pattern(history: &[TrainingHistoryEntry]) -> Option<LearningPattern> {
    if history.len() < PATTERN_WINDOW {
        return None;
    }
    let window = &history[history.len() - PATTERN_WINDOW..];
    let (oldest, newest) = (window[0], window[PATTERN_WINDOW - 1]);

    let losses: Vec<f32> = window.iter().map(|entry| entry.loss).collect();

    Some(LearningPattern {
        loss: if newest.loss < oldest.loss {
            LossTrend::Decreasing
        } else {
            LossTrend::Stable
        },
        accuracy: if newest.accuracy > oldest.accuracy {
            AccuracyTrend::Improving
        } else {
            AccuracyTrend::Stable
        },
        loss_slope: linear_slope(&losses),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionConfidence {
    pub level: Level,
    /// Accuracy the level was read from
    pub accuracy: f32,
    pub training_count: usize,
    pub recommendation: Option<&'static str>,
}

/// `None` until `training_count` reaches `required`. `latest_accuracy` is
/// the newest history entry's accuracy, 0 when history is empty.
pub fn prediction_confidence(
    training_count: usize,
    required: usize,
    latest_accuracy: Option<f32>,
) -> Option<PredictionConfidence> {
    if training_count < required {
        return None;
    }
    let accuracy = latest_accuracy.unwrap_or(0.0);
    let level = if accuracy > 0.8 {
        Level::High
    } else if accuracy > 0.6 {
        Level::Medium
    } else {
        Level::Low
    };

    let recommendation = if training_count < RECOMMENDED_EXAMPLES {
        Some("Train more for better accuracy")
    } else if accuracy < 0.7 {
        Some("Try different color combinations")
    } else if accuracy > 0.85 {
        Some("Model performing well!")
    } else {
        None
    };

    Some(PredictionConfidence {
        level,
        accuracy,
        training_count,
        recommendation,
    })
}

/// Progress message shown after each trial.
pub fn recommendation_status(training_count: usize, current_accuracy: f32) -> String {
    if training_count < RECOMMENDED_EXAMPLES / 2 {
        format!("Training... ({training_count}/{RECOMMENDED_EXAMPLES} recommended examples)")
    } else if training_count < RECOMMENDED_EXAMPLES {
        format!("Good progress! ({training_count}/{RECOMMENDED_EXAMPLES} examples)")
    } else if current_accuracy > 0.8 {
        "Model performing well! Ready for predictions.".to_string()
    } else if current_accuracy > 0.6 {
        "Model learning... Try more diverse color combinations.".to_string()
    } else {
        "Model needs more training with varied examples.".to_string()
    }
}

/// Snapshot of every diagnostic at once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInsights {
    pub sensitivity: Option<ColorSensitivity>,
    pub weight_change: Option<WeightChange>,
    pub learning_pattern: Option<LearningPattern>,
    pub confidence: Option<PredictionConfidence>,
    pub status: String,
}
