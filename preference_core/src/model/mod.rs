//! Preference models - the two interchangeable learning strategies
//!
//! Both strategies learn from labeled colors and score a color with the
//! probability that the user prefers it:
//! - [`GradientPreferenceModel`]: small dense network refit over a sliding
//!   window of recent examples
//! - [`RuleBasedPreferenceModel`]: per-bin preference frequencies in HSV space
//!
//! The session talks to whichever one is active through [`PreferenceModel`].

pub mod gradient;
pub mod rule;

pub use gradient::{EpochMetrics, FitReport, GradientPreferenceModel, TrainingExample};
pub use rule::{HsvBins, HsvChannel, PreferenceStat, RuleBasedPreferenceModel};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::PreferenceResult;

/// Which strategy receives training and prediction calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Gradient,
    RuleBased,
}

impl ModelKind {
    /// Human-readable label for status messages
    pub fn label(&self) -> &'static str {
        match self {
            ModelKind::Gradient => "Neural Network",
            ModelKind::RuleBased => "Rule-Based (HSV)",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a trial's loss/accuracy came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSource {
    /// Measured by an actual fit
    Measured,
    /// Fixed stand-ins (loss 0, accuracy 0.5) from a model without a loss
    Placeholder,
}

/// Result of training a model on one trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingOutcome {
    pub loss: f32,
    pub accuracy: f32,
    pub source: MetricSource,
}

impl TrainingOutcome {
    /// Loss 0 and accuracy 0.5, reported by models that have no loss.
    pub const PLACEHOLDER: TrainingOutcome = TrainingOutcome {
        loss: 0.0,
        accuracy: 0.5,
        source: MetricSource::Placeholder,
    };

    pub fn measured(loss: f32, accuracy: f32) -> Self {
        Self {
            loss,
            accuracy,
            source: MetricSource::Measured,
        }
    }
}

/// A trainable color preference model.
pub trait PreferenceModel: Send {
    fn kind(&self) -> ModelKind;

    /// Learn from one trial: `preferred` is labeled 1, `rejected` 0.
    fn train_pair(&mut self, preferred: Color, rejected: Color)
        -> PreferenceResult<TrainingOutcome>;

    /// Probability in [0, 1] that the user prefers `color`. Never mutates the model.
    fn predict(&self, color: Color) -> PreferenceResult<f32>;

    /// First-layer weights for instrumentation, if the model has any.
    fn weights_snapshot(&self) -> Option<Vec<f32>> {
        None
    }

    /// Labeled examples taken since the last reset.
    fn examples_seen(&self) -> usize;

    /// Drop per-session state (buffered examples, counters) while keeping
    /// learned parameters.
    fn reset_session(&mut self);
}
