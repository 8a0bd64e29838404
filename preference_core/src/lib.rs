//! # Preference Core
//!
//! Learns a user's color preferences from pairwise choices. Each trial shows
//! two well-separated random colors; the user picks one, and the active model
//! learns that the picked color is preferred and the other is not. Once enough
//! trials were recorded the session predicts, for a fresh pair, how likely
//! the user is to prefer each color.
//!
//! ## Quick Start
//!
//! ```rust
//! use preference_core::{ModelKind, TrainingSession};
//!
//! let session = TrainingSession::headless();
//! session.switch_model(ModelKind::RuleBased);
//!
//! for _ in 0..10 {
//!     session.record_preference(0).unwrap();
//! }
//!
//! let prediction = session.predict().unwrap();
//! assert!((0.0..=1.0).contains(&prediction.prob0));
//! assert!((0.0..=1.0).contains(&prediction.prob1));
//! ```
//!
//! ## Core Modules
//!
//! - [`color`] - RGB/HSV colors and distance-constrained pair sampling
//! - [`model`] - Gradient and rule-based preference models
//! - [`neural`] - Dense layers, dropout, Adam and cross-entropy
//! - [`session`] - Training session orchestration and insights
//! - [`config`] - Configuration via TOML
//! - [`logging`] - Tracing setup and JSON line-delimited training journal

pub mod color;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod neural;
pub mod session;

pub use color::{hsv_to_rgb, rgb_to_hsv, Color, ColorPair, ColorSampler, Hsv};
pub use config::{
    ConfigError, GradientConfig, PreferenceConfig, RuleConfig, SamplerConfig, SessionConfig,
};
pub use error::{PreferenceError, PreferenceResult};
pub use logging::{append_training_entry, init_tracing, TrainingLogEntry};
pub use model::{
    FitReport, GradientPreferenceModel, ModelKind, PreferenceModel, RuleBasedPreferenceModel,
    TrainingExample, TrainingOutcome,
};
pub use session::{
    inference_unlocked, DisplaySink, NullSink, Phase, Prediction, RecordOutcome, SessionInsights,
    TrainingHistoryEntry, TrainingSession, TrainingSummary,
};
