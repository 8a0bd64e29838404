//! Learner configuration via TOML files.
//!
//! Every section is optional; missing keys fall back to the defaults the
//! demo was tuned with. Raw values are validated into the typed sections
//! before any model sees them.
//!
//! ```toml
//! [sampler]
//! min_distance = 100.0
//! seed = 7
//!
//! [gradient]
//! hidden_layers = [16, 12, 8]
//! learning_rate = 0.005
//!
//! [rule]
//! hue_weight = 0.4
//! saturation_weight = 0.3
//! value_weight = 0.3
//!
//! [session]
//! min_examples = 10
//! initial_model = "rule_based"
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;
use crate::model::ModelKind;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Complete learner configuration.
///
/// # Examples
///
/// ```
/// use preference_core::PreferenceConfig;
///
/// let config: PreferenceConfig = "[session]\nmin_examples = 4".parse().unwrap();
/// assert_eq!(config.session.min_examples, 4);
/// assert_eq!(config.gradient.hidden_layers, vec![16, 12, 8]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PreferenceConfig {
    pub sampler: SamplerConfig,
    pub gradient: GradientConfig,
    pub rule: RuleConfig,
    pub session: SessionConfig,
}

impl PreferenceConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        contents.parse()
    }
}

impl FromStr for PreferenceConfig {
    type Err = ConfigError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let raw: RawPreferenceConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        Ok(Self {
            sampler: SamplerConfig::try_from(raw.sampler)?,
            gradient: GradientConfig::try_from(raw.gradient)?,
            rule: RuleConfig::try_from(raw.rule)?,
            session: SessionConfig::try_from(raw.session)?,
        })
    }
}

/// Color pair sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SamplerConfig {
    /// Minimum Euclidean RGB distance between the two colors of a pair
    pub min_distance: f32,
    /// Redraws of the second color before falling back to a fixed pair
    pub max_attempts: usize,
    /// Random seed for reproducible pairs
    pub seed: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            min_distance: 100.0,
            max_attempts: 1000,
            seed: 42,
        }
    }
}

impl TryFrom<RawSampler> for SamplerConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSampler) -> Result<Self, ConfigError> {
        // Measured the same way the sampler measures its black/white fallback.
        let max_possible = Color::BLACK.distance(&Color::WHITE);
        if !raw.min_distance.is_finite() || raw.min_distance < 0.0 {
            return Err(ConfigError::invalid(
                "sampler.min_distance",
                "must be a non-negative number",
            ));
        }
        if raw.min_distance > max_possible {
            return Err(ConfigError::invalid(
                "sampler.min_distance",
                format!("cannot exceed {max_possible:.1}"),
            ));
        }
        if raw.max_attempts == 0 {
            return Err(ConfigError::invalid(
                "sampler.max_attempts",
                "must be non-zero",
            ));
        }

        Ok(Self {
            min_distance: raw.min_distance,
            max_attempts: raw.max_attempts,
            seed: raw.seed,
        })
    }
}

/// Gradient model architecture and optimizer parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradientConfig {
    /// Hidden layer widths, input side first
    pub hidden_layers: Vec<usize>,
    /// Dropout rate applied after every hidden layer except the last
    pub dropout_rate: f32,
    /// L2 kernel penalty on hidden layers
    pub l2: f32,
    /// Adam step size
    pub learning_rate: f32,
    /// Epochs per training step
    pub epochs: usize,
    /// Mini-batch size (capped by the buffer length)
    pub batch_size: usize,
    /// Training buffer capacity; oldest examples are evicted first
    pub buffer_capacity: usize,
    /// Seed for initialization, shuffling and dropout masks
    pub seed: u64,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![16, 12, 8],
            dropout_rate: 0.2,
            l2: 0.01,
            learning_rate: 0.005,
            epochs: 3,
            batch_size: 8,
            buffer_capacity: 100,
            seed: 42,
        }
    }
}

impl TryFrom<RawGradient> for GradientConfig {
    type Error = ConfigError;

    fn try_from(raw: RawGradient) -> Result<Self, ConfigError> {
        if raw.hidden_layers.is_empty() || raw.hidden_layers.contains(&0) {
            return Err(ConfigError::invalid(
                "gradient.hidden_layers",
                "needs at least one layer and every width must be non-zero",
            ));
        }
        if !(0.0..1.0).contains(&raw.dropout_rate) {
            return Err(ConfigError::invalid(
                "gradient.dropout_rate",
                "must be within [0, 1)",
            ));
        }
        if !raw.l2.is_finite() || raw.l2 < 0.0 {
            return Err(ConfigError::invalid("gradient.l2", "must be non-negative"));
        }
        if !raw.learning_rate.is_finite() || raw.learning_rate <= 0.0 {
            return Err(ConfigError::invalid(
                "gradient.learning_rate",
                "must be positive",
            ));
        }
        if raw.epochs == 0 {
            return Err(ConfigError::invalid("gradient.epochs", "must be non-zero"));
        }
        if raw.batch_size == 0 {
            return Err(ConfigError::invalid(
                "gradient.batch_size",
                "must be non-zero",
            ));
        }
        if raw.buffer_capacity == 0 {
            return Err(ConfigError::invalid(
                "gradient.buffer_capacity",
                "must be non-zero",
            ));
        }

        Ok(Self {
            hidden_layers: raw.hidden_layers,
            dropout_rate: raw.dropout_rate,
            l2: raw.l2,
            learning_rate: raw.learning_rate,
            epochs: raw.epochs,
            batch_size: raw.batch_size,
            buffer_capacity: raw.buffer_capacity,
            seed: raw.seed,
        })
    }
}

/// Channel weights of the rule-based score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleConfig {
    pub hue_weight: f32,
    pub saturation_weight: f32,
    pub value_weight: f32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            hue_weight: 0.4,
            saturation_weight: 0.3,
            value_weight: 0.3,
        }
    }
}

impl TryFrom<RawRule> for RuleConfig {
    type Error = ConfigError;

    fn try_from(raw: RawRule) -> Result<Self, ConfigError> {
        let weights = [
            ("rule.hue_weight", raw.hue_weight),
            ("rule.saturation_weight", raw.saturation_weight),
            ("rule.value_weight", raw.value_weight),
        ];
        for (field, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::invalid(field, "must be non-negative"));
            }
        }

        let sum = raw.hue_weight + raw.saturation_weight + raw.value_weight;
        if (sum - 1.0).abs() > 1e-4 {
            return Err(ConfigError::invalid(
                "rule",
                format!("channel weights must sum to 1, got {sum}"),
            ));
        }

        Ok(Self {
            hue_weight: raw.hue_weight,
            saturation_weight: raw.saturation_weight,
            value_weight: raw.value_weight,
        })
    }
}

/// Orchestration parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    /// Trials required before inference unlocks (two examples per trial)
    pub min_examples: usize,
    /// Model active when the session starts
    pub initial_model: ModelKind,
    /// Maximum retained history entries
    pub history_capacity: usize,
    /// Maximum retained first-layer weight snapshots
    pub weight_history_capacity: usize,
    /// Optional JSONL journal of completed trials
    pub journal_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Total examples required before inference unlocks.
    pub fn required_examples(&self) -> usize {
        self.min_examples * 2
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            min_examples: 10,
            initial_model: ModelKind::Gradient,
            history_capacity: 1000,
            weight_history_capacity: 50,
            journal_path: None,
        }
    }
}

impl TryFrom<RawSession> for SessionConfig {
    type Error = ConfigError;

    fn try_from(raw: RawSession) -> Result<Self, ConfigError> {
        if raw.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "session.history_capacity",
                "must be non-zero",
            ));
        }
        if raw.weight_history_capacity < 2 {
            return Err(ConfigError::invalid(
                "session.weight_history_capacity",
                "must keep at least two snapshots",
            ));
        }

        Ok(Self {
            min_examples: raw.min_examples,
            initial_model: raw.initial_model,
            history_capacity: raw.history_capacity,
            weight_history_capacity: raw.weight_history_capacity,
            journal_path: raw.journal_path,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPreferenceConfig {
    sampler: RawSampler,
    gradient: RawGradient,
    rule: RawRule,
    session: RawSession,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSampler {
    min_distance: f32,
    max_attempts: usize,
    seed: u64,
}

impl Default for RawSampler {
    fn default() -> Self {
        let defaults = SamplerConfig::default();
        Self {
            min_distance: defaults.min_distance,
            max_attempts: defaults.max_attempts,
            seed: defaults.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawGradient {
    hidden_layers: Vec<usize>,
    dropout_rate: f32,
    l2: f32,
    learning_rate: f32,
    epochs: usize,
    batch_size: usize,
    buffer_capacity: usize,
    seed: u64,
}

impl Default for RawGradient {
    fn default() -> Self {
        let defaults = GradientConfig::default();
        Self {
            hidden_layers: defaults.hidden_layers,
            dropout_rate: defaults.dropout_rate,
            l2: defaults.l2,
            learning_rate: defaults.learning_rate,
            epochs: defaults.epochs,
            batch_size: defaults.batch_size,
            buffer_capacity: defaults.buffer_capacity,
            seed: defaults.seed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawRule {
    hue_weight: f32,
    saturation_weight: f32,
    value_weight: f32,
}

impl Default for RawRule {
    fn default() -> Self {
        let defaults = RuleConfig::default();
        Self {
            hue_weight: defaults.hue_weight,
            saturation_weight: defaults.saturation_weight,
            value_weight: defaults.value_weight,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawSession {
    min_examples: usize,
    initial_model: ModelKind,
    history_capacity: usize,
    weight_history_capacity: usize,
    journal_path: Option<PathBuf>,
}

impl Default for RawSession {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            min_examples: defaults.min_examples,
            initial_model: defaults.initial_model,
            history_capacity: defaults.history_capacity,
            weight_history_capacity: defaults.weight_history_capacity,
            journal_path: defaults.journal_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorSampler;

    #[test]
    fn empty_document_yields_defaults() {
        let config: PreferenceConfig = "".parse().unwrap();
        assert_eq!(config, PreferenceConfig::default());
        assert_eq!(config.session.required_examples(), 20);
    }

    #[test]
    fn parses_custom_values() {
        let toml = r#"
            [sampler]
            min_distance = 120.0
            seed = 9

            [gradient]
            hidden_layers = [8, 4]
            epochs = 5

            [session]
            min_examples = 3
            initial_model = "rule_based"
            journal_path = "logs/trials.jsonl"
        "#;
        let config: PreferenceConfig = toml.parse().unwrap();

        assert_eq!(config.sampler.min_distance, 120.0);
        assert_eq!(config.sampler.seed, 9);
        assert_eq!(config.sampler.max_attempts, 1000);
        assert_eq!(config.gradient.hidden_layers, vec![8, 4]);
        assert_eq!(config.gradient.epochs, 5);
        assert_eq!(config.gradient.batch_size, 8);
        assert_eq!(config.session.min_examples, 3);
        assert_eq!(config.session.initial_model, ModelKind::RuleBased);
        assert_eq!(
            config.session.journal_path,
            Some(PathBuf::from("logs/trials.jsonl"))
        );
    }

    #[test]
    fn rejects_rule_weights_not_summing_to_one() {
        let toml = "[rule]\nhue_weight = 0.5\nsaturation_weight = 0.3\nvalue_weight = 0.3";
        let err = toml.parse::<PreferenceConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "rule"));
    }

    #[test]
    fn rejects_unreachable_min_distance() {
        let err = "[sampler]\nmin_distance = 500.0"
            .parse::<PreferenceConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("sampler.min_distance"));
    }

    #[test]
    fn min_distance_limit_matches_fallback_pair() {
        let limit = Color::BLACK.distance(&Color::WHITE);
        let raw = |min_distance| RawSampler {
            min_distance,
            max_attempts: 3,
            seed: 11,
        };

        let config = SamplerConfig::try_from(raw(limit)).unwrap();
        let mut sampler = ColorSampler::new(config);
        for _ in 0..20 {
            assert!(sampler.sample().distance() >= limit);
        }

        let above = f32::from_bits(limit.to_bits() + 1);
        let err = SamplerConfig::try_from(raw(above)).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref field, .. } if field == "sampler.min_distance"
        ));
    }

    #[test]
    fn rejects_zero_width_layer() {
        let err = "[gradient]\nhidden_layers = [16, 0]"
            .parse::<PreferenceConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("gradient.hidden_layers"));
    }

    #[test]
    fn rejects_dropout_of_one() {
        let err = "[gradient]\ndropout_rate = 1.0"
            .parse::<PreferenceConfig>()
            .unwrap_err();
        assert!(err.to_string().contains("dropout_rate"));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = "[session]\nmin_exmples = 3"
            .parse::<PreferenceConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learner.toml");
        fs::write(&path, "[gradient]\nbuffer_capacity = 40").unwrap();

        let config = PreferenceConfig::load_from_file(&path).unwrap();
        assert_eq!(config.gradient.buffer_capacity, 40);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PreferenceConfig::load_from_file("/nonexistent/learner.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
