//! HSV histogram preference model.
//!
//! Each labeled color increments one bin per HSV channel. A color's score is
//! the weighted mean of the preference rates of the three bins it falls
//! into, with unseen bins counting as a neutral 0.5.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::color::{Color, Hsv};
use crate::config::RuleConfig;
use crate::error::PreferenceResult;
use crate::model::{ModelKind, PreferenceModel, TrainingOutcome};

/// Score of a bin nobody has seen yet.
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Preference counts for one bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceStat {
    pub preferred_count: usize,
    pub total_count: usize,
}

impl PreferenceStat {
    fn observe(&mut self, preferred: bool) {
        self.total_count += 1;
        if preferred {
            self.preferred_count += 1;
        }
    }

    /// Fraction of observations that were preferred.
    pub fn score(&self) -> f32 {
        if self.total_count == 0 {
            return NEUTRAL_SCORE;
        }
        self.preferred_count as f32 / self.total_count as f32
    }
}

/// One of the three binned HSV channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HsvChannel {
    /// 12 bins of 30°
    Hue,
    /// 4 bins of 25%
    Saturation,
    /// 4 bins of 25%
    Value,
}

impl HsvChannel {
    pub const ALL: [HsvChannel; 3] = [HsvChannel::Hue, HsvChannel::Saturation, HsvChannel::Value];

    pub fn bin_count(&self) -> usize {
        match self {
            HsvChannel::Hue => 12,
            HsvChannel::Saturation | HsvChannel::Value => 4,
        }
    }

    fn bin_width(&self) -> f32 {
        match self {
            HsvChannel::Hue => 30.0,
            HsvChannel::Saturation | HsvChannel::Value => 25.0,
        }
    }

    /// Bin index of a channel value, clamped so the top edge (s or v = 100)
    /// lands in the last bin.
    pub fn bin_of(&self, value: f32) -> usize {
        let bin = (value / self.bin_width()).floor().max(0.0) as usize;
        bin.min(self.bin_count() - 1)
    }
}

/// Bin indices of a color on each channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HsvBins {
    pub hue: usize,
    pub saturation: usize,
    pub value: usize,
}

impl HsvBins {
    pub fn of(hsv: Hsv) -> Self {
        Self {
            hue: HsvChannel::Hue.bin_of(hsv.h),
            saturation: HsvChannel::Saturation.bin_of(hsv.s),
            value: HsvChannel::Value.bin_of(hsv.v),
        }
    }

    pub fn get(&self, channel: HsvChannel) -> usize {
        match channel {
            HsvChannel::Hue => self.hue,
            HsvChannel::Saturation => self.saturation,
            HsvChannel::Value => self.value,
        }
    }
}

/// Frequency-based preference model over HSV bins.
#[derive(Debug, Clone)]
pub struct RuleBasedPreferenceModel {
    config: RuleConfig,
    hue: BTreeMap<usize, PreferenceStat>,
    saturation: BTreeMap<usize, PreferenceStat>,
    value: BTreeMap<usize, PreferenceStat>,
    examples_seen: usize,
}

impl RuleBasedPreferenceModel {
    pub fn new(config: RuleConfig) -> Self {
        Self {
            config,
            hue: BTreeMap::new(),
            saturation: BTreeMap::new(),
            value: BTreeMap::new(),
            examples_seen: 0,
        }
    }

    fn table(&self, channel: HsvChannel) -> &BTreeMap<usize, PreferenceStat> {
        match channel {
            HsvChannel::Hue => &self.hue,
            HsvChannel::Saturation => &self.saturation,
            HsvChannel::Value => &self.value,
        }
    }

    fn table_mut(&mut self, channel: HsvChannel) -> &mut BTreeMap<usize, PreferenceStat> {
        match channel {
            HsvChannel::Hue => &mut self.hue,
            HsvChannel::Saturation => &mut self.saturation,
            HsvChannel::Value => &mut self.value,
        }
    }

    fn weight(&self, channel: HsvChannel) -> f32 {
        match channel {
            HsvChannel::Hue => self.config.hue_weight,
            HsvChannel::Saturation => self.config.saturation_weight,
            HsvChannel::Value => self.config.value_weight,
        }
    }

    /// Record one labeled color.
    pub fn train(&mut self, color: Color, preferred: bool) {
        let bins = HsvBins::of(color.to_hsv());
        for channel in HsvChannel::ALL {
            self.table_mut(channel)
                .entry(bins.get(channel))
                .or_insert(PreferenceStat {
                    preferred_count: 0,
                    total_count: 0,
                })
                .observe(preferred);
        }
        self.examples_seen += 1;
    }

    /// Weighted preference score in [0, 1]; exactly 0.5 for an untrained model.
    pub fn predict(&self, color: Color) -> f32 {
        let bins = HsvBins::of(color.to_hsv());
        HsvChannel::ALL
            .iter()
            .map(|&channel| self.weight(channel) * self.channel_score(channel, bins.get(channel)))
            .sum::<f32>()
            .clamp(0.0, 1.0)
    }

    /// Score of a single bin, neutral when unseen.
    pub fn channel_score(&self, channel: HsvChannel, bin: usize) -> f32 {
        self.stat(channel, bin)
            .map(PreferenceStat::score)
            .unwrap_or(NEUTRAL_SCORE)
    }

    pub fn stat(&self, channel: HsvChannel, bin: usize) -> Option<&PreferenceStat> {
        self.table(channel).get(&bin)
    }

    /// Bins observed so far on `channel`, in index order.
    pub fn stats(&self, channel: HsvChannel) -> impl Iterator<Item = (usize, &PreferenceStat)> {
        self.table(channel).iter().map(|(&bin, stat)| (bin, stat))
    }

    pub fn examples_seen(&self) -> usize {
        self.examples_seen
    }
}

impl Default for RuleBasedPreferenceModel {
    fn default() -> Self {
        Self::new(RuleConfig::default())
    }
}

impl PreferenceModel for RuleBasedPreferenceModel {
    fn kind(&self) -> ModelKind {
        ModelKind::RuleBased
    }

    fn train_pair(
        &mut self,
        preferred: Color,
        rejected: Color,
    ) -> PreferenceResult<TrainingOutcome> {
        self.train(preferred, true);
        self.train(rejected, false);
        Ok(TrainingOutcome::PLACEHOLDER)
    }

    fn predict(&self, color: Color) -> PreferenceResult<f32> {
        Ok(RuleBasedPreferenceModel::predict(self, color))
    }

    fn examples_seen(&self) -> usize {
        self.examples_seen
    }

    fn reset_session(&mut self) {
        self.examples_seen = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn untrained_model_is_neutral() {
        let model = RuleBasedPreferenceModel::default();
        for color in [Color::BLACK, Color::WHITE, Color::new(12, 200, 90)] {
            assert!((model.predict(color) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn bins_clamp_top_edge() {
        assert_eq!(HsvChannel::Value.bin_of(100.0), 3);
        assert_eq!(HsvChannel::Saturation.bin_of(100.0), 3);
        assert_eq!(HsvChannel::Saturation.bin_of(24.99), 0);
        assert_eq!(HsvChannel::Hue.bin_of(359.9), 11);
        assert_eq!(HsvChannel::Hue.bin_of(30.0), 1);

        let white = HsvBins::of(Color::WHITE.to_hsv());
        assert_eq!(white, HsvBins { hue: 0, saturation: 0, value: 3 });
    }

    #[test]
    fn same_color_both_ways_gives_half_per_channel() {
        let mut model = RuleBasedPreferenceModel::default();
        let color = Color::new(30, 160, 220);
        model.train(color, true);
        model.train(color, false);

        let bins = HsvBins::of(color.to_hsv());
        for channel in HsvChannel::ALL {
            let stat = model.stat(channel, bins.get(channel)).unwrap();
            assert_eq!(stat.total_count, 2);
            assert_eq!(stat.preferred_count, 1);
            assert_eq!(model.channel_score(channel, bins.get(channel)), 0.5);
        }
        assert!((model.predict(color) - 0.5).abs() < 1e-6);
        assert_eq!(model.examples_seen(), 2);
    }

    #[test]
    fn weighting_favors_hue() {
        let mut model = RuleBasedPreferenceModel::default();
        // Pure red and a desaturated dark red share no S/V bins but share the hue bin.
        model.train(Color::new(255, 0, 0), true);

        let query = Color::new(60, 50, 50);
        let bins = HsvBins::of(query.to_hsv());
        assert_eq!(bins.hue, 0);
        assert_ne!(bins.saturation, 3);
        assert_ne!(bins.value, 3);

        // 0.4 * 1.0 + 0.3 * 0.5 + 0.3 * 0.5
        assert!((model.predict(query) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn predictions_stay_in_unit_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut model = RuleBasedPreferenceModel::default();
        for _ in 0..300 {
            let color = Color::new(rng.gen(), rng.gen(), rng.gen());
            model.train(color, rng.gen());
            let query = Color::new(rng.gen(), rng.gen(), rng.gen());
            let p = model.predict(query);
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn stats_iterate_in_bin_order() {
        let mut model = RuleBasedPreferenceModel::default();
        model.train(Color::new(0, 0, 255), true);
        model.train(Color::new(255, 0, 0), false);

        let hue_bins: Vec<_> = model.stats(HsvChannel::Hue).map(|(bin, _)| bin).collect();
        assert_eq!(hue_bins, vec![0, 8]);
    }

    #[test]
    fn train_pair_reports_placeholders() {
        let mut model = RuleBasedPreferenceModel::default();
        let outcome =
            PreferenceModel::train_pair(&mut model, Color::WHITE, Color::BLACK).unwrap();
        assert_eq!(outcome, TrainingOutcome::PLACEHOLDER);
        assert_eq!(model.stat(HsvChannel::Value, 3).unwrap().preferred_count, 1);
        assert_eq!(model.stat(HsvChannel::Value, 0).unwrap().preferred_count, 0);
    }

    #[test]
    fn reset_session_keeps_learned_bins() {
        let mut model = RuleBasedPreferenceModel::default();
        model.train(Color::new(255, 0, 0), true);
        PreferenceModel::reset_session(&mut model);

        assert_eq!(model.examples_seen(), 0);
        assert!(model.stat(HsvChannel::Hue, 0).is_some());
    }
}
