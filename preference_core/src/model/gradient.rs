//! Neural preference model trained over a sliding window of examples.
//!
//! Every labeled color goes into a bounded FIFO buffer. A training step
//! refits the network on the whole buffer for a few shuffled epochs of
//! mini-batches, so recent trials dominate what the model knows.

use std::collections::VecDeque;

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::GradientConfig;
use crate::error::{PreferenceError, PreferenceResult};
use crate::model::{ModelKind, PreferenceModel, TrainingOutcome};
use crate::neural::{PreferenceNetwork, INPUT_SIZE};

/// One labeled, normalized color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingExample {
    input: [f32; INPUT_SIZE],
    label: u8,
}

impl TrainingExample {
    /// Components must be finite and within [0, 1]; label must be 0 or 1.
    pub fn new(input: [f32; INPUT_SIZE], label: u8) -> PreferenceResult<Self> {
        if let Some(bad) = input
            .iter()
            .find(|v| !v.is_finite() || !(0.0..=1.0).contains(*v))
        {
            return Err(PreferenceError::invalid_input(
                "input",
                bad,
                "components must be finite and within [0, 1]",
            ));
        }
        if label > 1 {
            return Err(PreferenceError::invalid_input(
                "label",
                label,
                "must be 0 or 1",
            ));
        }
        Ok(Self { input, label })
    }

    pub fn from_color(color: Color, label: u8) -> PreferenceResult<Self> {
        Self::new(color.normalized(), label)
    }

    pub fn input(&self) -> [f32; INPUT_SIZE] {
        self.input
    }

    pub fn label(&self) -> u8 {
        self.label
    }
}

/// Metrics of one epoch of a training step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    /// Sample-weighted mean batch loss, L2 penalty included
    pub loss: f32,
    pub accuracy: f32,
}

/// Result of [`GradientPreferenceModel::train_step`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitReport {
    /// Loss of the first epoch
    pub loss: f32,
    /// Accuracy of the first epoch
    pub accuracy: f32,
    pub epochs: Vec<EpochMetrics>,
    /// Buffer length at the time of the fit
    pub examples: usize,
}

impl FitReport {
    /// Metrics of the last epoch, for callers that want the converged figure.
    pub fn final_epoch(&self) -> Option<&EpochMetrics> {
        self.epochs.last()
    }
}

/// Dense-network preference model with a bounded example buffer.
pub struct GradientPreferenceModel {
    config: GradientConfig,
    network: PreferenceNetwork,
    buffer: VecDeque<TrainingExample>,
    /// Examples pushed since the last session reset, evicted ones included
    examples_seen: usize,
    rng: StdRng,
}

impl GradientPreferenceModel {
    pub fn new(config: GradientConfig) -> Self {
        let network = PreferenceNetwork::new(&config);
        // Shuffling draws from its own stream so dropout masks stay reproducible.
        let rng = StdRng::seed_from_u64(config.seed.wrapping_add(1000));
        Self {
            buffer: VecDeque::with_capacity(config.buffer_capacity),
            examples_seen: 0,
            config,
            network,
            rng,
        }
    }

    pub fn config(&self) -> &GradientConfig {
        &self.config
    }

    pub fn network(&self) -> &PreferenceNetwork {
        &self.network
    }

    pub fn capacity(&self) -> usize {
        self.config.buffer_capacity
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    /// Buffered examples, oldest first.
    pub fn examples(&self) -> impl Iterator<Item = &TrainingExample> {
        self.buffer.iter()
    }

    /// Append a validated example, evicting the oldest at capacity.
    pub fn push_example(&mut self, example: TrainingExample) {
        while self.buffer.len() >= self.config.buffer_capacity.max(1) {
            self.buffer.pop_front();
        }
        self.buffer.push_back(example);
        self.examples_seen += 1;
    }

    pub fn add_example(&mut self, color: Color, label: u8) -> PreferenceResult<()> {
        self.push_example(TrainingExample::from_color(color, label)?);
        Ok(())
    }

    pub fn add_normalized(&mut self, input: [f32; INPUT_SIZE], label: u8) -> PreferenceResult<()> {
        self.push_example(TrainingExample::new(input, label)?);
        Ok(())
    }

    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Refit on the buffer: `epochs` shuffled passes of mini-batches.
    ///
    /// # Errors
    ///
    /// [`PreferenceError::EmptyBuffer`] when nothing has been buffered yet
    pub fn train_step(&mut self) -> PreferenceResult<FitReport> {
        if self.buffer.is_empty() {
            return Err(PreferenceError::empty_buffer("train_step"));
        }

        let examples: Vec<TrainingExample> = self.buffer.iter().copied().collect();
        let batch_size = self.config.batch_size.clamp(1, examples.len());
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut epochs = Vec::with_capacity(self.config.epochs);

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut self.rng);

            let mut loss_sum = 0.0;
            let mut accuracy_sum = 0.0;
            for batch in order.chunks(batch_size) {
                let (inputs, targets) = stack_batch(&examples, batch);
                let metrics = self.network.train_batch(&inputs, &targets);
                loss_sum += metrics.loss * batch.len() as f32;
                accuracy_sum += metrics.accuracy * batch.len() as f32;
            }

            let n = examples.len() as f32;
            epochs.push(EpochMetrics {
                epoch,
                loss: loss_sum / n,
                accuracy: accuracy_sum / n,
            });
        }

        let Some(first) = epochs.first().copied() else {
            return Err(PreferenceError::contract_violation(
                "train_step",
                "gradient model configured with zero epochs",
            ));
        };
        tracing::debug!(
            examples = examples.len(),
            loss = first.loss,
            accuracy = first.accuracy,
            steps = self.network.steps(),
            "gradient model fit"
        );

        Ok(FitReport {
            loss: first.loss,
            accuracy: first.accuracy,
            epochs,
            examples: examples.len(),
        })
    }

    /// Preference probability of a color. Dropout is off and nothing mutates.
    pub fn predict(&self, color: Color) -> f32 {
        self.predict_normalized(color.normalized())
    }

    pub fn predict_normalized(&self, input: [f32; INPUT_SIZE]) -> f32 {
        let batch = Array2::from_shape_fn((1, INPUT_SIZE), |(_, j)| input[j]);
        self.network.predict(&batch)[0]
    }

    /// First-layer kernel flattened row-major: input channel `i` covers
    /// indices `i * width .. (i + 1) * width`.
    pub fn weights_snapshot(&self) -> Vec<f32> {
        self.network.first_layer_weights().iter().copied().collect()
    }
}

fn stack_batch(examples: &[TrainingExample], indices: &[usize]) -> (Array2<f32>, Array1<f32>) {
    let inputs = Array2::from_shape_fn((indices.len(), INPUT_SIZE), |(row, col)| {
        examples[indices[row]].input[col]
    });
    let targets = indices
        .iter()
        .map(|&i| f32::from(examples[i].label))
        .collect::<Array1<f32>>();
    (inputs, targets)
}

impl Default for GradientPreferenceModel {
    fn default() -> Self {
        Self::new(GradientConfig::default())
    }
}

impl PreferenceModel for GradientPreferenceModel {
    fn kind(&self) -> ModelKind {
        ModelKind::Gradient
    }

    fn train_pair(
        &mut self,
        preferred: Color,
        rejected: Color,
    ) -> PreferenceResult<TrainingOutcome> {
        self.add_example(preferred, 1)?;
        self.add_example(rejected, 0)?;
        let report = self.train_step()?;
        Ok(TrainingOutcome::measured(report.loss, report.accuracy))
    }

    fn predict(&self, color: Color) -> PreferenceResult<f32> {
        Ok(GradientPreferenceModel::predict(self, color))
    }

    fn weights_snapshot(&self) -> Option<Vec<f32>> {
        Some(GradientPreferenceModel::weights_snapshot(self))
    }

    fn examples_seen(&self) -> usize {
        self.examples_seen
    }

    fn reset_session(&mut self) {
        self.clear_buffer();
        self.examples_seen = 0;
    }
}
