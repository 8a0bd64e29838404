//! Training session - orchestration of models, metrics and phases
//!
//! A [`TrainingSession`] owns both preference models, the color sampler and
//! every per-session metric. It exposes the operations a UI drives:
//! - record which of the two shown colors the user preferred
//! - unlock and run predictions once enough examples were recorded
//! - take feedback on predictions and retrain on corrections
//! - switch the active model
//!
//! Operations take `&self`. State sits behind a mutex and a busy flag keeps
//! at most one training call in flight; a second call made while one is
//! running (from another thread, or from a [`DisplaySink`] callback) is
//! dropped and reported as [`RecordOutcome::Ignored`].

pub mod history;
pub mod insights;

pub use history::{linear_slope, BoundedHistory, TrainingHistoryEntry, WeightHistoryEntry};
pub use insights::SessionInsights;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::color::{ColorPair, ColorSampler};
use crate::config::{PreferenceConfig, SessionConfig};
use crate::error::{PreferenceError, PreferenceResult};
use crate::logging::{append_training_entry, TrainingLogEntry};
use crate::model::{
    GradientPreferenceModel, MetricSource, ModelKind, PreferenceModel, RuleBasedPreferenceModel,
};

/// Receiver of render updates. Both calls are fire-and-forget.
pub trait DisplaySink: Send + Sync {
    /// A new pair of colors should be shown.
    fn colors_changed(&self, pair: &ColorPair);

    /// A human-readable status line.
    fn status(&self, message: &str);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DisplaySink for NullSink {
    fn colors_changed(&self, _pair: &ColorPair) {}

    fn status(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Training,
    Inference,
}

/// Aggregate metrics after a recorded trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub training_count: usize,
    pub loss: f32,
    pub accuracy: f32,
    /// Whether the count has reached the inference threshold
    pub inference_unlocked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecordOutcome {
    Recorded(TrainingSummary),
    /// Another training call was in flight; nothing changed
    Ignored,
}

impl RecordOutcome {
    pub fn summary(&self) -> Option<&TrainingSummary> {
        match self {
            RecordOutcome::Recorded(summary) => Some(summary),
            RecordOutcome::Ignored => None,
        }
    }
}

/// Preference probabilities for a freshly sampled pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub pair: ColorPair,
    pub prob0: f32,
    pub prob1: f32,
}

impl Prediction {
    /// Index of the color the model expects the user to pick (ties go right).
    pub fn predicted_preferred(&self) -> usize {
        if self.prob0 > self.prob1 {
            0
        } else {
            1
        }
    }
}

/// Whether `training_count` examples are enough to unlock inference.
pub fn inference_unlocked(training_count: usize, min_examples: usize) -> bool {
    training_count >= min_examples * 2
}

/// Holds the busy flag for the duration of one training call.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(flag))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

struct SessionState {
    sampler: ColorSampler,
    gradient: GradientPreferenceModel,
    rule: RuleBasedPreferenceModel,
    active: ModelKind,
    phase: Phase,
    current_pair: ColorPair,
    training_count: usize,
    current_loss: f32,
    current_accuracy: f32,
    history: BoundedHistory<TrainingHistoryEntry>,
    weight_history: BoundedHistory<WeightHistoryEntry>,
    previous_weights: Option<Vec<f32>>,
    last_prediction: Option<Prediction>,
}

impl SessionState {
    fn active_model(&mut self) -> &mut dyn PreferenceModel {
        match self.active {
            ModelKind::Gradient => &mut self.gradient,
            ModelKind::RuleBased => &mut self.rule,
        }
    }

    fn active_model_ref(&self) -> &dyn PreferenceModel {
        match self.active {
            ModelKind::Gradient => &self.gradient,
            ModelKind::RuleBased => &self.rule,
        }
    }

    fn clear_metrics(&mut self) {
        self.training_count = 0;
        self.current_loss = 0.0;
        self.current_accuracy = 0.0;
        self.history.clear();
        self.weight_history.clear();
        self.previous_weights = None;
        self.last_prediction = None;
    }
}

/// What a completed trial hands back to the caller outside the lock.
struct TrialReport {
    summary: TrainingSummary,
    next_pair: ColorPair,
    journal: TrainingLogEntry,
    unlocked_now: bool,
}

/// Interactive preference-training session.
pub struct TrainingSession {
    config: SessionConfig,
    state: Mutex<SessionState>,
    busy: AtomicBool,
    sink: Arc<dyn DisplaySink>,
}

impl TrainingSession {
    pub fn new(config: PreferenceConfig, sink: Arc<dyn DisplaySink>) -> Self {
        let mut sampler = ColorSampler::new(config.sampler);
        let current_pair = sampler.sample();

        let state = SessionState {
            sampler,
            gradient: GradientPreferenceModel::new(config.gradient),
            rule: RuleBasedPreferenceModel::new(config.rule),
            active: config.session.initial_model,
            phase: Phase::Training,
            current_pair,
            training_count: 0,
            current_loss: 0.0,
            current_accuracy: 0.0,
            history: BoundedHistory::new(config.session.history_capacity),
            weight_history: BoundedHistory::new(config.session.weight_history_capacity),
            previous_weights: None,
            last_prediction: None,
        };

        tracing::info!(model = %state.active, "training session created");

        Self {
            config: config.session,
            state: Mutex::new(state),
            busy: AtomicBool::new(false),
            sink,
        }
    }

    /// Session with default configuration and no display.
    pub fn headless() -> Self {
        Self::new(PreferenceConfig::default(), Arc::new(NullSink))
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Draw a new pair, make it current and render it.
    pub fn sample_color_pair(&self) -> ColorPair {
        let pair = {
            let mut state = self.state();
            let pair = state.sampler.sample();
            state.current_pair = pair;
            pair
        };
        self.sink.colors_changed(&pair);
        pair
    }

    pub fn current_pair(&self) -> ColorPair {
        self.state().current_pair
    }

    pub fn current_model_kind(&self) -> ModelKind {
        self.state().active
    }

    pub fn phase(&self) -> Phase {
        self.state().phase
    }

    pub fn training_count(&self) -> usize {
        self.state().training_count
    }

    /// Loss and accuracy of the most recent trial.
    pub fn current_metrics(&self) -> (f32, f32) {
        let state = self.state();
        (state.current_loss, state.current_accuracy)
    }

    /// True while a training call is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn can_start_inference(&self) -> bool {
        inference_unlocked(self.training_count(), self.config.min_examples)
    }

    pub fn history(&self) -> Vec<TrainingHistoryEntry> {
        self.state().history.to_vec()
    }

    pub fn weight_history(&self) -> Vec<WeightHistoryEntry> {
        self.state().weight_history.to_vec()
    }

    /// First-layer weights of the active model; empty for the rule-based model.
    pub fn weights_snapshot(&self) -> Vec<f32> {
        self.state()
            .active_model_ref()
            .weights_snapshot()
            .unwrap_or_default()
    }

    pub fn last_prediction(&self) -> Option<Prediction> {
        self.state().last_prediction
    }

    /// Train the active model on the current pair, `picked_index` being the
    /// color the user preferred.
    ///
    /// # Errors
    ///
    /// - [`PreferenceError::InvalidInput`] when `picked_index` is not 0 or 1
    /// - any error raised by the active model
    ///
    /// Nothing is counted when an error is returned.
    pub fn record_preference(&self, picked_index: usize) -> PreferenceResult<RecordOutcome> {
        let Some(_guard) = BusyGuard::acquire(&self.busy) else {
            tracing::debug!(picked_index, "training in flight, preference ignored");
            return Ok(RecordOutcome::Ignored);
        };

        let report = {
            let mut state = self.state();
            let pair = state.current_pair;
            self.train_on(&mut state, pair, picked_index)
        };

        let report = match report {
            Ok(report) => report,
            Err(err) => {
                tracing::error!(error = %err, picked_index, "training failed");
                self.sink.status("Training error");
                return Err(err);
            }
        };

        if let Some(path) = &self.config.journal_path {
            if let Err(err) = append_training_entry(path, &report.journal) {
                tracing::warn!(error = %err, path = %path.display(), "journal write failed");
            }
        }

        self.sink.status(&insights::recommendation_status(
            report.summary.training_count,
            report.summary.accuracy,
        ));
        if report.unlocked_now {
            tracing::info!(
                training_count = report.summary.training_count,
                "inference unlocked"
            );
            self.sink.status("Inference unlocked! Start predictions when ready.");
        }
        self.sink.colors_changed(&report.next_pair);

        Ok(RecordOutcome::Recorded(report.summary))
    }

    fn train_on(
        &self,
        state: &mut SessionState,
        pair: ColorPair,
        picked_index: usize,
    ) -> PreferenceResult<TrialReport> {
        let (preferred, rejected) = pair.split_by_pick(picked_index)?;

        let before = state.active_model_ref().weights_snapshot();
        let outcome = state.active_model().train_pair(preferred, rejected)?;

        let required = self.config.required_examples();
        let was_unlocked = state.training_count >= required;
        state.training_count += 2;
        state.current_loss = outcome.loss;
        state.current_accuracy = outcome.accuracy;
        let step = state.training_count;

        if outcome.source == MetricSource::Measured {
            state.history.push(TrainingHistoryEntry {
                loss: outcome.loss,
                accuracy: outcome.accuracy,
                step,
            });
        }
        if let Some(weights) = state.active_model_ref().weights_snapshot() {
            state.weight_history.push(WeightHistoryEntry { weights, step });
        }
        state.previous_weights = before;

        let model = state.active_model_ref();
        let (kind, examples_seen) = (model.kind(), model.examples_seen());
        tracing::debug!(
            model = %kind,
            training_count = step,
            examples_seen,
            loss = outcome.loss,
            accuracy = outcome.accuracy,
            "preference recorded"
        );

        let next_pair = state.sampler.sample();
        state.current_pair = next_pair;

        let unlocked = step >= required;
        Ok(TrialReport {
            summary: TrainingSummary {
                training_count: step,
                loss: outcome.loss,
                accuracy: outcome.accuracy,
                inference_unlocked: unlocked,
            },
            next_pair,
            journal: TrainingLogEntry {
                model: kind,
                training_count: step,
                examples_seen,
                loss: outcome.loss,
                accuracy: outcome.accuracy,
                preferred: preferred.channels(),
                rejected: rejected.channels(),
                timestamp_ms: TrainingLogEntry::timestamp_now(),
            },
            unlocked_now: unlocked && !was_unlocked,
        })
    }

    /// Sample a fresh pair and score both colors with the active model.
    ///
    /// # Errors
    ///
    /// [`PreferenceError::InferenceLocked`] below the example threshold
    pub fn predict(&self) -> PreferenceResult<Prediction> {
        let result = {
            let mut state = self.state();
            Self::predict_locked(&mut state, &self.config)
        };

        match result {
            Ok(prediction) => {
                self.sink.colors_changed(&prediction.pair);
                self.sink.status("Prediction complete!");
                Ok(prediction)
            }
            Err(err) => {
                tracing::error!(error = %err, "prediction failed");
                self.sink.status("Prediction error");
                Err(err)
            }
        }
    }

    fn predict_locked(
        state: &mut SessionState,
        config: &SessionConfig,
    ) -> PreferenceResult<Prediction> {
        if !inference_unlocked(state.training_count, config.min_examples) {
            return Err(PreferenceError::inference_locked(
                state.training_count,
                config.required_examples(),
            ));
        }

        let pair = state.sampler.sample();
        state.current_pair = pair;

        let model = state.active_model_ref();
        let prediction = Prediction {
            pair,
            prob0: model.predict(pair.first())?,
            prob1: model.predict(pair.second())?,
        };
        tracing::debug!(
            model = %model.kind(),
            prob0 = prediction.prob0,
            prob1 = prediction.prob1,
            "prediction made"
        );

        state.last_prediction = Some(prediction);
        Ok(prediction)
    }

    /// React to the user's verdict on the last prediction.
    ///
    /// When the prediction was wrong, `corrected_index` names the color the
    /// user actually preferred and the model is trained on the predicted
    /// pair. Either way a new prediction follows.
    ///
    /// # Errors
    ///
    /// - [`PreferenceError::ContractViolation`] when no prediction exists, or
    ///   `was_correct` is false without a `corrected_index`; nothing changes
    /// - [`PreferenceError::InvalidInput`] for a corrected index other than 0 or 1
    pub fn submit_feedback(
        &self,
        was_correct: bool,
        corrected_index: Option<usize>,
    ) -> PreferenceResult<Prediction> {
        let predicted_pair = match self.last_prediction() {
            Some(prediction) => prediction.pair,
            None => {
                return Err(PreferenceError::contract_violation(
                    "submit_feedback",
                    "no prediction has been made",
                ))
            }
        };

        if !was_correct {
            let Some(index) = corrected_index else {
                return Err(PreferenceError::contract_violation(
                    "submit_feedback",
                    "an incorrect prediction needs the index the user preferred",
                ));
            };
            predicted_pair.split_by_pick(index)?;

            // Train on the pair the prediction was made for.
            self.state().current_pair = predicted_pair;
            if let RecordOutcome::Ignored = self.record_preference(index)? {
                tracing::debug!("correction dropped, training in flight");
            }
        }

        self.predict()
    }

    /// Make `kind` the active model and start a fresh session for it.
    ///
    /// Buffered examples, counters, history, weight history and the previous
    /// snapshot are cleared and the phase returns to training. Learned
    /// parameters of both models are kept.
    pub fn switch_model(&self, kind: ModelKind) {
        {
            let mut state = self.state();
            state.gradient.reset_session();
            PreferenceModel::reset_session(&mut state.rule);
            state.clear_metrics();
            state.active = kind;
            state.phase = Phase::Training;
        }

        tracing::info!(model = %kind, "model switched");
        self.sink.status(&format!("Switched to {kind} model"));
    }

    /// Enter the inference phase and issue the first prediction.
    ///
    /// # Errors
    ///
    /// [`PreferenceError::InferenceLocked`] below the example threshold
    pub fn start_inference(&self) -> PreferenceResult<Prediction> {
        {
            let mut state = self.state();
            if !inference_unlocked(state.training_count, self.config.min_examples) {
                return Err(PreferenceError::inference_locked(
                    state.training_count,
                    self.config.required_examples(),
                ));
            }
            state.phase = Phase::Inference;
        }

        tracing::info!("inference phase started");
        self.sink.status("Making predictions...");
        self.predict()
    }

    pub fn back_to_training(&self) {
        self.state().phase = Phase::Training;
        tracing::info!("training phase resumed");
        self.sink.status("Ready to train!");
    }

    /// Diagnostics over the current weights and history.
    pub fn insights(&self) -> SessionInsights {
        let state = self.state();
        let current = state.active_model_ref().weights_snapshot();
        let history: Vec<TrainingHistoryEntry> = state.history.to_vec();

        let weight_change = match (&state.previous_weights, &current) {
            (Some(previous), Some(current)) if state.weight_history.len() >= 2 => {
                insights::weight_change(previous, current)
            }
            _ => None,
        };

        SessionInsights {
            sensitivity: current.as_deref().and_then(insights::color_sensitivity),
            weight_change,
            learning_pattern: insights::learning_pattern(&history),
            confidence: insights::prediction_confidence(
                state.training_count,
                self.config.required_examples(),
                state.history.latest().map(|entry| entry.accuracy),
            ),
            status: insights::recommendation_status(state.training_count, state.current_accuracy),
        }
    }
}
