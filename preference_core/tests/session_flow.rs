use std::sync::{Arc, Mutex, OnceLock, Weak};

use preference_core::{
    ColorPair, DisplaySink, ModelKind, NullSink, Phase, PreferenceConfig, PreferenceError,
    RecordOutcome, TrainingSession,
};

fn session_with(kind: ModelKind) -> TrainingSession {
    let mut config = PreferenceConfig::default();
    config.session.initial_model = kind;
    TrainingSession::new(config, Arc::new(NullSink))
}

#[test]
fn rule_based_scenario_reaches_prediction() {
    let session = session_with(ModelKind::RuleBased);
    for _ in 0..10 {
        session.record_preference(0).unwrap();
    }

    assert_eq!(session.training_count(), 20);
    let prediction = session.predict().unwrap();
    assert!((0.0..=1.0).contains(&prediction.prob0));
    assert!((0.0..=1.0).contains(&prediction.prob1));
    assert_eq!(session.current_pair(), prediction.pair);
    assert_eq!(session.last_prediction(), Some(prediction));
}

#[test]
fn each_record_adds_two() {
    let session = session_with(ModelKind::Gradient);
    for trial in 1..=4 {
        let outcome = session.record_preference(trial % 2).unwrap();
        let summary = outcome.summary().copied().unwrap();
        assert_eq!(summary.training_count, trial * 2);
        assert_eq!(session.training_count(), trial * 2);
    }
}

#[test]
fn inference_unlocks_on_tenth_trial() {
    let session = session_with(ModelKind::RuleBased);
    for _ in 0..9 {
        session.record_preference(1).unwrap();
    }

    assert_eq!(session.training_count(), 18);
    assert!(!session.can_start_inference());
    assert_eq!(
        session.predict(),
        Err(PreferenceError::InferenceLocked {
            training_count: 18,
            required: 20
        })
    );
    assert!(matches!(
        session.start_inference(),
        Err(PreferenceError::InferenceLocked { .. })
    ));
    assert_eq!(session.phase(), Phase::Training);

    let outcome = session.record_preference(1).unwrap();
    assert!(outcome.summary().unwrap().inference_unlocked);
    assert!(session.can_start_inference());

    session.start_inference().unwrap();
    assert_eq!(session.phase(), Phase::Inference);
    session.back_to_training();
    assert_eq!(session.phase(), Phase::Training);
}

#[test]
fn rule_based_trials_report_placeholders_without_history() {
    let session = session_with(ModelKind::RuleBased);
    let summary = session.record_preference(0).unwrap().summary().copied().unwrap();

    assert_eq!(summary.loss, 0.0);
    assert_eq!(summary.accuracy, 0.5);
    assert_eq!(session.current_metrics(), (0.0, 0.5));
    assert!(session.history().is_empty());
    assert!(session.weights_snapshot().is_empty());
}

#[test]
fn gradient_trials_append_history() {
    let session = session_with(ModelKind::Gradient);
    for _ in 0..3 {
        session.record_preference(0).unwrap();
    }

    let history = session.history();
    assert_eq!(history.len(), 3);
    assert_eq!(
        history.iter().map(|entry| entry.step).collect::<Vec<_>>(),
        vec![2, 4, 6]
    );
    assert!(history.iter().all(|entry| entry.loss.is_finite()
        && entry.loss >= 0.0
        && (0.0..=1.0).contains(&entry.accuracy)));
    assert_eq!(session.weights_snapshot().len(), 48);
    assert!(session.insights().learning_pattern.is_some());
}

#[test]
fn switch_model_starts_fresh_session() {
    let session = session_with(ModelKind::Gradient);
    for _ in 0..3 {
        session.record_preference(0).unwrap();
    }
    let weights = session.weights_snapshot();

    session.switch_model(ModelKind::RuleBased);
    assert_eq!(session.current_model_kind(), ModelKind::RuleBased);
    assert_eq!(session.training_count(), 0);
    assert!(session.history().is_empty());
    assert!(session.weight_history().is_empty());
    assert_eq!(session.phase(), Phase::Training);

    session.switch_model(ModelKind::Gradient);
    assert_eq!(session.weights_snapshot(), weights);
}

#[test]
fn feedback_contract_violations_change_nothing() {
    let session = session_with(ModelKind::RuleBased);
    assert!(matches!(
        session.submit_feedback(true, None),
        Err(PreferenceError::ContractViolation { .. })
    ));

    for _ in 0..10 {
        session.record_preference(0).unwrap();
    }
    let prediction = session.predict().unwrap();

    assert!(matches!(
        session.submit_feedback(false, None),
        Err(PreferenceError::ContractViolation { .. })
    ));
    assert_eq!(session.training_count(), 20);
    assert_eq!(session.current_pair(), prediction.pair);
    assert_eq!(session.last_prediction(), Some(prediction));
}

#[test]
fn incorrect_feedback_trains_then_predicts() {
    let session = session_with(ModelKind::RuleBased);
    for _ in 0..10 {
        session.record_preference(0).unwrap();
    }
    let first = session.predict().unwrap();

    let second = session.submit_feedback(false, Some(1)).unwrap();
    assert_eq!(session.training_count(), 22);
    assert_ne!(second.pair, first.pair);

    let third = session.submit_feedback(true, None).unwrap();
    assert_eq!(session.training_count(), 22);
    assert_eq!(session.last_prediction(), Some(third));
}

#[derive(Default)]
struct RecordingSink {
    statuses: Mutex<Vec<String>>,
}

impl DisplaySink for RecordingSink {
    fn colors_changed(&self, _pair: &ColorPair) {}

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}

#[test]
fn training_error_status_hides_error_detail() {
    let sink = Arc::new(RecordingSink::default());
    let session = TrainingSession::new(PreferenceConfig::default(), sink.clone());

    let err = session.record_preference(7).unwrap_err();
    assert!(matches!(err, PreferenceError::InvalidInput { .. }));

    let statuses = sink.statuses.lock().unwrap();
    assert_eq!(*statuses, vec!["Training error".to_string()]);
    assert!(statuses.iter().all(|s| !s.contains(&err.to_string())));
    assert_eq!(session.training_count(), 0);
}

#[test]
fn prediction_error_status_hides_error_detail() {
    let sink = Arc::new(RecordingSink::default());
    let session = TrainingSession::new(PreferenceConfig::default(), sink.clone());

    let err = session.predict().unwrap_err();
    assert!(matches!(err, PreferenceError::InferenceLocked { .. }));
    assert_eq!(*sink.statuses.lock().unwrap(), vec!["Prediction error".to_string()]);
}

/// Sink that tries to record again from inside the render callback.
struct ReentrantSink {
    session: OnceLock<Weak<TrainingSession>>,
    nested: Mutex<Vec<RecordOutcome>>,
    statuses: Mutex<Vec<String>>,
}

impl DisplaySink for ReentrantSink {
    fn colors_changed(&self, _pair: &ColorPair) {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            let outcome = session.record_preference(0).unwrap();
            self.nested.lock().unwrap().push(outcome);
        }
    }

    fn status(&self, message: &str) {
        self.statuses.lock().unwrap().push(message.to_string());
    }
}

#[test]
fn reentrant_record_is_ignored() {
    let sink = Arc::new(ReentrantSink {
        session: OnceLock::new(),
        nested: Mutex::new(Vec::new()),
        statuses: Mutex::new(Vec::new()),
    });
    let mut config = PreferenceConfig::default();
    config.session.initial_model = ModelKind::RuleBased;
    let session = Arc::new(TrainingSession::new(config, sink.clone()));
    sink.session.set(Arc::downgrade(&session)).unwrap();

    let outcome = session.record_preference(1).unwrap();

    assert!(matches!(outcome, RecordOutcome::Recorded(_)));
    assert_eq!(*sink.nested.lock().unwrap(), vec![RecordOutcome::Ignored]);
    assert_eq!(session.training_count(), 2);
    assert!(!session.is_busy());
    assert_eq!(
        sink.statuses.lock().unwrap().first().map(String::as_str),
        Some("Training... (2/20 recommended examples)")
    );
}

#[test]
fn sessions_are_shareable_across_threads() {
    let session = Arc::new(session_with(ModelKind::RuleBased));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let session = Arc::clone(&session);
            std::thread::spawn(move || session.record_preference(i % 2).unwrap())
        })
        .collect();

    let recorded = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|outcome| matches!(outcome, RecordOutcome::Recorded(_)))
        .count();

    assert!(recorded >= 1);
    assert_eq!(session.training_count(), recorded * 2);
}
