//! Drives a training session with a scripted user who prefers warmer colors.
//!
//! Run with: PREFERENCE_LOG=debug cargo run --example scripted_session [config.toml]

use std::sync::Arc;

use preference_core::{
    init_tracing, Color, ColorPair, DisplaySink, ModelKind, PreferenceConfig, TrainingSession,
};

struct ConsoleSink;

impl DisplaySink for ConsoleSink {
    fn colors_changed(&self, pair: &ColorPair) {
        println!("  showing {} | {}", pair.first(), pair.second());
    }

    fn status(&self, message: &str) {
        println!("  status: {message}");
    }
}

/// Redder minus bluer.
fn warmth(color: Color) -> i32 {
    i32::from(color.r) - i32::from(color.b)
}

fn scripted_pick(pair: ColorPair) -> usize {
    if warmth(pair.first()) >= warmth(pair.second()) {
        0
    } else {
        1
    }
}

fn run(session: &TrainingSession, trials: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("== {} ==", session.current_model_kind());
    for _ in 0..trials {
        let pick = scripted_pick(session.current_pair());
        session.record_preference(pick)?;
    }

    let mut prediction = session.start_inference()?;
    let mut correct = 0;
    for _ in 0..10 {
        let actual = scripted_pick(prediction.pair);
        let was_correct = prediction.predicted_preferred() == actual;
        if was_correct {
            correct += 1;
        }
        println!(
            "  predicted {:.1}% / {:.1}%, user picks {actual}",
            prediction.prob0 * 100.0,
            prediction.prob1 * 100.0
        );
        prediction = session.submit_feedback(was_correct, Some(actual))?;
    }
    println!("  {correct}/10 predictions matched");

    let insights = session.insights();
    println!("  insights: {}", serde_json::to_string_pretty(&insights)?);
    session.back_to_training();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => PreferenceConfig::load_from_file(path)?,
        None => PreferenceConfig::default(),
    };

    let session = TrainingSession::new(config, Arc::new(ConsoleSink));
    run(&session, 15)?;

    session.switch_model(ModelKind::RuleBased);
    run(&session, 15)?;

    Ok(())
}
