//! Adam optimizer (Adaptive Moment Estimation).

use std::collections::HashMap;

use ndarray::{Array, Dimension};

#[derive(Debug, Clone)]
struct Moments {
    first: Vec<f32>,
    second: Vec<f32>,
}

/// Adam with per-parameter moment estimates keyed by parameter name.
///
/// Call [`AdamOptimizer::advance`] once per batch, then
/// [`AdamOptimizer::update`] for every parameter of the model.
#[derive(Debug, Clone)]
pub struct AdamOptimizer {
    /// Learning rate
    pub learning_rate: f32,
    /// Exponential decay rate for first moment (typically 0.9)
    pub beta1: f32,
    /// Exponential decay rate for second moment (typically 0.999)
    pub beta2: f32,
    /// Small constant for numerical stability
    pub epsilon: f32,
    moments: HashMap<String, Moments>,
    /// Time step counter
    t: u32,
}

impl AdamOptimizer {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            moments: HashMap::new(),
            t: 0,
        }
    }

    /// Start a new optimization step.
    pub fn advance(&mut self) {
        self.t += 1;
    }

    pub fn steps(&self) -> u32 {
        self.t
    }

    /// Update `param` in place from `gradient` (same shape).
    pub fn update<D: Dimension>(
        &mut self,
        param_name: &str,
        param: &mut Array<f32, D>,
        gradient: &Array<f32, D>,
    ) {
        assert_eq!(param.shape(), gradient.shape(), "gradient shape mismatch");
        let t = self.t.max(1) as i32;
        let (beta1, beta2) = (self.beta1, self.beta2);
        let (learning_rate, epsilon) = (self.learning_rate, self.epsilon);
        let bias1 = 1.0 - beta1.powi(t);
        let bias2 = 1.0 - beta2.powi(t);

        let len = param.len();
        let moments = self
            .moments
            .entry(param_name.to_string())
            .or_insert_with(|| Moments {
                first: vec![0.0; len],
                second: vec![0.0; len],
            });

        for (((p, &g), m), v) in param
            .iter_mut()
            .zip(gradient.iter())
            .zip(moments.first.iter_mut())
            .zip(moments.second.iter_mut())
        {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            let m_hat = *m / bias1;
            let v_hat = *v / bias2;
            *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
        }
    }

    /// Resets all accumulated moments.
    pub fn reset(&mut self) {
        self.moments.clear();
        self.t = 0;
    }
}
