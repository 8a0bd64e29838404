//! Feed-forward binary classifier with dropout and backpropagation.

use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GradientConfig;
use crate::neural::dense::{Activation, DenseLayer};
use crate::neural::loss::{binary_accuracy, binary_cross_entropy};
use crate::neural::optimizer::AdamOptimizer;

/// Number of input features (normalized R, G, B).
pub const INPUT_SIZE: usize = 3;

/// Loss and accuracy measured on one training batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchMetrics {
    /// Cross-entropy plus the L2 penalty
    pub loss: f32,
    pub accuracy: f32,
}

/// Intermediate values of a training forward pass.
struct ForwardCache {
    /// `activations[0]` is the input, `activations[l + 1]` the output of layer `l`
    activations: Vec<Array2<f32>>,
    pre_activations: Vec<Array2<f32>>,
    dropout_masks: Vec<Option<Array2<f32>>>,
}

/// Dense network `3 → hidden… → 1` with ReLU hidden layers and a sigmoid output.
///
/// # Architecture
///
/// ```text
/// input(3) → dense(16, relu) → dropout → dense(12, relu) → dropout → dense(8, relu) → dense(1, sigmoid)
/// ```
///
/// Dropout follows every hidden layer except the last and is only active
/// during [`PreferenceNetwork::train_batch`]. The input layer starts from a
/// Glorot-normal kernel, the rest from Glorot-uniform.
#[derive(Clone)]
pub struct PreferenceNetwork {
    layers: Vec<DenseLayer>,
    dropout_rate: f32,
    optimizer: AdamOptimizer,
    rng: StdRng,
}

impl PreferenceNetwork {
    pub fn new(config: &GradientConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);

        let mut layers = Vec::with_capacity(config.hidden_layers.len() + 1);
        let mut inputs = INPUT_SIZE;
        for (index, &units) in config.hidden_layers.iter().enumerate() {
            let layer = if index == 0 {
                DenseLayer::glorot_normal(inputs, units, Activation::Relu, config.l2, &mut rng)
            } else {
                DenseLayer::glorot(inputs, units, Activation::Relu, config.l2, &mut rng)
            };
            layers.push(layer);
            inputs = units;
        }
        layers.push(DenseLayer::glorot(
            inputs,
            1,
            Activation::Sigmoid,
            0.0,
            &mut rng,
        ));

        Self {
            layers,
            dropout_rate: config.dropout_rate,
            optimizer: AdamOptimizer::new(config.learning_rate),
            rng,
        }
    }

    pub fn layers(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Kernel of the input layer, `[3, first_hidden_width]`.
    pub fn first_layer_weights(&self) -> &Array2<f32> {
        &self.layers[0].weights
    }

    pub fn num_parameters(&self) -> usize {
        self.layers.iter().map(DenseLayer::num_parameters).sum()
    }

    /// Optimizer steps taken so far.
    pub fn steps(&self) -> u32 {
        self.optimizer.steps()
    }

    fn has_dropout_after(&self, layer_index: usize) -> bool {
        // The last hidden layer sits at len - 2.
        self.dropout_rate > 0.0 && layer_index + 2 < self.layers.len()
    }

    /// Inference pass, dropout disabled. `inputs` is `[batch, 3]`.
    pub fn predict(&self, inputs: &Array2<f32>) -> Array1<f32> {
        let mut activation = inputs.clone();
        for layer in &self.layers {
            let (_, a) = layer.forward(&activation);
            activation = a;
        }
        activation.column(0).to_owned()
    }

    fn forward_train(&mut self, inputs: &Array2<f32>) -> ForwardCache {
        let keep = 1.0 - self.dropout_rate;
        let mut cache = ForwardCache {
            activations: vec![inputs.clone()],
            pre_activations: Vec::with_capacity(self.layers.len()),
            dropout_masks: Vec::with_capacity(self.layers.len()),
        };

        for index in 0..self.layers.len() {
            let (z, mut a) = self.layers[index].forward(&cache.activations[index]);

            let mask = if self.has_dropout_after(index) {
                let rng = &mut self.rng;
                let mask = Array2::from_shape_fn(a.dim(), |_| {
                    if rng.gen::<f32>() < keep {
                        1.0 / keep
                    } else {
                        0.0
                    }
                });
                a = a * &mask;
                Some(mask)
            } else {
                None
            };

            cache.pre_activations.push(z);
            cache.dropout_masks.push(mask);
            cache.activations.push(a);
        }

        cache
    }

    /// One optimizer step on a mini-batch.
    ///
    /// # Arguments
    ///
    /// * `inputs` - Batch laid out `[batch, 3]`
    /// * `targets` - Labels, each 0.0 or 1.0
    ///
    /// # Returns
    ///
    /// Loss and accuracy of the batch as seen by the forward pass (dropout active)
    pub fn train_batch(&mut self, inputs: &Array2<f32>, targets: &Array1<f32>) -> BatchMetrics {
        assert_eq!(inputs.nrows(), targets.len(), "batch size mismatch");
        let batch = inputs.nrows() as f32;

        let cache = self.forward_train(inputs);
        let output = cache
            .activations
            .last()
            .map(|a| a.column(0).to_owned())
            .unwrap_or_default();

        let penalty: f32 = self.layers.iter().map(DenseLayer::l2_penalty).sum();
        let metrics = BatchMetrics {
            loss: binary_cross_entropy(output.view(), targets.view()) + penalty,
            accuracy: binary_accuracy(output.view(), targets.view()),
        };

        // Sigmoid + cross-entropy: dL/dz = (p - y) / n
        let mut delta: Array2<f32> = (&output - targets)
            .mapv(|v| v / batch)
            .insert_axis(Axis(1));

        let mut gradients = Vec::with_capacity(self.layers.len());
        for index in (0..self.layers.len()).rev() {
            let layer = &self.layers[index];
            let mut grad_weights = cache.activations[index].t().dot(&delta);
            if layer.l2 > 0.0 {
                grad_weights = grad_weights + &layer.weights * (2.0 * layer.l2);
            }
            let grad_bias = delta.sum_axis(Axis(0));

            if index > 0 {
                let mut upstream = delta.dot(&layer.weights.t());
                if let Some(mask) = &cache.dropout_masks[index - 1] {
                    upstream = upstream * mask;
                }
                let previous = &self.layers[index - 1];
                delta = upstream
                    * previous
                        .activation
                        .derivative(&cache.pre_activations[index - 1]);
            }

            gradients.push((index, grad_weights, grad_bias));
        }

        self.optimizer.advance();
        for (index, grad_weights, grad_bias) in gradients {
            let layer = &mut self.layers[index];
            self.optimizer
                .update(&format!("dense_{index}/kernel"), &mut layer.weights, &grad_weights);
            self.optimizer
                .update(&format!("dense_{index}/bias"), &mut layer.bias, &grad_bias);
        }

        metrics
    }
}
