//! Fully connected layer with a pointwise activation.

use ndarray::{Array1, Array2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Pointwise activation applied after the affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    Relu,
    Sigmoid,
}

impl Activation {
    pub fn apply(&self, z: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => z.mapv(|v| v.max(0.0)),
            Activation::Sigmoid => z.mapv(sigmoid),
        }
    }

    /// Derivative with respect to the pre-activation `z`.
    pub fn derivative(&self, z: &Array2<f32>) -> Array2<f32> {
        match self {
            Activation::Relu => z.mapv(|v| if v > 0.0 { 1.0 } else { 0.0 }),
            Activation::Sigmoid => z.mapv(|v| {
                let s = sigmoid(v);
                s * (1.0 - s)
            }),
        }
    }
}

fn sigmoid(x: f32) -> f32 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Box-Muller transform over two uniform draws.
fn standard_normal<R: Rng>(rng: &mut R) -> f32 {
    // gen() is in [0, 1); flip it so ln never sees zero
    let u1 = 1.0 - rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

/// Dense layer computing `activation(x · W + b)`.
///
/// The kernel is stored `[inputs, units]`, so row `i` holds every unit's
/// weight for input feature `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DenseLayer {
    pub(crate) weights: Array2<f32>,
    pub(crate) bias: Array1<f32>,
    pub activation: Activation,
    /// L2 penalty coefficient on the kernel (0 disables it)
    pub l2: f32,
}

impl DenseLayer {
    /// Glorot-uniform kernel, zero bias.
    pub fn glorot<R: Rng>(
        inputs: usize,
        units: usize,
        activation: Activation,
        l2: f32,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (inputs + units) as f32).sqrt();
        let weights =
            Array2::from_shape_fn((inputs, units), |_| (rng.gen::<f32>() - 0.5) * 2.0 * limit);

        Self {
            weights,
            bias: Array1::zeros(units),
            activation,
            l2,
        }
    }

    /// Glorot-normal kernel, zero bias.
    ///
    /// Draws from a normal with standard deviation `sqrt(2 / (inputs + units))`,
    /// redrawing anything beyond two standard deviations.
    pub fn glorot_normal<R: Rng>(
        inputs: usize,
        units: usize,
        activation: Activation,
        l2: f32,
        rng: &mut R,
    ) -> Self {
        let std_dev = (2.0 / (inputs + units) as f32).sqrt();
        let weights = Array2::from_shape_fn((inputs, units), |_| loop {
            let z = standard_normal(rng);
            if z.abs() <= 2.0 {
                break z * std_dev;
            }
        });

        Self {
            weights,
            bias: Array1::zeros(units),
            activation,
            l2,
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn units(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    /// Returns `(z, activation(z))` for a batch laid out `[batch, inputs]`.
    pub fn forward(&self, input: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
        let z = input.dot(&self.weights) + &self.bias;
        let a = self.activation.apply(&z);
        (z, a)
    }

    /// `l2 * Σ w²`, the amount this layer adds to the training loss.
    pub fn l2_penalty(&self) -> f32 {
        if self.l2 == 0.0 {
            return 0.0;
        }
        self.l2 * self.weights.iter().map(|w| w * w).sum::<f32>()
    }
}
