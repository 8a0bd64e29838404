//! Dense feed-forward network components for the gradient preference model.
//!
//! This module provides the building blocks for a small fully connected
//! binary classifier: dense layers with ReLU/sigmoid activations, dropout,
//! an L2 kernel penalty, binary cross-entropy and the Adam optimizer.

pub mod dense;
pub mod loss;
pub mod network;
pub mod optimizer;

pub use dense::{Activation, DenseLayer};
pub use loss::{binary_accuracy, binary_cross_entropy};
pub use network::{BatchMetrics, PreferenceNetwork, INPUT_SIZE};
pub use optimizer::AdamOptimizer;
