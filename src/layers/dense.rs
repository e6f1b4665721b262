use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::activations::Activation;

/// A fully connected (dense) layer of the Q-network
///
/// The layer caches its last inputs and pre-activations so that
/// [`backward_batch`](DenseLayer::backward_batch) can follow a
/// [`forward_batch`](DenseLayer::forward_batch). The caches are never serialized,
/// which keeps saved weights byte-identical regardless of the last forward pass.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    #[serde(skip)]
    pre_activation_output: Option<Array2<f32>>,
    #[serde(skip)]
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with Xavier-uniform weights and zero biases.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let limit = (6.0 / (input_size + output_size).max(1) as f32).sqrt();
        let weights = Array2::random_using((input_size, output_size), Uniform::new(-limit, limit), rng);
        let biases = Array1::zeros(output_size);
        DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Self {
        assert_eq!(weights.dim(), self.weights.dim());
        self.weights = weights;
        self
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Self {
        assert_eq!(biases.dim(), self.biases.dim());
        self.biases = biases;
        self
    }

    /// Forward pass for a batch of row vectors, caching what backprop needs.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        self.inputs = Some(inputs.to_owned());
        let mut outputs = inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0));
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    /// Backward pass for a batch of output errors.
    ///
    /// Returns `(adjusted_error, weight_gradients, bias_gradients)`, or `None` when no
    /// forward pass has been cached yet.
    pub fn backward_batch(
        &self,
        output_errors: ArrayView2<f32>,
    ) -> Option<(Array2<f32>, Array2<f32>, Array1<f32>)> {
        let pre_activation_output = self.pre_activation_output.as_ref()?;
        let inputs = self.inputs.as_ref()?;

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = output_errors.to_owned() * &activation_deriv;
        let weight_gradients = inputs.t().dot(&adjusted_error);
        let bias_gradients = adjusted_error.sum_axis(Axis(0));

        Some((adjusted_error, weight_gradients, bias_gradients))
    }

    pub fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }

    pub fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    pub fn num_parameters(&self) -> usize {
        self.weights.len() + self.biases.len()
    }
}
