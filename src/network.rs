use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{Result, TrainError};
use crate::layers::DenseLayer;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward network of dense layers together with its optimizer.
///
/// This is the function approximator behind both halves of the
/// [`DqnBrain`](crate::brain::DqnBrain): a map from an encoded board to one value
/// estimate per action.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new network from layer sizes and one activation per layer.
    pub fn new<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        rng: &mut R,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(TrainError::configuration(
                "HIDDEN_LAYERS",
                "a network needs at least an input and an output layer",
            ));
        }
        if layer_sizes.len() - 1 != activations.len() {
            return Err(TrainError::dimension_mismatch(
                format!("{} activations", layer_sizes.len() - 1),
                format!("{} activations", activations.len()),
            ));
        }

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| DenseLayer::new(window[0], window[1], activation, rng))
            .collect::<Vec<_>>();

        Ok(NeuralNetwork { layers, optimizer })
    }

    pub fn with_layers(mut self, layers: Vec<DenseLayer>) -> Self {
        self.layers = layers;
        self
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(DenseLayer::input_size).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(DenseLayer::output_size).unwrap_or(0)
    }

    /// Forward pass for a single input vector.
    pub fn forward(&mut self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.forward_batch(input.insert_axis(Axis(0)));
        output.row(0).to_owned()
    }

    /// Forward pass for a batch of input row vectors.
    pub fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    /// Backpropagate a batch of output errors, returning per-layer gradients in layer order.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<Vec<(Array2<f32>, Array1<f32>)>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (adjusted_error, weight_gradients, bias_gradients) = layer
                .backward_batch(current_error.view())
                .ok_or_else(|| TrainError::Training("backward pass without a cached forward pass".to_string()))?;
            gradients.push((weight_gradients, bias_gradients));

            if i != 0 {
                current_error = adjusted_error.dot(&layer.weights.t());
            }
        }

        gradients.reverse();
        Ok(gradients)
    }

    /// One supervised step towards `targets` under mean squared error.
    ///
    /// Returns the loss measured before the update.
    pub fn train_minibatch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        learning_rate: f32,
    ) -> Result<f32> {
        if inputs.nrows() != targets.nrows() || targets.ncols() != self.output_size() {
            return Err(TrainError::dimension_mismatch(
                format!("({}, {})", inputs.nrows(), self.output_size()),
                format!("({}, {})", targets.nrows(), targets.ncols()),
            ));
        }

        let outputs = self.forward_batch(inputs);
        let batch_size = inputs.nrows().max(1) as f32;
        let output_errors = (&outputs - &targets) / batch_size;
        let loss = (&outputs - &targets).mapv(|x| x * x).mean().unwrap_or(0.0);

        let gradients = self.backward_batch(output_errors.view())?;
        for (index, (layer, (weight_gradients, bias_gradients))) in
            self.layers.iter_mut().zip(gradients).enumerate()
        {
            self.optimizer.update_weights(index, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(index, &mut layer.biases, &bias_gradients, learning_rate);
        }
        self.optimizer.finish_step();

        Ok(loss)
    }

    /// Human readable architecture description.
    pub fn summary(&self) -> String {
        let mut summary = format!("NeuralNetwork ({} optimizer)\n", self.optimizer.name());
        for (i, layer) in self.layers.iter().enumerate() {
            summary.push_str(&format!(
                "  dense_{}: {} -> {} [{}] params={}\n",
                i,
                layer.input_size(),
                layer.output_size(),
                layer.activation.name(),
                layer.num_parameters()
            ));
        }
        let total: usize = self.layers.iter().map(DenseLayer::num_parameters).sum();
        summary.push_str(&format!("  total params: {}", total));
        summary
    }

    /// Serialize the network, layers and optimizer state, to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    /// Load a network previously written by [`save`](NeuralNetwork::save).
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;
        let network: Self = bincode::deserialize(&data)?;
        Ok(network)
    }
}

/// A macro to create a new `NeuralNetwork` from explicit layers.
///
/// # Examples
///
/// ```
/// use ricochet::optimizer::{OptimizerWrapper, SGD};
/// use ricochet::create_network;
/// use ricochet::activations::Activation;
/// let mut rng = rand::thread_rng();
/// let network = create_network!(OptimizerWrapper::SGD(SGD::new()), &mut rng,
///     (4, 32, Activation::Relu),
///     (32, 2, Activation::Linear)
/// );
/// assert_eq!(network.output_size(), 2);
/// ```
#[macro_export]
macro_rules! create_network {
    ($optimizer:expr, $rng:expr, $( ($input_size:expr, $output_size:expr, $activation:expr) ),* ) => {
        {
            let rng = $rng;
            let layers = vec![$( $crate::layers::DenseLayer::new($input_size, $output_size, $activation, rng) ),*];
            $crate::network::NeuralNetwork { layers, optimizer: $optimizer }
        }
    }
}
