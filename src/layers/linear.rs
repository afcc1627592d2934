use ndarray::{Array2, ArrayView2, IntoDimension, Ix1, Ix2};
use rand::Rng;

use crate::activations::Activation;
use crate::error::{ModelError, Result};
use super::initialization::LayerInit;
use super::parameter::{Param, Parameter};
use super::traits::Module;

/// A fully connected layer in a neural network.
///
/// Weights are stored `[input_size, output_size]` so a batch is evaluated as
/// `activation(inputs · W + b)`.
#[derive(Debug)]
pub struct Linear {
    pub weight: Param<Ix2>,
    pub bias: Param<Ix1>,
    pub activation: Activation,
    init: LayerInit,
}

impl Linear {
    /// Create a new linear layer, sampling weights and biases as `init` declares.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: LayerInit,
        rng: &mut R,
    ) -> Result<Self> {
        if input_size == 0 || output_size == 0 {
            return Err(ModelError::configuration(
                "linear",
                format!("layer sizes must be positive, got {} -> {}", input_size, output_size),
            ));
        }

        let weight = init.weight.initialize(
            (input_size, output_size).into_dimension(),
            input_size,
            output_size,
            rng,
        )?;
        let bias = init.bias.initialize(output_size.into_dimension(), input_size, rng)?;

        Ok(Linear {
            weight: Param::new(weight),
            bias: Param::new(bias),
            activation,
            init,
        })
    }

    /// Evaluate the layer on a batch, one row per sample
    pub fn forward(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        if inputs.ncols() != self.input_size() {
            return Err(ModelError::shape_mismatch(
                format!("[*, {}]", self.input_size()),
                format!("{:?}", inputs.shape()),
            ));
        }
        let outputs = inputs.dot(self.weight.value()) + self.bias.value();
        Ok(self.activation.applied(outputs))
    }

    pub fn input_size(&self) -> usize {
        self.weight.value().nrows()
    }

    pub fn output_size(&self) -> usize {
        self.weight.value().ncols()
    }

    /// Initialization policy this layer was built with
    pub fn init(&self) -> LayerInit {
        self.init
    }
}

impl Module for Linear {
    fn named_parameters(&self) -> Vec<(&'static str, &dyn Parameter)> {
        vec![
            ("weight", &self.weight as &dyn Parameter),
            ("bias", &self.bias as &dyn Parameter),
        ]
    }

    fn named_parameters_mut(&mut self) -> Vec<(&'static str, &mut dyn Parameter)> {
        vec![
            ("weight", &mut self.weight as &mut dyn Parameter),
            ("bias", &mut self.bias as &mut dyn Parameter),
        ]
    }
}
