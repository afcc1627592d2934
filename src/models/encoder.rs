use ndarray::{Array2, ArrayView4};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::error::{ModelError, Result};
use crate::layers::{Conv2d, LayerInit};
use crate::shape::{feature_map_shape, flattened_dim, ConvLayerSpec};

/// Output channels and geometry of each convolution, in order
pub const CONV_STACK: [(usize, ConvLayerSpec); 2] = [
    (16, ConvLayerSpec::square(8, 4)),
    (32, ConvLayerSpec::square(4, 2)),
];

/// Two-layer ReLU convolutional feature extractor shared by the image variants.
///
/// The width of the flattened output is derived from the same layer specs the
/// convolutions are built from.
#[derive(Debug)]
pub struct ConvEncoder {
    pub conv1: Conv2d,
    pub conv2: Conv2d,
    input_shape: (usize, usize, usize),
    output_dim: usize,
}

impl ConvEncoder {
    pub fn new<R: Rng + ?Sized>(input_shape: (usize, usize, usize), init: LayerInit, rng: &mut R) -> Result<Self> {
        let (channels_1, spec_1) = CONV_STACK[0];
        let (channels_2, spec_2) = CONV_STACK[1];
        let conv1 = Conv2d::new(input_shape.2, channels_1, spec_1, Activation::Relu, init, rng)?;
        let conv2 = Conv2d::new(channels_1, channels_2, spec_2, Activation::Relu, init, rng)?;

        let feature_map = feature_map_shape(input_shape, &[conv1.spec(), conv2.spec()])?;
        let output_dim = flattened_dim(feature_map, conv2.out_channels());

        debug!(
            input = ?input_shape,
            feature_map = ?feature_map,
            output_dim,
            "built convolutional encoder"
        );

        Ok(ConvEncoder {
            conv1,
            conv2,
            input_shape,
            output_dim,
        })
    }

    pub fn input_shape(&self) -> (usize, usize, usize) {
        self.input_shape
    }

    /// Width of the flattened feature vector
    pub fn output_dim(&self) -> usize {
        self.output_dim
    }

    /// `[batch, height, width, channels]` images to `[batch, output_dim]` features
    pub fn forward(&self, images: ArrayView4<f32>) -> Result<Array2<f32>> {
        let batch = images.dim().0;
        let features = self.conv1.forward(images)?;
        let features = self.conv2.forward(features.view())?;
        features
            .into_shape((batch, self.output_dim))
            .map_err(|e| ModelError::shape_mismatch(format!("[{}, {}]", batch, self.output_dim), e.to_string()))
    }
}
