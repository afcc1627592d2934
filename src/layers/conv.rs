//! Convolutional layers for processing image observations
//!
//! Inputs and outputs are channels-last, `[batch, height, width, channels]`,
//! which is the layout environments describe their image observations in.

use ndarray::{Array2, Array4, ArrayView4, IntoDimension, Ix1, Ix4};
use rand::Rng;

use crate::activations::Activation;
use crate::error::{ModelError, Result};
use crate::shape::ConvLayerSpec;
use super::initialization::LayerInit;
use super::parameter::{Param, Parameter};
use super::traits::Module;

/// 2D Convolutional Layer
///
/// Applies 2D convolution over an input signal composed of several input planes.
#[derive(Debug)]
pub struct Conv2d {
    /// Convolution kernels/filters [out_channels, in_channels, kernel_height, kernel_width]
    pub kernels: Param<Ix4>,

    /// Bias terms for each output channel
    pub biases: Param<Ix1>,

    /// Activation function
    pub activation: Activation,

    /// Padding, dilation, kernel size and stride
    spec: ConvLayerSpec,

    init: LayerInit,
}

impl Conv2d {
    /// Create a new 2D convolutional layer
    pub fn new<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        spec: ConvLayerSpec,
        activation: Activation,
        init: LayerInit,
        rng: &mut R,
    ) -> Result<Self> {
        spec.validate()?;
        if in_channels == 0 || out_channels == 0 {
            return Err(ModelError::configuration(
                "conv",
                format!("channel counts must be positive, got {} -> {}", in_channels, out_channels),
            ));
        }
        if spec.dilation.0 == 0 || spec.dilation.1 == 0 {
            return Err(ModelError::configuration(
                "dilation",
                format!("a convolution layer needs dilation >= 1, got {:?}", spec.dilation),
            ));
        }

        let (kh, kw) = spec.kernel_size;
        let fan_in = in_channels * kh * kw;
        let fan_out = out_channels * kh * kw;

        let kernels = init.weight.initialize(
            (out_channels, in_channels, kh, kw).into_dimension(),
            fan_in,
            fan_out,
            rng,
        )?;
        let biases = init.bias.initialize(out_channels.into_dimension(), fan_in, rng)?;

        Ok(Conv2d {
            kernels: Param::new(kernels),
            biases: Param::new(biases),
            activation,
            spec,
            init,
        })
    }

    pub fn spec(&self) -> ConvLayerSpec {
        self.spec
    }

    pub fn init(&self) -> LayerInit {
        self.init
    }

    pub fn in_channels(&self) -> usize {
        self.kernels.value().dim().1
    }

    pub fn out_channels(&self) -> usize {
        self.kernels.value().dim().0
    }

    /// Spatial output size for a `height x width` input
    pub fn output_size(&self, height: usize, width: usize) -> Result<(usize, usize)> {
        let (h, w) = self.spec.output_extent(height as i64, width as i64)?;
        if h <= 0 || w <= 0 {
            return Err(ModelError::shape_mismatch(
                "an input large enough for the kernel",
                format!("{}x{}", height, width),
            ));
        }
        Ok((h as usize, w as usize))
    }

    /// Unfold every receptive field into one row: `[batch * oh * ow, in * kh * kw]`
    fn im2col(&self, input: &ArrayView4<f32>, out_h: usize, out_w: usize) -> Array2<f32> {
        let (batch, in_h, in_w, channels) = input.dim();
        let (kh, kw) = self.spec.kernel_size;
        let (sh, sw) = self.spec.stride;
        let (dh, dw) = self.spec.dilation;
        let (ph, pw) = (self.spec.padding.0 as isize, self.spec.padding.1 as isize);

        let mut cols = Array2::zeros((batch * out_h * out_w, channels * kh * kw));

        for b in 0..batch {
            for oh in 0..out_h {
                for ow in 0..out_w {
                    let row = (b * out_h + oh) * out_w + ow;
                    for ki in 0..kh {
                        let ih = (oh * sh + ki * dh) as isize - ph;
                        if ih < 0 || ih >= in_h as isize {
                            continue;
                        }
                        for kj in 0..kw {
                            let iw = (ow * sw + kj * dw) as isize - pw;
                            // zero padding: out-of-range taps stay 0
                            if iw < 0 || iw >= in_w as isize {
                                continue;
                            }
                            for c in 0..channels {
                                cols[[row, (c * kh + ki) * kw + kj]] =
                                    input[[b, ih as usize, iw as usize, c]];
                            }
                        }
                    }
                }
            }
        }

        cols
    }

    /// Forward pass for a batch of images `[batch, height, width, channels]`
    pub fn forward(&self, input: ArrayView4<f32>) -> Result<Array4<f32>> {
        let (batch, in_h, in_w, channels) = input.dim();
        if channels != self.in_channels() {
            return Err(ModelError::shape_mismatch(
                format!("[*, *, *, {}]", self.in_channels()),
                format!("{:?}", input.shape()),
            ));
        }
        let (out_h, out_w) = self.output_size(in_h, in_w)?;

        let (kh, kw) = self.spec.kernel_size;
        let kernel_matrix = self
            .kernels
            .value()
            .view()
            .into_shape((self.out_channels(), channels * kh * kw))
            .map_err(|e| ModelError::shape_mismatch("contiguous kernels", e.to_string()))?;

        let cols = self.im2col(&input, out_h, out_w);
        let outputs = cols.dot(&kernel_matrix.t()) + self.biases.value();

        let outputs = outputs
            .into_shape((batch, out_h, out_w, self.out_channels()))
            .map_err(|e| ModelError::shape_mismatch("contiguous feature map", e.to_string()))?;

        Ok(self.activation.applied(outputs))
    }
}

impl Module for Conv2d {
    fn named_parameters(&self) -> Vec<(&'static str, &dyn Parameter)> {
        vec![
            ("weight", &self.kernels as &dyn Parameter),
            ("bias", &self.biases as &dyn Parameter),
        ]
    }

    fn named_parameters_mut(&mut self) -> Vec<(&'static str, &mut dyn Parameter)> {
        vec![
            ("weight", &mut self.kernels as &mut dyn Parameter),
            ("bias", &mut self.biases as &mut dyn Parameter),
        ]
    }
}
