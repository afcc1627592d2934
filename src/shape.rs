//! Feature-map shape inference for convolution stacks.
//!
//! Image variants size their first fully connected layer from the spatial
//! output of the convolution stack. The same [`ConvLayerSpec`] values that
//! build the convolution layers are fed through [`feature_map_shape`], so the
//! flattened width cannot drift from the layers that produce it.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Geometry of one 2D convolution, each pair given as `(height, width)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConvLayerSpec {
    pub padding: (usize, usize),
    pub dilation: (usize, usize),
    pub kernel_size: (usize, usize),
    pub stride: (usize, usize),
}

impl ConvLayerSpec {
    pub const fn new(
        padding: (usize, usize),
        dilation: (usize, usize),
        kernel_size: (usize, usize),
        stride: (usize, usize),
    ) -> Self {
        ConvLayerSpec {
            padding,
            dilation,
            kernel_size,
            stride,
        }
    }

    /// Square kernel and stride, no padding, unit dilation
    pub const fn square(kernel: usize, stride: usize) -> Self {
        ConvLayerSpec::new((0, 0), (1, 1), (kernel, kernel), (stride, stride))
    }

    /// Output extent of this layer along both spatial axes.
    ///
    /// Values are signed so callers can report how far below one a
    /// degenerate configuration lands.
    pub fn output_extent(&self, height: i64, width: i64) -> Result<(i64, i64)> {
        self.validate()?;
        Ok((
            axis_extent(height, self.padding.0, self.dilation.0, self.kernel_size.0, self.stride.0)?,
            axis_extent(width, self.padding.1, self.dilation.1, self.kernel_size.1, self.stride.1)?,
        ))
    }

    /// Kernel and stride must be strictly positive; padding and dilation may be zero.
    pub fn validate(&self) -> Result<()> {
        if self.kernel_size.0 == 0 || self.kernel_size.1 == 0 {
            return Err(ModelError::configuration(
                "kernel_size",
                format!("must be positive, got {:?}", self.kernel_size),
            ));
        }
        if self.stride.0 == 0 || self.stride.1 == 0 {
            return Err(ModelError::configuration(
                "stride",
                format!("must be positive, got {:?}", self.stride),
            ));
        }
        Ok(())
    }
}

/// `floor((a + 2p - d(k - 1) - 1) / s + 1)`, rejecting geometry that does
/// not fit in an `i64`
fn axis_extent(size: i64, padding: usize, dilation: usize, kernel: usize, stride: usize) -> Result<i64> {
    let overflow = || {
        ModelError::configuration(
            "conv_layer",
            format!(
                "geometry overflows: size={} padding={} dilation={} kernel={} stride={}",
                size, padding, dilation, kernel, stride
            ),
        )
    };
    let padding = i64::try_from(padding).map_err(|_| overflow())?;
    let dilation = i64::try_from(dilation).map_err(|_| overflow())?;
    let kernel = i64::try_from(kernel).map_err(|_| overflow())?;
    let stride = i64::try_from(stride).map_err(|_| overflow())?;

    let span = dilation.checked_mul(kernel - 1).ok_or_else(overflow)?;
    let numerator = padding
        .checked_mul(2)
        .and_then(|p| p.checked_add(size))
        .and_then(|n| n.checked_sub(span))
        .and_then(|n| n.checked_sub(1))
        .ok_or_else(overflow)?;
    Ok(numerator.div_euclid(stride) + 1)
}

/// Final `(height, width)` after running `input = (height, width, channels)`
/// through every layer in `layers`, in order.
///
/// Fails with a configuration error if any layer would produce an empty
/// feature map.
pub fn feature_map_shape(input: (usize, usize, usize), layers: &[ConvLayerSpec]) -> Result<(usize, usize)> {
    let (height, width, _channels) = input;
    if height == 0 || width == 0 {
        return Err(ModelError::configuration(
            "observation_shape",
            format!("spatial input must be positive, got {}x{}", height, width),
        ));
    }

    let (mut h, mut w) = (height as i64, width as i64);
    for (index, layer) in layers.iter().enumerate() {
        let (next_h, next_w) = layer.output_extent(h, w)?;
        if next_h <= 0 || next_w <= 0 {
            return Err(ModelError::configuration(
                format!("conv{}", index + 1),
                format!(
                    "feature map {}x{} shrinks to {}x{} with {:?}",
                    h, w, next_h, next_w, layer
                ),
            ));
        }
        h = next_h;
        w = next_w;
    }

    Ok((h as usize, w as usize))
}

/// Width of the flattened feature vector for a `(height, width)` map with
/// `channels` output channels
pub fn flattened_dim(feature_map: (usize, usize), channels: usize) -> usize {
    feature_map.0 * feature_map.1 * channels
}
