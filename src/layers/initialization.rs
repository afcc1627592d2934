use ndarray::{Array, Dimension};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::activations::Activation;
use crate::error::{ModelError, Result};

/// Which fan a scaled initializer divides by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FanMode {
    FanIn,
    FanOut,
}

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightInit {
    /// He/Kaiming normal: `N(0, gain / sqrt(fan))` with the gain of `nonlinearity`
    KaimingNormal { mode: FanMode, nonlinearity: Activation },

    /// Normal distribution with custom mean and std
    Normal { mean: f32, std: f32 },

    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`, the usual framework default for
    /// linear and convolutional layers
    FanInUniform,
}

/// Bias initialization strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BiasInit {
    Zeros,
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))`
    FanInUniform,
}

/// Initialization policy for one layer, declared where the layer is built
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerInit {
    pub weight: WeightInit,
    pub bias: BiasInit,
}

impl LayerInit {
    /// Kaiming normal in fan-out mode with zero biases
    pub fn kaiming_fan_out(nonlinearity: Activation) -> Self {
        LayerInit {
            weight: WeightInit::KaimingNormal {
                mode: FanMode::FanOut,
                nonlinearity,
            },
            bias: BiasInit::Zeros,
        }
    }

    /// Plain `N(0, 1)` weights with zero biases
    pub fn standard_normal() -> Self {
        LayerInit {
            weight: WeightInit::Normal { mean: 0.0, std: 1.0 },
            bias: BiasInit::Zeros,
        }
    }

    /// Fan-in uniform weights and biases
    pub fn framework_default() -> Self {
        LayerInit {
            weight: WeightInit::FanInUniform,
            bias: BiasInit::FanInUniform,
        }
    }
}

impl Default for LayerInit {
    fn default() -> Self {
        LayerInit::framework_default()
    }
}

fn fan_in_bound(fan_in: usize) -> Result<f32> {
    if fan_in == 0 {
        return Err(ModelError::configuration("fan_in", "must be positive"));
    }
    Ok(1.0 / (fan_in as f32).sqrt())
}

fn normal(mean: f32, std: f32) -> Result<Normal<f32>> {
    Normal::new(mean, std).map_err(|e| {
        ModelError::configuration("std", format!("invalid normal std {}: {}", std, e))
    })
}

impl WeightInit {
    /// Standard deviation a scaled scheme targets, if it has one
    pub fn target_std(&self, fan_in: usize, fan_out: usize) -> Option<f32> {
        match self {
            WeightInit::KaimingNormal { mode, nonlinearity } => {
                let fan = match mode {
                    FanMode::FanIn => fan_in,
                    FanMode::FanOut => fan_out,
                };
                Some(nonlinearity.gain() / (fan as f32).sqrt())
            }
            WeightInit::Normal { std, .. } => Some(*std),
            WeightInit::FanInUniform => Some(1.0 / (3.0 * fan_in as f32).sqrt()),
        }
    }

    /// Sample a weight tensor of the given shape
    pub fn initialize<D, R>(&self, shape: D, fan_in: usize, fan_out: usize, rng: &mut R) -> Result<Array<f32, D>>
    where
        D: Dimension,
        R: Rng + ?Sized,
    {
        match self {
            WeightInit::KaimingNormal { mode, nonlinearity } => {
                let fan = match mode {
                    FanMode::FanIn => fan_in,
                    FanMode::FanOut => fan_out,
                };
                if fan == 0 {
                    return Err(ModelError::configuration("fan", "must be positive"));
                }
                let std = nonlinearity.gain() / (fan as f32).sqrt();
                Ok(Array::random_using(shape, normal(0.0, std)?, rng))
            }

            WeightInit::Normal { mean, std } => {
                Ok(Array::random_using(shape, normal(*mean, *std)?, rng))
            }

            WeightInit::FanInUniform => {
                let bound = fan_in_bound(fan_in)?;
                Ok(Array::random_using(shape, Uniform::new_inclusive(-bound, bound), rng))
            }
        }
    }
}

impl BiasInit {
    /// Sample a bias tensor of the given shape
    pub fn initialize<D, R>(&self, shape: D, fan_in: usize, rng: &mut R) -> Result<Array<f32, D>>
    where
        D: Dimension,
        R: Rng + ?Sized,
    {
        match self {
            BiasInit::Zeros => Ok(Array::zeros(shape)),
            BiasInit::FanInUniform => {
                let bound = fan_in_bound(fan_in)?;
                Ok(Array::random_using(shape, Uniform::new_inclusive(-bound, bound), rng))
            }
        }
    }
}
