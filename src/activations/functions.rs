use ndarray::{Array, Dimension};
use serde::{Serialize, Deserialize};

/// An enumeration of the activation functions used by the actor-critic layers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Activation {
    #[default]
    Relu,
    Tanh,
    Linear,
}

impl Activation {
    /// Apply the activation function to an array of any rank in-place.
    pub fn apply<D: Dimension>(&self, input: &mut Array<f32, D>) {
        match self {
            Activation::Relu => {
                input.mapv_inplace(|v| v.max(0.0));
            }
            Activation::Tanh => {
                input.mapv_inplace(|v| v.tanh());
            }
            Activation::Linear => {}
        }
    }

    /// Consume an array and return it with the activation applied.
    pub fn applied<D: Dimension>(&self, mut input: Array<f32, D>) -> Array<f32, D> {
        self.apply(&mut input);
        input
    }

    /// Recommended gain for fan-scaled initialization.
    ///
    /// Matches the usual values: `sqrt(2)` for ReLU, `5/3` for tanh and `1` for
    /// the identity.
    pub fn gain(&self) -> f32 {
        match self {
            Activation::Relu => 2.0_f32.sqrt(),
            Activation::Tanh => 5.0 / 3.0,
            Activation::Linear => 1.0,
        }
    }
}
