//! Building blocks shared by every actor-critic variant.
//!
//! - [`parameter`] - trainable tensors with stable identities
//! - [`traits`] - the [`Module`] trait every parameter owner implements
//! - [`initialization`] - per-layer weight and bias initialization policies
//! - [`linear`] - fully connected layers
//! - [`conv`] - channels-last 2D convolution

pub mod traits;
pub mod parameter;
pub mod initialization;
pub mod linear;
pub mod conv;

pub use traits::{flatten_modules, qualified_name, Module, ParamIter};
pub use parameter::{Param, ParamId, Parameter};
pub use initialization::{BiasInit, FanMode, LayerInit, WeightInit};
pub use linear::Linear;
pub use conv::Conv2d;
