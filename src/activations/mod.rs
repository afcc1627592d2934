//! # Activation Functions Module
//!
//! Element-wise non-linearities applied between the layers of the actor-critic
//! trunks and heads.
//!
//! ## Available Activations
//!
//! - **ReLU**: `max(0, x)` - used by the shared-trunk, discrete and convolutional variants
//! - **Tanh**: Hyperbolic tangent - used by the separate-trunk continuous variant
//! - **Linear**: Identity function - used by output heads
//!
//! Each activation also reports its recommended initialization gain, which the
//! fan-scaled weight initializers in [`crate::layers::initialization`] consume.
//!
//! ## Usage Example
//!
//! ```rust
//! use acnets::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5], [0.0, 2.0]];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![[1.0, 0.0], [0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::Activation;
