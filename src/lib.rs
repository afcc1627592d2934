//! # acnets - Actor-Critic Network Architectures
//!
//! acnets provides the function approximators an actor-critic training loop
//! plugs in: given an environment's observation and action-space shape, a model
//! produces the parameters of a policy distribution and a scalar value estimate
//! for every observation in a batch.
//!
//! ## Key Features
//!
//! - **Five architectures** behind one [`models::ActorCritic`] trait: shared or
//!   separate trunks, discrete or bounded-continuous actions, vector or image inputs
//! - **Shape inference** for convolution stacks, so flattened widths always match
//!   the layers that produce them
//! - **Policy-parameter selection** with stable parameter identities, for
//!   optimizers that only update the policy
//! - **Explicit initialization** declared per layer at construction time
//! - **Checkpoint-friendly** name-to-tensor snapshots of every parameter
//!
//! ## Quick Start
//!
//! ```rust
//! use acnets::config::ModelConfig;
//! use acnets::env::{ActionSpace, EnvironmentDescriptor};
//! use acnets::models::{build_model, ActorCritic};
//! use ndarray::Array4;
//!
//! // Atari-style frames with six discrete actions
//! let env = EnvironmentDescriptor::image(84, 84, 4, ActionSpace::discrete(6)).unwrap();
//! let model = build_model(&ModelConfig::builder().hidden(64).seed(1).build().unwrap(), &env).unwrap();
//!
//! let frames = Array4::<f32>::zeros((2, 84, 84, 4)).into_dyn();
//! let output = model.forward(frames.view()).unwrap();
//! assert_eq!(output.logits().unwrap().dim(), (2, 6));
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions used by the layers (ReLU, Tanh, Linear)
//! - [`config`] - Architecture selection and model configuration
//! - [`env`] - Observation and action-space descriptors
//! - [`error`] - Error types and result handling
//! - [`layers`] - Parameters, linear and convolutional layers, initialization
//! - [`models`] - The actor-critic architectures and the model factory
//! - [`shape`] - Feature-map shape inference for convolution stacks

pub mod activations;
pub mod config;
pub mod env;
pub mod error;
pub mod layers;
pub mod models;
pub mod shape;

pub use config::{Architecture, ModelConfig, ModelConfigBuilder};
pub use env::{ActionSpace, EnvironmentDescriptor};
pub use error::{ModelError, Result};
pub use models::{build_model, ActorCritic, PolicyOutput};
