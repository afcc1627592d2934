//! # Actor-Critic Models
//!
//! Five interchangeable architectures behind one trait, [`ActorCritic`]:
//!
//! | Architecture | Input | Trunk | Policy output |
//! |--------------|-------|-------|---------------|
//! | [`MlpSharedContinuous`] | vector | shared, ReLU | bounded Gaussian mean + learned std |
//! | [`MlpSeparateContinuous`] | vector | separate policy/value, tanh | bounded Gaussian mean + learned std |
//! | [`MlpDiscrete`] | vector | shared, ReLU | categorical logits |
//! | [`ConvDiscrete`] | image | conv features, separate heads | categorical logits |
//! | [`ConvContinuous`] | image | conv features, separate heads | bounded Gaussian mean + learned std |
//!
//! Every model lists its parameter owners explicitly: all modules, the modules
//! feeding the policy output, and the modules only the value output uses. The
//! policy selector is a walk over that fixed list, so a value-head parameter
//! can never appear in it.
//!
//! ## Example
//!
//! ```rust
//! use acnets::config::ModelConfig;
//! use acnets::env::{ActionSpace, EnvironmentDescriptor};
//! use acnets::models::{build_model, ActorCritic};
//! use ndarray::Array2;
//!
//! let env = EnvironmentDescriptor::vector(8, ActionSpace::symmetric(2, 1.0)).unwrap();
//! let config = ModelConfig::builder().hidden(64).seed(0).build().unwrap();
//! let model = build_model(&config, &env).unwrap();
//!
//! let output = model.forward(Array2::<f32>::zeros((4, 8)).into_dyn().view()).unwrap();
//! assert_eq!(output.value().dim(), (4, 1));
//!
//! // hand only the policy parameters to a trust-region optimizer
//! let policy: Vec<_> = model.policy_parameters().map(|p| p.id()).collect();
//! assert!(!policy.is_empty());
//! ```
//!
//! ## Concurrency
//!
//! `forward` takes `&self` and never mutates the model. Parameter updates go
//! through `&mut self` ([`ActorCritic::parameters_mut`],
//! [`ActorCritic::load_state_dict`]), so the borrow checker serializes them
//! against forward calls. Callers sharing a model across threads must wrap it
//! in their own lock; running a forward pass while another thread mutates
//! parameters is not supported.

pub mod gaussian;
pub mod encoder;
pub mod mlp_shared;
pub mod mlp_separate;
pub mod mlp_discrete;
pub mod conv_discrete;
pub mod conv_continuous;

use std::collections::BTreeMap;
use std::fmt::Debug;

use ndarray::{Array2, ArrayD, ArrayView2, ArrayView4, ArrayViewD, Ix2, Ix4};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::config::{Architecture, ModelConfig};
use crate::env::EnvironmentDescriptor;
use crate::error::{ModelError, Result};
use crate::layers::{flatten_modules, qualified_name, Module, ParamIter, Parameter};

pub use gaussian::GaussianPolicy;
pub use encoder::ConvEncoder;
pub use mlp_shared::MlpSharedContinuous;
pub use mlp_separate::MlpSeparateContinuous;
pub use mlp_discrete::MlpDiscrete;
pub use conv_discrete::ConvDiscrete;
pub use conv_continuous::ConvContinuous;

/// Output of one forward pass, batch-first
#[derive(Debug, Clone, PartialEq)]
pub enum PolicyOutput {
    /// Diagonal Gaussian policy
    Gaussian {
        /// `[batch, action_dim]`, clipped to the action bounds
        mean: Array2<f32>,
        /// `[1, action_dim]`, broadcast over the batch
        std: Array2<f32>,
        /// `[batch, 1]`
        value: Array2<f32>,
    },
    /// Categorical policy
    Categorical {
        /// `[batch, num_actions]`, unnormalized
        logits: Array2<f32>,
        /// `[batch, 1]`
        value: Array2<f32>,
    },
}

impl PolicyOutput {
    pub fn value(&self) -> &Array2<f32> {
        match self {
            PolicyOutput::Gaussian { value, .. } => value,
            PolicyOutput::Categorical { value, .. } => value,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.value().nrows()
    }

    pub fn is_continuous(&self) -> bool {
        matches!(self, PolicyOutput::Gaussian { .. })
    }

    pub fn mean(&self) -> Option<&Array2<f32>> {
        match self {
            PolicyOutput::Gaussian { mean, .. } => Some(mean),
            PolicyOutput::Categorical { .. } => None,
        }
    }

    pub fn std(&self) -> Option<&Array2<f32>> {
        match self {
            PolicyOutput::Gaussian { std, .. } => Some(std),
            PolicyOutput::Categorical { .. } => None,
        }
    }

    pub fn logits(&self) -> Option<&Array2<f32>> {
        match self {
            PolicyOutput::Categorical { logits, .. } => Some(logits),
            PolicyOutput::Gaussian { .. } => None,
        }
    }
}

/// Common interface of every actor-critic architecture
pub trait ActorCritic: Debug + Send + Sync {
    fn architecture(&self) -> Architecture;

    /// Shape of a single observation, without the batch axis
    fn observation_shape(&self) -> Vec<usize>;

    /// Evaluate a batch of observations laid out `[batch, ..observation_shape]`.
    ///
    /// A batch of the wrong rank or feature size is a shape-mismatch error;
    /// inputs are never reshaped.
    fn forward(&self, observations: ArrayViewD<'_, f32>) -> Result<PolicyOutput>;

    /// Every parameter owner with its name, in declaration order
    fn named_modules(&self) -> Vec<(&'static str, &dyn Module)>;

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)>;

    /// Owners of the parameters feeding the policy output
    fn policy_modules(&self) -> Vec<&dyn Module>;

    /// Owners of the parameters only the value output uses
    fn value_modules(&self) -> Vec<&dyn Module>;

    /// Parameters feeding the policy output, including any shared trunk and the
    /// learned log-std. Restartable: each call walks the same parameters again.
    fn policy_parameters(&self) -> ParamIter<'_> {
        flatten_modules(self.policy_modules())
    }

    /// Parameters used only by the value output
    fn value_parameters(&self) -> ParamIter<'_> {
        flatten_modules(self.value_modules())
    }

    /// All parameters, in declaration order
    fn parameters(&self) -> ParamIter<'_> {
        flatten_modules(self.named_modules().into_iter().map(|(_, module)| module))
    }

    /// All parameters, mutable, for in-place optimizer updates
    fn parameters_mut(&mut self) -> Vec<&mut dyn Parameter> {
        let mut params = Vec::new();
        for (_, module) in self.named_modules_mut() {
            for (_, param) in module.named_parameters_mut() {
                params.push(param);
            }
        }
        params
    }

    /// All parameters under dotted names such as `fc1.weight` or `log_std`
    fn named_parameters(&self) -> Vec<(String, &dyn Parameter)> {
        let mut named = Vec::new();
        for (module_name, module) in self.named_modules() {
            for (local, param) in module.named_parameters() {
                named.push((qualified_name(module_name, local), param));
            }
        }
        named
    }

    /// Total number of scalar parameters
    fn num_parameters(&self) -> usize {
        self.parameters().map(|p| p.len()).sum()
    }

    /// Number of scalar parameters in the policy partition
    fn num_policy_parameters(&self) -> usize {
        self.policy_parameters().map(|p| p.len()).sum()
    }

    /// Snapshot of every parameter keyed by its dotted name
    fn state_dict(&self) -> BTreeMap<String, ArrayD<f32>> {
        self.named_parameters()
            .into_iter()
            .map(|(name, param)| (name, param.view().to_owned()))
            .collect()
    }

    /// Overwrite every parameter from a name-to-tensor mapping.
    ///
    /// The mapping must name exactly this model's parameters with matching
    /// shapes; nothing is written unless the whole mapping checks out.
    fn load_state_dict(&mut self, state: &BTreeMap<String, ArrayD<f32>>) -> Result<()> {
        let expected = self.named_parameters();
        for (name, param) in &expected {
            let tensor = state.get(name).ok_or_else(|| {
                ModelError::configuration(name.clone(), "missing from state dict")
            })?;
            if tensor.shape() != param.shape() {
                return Err(ModelError::shape_mismatch(
                    format!("{} with shape {:?}", name, param.shape()),
                    format!("{:?}", tensor.shape()),
                ));
            }
        }
        if state.len() != expected.len() {
            let unknown = state
                .keys()
                .find(|key| expected.iter().all(|(name, _)| name != *key))
                .cloned()
                .unwrap_or_default();
            return Err(ModelError::configuration(unknown, "not a parameter of this model"));
        }

        for (module_name, module) in self.named_modules_mut() {
            for (local, param) in module.named_parameters_mut() {
                if let Some(tensor) = state.get(&qualified_name(module_name, local)) {
                    param.view_mut().assign(tensor);
                }
            }
        }
        Ok(())
    }
}

/// View a dynamic batch as `[batch, features]`
pub(crate) fn vector_batch<'a>(observations: ArrayViewD<'a, f32>, features: usize) -> Result<ArrayView2<'a, f32>> {
    let actual = format!("{:?}", observations.shape());
    let batch = observations
        .into_dimensionality::<Ix2>()
        .map_err(|_| ModelError::shape_mismatch(format!("[batch, {}]", features), actual.clone()))?;
    if batch.ncols() != features {
        return Err(ModelError::shape_mismatch(format!("[batch, {}]", features), actual));
    }
    Ok(batch)
}

/// View a dynamic batch as `[batch, height, width, channels]`
pub(crate) fn image_batch<'a>(
    observations: ArrayViewD<'a, f32>,
    shape: (usize, usize, usize),
) -> Result<ArrayView4<'a, f32>> {
    let expected = format!("[batch, {}, {}, {}]", shape.0, shape.1, shape.2);
    let actual = format!("{:?}", observations.shape());
    let batch = observations
        .into_dimensionality::<Ix4>()
        .map_err(|_| ModelError::shape_mismatch(expected.clone(), actual.clone()))?;
    let (_, h, w, c) = batch.dim();
    if (h, w, c) != shape {
        return Err(ModelError::shape_mismatch(expected, actual));
    }
    Ok(batch)
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Build the model `config` selects for `env`
pub fn build_model(config: &ModelConfig, env: &EnvironmentDescriptor) -> Result<Box<dyn ActorCritic>> {
    config.validate()?;
    env.validate()?;
    let architecture = config.resolve_architecture(env)?;
    let hidden = config.resolve_hidden(architecture)?;
    let mut rng = seeded_rng(config.seed);

    let model: Box<dyn ActorCritic> = match architecture {
        Architecture::MlpSharedContinuous => Box::new(MlpSharedContinuous::new(env, hidden, &mut rng)?),
        Architecture::MlpSeparateContinuous => Box::new(MlpSeparateContinuous::new(env, hidden, &mut rng)?),
        Architecture::MlpDiscrete => Box::new(MlpDiscrete::new(env, hidden, &mut rng)?),
        Architecture::ConvDiscrete => Box::new(ConvDiscrete::new(env, hidden, &mut rng)?),
        Architecture::ConvContinuous => Box::new(ConvContinuous::new(env, hidden, &mut rng)?),
    };

    debug!(
        %architecture,
        hidden,
        total_params = model.num_parameters(),
        policy_params = model.num_policy_parameters(),
        "built actor-critic model"
    );
    Ok(model)
}
