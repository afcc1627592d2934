use ndarray::{ArrayView2, ArrayViewD};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::config::Architecture;
use crate::env::EnvironmentDescriptor;
use crate::error::Result;
use crate::layers::{LayerInit, Linear, Module};

use super::{vector_batch, ActorCritic, PolicyOutput};

/// Categorical policy and value head on a shared two-layer ReLU trunk.
///
/// Weights start from a plain standard normal, biases from zero.
#[derive(Debug)]
pub struct MlpDiscrete {
    pub fc1: Linear,
    pub fc2: Linear,
    pub action: Linear,
    pub value: Linear,
    features: usize,
}

impl MlpDiscrete {
    pub fn new<R: Rng + ?Sized>(env: &EnvironmentDescriptor, hidden: usize, rng: &mut R) -> Result<Self> {
        let features = env.observation_features()?;
        let num_actions = env.num_actions()?;
        let init = LayerInit::standard_normal();

        let model = MlpDiscrete {
            fc1: Linear::new(features, hidden, Activation::Relu, init, rng)?,
            fc2: Linear::new(hidden, hidden, Activation::Relu, init, rng)?,
            action: Linear::new(hidden, num_actions, Activation::Linear, init, rng)?,
            value: Linear::new(hidden, 1, Activation::Linear, init, rng)?,
            features,
        };
        debug!(features, hidden, num_actions, "built discrete model");
        Ok(model)
    }

    pub fn num_actions(&self) -> usize {
        self.action.output_size()
    }

    pub fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<PolicyOutput> {
        let trunk = self.fc1.forward(observations)?;
        let trunk = self.fc2.forward(trunk.view())?;
        Ok(PolicyOutput::Categorical {
            logits: self.action.forward(trunk.view())?,
            value: self.value.forward(trunk.view())?,
        })
    }
}

impl ActorCritic for MlpDiscrete {
    fn architecture(&self) -> Architecture {
        Architecture::MlpDiscrete
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![self.features]
    }

    fn forward(&self, observations: ArrayViewD<'_, f32>) -> Result<PolicyOutput> {
        self.forward_batch(vector_batch(observations, self.features)?)
    }

    fn named_modules(&self) -> Vec<(&'static str, &dyn Module)> {
        vec![
            ("fc1", &self.fc1 as &dyn Module),
            ("fc2", &self.fc2 as &dyn Module),
            ("action", &self.action as &dyn Module),
            ("value", &self.value as &dyn Module),
        ]
    }

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)> {
        vec![
            ("fc1", &mut self.fc1 as &mut dyn Module),
            ("fc2", &mut self.fc2 as &mut dyn Module),
            ("action", &mut self.action as &mut dyn Module),
            ("value", &mut self.value as &mut dyn Module),
        ]
    }

    fn policy_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.fc1 as &dyn Module,
            &self.fc2 as &dyn Module,
            &self.action as &dyn Module,
        ]
    }

    fn value_modules(&self) -> Vec<&dyn Module> {
        vec![&self.value as &dyn Module]
    }
}
