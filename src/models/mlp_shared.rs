use ndarray::{ArrayView2, ArrayViewD};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::config::Architecture;
use crate::env::EnvironmentDescriptor;
use crate::error::Result;
use crate::layers::{LayerInit, Linear, Module};

use super::{vector_batch, ActorCritic, GaussianPolicy, PolicyOutput};

/// Gaussian policy and value head on one shared two-layer ReLU trunk.
///
/// ```text
/// trunk = relu(fc2(relu(fc1(obs))))
/// mean  = clip(mean(trunk), low, high)
/// value = value(trunk)
/// ```
#[derive(Debug)]
pub struct MlpSharedContinuous {
    pub fc1: Linear,
    pub fc2: Linear,
    pub mean: Linear,
    pub value: Linear,
    pub gaussian: GaussianPolicy,
    features: usize,
}

impl MlpSharedContinuous {
    pub fn new<R: Rng + ?Sized>(env: &EnvironmentDescriptor, hidden: usize, rng: &mut R) -> Result<Self> {
        let features = env.observation_features()?;
        let bounds = env.action_bounds()?;
        let action_dim = bounds.dim();
        let init = LayerInit::kaiming_fan_out(Activation::Relu);

        let model = MlpSharedContinuous {
            fc1: Linear::new(features, hidden, Activation::Relu, init, rng)?,
            fc2: Linear::new(hidden, hidden, Activation::Relu, init, rng)?,
            mean: Linear::new(hidden, action_dim, Activation::Linear, init, rng)?,
            value: Linear::new(hidden, 1, Activation::Linear, init, rng)?,
            gaussian: GaussianPolicy::new(bounds),
            features,
        };
        debug!(features, hidden, action_dim, "built shared-trunk continuous model");
        Ok(model)
    }

    pub fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<PolicyOutput> {
        let trunk = self.fc1.forward(observations)?;
        let trunk = self.fc2.forward(trunk.view())?;
        let mean = self.gaussian.clip_mean(self.mean.forward(trunk.view())?);
        let value = self.value.forward(trunk.view())?;
        Ok(PolicyOutput::Gaussian {
            mean,
            std: self.gaussian.std(),
            value,
        })
    }
}

impl ActorCritic for MlpSharedContinuous {
    fn architecture(&self) -> Architecture {
        Architecture::MlpSharedContinuous
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
            ("mean", &self.mean as &dyn Module),
            ("value", &self.value as &dyn Module),
            ("log_std", &self.gaussian.log_std as &dyn Module),
        ]
    }

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)> {
        vec![
            ("fc1", &mut self.fc1 as &mut dyn Module),
            ("fc2", &mut self.fc2 as &mut dyn Module),
            ("mean", &mut self.mean as &mut dyn Module),
            ("value", &mut self.value as &mut dyn Module),
            ("log_std", &mut self.gaussian.log_std as &mut dyn Module),
        ]
    }

    fn policy_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.fc1 as &dyn Module,
            &self.fc2 as &dyn Module,
            &self.mean as &dyn Module,
            &self.gaussian.log_std as &dyn Module,
        ]
    }

    fn value_modules(&self) -> Vec<&dyn Module> {
        vec![&self.value as &dyn Module]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use crate::layers::Parameter;
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model(hidden: usize) -> MlpSharedContinuous {
        let env = EnvironmentDescriptor::vector(8, ActionSpace::symmetric(2, 1.0)).unwrap();
        MlpSharedContinuous::new(&env, hidden, &mut StdRng::seed_from_u64(7)).unwrap()
    }

    #[test]
    fn test_output_shapes() {
        let model = model(256);
        let output = model.forward(Array2::<f32>::zeros((32, 8)).into_dyn().view()).unwrap();
        assert_eq!(output.mean().unwrap().dim(), (32, 2));
        assert_eq!(output.std().unwrap().dim(), (1, 2));
        assert_eq!(output.value().dim(), (32, 1));
    }

    #[test]
    fn test_mean_respects_bounds_for_large_inputs() {
        let model = model(32);
        let obs = Array2::from_shape_fn((16, 8), |(i, j)| (i as f32 - 8.0) * 50.0 + j as f32);
        let output = model.forward_batch(obs.view()).unwrap();
        assert!(output.mean().unwrap().iter().all(|&m| (-1.0..=1.0).contains(&m)));
    }

    #[test]
    fn test_biases_and_log_std_start_at_zero() {
        let model = model(16);
        assert!(model.fc1.bias.value().iter().all(|&b| b == 0.0));
        assert!(model.value.bias.value().iter().all(|&b| b == 0.0));
        assert!(model.gaussian.log_std.value().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_policy_contains_trunk_and_log_std() {
        let model = model(16);
        let policy: Vec<_> = model.policy_parameters().map(|p| p.id()).collect();
        assert!(policy.contains(&model.fc1.weight.id()));
        assert!(policy.contains(&model.gaussian.log_std.id()));
        assert!(!policy.contains(&model.value.weight.id()));
        assert_eq!(policy.len(), 7);
    }

    #[test]
    fn test_discrete_env_rejected() {
        let env = EnvironmentDescriptor::vector(4, ActionSpace::discrete(2)).unwrap();
        let err = MlpSharedContinuous::new(&env, 16, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(err.is_configuration());
    }
}
