use ndarray::{ArrayView2, ArrayViewD};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::config::Architecture;
use crate::env::EnvironmentDescriptor;
use crate::error::Result;
use crate::layers::{LayerInit, Linear, Module};

use super::{vector_batch, ActorCritic, GaussianPolicy, PolicyOutput};

/// Gaussian policy and value estimate computed by two independent tanh trunks.
///
/// No layer is shared, so the policy partition is exactly the action trunk,
/// the mean head and the log-std.
#[derive(Debug)]
pub struct MlpSeparateContinuous {
    pub action_1: Linear,
    pub action_2: Linear,
    pub mean: Linear,
    pub value_1: Linear,
    pub value_2: Linear,
    pub value: Linear,
    pub gaussian: GaussianPolicy,
    features: usize,
}

impl MlpSeparateContinuous {
    pub fn new<R: Rng + ?Sized>(env: &EnvironmentDescriptor, hidden: usize, rng: &mut R) -> Result<Self> {
        let features = env.observation_features()?;
        let bounds = env.action_bounds()?;
        let action_dim = bounds.dim();
        let init = LayerInit::kaiming_fan_out(Activation::Tanh);

        let model = MlpSeparateContinuous {
            action_1: Linear::new(features, hidden, Activation::Tanh, init, rng)?,
            action_2: Linear::new(hidden, hidden, Activation::Tanh, init, rng)?,
            mean: Linear::new(hidden, action_dim, Activation::Linear, init, rng)?,
            value_1: Linear::new(features, hidden, Activation::Tanh, init, rng)?,
            value_2: Linear::new(hidden, hidden, Activation::Tanh, init, rng)?,
            value: Linear::new(hidden, 1, Activation::Linear, init, rng)?,
            gaussian: GaussianPolicy::new(bounds),
            features,
        };
        debug!(features, hidden, action_dim, "built separate-trunk continuous model");
        Ok(model)
    }

    pub fn forward_batch(&self, observations: ArrayView2<f32>) -> Result<PolicyOutput> {
        let policy = self.action_1.forward(observations)?;
        let policy = self.action_2.forward(policy.view())?;
        let mean = self.gaussian.clip_mean(self.mean.forward(policy.view())?);

        let critic = self.value_1.forward(observations)?;
        let critic = self.value_2.forward(critic.view())?;
        let value = self.value.forward(critic.view())?;

        Ok(PolicyOutput::Gaussian {
            mean,
            std: self.gaussian.std(),
            value,
        })
    }
}

impl ActorCritic for MlpSeparateContinuous {
    fn architecture(&self) -> Architecture {
        Architecture::MlpSeparateContinuous
    }

    fn observation_shape(&self) -> Vec<usize> {
        vec![self.features]
    }

    fn forward(&self, observations: ArrayViewD<'_, f32>) -> Result<PolicyOutput> {
        self.forward_batch(vector_batch(observations, self.features)?)
    }

    fn named_modules(&self) -> Vec<(&'static str, &dyn Module)> {
        vec![
            ("action_1", &self.action_1 as &dyn Module),
            ("action_2", &self.action_2 as &dyn Module),
            ("mean", &self.mean as &dyn Module),
            ("value_1", &self.value_1 as &dyn Module),
            ("value_2", &self.value_2 as &dyn Module),
            ("value", &self.value as &dyn Module),
            ("log_std", &self.gaussian.log_std as &dyn Module),
        ]
    }

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)> {
        vec![
            ("action_1", &mut self.action_1 as &mut dyn Module),
            ("action_2", &mut self.action_2 as &mut dyn Module),
            ("mean", &mut self.mean as &mut dyn Module),
            ("value_1", &mut self.value_1 as &mut dyn Module),
            ("value_2", &mut self.value_2 as &mut dyn Module),
            ("value", &mut self.value as &mut dyn Module),
            ("log_std", &mut self.gaussian.log_std as &mut dyn Module),
        ]
    }

    fn policy_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.action_1 as &dyn Module,
            &self.action_2 as &dyn Module,
            &self.mean as &dyn Module,
            &self.gaussian.log_std as &dyn Module,
        ]
    }

    fn value_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.value_1 as &dyn Module,
            &self.value_2 as &dyn Module,
            &self.value as &dyn Module,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use crate::layers::{Parameter, WeightInit};
    use ndarray::Array2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn model() -> MlpSeparateContinuous {
        let env = EnvironmentDescriptor::vector(5, ActionSpace::continuous(vec![-2.0, 0.0, -1.0], vec![2.0, 1.0, 1.0]))
            .unwrap();
        MlpSeparateContinuous::new(&env, 64, &mut StdRng::seed_from_u64(11)).unwrap()
    }

    #[test]
    fn test_layers_use_tanh_gain() {
        let model = model();
        match model.action_1.init().weight {
            WeightInit::KaimingNormal { nonlinearity, .. } => assert_eq!(nonlinearity, Activation::Tanh),
            other => panic!("unexpected init {:?}", other),
        }
        assert_eq!(model.value_2.activation, Activation::Tanh);
    }

    #[test]
    fn test_value_trunk_does_not_touch_policy() {
        let mut model = model();
        let obs = Array2::from_shape_fn((4, 5), |(i, j)| (i + j) as f32 * 0.1);
        let before = model.forward_batch(obs.view()).unwrap();

        model.value_1.weight.view_mut().fill(3.0);
        model.value.bias.view_mut().fill(-1.0);
        let after = model.forward_batch(obs.view()).unwrap();

        assert_eq!(before.mean(), after.mean());
        assert_ne!(before.value(), after.value());
    }

    #[test]
    fn test_mean_bounds_per_dimension() {
        let model = model();
        let obs = Array2::from_elem((8, 5), 100.0f32);
        let output = model.forward_batch(obs.view()).unwrap();
        for row in output.mean().unwrap().rows() {
            assert!((-2.0..=2.0).contains(&row[0]));
            assert!((0.0..=1.0).contains(&row[1]));
            assert!((-1.0..=1.0).contains(&row[2]));
        }
    }

    #[test]
    fn test_value_partition_is_value_trunk() {
        let model = model();
        let value: Vec<_> = model.value_parameters().map(|p| p.id()).collect();
        let expected = vec![
            model.value_1.weight.id(),
            model.value_1.bias.id(),
            model.value_2.weight.id(),
            model.value_2.bias.id(),
            model.value.weight.id(),
            model.value.bias.id(),
        ];
        assert_eq!(value, expected);
    }
}
