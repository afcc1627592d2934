use ndarray::{ArrayView4, ArrayViewD};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::config::Architecture;
use crate::env::EnvironmentDescriptor;
use crate::error::Result;
use crate::layers::{LayerInit, Linear, Module};

use super::{image_batch, ActorCritic, ConvEncoder, PolicyOutput};

/// Categorical policy over convolutional image features.
///
/// The encoder is shared; the action and value heads each get their own hidden
/// ReLU layer.
#[derive(Debug)]
pub struct ConvDiscrete {
    pub encoder: ConvEncoder,
    pub fc_action: Linear,
    pub action: Linear,
    pub fc_value: Linear,
    pub value: Linear,
}

impl ConvDiscrete {
    pub fn new<R: Rng + ?Sized>(env: &EnvironmentDescriptor, hidden: usize, rng: &mut R) -> Result<Self> {
        let input_shape = env.image_shape()?;
        let num_actions = env.num_actions()?;
        let init = LayerInit::framework_default();

        let encoder = ConvEncoder::new(input_shape, init, rng)?;
        let conv_dim = encoder.output_dim();
        let model = ConvDiscrete {
            fc_action: Linear::new(conv_dim, hidden, Activation::Relu, init, rng)?,
            action: Linear::new(hidden, num_actions, Activation::Linear, init, rng)?,
            fc_value: Linear::new(conv_dim, hidden, Activation::Relu, init, rng)?,
            value: Linear::new(hidden, 1, Activation::Linear, init, rng)?,
            encoder,
        };
        debug!(?input_shape, conv_dim, hidden, num_actions, "built convolutional discrete model");
        Ok(model)
    }

    pub fn num_actions(&self) -> usize {
        self.action.output_size()
    }

    /// Evaluate `[batch, height, width, channels]` images
    pub fn forward_batch(&self, images: ArrayView4<f32>) -> Result<PolicyOutput> {
        let features = self.encoder.forward(images)?;
        let action = self.fc_action.forward(features.view())?;
        let critic = self.fc_value.forward(features.view())?;
        Ok(PolicyOutput::Categorical {
            logits: self.action.forward(action.view())?,
            value: self.value.forward(critic.view())?,
        })
    }
}

impl ActorCritic for ConvDiscrete {
    fn architecture(&self) -> Architecture {
        Architecture::ConvDiscrete
    }

    fn observation_shape(&self) -> Vec<usize> {
        let (h, w, c) = self.encoder.input_shape();
        vec![h, w, c]
    }

    fn forward(&self, observations: ArrayViewD<'_, f32>) -> Result<PolicyOutput> {
        self.forward_batch(image_batch(observations, self.encoder.input_shape())?)
    }

    fn named_modules(&self) -> Vec<(&'static str, &dyn Module)> {
        vec![
            ("conv1", &self.encoder.conv1 as &dyn Module),
            ("conv2", &self.encoder.conv2 as &dyn Module),
            ("fc_action", &self.fc_action as &dyn Module),
            ("action", &self.action as &dyn Module),
            ("fc_value", &self.fc_value as &dyn Module),
            ("value", &self.value as &dyn Module),
        ]
    }

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)> {
        vec![
            ("conv1", &mut self.encoder.conv1 as &mut dyn Module),
            ("conv2", &mut self.encoder.conv2 as &mut dyn Module),
            ("fc_action", &mut self.fc_action as &mut dyn Module),
            ("action", &mut self.action as &mut dyn Module),
            ("fc_value", &mut self.fc_value as &mut dyn Module),
            ("value", &mut self.value as &mut dyn Module),
        ]
    }

    fn policy_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.encoder.conv1 as &dyn Module,
            &self.encoder.conv2 as &dyn Module,
            &self.fc_action as &dyn Module,
            &self.action as &dyn Module,
        ]
    }

    fn value_modules(&self) -> Vec<&dyn Module> {
        vec![&self.fc_value as &dyn Module, &self.value as &dyn Module]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use crate::layers::Parameter;
    use ndarray::Array4;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_atari_shapes() {
        let env = EnvironmentDescriptor::image(84, 84, 4, ActionSpace::discrete(6)).unwrap();
        let model = ConvDiscrete::new(&env, 64, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(model.fc_action.input_size(), 2592);
        assert_eq!(model.observation_shape(), vec![84, 84, 4]);

        let output = model.forward(Array4::<f32>::zeros((2, 84, 84, 4)).into_dyn().view()).unwrap();
        assert_eq!(output.logits().unwrap().dim(), (2, 6));
        assert_eq!(output.value().dim(), (2, 1));
    }

    #[test]
    fn test_biases_use_fan_in_bound() {
        let env = EnvironmentDescriptor::image(36, 36, 1, ActionSpace::discrete(3)).unwrap();
        let model = ConvDiscrete::new(&env, 16, &mut StdRng::seed_from_u64(1)).unwrap();
        let bound = 1.0 / (model.fc_value.input_size() as f32).sqrt();
        assert!(model.fc_value.bias.value().iter().all(|b| b.abs() <= bound));
        assert!(model.fc_value.bias.value().iter().any(|&b| b != 0.0));
    }

    #[test]
    fn test_tiny_image_rejected() {
        let env = EnvironmentDescriptor::image(10, 10, 3, ActionSpace::discrete(2)).unwrap();
        let err = ConvDiscrete::new(&env, 16, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_channel_first_batch_rejected() {
        let env = EnvironmentDescriptor::image(36, 36, 3, ActionSpace::discrete(2)).unwrap();
        let model = ConvDiscrete::new(&env, 16, &mut StdRng::seed_from_u64(0)).unwrap();
        let err = model.forward(Array4::<f32>::zeros((1, 3, 36, 36)).into_dyn().view()).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_encoder_belongs_to_policy() {
        let env = EnvironmentDescriptor::image(36, 36, 1, ActionSpace::discrete(2)).unwrap();
        let model = ConvDiscrete::new(&env, 8, &mut StdRng::seed_from_u64(0)).unwrap();
        let policy: Vec<_> = model.policy_parameters().map(|p| p.id()).collect();
        assert!(policy.contains(&model.encoder.conv1.kernels.id()));
        assert!(policy.contains(&model.encoder.conv2.biases.id()));
        assert!(!policy.contains(&model.fc_value.weight.id()));
    }
}
