use ndarray::{ArrayView4, ArrayViewD};
use rand::Rng;
use tracing::debug;

use crate::activations::Activation;
use crate::config::Architecture;
use crate::env::EnvironmentDescriptor;
use crate::error::Result;
use crate::layers::{LayerInit, Linear, Module};

use super::{image_batch, ActorCritic, ConvEncoder, GaussianPolicy, PolicyOutput};

/// Bounded Gaussian policy over convolutional image features.
///
/// Same layout as [`super::ConvDiscrete`], with a mean head clipped to the
/// action bounds and a learned log-std in place of the logits head.
#[derive(Debug)]
pub struct ConvContinuous {
    pub encoder: ConvEncoder,
    pub fc_action: Linear,
    pub mean: Linear,
    pub fc_value: Linear,
    pub value: Linear,
    pub gaussian: GaussianPolicy,
}

impl ConvContinuous {
    pub fn new<R: Rng + ?Sized>(env: &EnvironmentDescriptor, hidden: usize, rng: &mut R) -> Result<Self> {
        let input_shape = env.image_shape()?;
        let bounds = env.action_bounds()?;
        let action_dim = bounds.dim();
        let init = LayerInit::framework_default();

        let encoder = ConvEncoder::new(input_shape, init, rng)?;
        let conv_dim = encoder.output_dim();
        let model = ConvContinuous {
            fc_action: Linear::new(conv_dim, hidden, Activation::Relu, init, rng)?,
            mean: Linear::new(hidden, action_dim, Activation::Linear, init, rng)?,
            fc_value: Linear::new(conv_dim, hidden, Activation::Relu, init, rng)?,
            value: Linear::new(hidden, 1, Activation::Linear, init, rng)?,
            gaussian: GaussianPolicy::new(bounds),
            encoder,
        };
        debug!(?input_shape, conv_dim, hidden, action_dim, "built convolutional continuous model");
        Ok(model)
    }

    /// Evaluate `[batch, height, width, channels]` images
    pub fn forward_batch(&self, images: ArrayView4<f32>) -> Result<PolicyOutput> {
        let features = self.encoder.forward(images)?;
        let action = self.fc_action.forward(features.view())?;
        let critic = self.fc_value.forward(features.view())?;
        Ok(PolicyOutput::Gaussian {
            mean: self.gaussian.clip_mean(self.mean.forward(action.view())?),
            std: self.gaussian.std(),
            value: self.value.forward(critic.view())?,
        })
    }
}

impl ActorCritic for ConvContinuous {
    fn architecture(&self) -> Architecture {
        Architecture::ConvContinuous
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
            ("mean", &self.mean as &dyn Module),
            ("fc_value", &self.fc_value as &dyn Module),
            ("value", &self.value as &dyn Module),
            ("log_std", &self.gaussian.log_std as &dyn Module),
        ]
    }

    fn named_modules_mut(&mut self) -> Vec<(&'static str, &mut dyn Module)> {
        vec![
            ("conv1", &mut self.encoder.conv1 as &mut dyn Module),
            ("conv2", &mut self.encoder.conv2 as &mut dyn Module),
            ("fc_action", &mut self.fc_action as &mut dyn Module),
            ("mean", &mut self.mean as &mut dyn Module),
            ("fc_value", &mut self.fc_value as &mut dyn Module),
            ("value", &mut self.value as &mut dyn Module),
            ("log_std", &mut self.gaussian.log_std as &mut dyn Module),
        ]
    }

    fn policy_modules(&self) -> Vec<&dyn Module> {
        vec![
            &self.encoder.conv1 as &dyn Module,
            &self.encoder.conv2 as &dyn Module,
            &self.fc_action as &dyn Module,
            &self.mean as &dyn Module,
            &self.gaussian.log_std as &dyn Module,
        ]
    }

    fn value_modules(&self) -> Vec<&dyn Module> {
        vec![&self.fc_value as &dyn Module, &self.value as &dyn Module]
    }
}
