//! Model configuration: which architecture to build, how wide its hidden
//! layers are, and how to seed initialization.
//!
//! Configurations are plain serde structs, so a training harness can load them
//! from JSON or assemble them with [`ModelConfigBuilder`].

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::env::EnvironmentDescriptor;
use crate::error::{ModelError, Result};

/// The five actor-critic architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Architecture {
    /// Vector input, shared ReLU trunk, Gaussian policy
    MlpSharedContinuous,
    /// Vector input, independent tanh trunks for policy and value, Gaussian policy
    MlpSeparateContinuous,
    /// Vector input, shared ReLU trunk, categorical policy
    MlpDiscrete,
    /// Image input, convolutional features, categorical policy
    ConvDiscrete,
    /// Image input, convolutional features, Gaussian policy
    ConvContinuous,
}

impl Architecture {
    pub const ALL: [Architecture; 5] = [
        Architecture::MlpSharedContinuous,
        Architecture::MlpSeparateContinuous,
        Architecture::MlpDiscrete,
        Architecture::ConvDiscrete,
        Architecture::ConvContinuous,
    ];

    /// Pick the architecture that fits an environment.
    ///
    /// `share_params` only matters for vector observations with continuous
    /// actions, where it selects the shared trunk over separate trunks.
    pub fn infer(env: &EnvironmentDescriptor, share_params: bool) -> Result<Self> {
        env.validate()?;
        let discrete = env.action_space.is_discrete();
        Ok(match (env.is_image(), discrete) {
            (false, true) => Architecture::MlpDiscrete,
            (false, false) if share_params => Architecture::MlpSharedContinuous,
            (false, false) => Architecture::MlpSeparateContinuous,
            (true, true) => Architecture::ConvDiscrete,
            (true, false) => Architecture::ConvContinuous,
        })
    }

    /// Hidden width used when the configuration does not set one
    pub fn default_hidden(&self) -> usize {
        match self {
            Architecture::MlpSeparateContinuous => 64,
            _ => 256,
        }
    }

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            Architecture::MlpSharedContinuous
                | Architecture::MlpSeparateContinuous
                | Architecture::ConvContinuous
        )
    }

    pub fn is_convolutional(&self) -> bool {
        matches!(self, Architecture::ConvDiscrete | Architecture::ConvContinuous)
    }

    /// Check that an environment has the observation and action kinds this
    /// architecture expects
    pub fn check_compatible(&self, env: &EnvironmentDescriptor) -> Result<()> {
        if self.is_convolutional() != env.is_image() {
            return Err(ModelError::configuration(
                "architecture",
                format!(
                    "{} expects {} observations, environment provides {:?}",
                    self,
                    if self.is_convolutional() { "image" } else { "vector" },
                    env.observation_shape
                ),
            ));
        }
        if self.is_continuous() == env.action_space.is_discrete() {
            return Err(ModelError::configuration(
                "architecture",
                format!(
                    "{} expects {} actions",
                    self,
                    if self.is_continuous() { "continuous" } else { "discrete" }
                ),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Architecture::MlpSharedContinuous => "mlp-shared-continuous",
            Architecture::MlpSeparateContinuous => "mlp-separate-continuous",
            Architecture::MlpDiscrete => "mlp-discrete",
            Architecture::ConvDiscrete => "conv-discrete",
            Architecture::ConvContinuous => "conv-continuous",
        };
        write!(f, "{}", name)
    }
}

/// Construction-time configuration for a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Architecture to build; inferred from the environment when unset
    pub architecture: Option<Architecture>,
    /// Hidden-layer width; the architecture's default when unset
    pub hidden: Option<usize>,
    /// Share the trunk between policy and value for continuous vector inputs
    pub share_params: bool,
    /// Seed for parameter initialization
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            architecture: None,
            hidden: None,
            share_params: true,
            seed: None,
        }
    }
}

impl ModelConfig {
    pub fn builder() -> ModelConfigBuilder {
        ModelConfigBuilder::new()
    }

    /// Architecture for `env`: the configured one if set, inferred otherwise
    pub fn resolve_architecture(&self, env: &EnvironmentDescriptor) -> Result<Architecture> {
        let architecture = match self.architecture {
            Some(architecture) => architecture,
            None => Architecture::infer(env, self.share_params)?,
        };
        architecture.check_compatible(env)?;
        Ok(architecture)
    }

    /// Hidden width for `architecture`
    pub fn resolve_hidden(&self, architecture: Architecture) -> Result<usize> {
        match self.hidden {
            Some(0) => Err(ModelError::configuration("hidden", "must be positive")),
            Some(hidden) => Ok(hidden),
            None => {
                let hidden = architecture.default_hidden();
                warn!(%architecture, hidden, "hidden width not configured, using default");
                Ok(hidden)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.hidden == Some(0) {
            return Err(ModelError::configuration("hidden", "must be positive"));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModelConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        ModelConfig::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for [`ModelConfig`]
pub struct ModelConfigBuilder {
    config: ModelConfig,
}

impl ModelConfigBuilder {
    pub fn new() -> Self {
        ModelConfigBuilder {
            config: ModelConfig::default(),
        }
    }

    pub fn architecture(mut self, architecture: Architecture) -> Self {
        self.config.architecture = Some(architecture);
        self
    }

    pub fn hidden(mut self, hidden: usize) -> Self {
        self.config.hidden = Some(hidden);
        self
    }

    pub fn share_params(mut self, share: bool) -> Self {
        self.config.share_params = share;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<ModelConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ModelConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use std::io::Write;

    #[test]
    fn test_infer_architecture() {
        let continuous = EnvironmentDescriptor::vector(3, ActionSpace::symmetric(1, 2.0)).unwrap();
        let discrete = EnvironmentDescriptor::vector(4, ActionSpace::discrete(2)).unwrap();
        let atari = EnvironmentDescriptor::image(84, 84, 4, ActionSpace::discrete(6)).unwrap();
        let pixels = EnvironmentDescriptor::image(64, 64, 3, ActionSpace::symmetric(3, 1.0)).unwrap();

        assert_eq!(Architecture::infer(&continuous, true).unwrap(), Architecture::MlpSharedContinuous);
        assert_eq!(Architecture::infer(&continuous, false).unwrap(), Architecture::MlpSeparateContinuous);
        assert_eq!(Architecture::infer(&discrete, true).unwrap(), Architecture::MlpDiscrete);
        assert_eq!(Architecture::infer(&atari, true).unwrap(), Architecture::ConvDiscrete);
        assert_eq!(Architecture::infer(&pixels, false).unwrap(), Architecture::ConvContinuous);
    }

    #[test]
    fn test_incompatible_architecture_rejected() {
        let discrete = EnvironmentDescriptor::vector(4, ActionSpace::discrete(2)).unwrap();
        let config = ModelConfig::builder()
            .architecture(Architecture::MlpSharedContinuous)
            .build()
            .unwrap();
        assert!(config.resolve_architecture(&discrete).unwrap_err().is_configuration());

        let config = ModelConfig::builder()
            .architecture(Architecture::ConvDiscrete)
            .build()
            .unwrap();
        assert!(config.resolve_architecture(&discrete).is_err());
    }

    #[test]
    fn test_default_hidden_widths() {
        let config = ModelConfig::default();
        assert_eq!(config.resolve_hidden(Architecture::MlpSeparateContinuous).unwrap(), 64);
        assert_eq!(config.resolve_hidden(Architecture::ConvDiscrete).unwrap(), 256);

        let config = ModelConfig::builder().hidden(32).build().unwrap();
        assert_eq!(config.resolve_hidden(Architecture::MlpDiscrete).unwrap(), 32);
    }

    #[test]
    fn test_zero_hidden_rejected() {
        assert!(ModelConfig::builder().hidden(0).build().is_err());
        assert!(ModelConfig::from_json_str(r#"{"hidden": 0}"#).is_err());
    }

    #[test]
    fn test_json_defaults_and_round_trip() {
        let config = ModelConfig::from_json_str(r#"{"architecture": "ConvContinuous"}"#).unwrap();
        assert_eq!(config.architecture, Some(Architecture::ConvContinuous));
        assert!(config.share_params);
        assert_eq!(config.hidden, None);

        let json = config.to_json_string().unwrap();
        assert_eq!(ModelConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"hidden": 128, "share_params": false, "seed": 9}}"#).unwrap();

        let config = ModelConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.hidden, Some(128));
        assert!(!config.share_params);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ModelConfig::from_json_file("/nonexistent/acnets/config.json").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
