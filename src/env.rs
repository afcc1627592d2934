//! Environment shape metadata consumed at model construction.
//!
//! Models query a descriptor exactly once, when they are built. Nothing here
//! simulates an environment; it only records what the observations and actions
//! look like.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Action space of an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionSpace {
    /// `n` mutually exclusive actions
    Discrete { n: usize },
    /// `dim`-dimensional box with element-wise bounds
    Continuous { dim: usize, low: Vec<f32>, high: Vec<f32> },
}

impl ActionSpace {
    pub fn discrete(n: usize) -> Self {
        ActionSpace::Discrete { n }
    }

    /// Box space whose dimension is taken from the bounds
    pub fn continuous(low: Vec<f32>, high: Vec<f32>) -> Self {
        ActionSpace::Continuous {
            dim: low.len(),
            low,
            high,
        }
    }

    /// Box space with the same bounds on every dimension
    pub fn symmetric(dim: usize, limit: f32) -> Self {
        ActionSpace::continuous(vec![-limit; dim], vec![limit; dim])
    }

    pub fn is_discrete(&self) -> bool {
        matches!(self, ActionSpace::Discrete { .. })
    }

    /// Number of discrete actions, or the dimension of a continuous action
    pub fn size(&self) -> usize {
        match self {
            ActionSpace::Discrete { n } => *n,
            ActionSpace::Continuous { dim, .. } => *dim,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            ActionSpace::Discrete { n } => {
                if *n == 0 {
                    return Err(ModelError::configuration("action_space.n", "must be at least 1"));
                }
            }
            ActionSpace::Continuous { dim, low, high } => {
                if *dim == 0 {
                    return Err(ModelError::configuration("action_space.dim", "must be at least 1"));
                }
                if low.is_empty() || high.is_empty() {
                    return Err(ModelError::configuration(
                        "action_space",
                        "continuous action space is missing its bounds",
                    ));
                }
                if low.len() != *dim || high.len() != *dim {
                    return Err(ModelError::configuration(
                        "action_space",
                        format!(
                            "bounds must have {} entries, got low={} high={}",
                            dim,
                            low.len(),
                            high.len()
                        ),
                    ));
                }
                for (i, (&lo, &hi)) in low.iter().zip(high.iter()).enumerate() {
                    if lo.is_nan() || hi.is_nan() || lo > hi {
                        return Err(ModelError::configuration(
                            "action_space",
                            format!("invalid bounds on dimension {}: low={} high={}", i, lo, hi),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Element-wise action bounds used to clip a Gaussian mean
#[derive(Debug, Clone, PartialEq)]
pub struct ActionBounds {
    pub low: Array1<f32>,
    pub high: Array1<f32>,
}

impl ActionBounds {
    pub fn dim(&self) -> usize {
        self.low.len()
    }
}

/// Observation shape and action space of an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentDescriptor {
    /// `[features]` for vector observations, `[height, width, channels]` for images
    pub observation_shape: Vec<usize>,
    pub action_space: ActionSpace,
}

impl EnvironmentDescriptor {
    pub fn new(observation_shape: Vec<usize>, action_space: ActionSpace) -> Result<Self> {
        let env = EnvironmentDescriptor {
            observation_shape,
            action_space,
        };
        env.validate()?;
        Ok(env)
    }

    /// Flat vector observations with `features` entries
    pub fn vector(features: usize, action_space: ActionSpace) -> Result<Self> {
        EnvironmentDescriptor::new(vec![features], action_space)
    }

    /// Image observations laid out `height x width x channels`
    pub fn image(height: usize, width: usize, channels: usize, action_space: ActionSpace) -> Result<Self> {
        EnvironmentDescriptor::new(vec![height, width, channels], action_space)
    }

    pub fn validate(&self) -> Result<()> {
        match self.observation_shape.len() {
            1 | 3 => {}
            rank => {
                return Err(ModelError::configuration(
                    "observation_shape",
                    format!(
                        "expected [features] or [height, width, channels], got rank {} ({:?})",
                        rank, self.observation_shape
                    ),
                ))
            }
        }
        if self.observation_shape.iter().any(|&d| d == 0) {
            return Err(ModelError::configuration(
                "observation_shape",
                format!("all dimensions must be positive, got {:?}", self.observation_shape),
            ));
        }
        self.action_space.validate()
    }

    pub fn is_image(&self) -> bool {
        self.observation_shape.len() == 3
    }

    /// Feature count of a vector observation
    pub fn observation_features(&self) -> Result<usize> {
        match self.observation_shape.as_slice() {
            [features] if *features > 0 => Ok(*features),
            other => Err(ModelError::configuration(
                "observation_shape",
                format!("expected a vector observation [features], got {:?}", other),
            )),
        }
    }

    /// `(height, width, channels)` of an image observation
    pub fn image_shape(&self) -> Result<(usize, usize, usize)> {
        match self.observation_shape.as_slice() {
            [h, w, c] if *h > 0 && *w > 0 && *c > 0 => Ok((*h, *w, *c)),
            other => Err(ModelError::configuration(
                "observation_shape",
                format!("expected an image observation [height, width, channels], got {:?}", other),
            )),
        }
    }

    /// Number of actions of a discrete action space
    pub fn num_actions(&self) -> Result<usize> {
        self.action_space.validate()?;
        match &self.action_space {
            ActionSpace::Discrete { n } => Ok(*n),
            ActionSpace::Continuous { .. } => Err(ModelError::configuration(
                "action_space",
                "expected a discrete action space, got a continuous one",
            )),
        }
    }

    /// Bounds of a continuous action space
    pub fn action_bounds(&self) -> Result<ActionBounds> {
        self.action_space.validate()?;
        match &self.action_space {
            ActionSpace::Continuous { low, high, .. } => Ok(ActionBounds {
                low: Array1::from_vec(low.clone()),
                high: Array1::from_vec(high.clone()),
            }),
            ActionSpace::Discrete { .. } => Err(ModelError::configuration(
                "action_space",
                "expected a continuous action space with bounds, got a discrete one",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_descriptor() {
        let env = EnvironmentDescriptor::vector(8, ActionSpace::symmetric(2, 1.0)).unwrap();
        assert_eq!(env.observation_features().unwrap(), 8);
        assert!(!env.is_image());
        let bounds = env.action_bounds().unwrap();
        assert_eq!(bounds.dim(), 2);
        assert_eq!(bounds.low.to_vec(), vec![-1.0, -1.0]);
        assert!(env.num_actions().is_err());
    }

    #[test]
    fn test_image_descriptor() {
        let env = EnvironmentDescriptor::image(84, 84, 4, ActionSpace::discrete(6)).unwrap();
        assert_eq!(env.image_shape().unwrap(), (84, 84, 4));
        assert_eq!(env.num_actions().unwrap(), 6);
        assert!(env.observation_features().is_err());
    }

    #[test]
    fn test_missing_bounds_rejected() {
        let space = ActionSpace::Continuous { dim: 2, low: vec![], high: vec![] };
        let err = EnvironmentDescriptor::vector(4, space).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let space = ActionSpace::continuous(vec![1.0, 0.0], vec![-1.0, 1.0]);
        assert!(EnvironmentDescriptor::vector(4, space).is_err());
    }

    #[test]
    fn test_mismatched_bound_lengths_rejected() {
        let space = ActionSpace::Continuous { dim: 3, low: vec![-1.0; 3], high: vec![1.0; 2] };
        assert!(EnvironmentDescriptor::vector(4, space).is_err());
    }

    #[test]
    fn test_malformed_observation_rejected() {
        assert!(EnvironmentDescriptor::new(vec![4, 4], ActionSpace::discrete(2)).is_err());
        assert!(EnvironmentDescriptor::new(vec![], ActionSpace::discrete(2)).is_err());
        assert!(EnvironmentDescriptor::vector(0, ActionSpace::discrete(2)).is_err());
        assert!(EnvironmentDescriptor::vector(3, ActionSpace::discrete(0)).is_err());
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "observation_shape": [3],
            "action_space": { "Continuous": { "dim": 1, "low": [-2.0], "high": [2.0] } }
        }"#;
        let env: EnvironmentDescriptor = serde_json::from_str(json).unwrap();
        env.validate().unwrap();
        assert_eq!(env.action_space.size(), 1);
    }

    #[test]
    fn test_json_round_trip_keeps_bounds() {
        let env = EnvironmentDescriptor::image(36, 36, 1, ActionSpace::continuous(vec![-1.0, 0.0], vec![1.0, 3.0])).unwrap();
        let json = serde_json::to_string(&env).unwrap();
        let restored: EnvironmentDescriptor = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, env);

        let bounds = restored.action_bounds().unwrap();
        assert_eq!(bounds.high, Array1::from_vec(vec![1.0, 3.0]));
        assert_eq!(bounds.dim(), 2);
    }
}
