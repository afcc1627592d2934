use ndarray::{azip, Array2, Ix2};

use crate::env::ActionBounds;
use crate::layers::Param;

/// Learned, observation-independent log-std plus the action bounds used to
/// clip the Gaussian mean.
#[derive(Debug)]
pub struct GaussianPolicy {
    /// `[1, action_dim]`, initialized to zero
    pub log_std: Param<Ix2>,
    bounds: ActionBounds,
}

impl GaussianPolicy {
    pub fn new(bounds: ActionBounds) -> Self {
        GaussianPolicy {
            log_std: Param::new(Array2::zeros((1, bounds.dim()))),
            bounds,
        }
    }

    pub fn action_dim(&self) -> usize {
        self.bounds.dim()
    }

    pub fn bounds(&self) -> &ActionBounds {
        &self.bounds
    }

    /// Clamp every row of `mean` into `[low, high]`.
    ///
    /// This only keeps the mean legal; samples drawn around it may still fall
    /// outside the bounds.
    pub fn clip_mean(&self, mut mean: Array2<f32>) -> Array2<f32> {
        for mut row in mean.rows_mut() {
            azip!((m in &mut row, &low in &self.bounds.low, &high in &self.bounds.high) {
                *m = m.max(low).min(high);
            });
        }
        mean
    }

    /// `exp(log_std)`, floored at the smallest positive normal `f32` so it
    /// stays strictly positive
    pub fn std(&self) -> Array2<f32> {
        self.log_std.value().mapv(|v| v.exp().max(f32::MIN_POSITIVE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2};

    fn policy() -> GaussianPolicy {
        GaussianPolicy::new(ActionBounds {
            low: arr1(&[-1.0, 0.0]),
            high: arr1(&[1.0, 5.0]),
        })
    }

    #[test]
    fn test_log_std_matches_bounds() {
        let policy = policy();
        assert_eq!(policy.action_dim(), 2);
        assert_eq!(policy.log_std.value().dim(), (1, policy.action_dim()));
        assert_eq!(policy.bounds().high, arr1(&[1.0, 5.0]));
    }

    #[test]
    fn test_clip_mean_per_dimension() {
        let clipped = policy().clip_mean(arr2(&[[-3.0, -3.0], [0.5, 2.0], [9.0, 9.0]]));
        assert_eq!(clipped, arr2(&[[-1.0, 0.0], [0.5, 2.0], [1.0, 5.0]]));
    }

    #[test]
    fn test_clip_mean_handles_nan() {
        let clipped = policy().clip_mean(arr2(&[[f32::NAN, f32::NAN]]));
        assert!(clipped.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_std_starts_at_one() {
        let policy = policy();
        assert_eq!(policy.std(), arr2(&[[1.0, 1.0]]));
    }

    #[test]
    fn test_std_positive_for_extreme_log_std() {
        let mut policy = policy();
        *policy.log_std.value_mut() = arr2(&[[-1.0e4, -200.0]]);
        assert!(policy.std().iter().all(|&s| s > 0.0));
    }
}
