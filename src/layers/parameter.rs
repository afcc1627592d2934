//! Trainable tensors with a stable identity.
//!
//! Every weight, bias and learned vector in a model is a [`Param`]. Each one is
//! tagged with a process-unique [`ParamId`] at creation, so optimizers can tell
//! two handles to the same tensor apart from two tensors that merely hold equal
//! values.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use ndarray::{Array, ArrayViewD, ArrayViewMutD, Dimension};

static NEXT_PARAM_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of one trainable tensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParamId(u64);

impl ParamId {
    fn next() -> Self {
        ParamId(NEXT_PARAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ParamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "param#{}", self.0)
    }
}

/// Object-safe view of a trainable tensor, independent of its rank.
///
/// This is the handle type yielded by parameter selectors. Reading goes through
/// [`Parameter::view`]; optimizers update values in place through
/// [`Parameter::view_mut`].
pub trait Parameter: Send + Sync {
    fn id(&self) -> ParamId;

    fn shape(&self) -> &[usize];

    /// Number of scalar entries
    fn len(&self) -> usize {
        self.shape().iter().product()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn view(&self) -> ArrayViewD<'_, f32>;

    fn view_mut(&mut self) -> ArrayViewMutD<'_, f32>;
}

/// A trainable tensor of fixed rank `D`
#[derive(Debug)]
pub struct Param<D: Dimension> {
    id: ParamId,
    value: Array<f32, D>,
}

impl<D: Dimension> Param<D> {
    pub fn new(value: Array<f32, D>) -> Self {
        Param {
            id: ParamId::next(),
            value,
        }
    }

    pub fn value(&self) -> &Array<f32, D> {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Array<f32, D> {
        &mut self.value
    }
}

impl<D: Dimension> Parameter for Param<D> {
    fn id(&self) -> ParamId {
        self.id
    }

    fn shape(&self) -> &[usize] {
        self.value.shape()
    }

    fn view(&self) -> ArrayViewD<'_, f32> {
        self.value.view().into_dyn()
    }

    fn view_mut(&mut self) -> ArrayViewMutD<'_, f32> {
        self.value.view_mut().into_dyn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_ids_are_unique() {
        let a = Param::new(Array1::<f32>::zeros(3));
        let b = Param::new(Array1::<f32>::zeros(3));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.value(), b.value());
    }

    #[test]
    fn test_ids_increase_and_display() {
        let first = Param::new(Array1::<f32>::zeros(1)).id();
        let second = Param::new(Array1::<f32>::zeros(1)).id();
        assert!(second.value() > first.value());
        assert!(second > first);
        assert_eq!(first.to_string(), format!("param#{}", first.value()));
    }

    #[test]
    fn test_dynamic_view_reflects_mutation() {
        let mut p = Param::new(Array2::<f32>::zeros((2, 3)));
        assert_eq!(p.shape(), &[2, 3]);
        assert_eq!(Parameter::len(&p), 6);

        p.view_mut().fill(1.5);
        assert!(p.value().iter().all(|&v| v == 1.5));
        assert_eq!(p.view().sum(), 9.0);
    }
}
