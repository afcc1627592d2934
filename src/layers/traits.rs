use ndarray::Dimension;

use super::parameter::{Param, Parameter};

/// Lazily-produced sequence of parameter handles borrowed from a model
pub type ParamIter<'a> = Box<dyn Iterator<Item = &'a dyn Parameter> + 'a>;

/// Trait for anything that owns trainable parameters.
///
/// Layers implement it, and so does a bare [`Param`], which is simply a module
/// holding exactly one tensor. Models list their modules explicitly, so a
/// selector is nothing more than a flattened walk over a fixed list of owners.
pub trait Module: Send + Sync {
    /// Parameters with their local names, in declaration order
    fn named_parameters(&self) -> Vec<(&'static str, &dyn Parameter)>;

    /// Mutable parameters with their local names, in declaration order
    fn named_parameters_mut(&mut self) -> Vec<(&'static str, &mut dyn Parameter)>;

    fn parameters(&self) -> ParamIter<'_> {
        Box::new(self.named_parameters().into_iter().map(|(_, p)| p))
    }

    /// Total number of scalar entries across all parameters
    fn num_parameters(&self) -> usize {
        self.parameters().map(|p| p.len()).sum()
    }
}

impl<D: Dimension> Module for Param<D> {
    fn named_parameters(&self) -> Vec<(&'static str, &dyn Parameter)> {
        vec![("", self as &dyn Parameter)]
    }

    fn named_parameters_mut(&mut self) -> Vec<(&'static str, &mut dyn Parameter)> {
        vec![("", self as &mut dyn Parameter)]
    }

    fn parameters(&self) -> ParamIter<'_> {
        Box::new(std::iter::once(self as &dyn Parameter))
    }
}

/// Flatten a list of modules into one parameter sequence
pub fn flatten_modules<'a, I>(modules: I) -> ParamIter<'a>
where
    I: IntoIterator<Item = &'a dyn Module>,
    I::IntoIter: 'a,
{
    Box::new(modules.into_iter().flat_map(|m| m.parameters()))
}

/// Join a module name and a local parameter name into a dotted path
pub fn qualified_name(module: &str, local: &str) -> String {
    if local.is_empty() {
        module.to_string()
    } else {
        format!("{}.{}", module, local)
    }
}
