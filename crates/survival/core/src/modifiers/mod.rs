//! Multiplicative modifier composition shared by depletion and speed.
//!
//! Each [`ModifierRegistry`] holds, per player, a set of multipliers keyed by
//! namespaced [`SourceId`]s. The registry is category-agnostic: callers pick
//! which entries take part in a product through a predicate, typically built
//! from [`SourceCategory`] prefixes.

mod registry;
mod source;

pub use registry::{ModifierDomain, ModifierRegistry, ModifierSet};
pub use source::{SourceCategory, SourceId};
