//! Data-driven engine policy and ability catalogs.
//!
//! Engine configuration lives in TOML (`config.toml`), ability catalogs in
//! RON (`abilities.ron`). Every loader validates what it reads, so a value
//! returned from here can be handed to the runtime as-is; a rejected file
//! never replaces the configuration already in use.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{AbilityLoader, ConfigLoader, Content, ContentFactory, LoadResult};
