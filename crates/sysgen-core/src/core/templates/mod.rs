//! # Template Backends Module
//!
//! Small-molecule template generation. A template backend parameterizes
//! molecules that the tabulated biopolymer force field has no templates for,
//! producing [`ParameterSet`](crate::core::forcefield::params::ParameterSet)s
//! that the engine layers above its own data.
//!
//! ## Key Components
//!
//! - [`backend`] - The [`backend::TemplateBackend`] and [`backend::TemplateBackendFactory`] contracts
//! - [`registry`] - Selection of a backend by force-field identifier
//! - [`dummy`] - The built-in placeholder backend with its TOML cache

pub mod backend;
pub mod dummy;
pub mod registry;
