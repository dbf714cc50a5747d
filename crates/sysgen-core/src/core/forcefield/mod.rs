//! # Force Field Module
//!
//! Parameter assignment for particle systems. A force-field engine turns a
//! [`Topology`](crate::core::models::topology::Topology) into a
//! [`ParticleSystem`](crate::core::models::system::ParticleSystem), asking a
//! template backend for residues its own tables do not cover.
//!
//! ## Key Components
//!
//! - [`params`] - Tabulated parameter sets stored as TOML
//! - [`engine`] - The [`engine::ForceFieldEngine`] contract, its options and errors
//! - [`template`] - [`template::TemplateForceField`], the residue-template engine
//! - [`dummy`] - Placeholder parameters for any topology
//!
//! ## Usage
//!
//! ```ignore
//! use sysgen::core::forcefield::engine::{EngineOptions, ForceFieldEngine};
//! use sysgen::core::forcefield::template::TemplateForceField;
//!
//! let forcefield = TemplateForceField::load(&["amber14.toml"])?;
//! let system = forcefield.create_system(&topology, &EngineOptions::default(), None)?;
//! ```

pub mod dummy;
pub mod engine;
pub mod params;
pub(crate) mod potentials;
pub mod template;
