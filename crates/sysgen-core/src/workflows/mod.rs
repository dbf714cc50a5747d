//! # Workflows Module
//!
//! High-level entry points that turn topologies into finished particle systems.
//!
//! - [`config`] - [`config::GeneratorConfig`], its builder, and the TOML loader
//! - [`generator`] - [`generator::SystemGenerator`], the system composer
//!
//! ## Usage
//!
//! ```ignore
//! use sysgen::workflows::config::GeneratorConfigBuilder;
//! use sysgen::workflows::generator::SystemGenerator;
//!
//! let config = GeneratorConfigBuilder::new()
//!     .forcefield("amber14.toml".into())
//!     .small_molecule_forcefield("dummy")
//!     .build()?;
//! let mut generator = SystemGenerator::new(config, &[ligand])?;
//! let system = generator.create_system(&topology, &[])?;
//! ```

pub mod config;
pub mod generator;
