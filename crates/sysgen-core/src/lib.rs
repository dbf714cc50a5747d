//! # sysgen Core Library
//!
//! Assembles simulation-ready particle systems from a molecular topology, a
//! tabulated biopolymer force field, and an optional small-molecule template
//! backend that parameterizes ligands on demand.
//!
//! ## Architectural Philosophy
//!
//! The library is split into two layers with a clear separation of concerns.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Topology`,
//!   `ParticleSystem`), bonded-term enumeration, parameter sets, the
//!   force-field engines, and the template backends with their registry.
//!
//! - **[`workflows`]: The Public API.** The [`workflows::generator::SystemGenerator`]
//!   ties an engine and a template backend together with its configuration,
//!   and applies the per-system finishing steps: barostat, disabled-term
//!   zeroing, and an optional post-processing hook.

pub mod core;
pub mod workflows;
