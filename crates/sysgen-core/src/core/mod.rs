//! # Core Module
//!
//! The stateless building blocks of sysgen: data models, bonded-term
//! enumeration, force-field parameter assignment, and small-molecule template
//! backends.
//!
//! ## Architecture
//!
//! - **Molecular Representation** ([`models`]) - Topologies, molecules, and assembled particle systems
//! - **Bonded Terms** ([`topology`]) - Angle and proper torsion enumeration from the bond graph
//! - **Parameter Assignment** ([`forcefield`]) - Parameter sets, engines, and the dummy assigner
//! - **Template Backends** ([`templates`]) - On-demand parameterization of small molecules
//! - **Utilities** ([`utils`]) - Static identifier tables

pub mod forcefield;
pub mod models;
pub mod templates;
pub mod topology;
pub mod utils;
