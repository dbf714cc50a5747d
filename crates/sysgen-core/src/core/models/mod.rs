//! # Core Models Module
//!
//! Data structures shared by every system builder in sysgen: the input
//! topology, the small molecules handed to template backends, and the
//! assembled particle system.
//!
//! ## Key Components
//!
//! - [`atom`] - Atoms and chemical elements
//! - [`residue`] - Residues, the unit of force-field template matching
//! - [`topology`] - Bonds and the read-only [`topology::Topology`] input
//! - [`molecule`] - Small molecules parameterized on demand by template backends
//! - [`system`] - The assembled [`system::ParticleSystem`] and its force terms
//!
//! ## Usage
//!
//! ```ignore
//! use sysgen::core::models::{atom::Element, topology::Topology};
//!
//! let mut topology = Topology::new();
//! let res = topology.add_residue("HOH", 'W');
//! let o = topology.add_atom("O", Some(Element::O), res).unwrap();
//! let h1 = topology.add_atom("H1", Some(Element::H), res).unwrap();
//! topology.add_bond(o, h1);
//! ```

pub mod atom;
pub mod molecule;
pub mod residue;
pub mod system;
pub mod topology;
