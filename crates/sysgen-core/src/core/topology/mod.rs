//! # Topology Module
//!
//! Derivation of bonded terms from a raw bond graph.
//!
//! ## Overview
//!
//! Force fields attach bonded parameters to every bond, every bond angle, and
//! every proper torsion of a molecule. This module derives the latter two from
//! the bond list alone:
//!
//! - **Bond graph** - [`bonded::adjacency`] builds the symmetric neighbor sets
//! - **Angles** - [`bonded::enumerate_angles`] visits every bond in both directions
//! - **Proper torsions** - [`bonded::enumerate_propers`] extends every angle by one bond
//!
//! Every term is stored in a canonical orientation and collected into a
//! `BTreeSet`, so enumeration is duplicate-free and its output order is
//! deterministic.
//!
//! ## Usage
//!
//! ```ignore
//! use sysgen::core::topology::bonded::BondedTerms;
//!
//! let terms = BondedTerms::from_bonds(4, vec![(0, 1), (1, 2), (2, 3)])?;
//! assert_eq!(terms.angles.len(), 2);
//! assert_eq!(terms.propers.len(), 1);
//! ```

pub mod bonded;
