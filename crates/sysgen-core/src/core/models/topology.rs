use super::atom::{Atom, Element};
use super::residue::Residue;
use nalgebra::Vector3;

/// An undirected bond between two atoms of a [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bond {
    pub atom1: usize, // Index of the first atom
    pub atom2: usize, // Index of the second atom
}

impl Bond {
    pub fn new(atom1: usize, atom2: usize) -> Self {
        Self { atom1, atom2 }
    }

    pub fn contains(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// Returns the atom on the other end of the bond, if `atom` is part of it.
    pub fn partner(&self, atom: usize) -> Option<usize> {
        if self.atom1 == atom {
            Some(self.atom2)
        } else if self.atom2 == atom {
            Some(self.atom1)
        } else {
            None
        }
    }

    #[inline]
    pub fn as_pair(&self) -> (usize, usize) {
        (self.atom1, self.atom2)
    }
}

/// A molecular topology: atoms grouped into residues, connected by bonds.
///
/// Atom indices are dense and zero-based; they are the positions of the atoms
/// in [`Topology::atoms`]. The topology is read-only input to every system
/// builder in this crate. Bonds are stored as given and validated only when a
/// bond graph is derived from them.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    atoms: Vec<Atom>,
    residues: Vec<Residue>,
    /// All bonds in the topology.
    pub bonds: Vec<Bond>,
    /// Periodic box vectors in nanometers, if the topology is periodic.
    pub box_vectors: Option<[Vector3<f64>; 3]>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new, empty residue and returns its index.
    pub fn add_residue(&mut self, name: &str, chain_id: char) -> usize {
        self.residues.push(Residue::new(name, chain_id));
        self.residues.len() - 1
    }

    /// Appends an atom to an existing residue and returns the atom's index.
    ///
    /// # Return
    ///
    /// Returns `None` if `residue` does not name an existing residue.
    pub fn add_atom(&mut self, name: &str, element: Option<Element>, residue: usize) -> Option<usize> {
        let index = self.atoms.len();
        self.residues.get_mut(residue)?.atoms.push(index);
        self.atoms.push(Atom::new(name, element, residue));
        Some(index)
    }

    pub fn add_bond(&mut self, atom1: usize, atom2: usize) {
        self.bonds.push(Bond::new(atom1, atom2));
    }

    pub fn atom(&self, index: usize) -> Option<&Atom> {
        self.atoms.get(index)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn residue(&self, index: usize) -> Option<&Residue> {
        self.residues.get(index)
    }

    pub fn residues(&self) -> &[Residue] {
        &self.residues
    }

    #[inline]
    pub fn atom_count(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn residue_count(&self) -> usize {
        self.residues.len()
    }

    #[inline]
    pub fn is_periodic(&self) -> bool {
        self.box_vectors.is_some()
    }

    /// Bonds whose two atoms both belong to `residue`.
    pub fn internal_bonds(&self, residue: usize) -> impl Iterator<Item = &Bond> {
        self.bonds.iter().filter(move |b| {
            self.residue_of(b.atom1) == Some(residue) && self.residue_of(b.atom2) == Some(residue)
        })
    }

    fn residue_of(&self, atom: usize) -> Option<usize> {
        self.atoms.get(atom).map(|a| a.residue)
    }
}
