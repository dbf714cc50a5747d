use super::atom::Element;
use super::topology::Topology;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeAtom {
    pub name: String,
    pub element: Element,
    pub partial_charge: f64, // In elementary charge units
}

/// A small molecule to be parameterized by a template backend.
///
/// The molecule is recognized in a [`Topology`] by residue name and atom
/// names; its bonds use indices into [`Molecule::atoms`].
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub atoms: Vec<MoleculeAtom>,
    pub bonds: Vec<(usize, usize)>,
}

impl Molecule {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            atoms: Vec::new(),
            bonds: Vec::new(),
        }
    }

    pub fn add_atom(&mut self, name: &str, element: Element, partial_charge: f64) -> usize {
        self.atoms.push(MoleculeAtom {
            name: name.to_string(),
            element,
            partial_charge,
        });
        self.atoms.len() - 1
    }

    pub fn add_bond(&mut self, atom1: usize, atom2: usize) {
        self.bonds.push((atom1, atom2));
    }

    pub fn atom_index(&self, name: &str) -> Option<usize> {
        self.atoms.iter().position(|a| a.name == name)
    }

    pub fn net_charge(&self) -> f64 {
        self.atoms.iter().map(|a| a.partial_charge).sum()
    }

    /// Whether residue `residue` of `topology` is an instance of this molecule.
    ///
    /// A residue matches when its name equals the molecule name and it holds
    /// exactly the molecule's set of atom names.
    pub fn matches_residue(&self, topology: &Topology, residue: usize) -> bool {
        let Some(res) = topology.residue(residue) else {
            return false;
        };
        if res.name != self.name || res.len() != self.atoms.len() {
            return false;
        }
        let expected: BTreeSet<&str> = self.atoms.iter().map(|a| a.name.as_str()).collect();
        let found: BTreeSet<&str> = res
            .atoms()
            .iter()
            .filter_map(|&i| topology.atom(i))
            .map(|a| a.name.as_str())
            .collect();
        expected == found
    }
}
