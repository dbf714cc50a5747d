use crate::core::utils::identifiers::is_water_residue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Residue {
    pub name: String,         // Residue name used for template matching (e.g., "ALA", "LIG")
    pub chain_id: char,       // Chain identifier from the source structure
    pub(crate) atoms: Vec<usize>, // Indices of the atoms in this residue, in insertion order
}

impl Residue {
    pub(crate) fn new(name: &str, chain_id: char) -> Self {
        Self {
            name: name.to_string(),
            chain_id,
            atoms: Vec::new(),
        }
    }

    pub fn atoms(&self) -> &[usize] {
        &self.atoms
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn is_water(&self) -> bool {
        is_water_residue(&self.name)
    }
}
