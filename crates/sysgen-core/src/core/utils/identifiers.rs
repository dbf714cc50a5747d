use phf::{Set, phf_set};

static WATER_RESIDUE_NAMES: Set<&'static str> = phf_set! {
    "HOH", "WAT", "H2O", "TIP3", "TP3", "SOL", "T3P", "T4P", "SPC",
};

pub fn is_water_residue(residue_name: &str) -> bool {
    WATER_RESIDUE_NAMES.contains(residue_name.trim())
}

/// Torsion type wildcard accepted on the outer atoms of a proper torsion type.
pub const WILDCARD_TYPE: &str = "X";

pub fn is_wildcard_type(atom_type: &str) -> bool {
    atom_type == WILDCARD_TYPE
}
