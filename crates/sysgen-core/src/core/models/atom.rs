use phf::{Map, phf_map};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Chemical elements recognized in biomolecular topologies.
///
/// Covers the elements found in standard biopolymer residues, common ligands,
/// and monatomic ions. The atomic mass is used by force fields that assign
/// masses per element rather than per atom type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    H,
    Li,
    B,
    C,
    N,
    O,
    F,
    Na,
    Mg,
    P,
    S,
    Cl,
    K,
    Ca,
    Mn,
    Fe,
    Co,
    Ni,
    Cu,
    Zn,
    Se,
    Br,
    Rb,
    I,
    Cs,
}

static ELEMENT_SYMBOLS: Map<&'static str, Element> = phf_map! {
    "H" => Element::H, "D" => Element::H, "LI" => Element::Li, "B" => Element::B,
    "C" => Element::C, "N" => Element::N, "O" => Element::O, "F" => Element::F,
    "NA" => Element::Na, "MG" => Element::Mg, "P" => Element::P, "S" => Element::S,
    "CL" => Element::Cl, "K" => Element::K, "CA" => Element::Ca, "MN" => Element::Mn,
    "FE" => Element::Fe, "CO" => Element::Co, "NI" => Element::Ni, "CU" => Element::Cu,
    "ZN" => Element::Zn, "SE" => Element::Se, "BR" => Element::Br, "RB" => Element::Rb,
    "I" => Element::I, "CS" => Element::Cs,
};

impl Element {
    /// Standard atomic mass in daltons.
    pub fn atomic_mass(&self) -> f64 {
        match self {
            Element::H => 1.008,
            Element::Li => 6.94,
            Element::B => 10.81,
            Element::C => 12.011,
            Element::N => 14.007,
            Element::O => 15.999,
            Element::F => 18.998,
            Element::Na => 22.990,
            Element::Mg => 24.305,
            Element::P => 30.974,
            Element::S => 32.06,
            Element::Cl => 35.45,
            Element::K => 39.098,
            Element::Ca => 40.078,
            Element::Mn => 54.938,
            Element::Fe => 55.845,
            Element::Co => 58.933,
            Element::Ni => 58.693,
            Element::Cu => 63.546,
            Element::Zn => 65.38,
            Element::Se => 78.971,
            Element::Br => 79.904,
            Element::Rb => 85.468,
            Element::I => 126.904,
            Element::Cs => 132.905,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::Li => "Li",
            Element::B => "B",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::Rb => "Rb",
            Element::I => "I",
            Element::Cs => "Cs",
        }
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        matches!(self, Element::H)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown element symbol: '{0}'")]
pub struct ParseElementError(pub String);

impl FromStr for Element {
    type Err = ParseElementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ELEMENT_SYMBOLS
            .get(s.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| ParseElementError(s.to_string()))
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// An atom of a [`Topology`](super::topology::Topology).
///
/// Atoms are addressed by their position in the topology's atom list; the
/// `residue` field is the index of the owning residue in the same topology.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    /// The name of the atom within its residue (e.g., "CA", "HB2").
    pub name: String,
    /// The chemical element, if known.
    pub element: Option<Element>,
    /// Index of the parent residue.
    pub residue: usize,
}

impl Atom {
    pub fn new(name: &str, element: Option<Element>, residue: usize) -> Self {
        Self {
            name: name.to_string(),
            element,
            residue,
        }
    }

    #[inline]
    pub fn is_hydrogen(&self) -> bool {
        self.element.is_some_and(|e| e.is_hydrogen())
    }
}
