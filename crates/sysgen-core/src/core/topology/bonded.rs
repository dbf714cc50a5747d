use crate::core::models::topology::Topology;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("Bond ({atom1}, {atom2}) references atom index {index}, but the topology has {num_atoms} atoms")]
    AtomIndexOutOfRange {
        atom1: usize,
        atom2: usize,
        index: usize,
        num_atoms: usize,
    },
    #[error("Atom {0} is bonded to itself")]
    SelfBond(usize),
}

/// Bond graph: for each atom index, the set of directly bonded atom indices.
pub type Adjacency = Vec<BTreeSet<usize>>;

/// A bond angle `(a, b, c)` centered on `b`.
///
/// Constructed through [`Angle::new`], which stores the endpoints in
/// ascending order so each physical angle has exactly one representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Angle(pub usize, pub usize, pub usize);

impl Angle {
    pub fn new(a: usize, center: usize, c: usize) -> Self {
        if a <= c {
            Self(a, center, c)
        } else {
            Self(c, center, a)
        }
    }

    #[inline]
    pub fn center(&self) -> usize {
        self.1
    }

    #[inline]
    pub fn contains(&self, atom: usize) -> bool {
        self.0 == atom || self.1 == atom || self.2 == atom
    }

    pub fn atoms(&self) -> [usize; 3] {
        [self.0, self.1, self.2]
    }
}

/// A proper torsion `(a, b, c, d)` about the central bond `(b, c)`.
///
/// Constructed through [`Proper::new`], which reverses the quadruple when
/// needed so that the first outer atom has the lower index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Proper(pub usize, pub usize, pub usize, pub usize);

impl Proper {
    pub fn new(a: usize, b: usize, c: usize, d: usize) -> Self {
        if a <= d {
            Self(a, b, c, d)
        } else {
            Self(d, c, b, a)
        }
    }

    pub fn atoms(&self) -> [usize; 4] {
        [self.0, self.1, self.2, self.3]
    }
}

/// Builds the bond graph of `num_atoms` atoms from undirected bonds.
///
/// # Errors
///
/// Returns [`TopologyError::AtomIndexOutOfRange`] if a bond references an atom
/// index `>= num_atoms`, or [`TopologyError::SelfBond`] if a bond connects an
/// atom to itself.
pub fn adjacency(num_atoms: usize, bonds: &[(usize, usize)]) -> Result<Adjacency, TopologyError> {
    let mut adj = vec![BTreeSet::new(); num_atoms];
    for &(atom1, atom2) in bonds {
        for index in [atom1, atom2] {
            if index >= num_atoms {
                return Err(TopologyError::AtomIndexOutOfRange {
                    atom1,
                    atom2,
                    index,
                    num_atoms,
                });
            }
        }
        if atom1 == atom2 {
            return Err(TopologyError::SelfBond(atom1));
        }
        adj[atom1].insert(atom2);
        adj[atom2].insert(atom1);
    }
    Ok(adj)
}

/// Enumerates every unique bond angle of the graph.
///
/// Each angle is visited once from each of its two bonds; canonical
/// endpoint ordering collapses both visits into a single entry.
///
/// # Panics
///
/// Panics if a bond references an atom outside `adjacency`. Graphs built by
/// [`adjacency`] from the same bonds never do.
pub fn enumerate_angles(bonds: &[(usize, usize)], adjacency: &Adjacency) -> BTreeSet<Angle> {
    let mut angles = BTreeSet::new();
    for &(p, q) in bonds {
        for &n in adjacency[p].iter().filter(|&&n| n != q) {
            angles.insert(Angle::new(n, p, q));
        }
        for &n in adjacency[q].iter().filter(|&&n| n != p) {
            angles.insert(Angle::new(p, q, n));
        }
    }
    angles
}

/// Enumerates every unique proper torsion by extending each angle by one
/// bond at either end.
pub fn enumerate_propers(angles: &BTreeSet<Angle>, adjacency: &Adjacency) -> BTreeSet<Proper> {
    let mut propers = BTreeSet::new();
    for angle in angles {
        let Angle(a, b, c) = *angle;
        for &n in adjacency[a].iter().filter(|&&n| !angle.contains(n)) {
            propers.insert(Proper::new(n, a, b, c));
        }
        for &n in adjacency[c].iter().filter(|&&n| !angle.contains(n)) {
            propers.insert(Proper::new(a, b, c, n));
        }
    }
    propers
}

/// Bonded terms derived from a topology's bond graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BondedTerms {
    pub adjacency: Adjacency,
    pub bonds: Vec<(usize, usize)>,
    pub angles: BTreeSet<Angle>,
    pub propers: BTreeSet<Proper>,
}

impl BondedTerms {
    pub fn from_topology(topology: &Topology) -> Result<Self, TopologyError> {
        let bonds: Vec<(usize, usize)> = topology.bonds.iter().map(|b| b.as_pair()).collect();
        Self::from_bonds(topology.atom_count(), bonds)
    }

    /// Repeated bonds, in either direction, are kept once in their first
    /// orientation.
    pub fn from_bonds(num_atoms: usize, bonds: Vec<(usize, usize)>) -> Result<Self, TopologyError> {
        let adjacency = adjacency(num_atoms, &bonds)?;
        let mut seen = BTreeSet::new();
        let bonds: Vec<(usize, usize)> = bonds
            .into_iter()
            .filter(|&(i, j)| seen.insert((i.min(j), i.max(j))))
            .collect();
        let angles = enumerate_angles(&bonds, &adjacency);
        let propers = enumerate_propers(&angles, &adjacency);
        Ok(Self {
            adjacency,
            bonds,
            angles,
            propers,
        })
    }

    /// Number of atoms bonded to `atom`.
    pub fn degree(&self, atom: usize) -> usize {
        self.adjacency.get(atom).map_or(0, BTreeSet::len)
    }

    /// Atom pairs separated by exactly one, two, and three bonds.
    ///
    /// Each pair is stored as `(low, high)` and appears only in the nearest
    /// class (a pair closed into a ring by a shorter path is not a 1-4 pair).
    pub fn exclusion_pairs(&self) -> ExclusionPairs {
        let ordered = |i: usize, j: usize| if i < j { (i, j) } else { (j, i) };

        let one_two: BTreeSet<_> = self.bonds.iter().map(|&(i, j)| ordered(i, j)).collect();
        let one_three: BTreeSet<_> = self
            .angles
            .iter()
            .map(|a| ordered(a.0, a.2))
            .filter(|p| !one_two.contains(p))
            .collect();
        let one_four: BTreeSet<_> = self
            .propers
            .iter()
            .map(|p| ordered(p.0, p.3))
            .filter(|p| !one_two.contains(p) && !one_three.contains(p))
            .collect();

        ExclusionPairs {
            one_two,
            one_three,
            one_four,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionPairs {
    pub one_two: BTreeSet<(usize, usize)>,
    pub one_three: BTreeSet<(usize, usize)>,
    pub one_four: BTreeSet<(usize, usize)>,
}
