use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// How nonbonded interactions are truncated and whether they are periodic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NonbondedMethod {
    #[default]
    NoCutoff,
    CutoffNonPeriodic,
    CutoffPeriodic,
    Pme,
}

impl NonbondedMethod {
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::CutoffPeriodic | Self::Pme)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicBond {
    pub atoms: [usize; 2],
    pub length: f64, // Equilibrium length in nm
    pub k: f64,      // Force constant in kJ/mol/nm^2
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicAngle {
    pub atoms: [usize; 3],
    pub theta0: f64, // Equilibrium angle in radians
    pub k: f64,      // Force constant in kJ/mol/rad^2
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicTorsion {
    pub atoms: [usize; 4],
    pub periodicity: u32,
    pub phase: f64, // In radians
    pub k: f64,     // Barrier height in kJ/mol
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedParticle {
    pub charge: f64,  // In elementary charge units
    pub sigma: f64,   // In nm
    pub epsilon: f64, // In kJ/mol
}

/// A pair whose nonbonded interaction replaces the one computed from the
/// per-particle parameters (bonded neighbors and scaled 1-4 pairs).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NonbondedException {
    pub atoms: [usize; 2],
    pub charge_prod: f64,
    pub sigma: f64,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarmonicBondForce {
    pub bonds: Vec<HarmonicBond>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarmonicAngleForce {
    pub angles: Vec<HarmonicAngle>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PeriodicTorsionForce {
    pub torsions: Vec<PeriodicTorsion>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NonbondedForce {
    pub method: NonbondedMethod,
    pub cutoff: f64, // In nm; ignored for NoCutoff
    pub particles: Vec<NonbondedParticle>,
    pub exceptions: Vec<NonbondedException>,
}

/// A purely repulsive pair potential `U(r) = prefactor * (r / length_scale)^-exponent`,
/// shared by all particle pairs within the cutoff. Carries no per-particle parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct RepulsiveForce {
    pub prefactor: f64,    // In kJ/mol
    pub length_scale: f64, // In nm
    pub exponent: i32,
    pub method: NonbondedMethod,
    pub cutoff: f64, // In nm
    pub particle_count: usize,
}

impl RepulsiveForce {
    #[inline]
    pub fn energy(&self, distance: f64) -> f64 {
        if self.method != NonbondedMethod::NoCutoff && distance > self.cutoff {
            return 0.0;
        }
        if distance < 1e-9 {
            return 1e10;
        }
        self.prefactor * (distance / self.length_scale).powi(-self.exponent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloBarostat {
    pub pressure: f64,    // In bar
    pub temperature: f64, // In kelvin
    pub frequency: u32,   // Steps between volume moves
    pub seed: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Force {
    HarmonicBond(HarmonicBondForce),
    HarmonicAngle(HarmonicAngleForce),
    PeriodicTorsion(PeriodicTorsionForce),
    Nonbonded(NonbondedForce),
    Repulsive(RepulsiveForce),
    MonteCarloBarostat(MonteCarloBarostat),
    CmMotionRemover { frequency: u32 },
}

impl Force {
    pub fn name(&self) -> &'static str {
        match self {
            Self::HarmonicBond(_) => "HarmonicBondForce",
            Self::HarmonicAngle(_) => "HarmonicAngleForce",
            Self::PeriodicTorsion(_) => "PeriodicTorsionForce",
            Self::Nonbonded(_) => "NonbondedForce",
            Self::Repulsive(_) => "RepulsiveForce",
            Self::MonteCarloBarostat(_) => "MonteCarloBarostat",
            Self::CmMotionRemover { .. } => "CMMotionRemover",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraint {
    pub atoms: [usize; 2],
    pub distance: f64, // In nm
}

/// A simulation-ready particle system: particle masses, distance constraints,
/// force terms, and the periodic box, if any.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParticleSystem {
    masses: Vec<f64>,
    constraints: Vec<Constraint>,
    forces: Vec<Force>,
    /// Periodic box vectors in nanometers.
    pub box_vectors: Option<[Vector3<f64>; 3]>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a particle with the given mass (amu) and returns its index.
    pub fn add_particle(&mut self, mass: f64) -> usize {
        self.masses.push(mass);
        self.masses.len() - 1
    }

    #[inline]
    pub fn particle_count(&self) -> usize {
        self.masses.len()
    }

    pub fn mass(&self, index: usize) -> Option<f64> {
        self.masses.get(index).copied()
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub(crate) fn masses_mut(&mut self) -> &mut [f64] {
        &mut self.masses
    }

    pub fn total_mass(&self) -> f64 {
        self.masses.iter().sum()
    }

    pub fn add_constraint(&mut self, atom1: usize, atom2: usize, distance: f64) {
        self.constraints.push(Constraint {
            atoms: [atom1, atom2],
            distance,
        });
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Adds a force term and returns its index.
    pub fn add_force(&mut self, force: Force) -> usize {
        self.forces.push(force);
        self.forces.len() - 1
    }

    pub fn forces(&self) -> &[Force] {
        &self.forces
    }

    pub fn forces_mut(&mut self) -> &mut [Force] {
        &mut self.forces
    }

    pub fn barostat(&self) -> Option<&MonteCarloBarostat> {
        self.forces.iter().find_map(|f| match f {
            Force::MonteCarloBarostat(b) => Some(b),
            _ => None,
        })
    }

    pub fn nonbonded(&self) -> Option<&NonbondedForce> {
        self.forces.iter().find_map(|f| match f {
            Force::Nonbonded(nb) => Some(nb),
            _ => None,
        })
    }

    pub fn harmonic_bonds(&self) -> impl Iterator<Item = &HarmonicBond> {
        self.forces
            .iter()
            .filter_map(|f| match f {
                Force::HarmonicBond(force) => Some(force),
                _ => None,
            })
            .flat_map(|force| force.bonds.iter())
    }

    pub fn harmonic_angles(&self) -> impl Iterator<Item = &HarmonicAngle> {
        self.forces
            .iter()
            .filter_map(|f| match f {
                Force::HarmonicAngle(force) => Some(force),
                _ => None,
            })
            .flat_map(|force| force.angles.iter())
    }

    pub fn periodic_torsions(&self) -> impl Iterator<Item = &PeriodicTorsion> {
        self.forces
            .iter()
            .filter_map(|f| match f {
                Force::PeriodicTorsion(force) => Some(force),
                _ => None,
            })
            .flat_map(|force| force.torsions.iter())
    }
}
