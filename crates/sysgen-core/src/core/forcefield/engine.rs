use crate::core::models::system::{NonbondedMethod, ParticleSystem};
use crate::core::models::topology::Topology;
use crate::core::templates::backend::{BackendError, TemplateBackend};
use crate::core::topology::bonded::TopologyError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which bonds and angles are replaced by rigid distance constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintMode {
    #[default]
    None,
    /// Bonds involving hydrogen.
    HBonds,
    AllBonds,
    /// All bonds, plus angles of the form H-X-H and H-O-X.
    HAngles,
}

/// The fixed options handed to the engine on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineOptions {
    pub nonbonded_method: NonbondedMethod,
    pub nonbonded_cutoff: f64, // In nm
    pub constraints: ConstraintMode,
    pub rigid_water: bool,
    /// Keep harmonic terms for constrained bonds and angles.
    pub flexible_constraints: bool,
    /// Target hydrogen mass in amu; the difference is taken from the bonded heavy atom.
    pub hydrogen_mass: Option<f64>,
    pub remove_cm_motion: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            nonbonded_method: NonbondedMethod::NoCutoff,
            nonbonded_cutoff: 1.0,
            constraints: ConstraintMode::None,
            rigid_water: true,
            flexible_constraints: false,
            hydrogen_mass: None,
            remove_cm_motion: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("No template found for residue {residue_index} ({residue_name})")]
    UnmatchedResidue {
        residue_index: usize,
        residue_name: String,
    },

    #[error("Atom type '{atom_type}' used by residue '{residue_name}' is not defined")]
    MissingAtomType {
        atom_type: String,
        residue_name: String,
    },

    #[error("No bond parameters for atom types {}-{}", .types[0], .types[1])]
    MissingBondParameters { types: [String; 2] },

    #[error("No angle parameters for atom types {}-{}-{}", .types[0], .types[1], .types[2])]
    MissingAngleParameters { types: [String; 3] },

    #[error("Nonbonded method {0:?} requires periodic box vectors")]
    MissingPeriodicBox(NonbondedMethod),

    #[error("Nonbonded cutoff {cutoff} nm exceeds half the smallest box width ({max} nm)")]
    CutoffTooLarge { cutoff: f64, max: f64 },
}

/// Turns a topology into a particle system.
///
/// Residues the engine cannot match are offered to `generator`, which is lent
/// for the duration of the call.
pub trait ForceFieldEngine {
    fn create_system(
        &self,
        topology: &Topology,
        options: &EngineOptions,
        generator: Option<&mut dyn TemplateBackend>,
    ) -> Result<ParticleSystem, EngineError>;
}
