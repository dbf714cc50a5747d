use super::engine::{EngineError, EngineOptions, ForceFieldEngine};
use super::potentials::{thermal_energy, thermal_stiffness};
use crate::core::models::system::{
    Force, HarmonicAngle, HarmonicAngleForce, HarmonicBond, HarmonicBondForce, NonbondedMethod,
    ParticleSystem, PeriodicTorsion, PeriodicTorsionForce, RepulsiveForce,
};
use crate::core::models::topology::Topology;
use crate::core::templates::backend::TemplateBackend;
use crate::core::topology::bonded::{BondedTerms, TopologyError};
use tracing::{debug, instrument};

pub const DUMMY_MASS: f64 = 12.0; // In amu
pub const DUMMY_TEMPERATURE: f64 = 300.0; // In kelvin, sets every energy scale

pub const REPULSION_PREFACTOR: f64 = 100.0; // In kJ/mol
pub const REPULSION_LENGTH_SCALE: f64 = 0.1; // In nm
pub const REPULSION_EXPONENT: i32 = 4;
pub const REPULSION_CUTOFF: f64 = 1.0; // In nm

pub const BOND_LENGTH: f64 = 0.1; // In nm
pub const BOND_LENGTH_SIGMA: f64 = 0.01; // In nm
pub const ANGLE_SIGMA_DEGREES: f64 = 10.0;
pub const TORSION_PERIODICITY: u32 = 3;

pub fn bond_stiffness() -> f64 {
    thermal_stiffness(thermal_energy(DUMMY_TEMPERATURE), BOND_LENGTH_SIGMA)
}

pub fn angle_stiffness() -> f64 {
    thermal_stiffness(
        thermal_energy(DUMMY_TEMPERATURE),
        ANGLE_SIGMA_DEGREES.to_radians(),
    )
}

/// Equilibrium angle (radians) for a center atom with `degree` bonded neighbors.
pub fn equilibrium_angle(degree: usize) -> f64 {
    let degrees = match degree {
        0..=3 => 120.0,
        4 => 109.5,
        _ => 90.0,
    };
    f64::to_radians(degrees)
}

/// Placeholder parameters for any topology, for exercising downstream tooling
/// without a real force field.
#[derive(Debug, Clone, Copy, Default)]
pub struct DummySystemGenerator;

impl DummySystemGenerator {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, name = "dummy_system", fields(atoms = topology.atom_count()))]
    pub fn create_system(&self, topology: &Topology) -> Result<ParticleSystem, TopologyError> {
        let terms = BondedTerms::from_topology(topology)?;

        let mut system = ParticleSystem::new();
        for _ in 0..topology.atom_count() {
            system.add_particle(DUMMY_MASS);
        }

        system.add_force(Force::Repulsive(RepulsiveForce {
            prefactor: REPULSION_PREFACTOR,
            length_scale: REPULSION_LENGTH_SCALE,
            exponent: REPULSION_EXPONENT,
            method: NonbondedMethod::CutoffNonPeriodic,
            cutoff: REPULSION_CUTOFF,
            particle_count: topology.atom_count(),
        }));

        let k_bond = bond_stiffness();
        let bonds = terms
            .bonds
            .iter()
            .map(|&(a, b)| HarmonicBond {
                atoms: [a, b],
                length: BOND_LENGTH,
                k: k_bond,
            })
            .collect();
        system.add_force(Force::HarmonicBond(HarmonicBondForce { bonds }));

        let k_angle = angle_stiffness();
        let angles = terms
            .angles
            .iter()
            .map(|angle| HarmonicAngle {
                atoms: angle.atoms(),
                theta0: equilibrium_angle(terms.degree(angle.center())),
                k: k_angle,
            })
            .collect();
        system.add_force(Force::HarmonicAngle(HarmonicAngleForce { angles }));

        let torsions = terms
            .propers
            .iter()
            .map(|proper| PeriodicTorsion {
                atoms: proper.atoms(),
                periodicity: TORSION_PERIODICITY,
                phase: 0.0,
                k: 0.0,
            })
            .collect();
        system.add_force(Force::PeriodicTorsion(PeriodicTorsionForce { torsions }));

        debug!(
            bonds = terms.bonds.len(),
            angles = terms.angles.len(),
            propers = terms.propers.len(),
            "Assigned dummy parameters."
        );
        Ok(system)
    }
}

/// Engine options and the template generator are ignored; every topology is
/// fully covered by the placeholder parameters.
impl ForceFieldEngine for DummySystemGenerator {
    fn create_system(
        &self,
        topology: &Topology,
        _options: &EngineOptions,
        _generator: Option<&mut dyn TemplateBackend>,
    ) -> Result<ParticleSystem, EngineError> {
        Ok(DummySystemGenerator::create_system(self, topology)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn chain(n: usize) -> Topology {
        let mut top = Topology::new();
        let r = top.add_residue("UNK", 'A');
        for i in 0..n {
            top.add_atom(&format!("C{}", i + 1), Some(Element::C), r);
        }
        for i in 1..n {
            top.add_bond(i - 1, i);
        }
        top
    }

    #[test]
    fn butane_chain_gets_one_term_per_enumerated_interaction() {
        let system = DummySystemGenerator::new().create_system(&chain(4)).unwrap();

        assert_eq!(system.particle_count(), 4);
        assert!(system.masses().iter().all(|&m| m == DUMMY_MASS));
        assert_eq!(system.harmonic_bonds().count(), 3);
        assert_eq!(system.harmonic_angles().count(), 2);

        let torsions: Vec<_> = system.periodic_torsions().collect();
        assert_eq!(torsions.len(), 1);
        assert_eq!(torsions[0].atoms, [0, 1, 2, 3]);
        assert_eq!(torsions[0].periodicity, 3);
        assert_eq!(torsions[0].k, 0.0);
    }

    #[test]
    fn forces_are_added_in_fixed_order() {
        let system = DummySystemGenerator::new().create_system(&chain(3)).unwrap();
        let names: Vec<_> = system.forces().iter().map(Force::name).collect();
        assert_eq!(
            names,
            [
                "RepulsiveForce",
                "HarmonicBondForce",
                "HarmonicAngleForce",
                "PeriodicTorsionForce"
            ]
        );
    }

    #[test]
    fn repulsive_force_uses_fixed_inverse_quartic_form() {
        let system = DummySystemGenerator::new().create_system(&chain(2)).unwrap();
        let Force::Repulsive(force) = &system.forces()[0] else {
            panic!("first force should be the repulsive term");
        };
        assert_eq!(force.particle_count, 2);
        assert_eq!(force.method, NonbondedMethod::CutoffNonPeriodic);
        assert!(f64_approx_equal(force.energy(0.1), 100.0));
    }

    #[test]
    fn bond_parameters_follow_thermal_scale() {
        let system = DummySystemGenerator::new().create_system(&chain(2)).unwrap();
        let bond = system.harmonic_bonds().next().unwrap();
        assert_eq!(bond.length, 0.1);
        let expected = thermal_energy(300.0) / 1e-4;
        assert!((bond.k - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn equilibrium_angle_depends_on_center_degree() {
        assert!(f64_approx_equal(equilibrium_angle(2), 120f64.to_radians()));
        assert!(f64_approx_equal(equilibrium_angle(3), 120f64.to_radians()));
        assert!(f64_approx_equal(equilibrium_angle(4), 109.5f64.to_radians()));
        assert!(f64_approx_equal(equilibrium_angle(6), 90f64.to_radians()));
    }

    #[test]
    fn tetrahedral_center_angles_use_tetrahedral_equilibrium() {
        let mut top = Topology::new();
        let r = top.add_residue("MET", 'A');
        let c = top.add_atom("C", Some(Element::C), r).unwrap();
        for name in ["H1", "H2", "H3", "H4"] {
            let h = top.add_atom(name, Some(Element::H), r).unwrap();
            top.add_bond(c, h);
        }
        let system = DummySystemGenerator::new().create_system(&top).unwrap();
        let angles: Vec<_> = system.harmonic_angles().collect();
        assert_eq!(angles.len(), 6);
        assert!(
            angles
                .iter()
                .all(|a| f64_approx_equal(a.theta0, 109.5f64.to_radians()))
        );
    }

    #[test]
    fn isolated_atoms_only_get_particles() {
        let system = DummySystemGenerator::new().create_system(&chain(1)).unwrap();
        assert_eq!(system.particle_count(), 1);
        assert_eq!(system.harmonic_bonds().count(), 0);
        assert_eq!(system.harmonic_angles().count(), 0);
    }

    #[test]
    fn repeated_bonds_get_one_harmonic_term() {
        let mut top = chain(3);
        top.add_bond(1, 0);
        top.add_bond(1, 2);
        let system = DummySystemGenerator::new().create_system(&top).unwrap();
        assert_eq!(system.harmonic_bonds().count(), 2);
        assert_eq!(system.harmonic_angles().count(), 1);
    }

    #[test]
    fn invalid_bond_is_rejected() {
        let mut top = chain(2);
        top.add_bond(0, 7);
        assert!(DummySystemGenerator::new().create_system(&top).is_err());
    }
}
