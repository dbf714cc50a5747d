use super::engine::{ConstraintMode, EngineError, EngineOptions, ForceFieldEngine};
use super::params::{AtomTypeParam, ParamLoadError, ParameterSet};
use super::potentials::{law_of_cosines, lorentz_berthelot};
use crate::core::models::atom::Element;
use crate::core::models::system::{
    Force, HarmonicAngle, HarmonicAngleForce, HarmonicBond, HarmonicBondForce, NonbondedException,
    NonbondedForce, NonbondedParticle, ParticleSystem, PeriodicTorsion, PeriodicTorsionForce,
};
use crate::core::models::topology::Topology;
use crate::core::templates::backend::TemplateBackend;
use crate::core::topology::bonded::BondedTerms;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, instrument};

const CM_MOTION_REMOVAL_FREQUENCY: u32 = 1;

#[derive(Debug, Clone, Default)]
struct AtomAssignment {
    atom_type: String,
    charge: f64,
}

/// A force field defined by residue templates and tabulated atom types.
///
/// Residues are matched to templates by name and atom names. Residues without a
/// template are handed to the template generator, whose output is layered over
/// the tabulated parameters for the rest of the call.
#[derive(Debug, Clone, Default)]
pub struct TemplateForceField {
    params: ParameterSet,
}

impl TemplateForceField {
    pub fn new(params: ParameterSet) -> Self {
        Self { params }
    }

    /// Loads and stacks parameter files; later files override earlier ones.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ParamLoadError> {
        Ok(Self::new(ParameterSet::load_all(paths)?))
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    fn assign_templates(
        &self,
        topology: &Topology,
        mut generator: Option<&mut dyn TemplateBackend>,
    ) -> Result<(Cow<'_, ParameterSet>, Vec<AtomAssignment>), EngineError> {
        let mut params = Cow::Borrowed(&self.params);
        let mut assignments = vec![AtomAssignment::default(); topology.atom_count()];

        for (index, residue) in topology.residues().iter().enumerate() {
            if params.match_residue(topology, index).is_none() {
                let generated = match generator.as_deref_mut() {
                    Some(generator) => generator.generate(topology, index)?,
                    None => None,
                };
                if let Some(set) = generated {
                    debug!("Generated templates for residue {} ({}).", index, residue.name);
                    params.to_mut().merge(set);
                }
            }

            let template = params.match_residue(topology, index).ok_or_else(|| {
                EngineError::UnmatchedResidue {
                    residue_index: index,
                    residue_name: residue.name.clone(),
                }
            })?;
            for &atom_index in residue.atoms() {
                let name = &topology.atoms()[atom_index].name;
                if let Some(template_atom) = template.atom(name) {
                    assignments[atom_index] = AtomAssignment {
                        atom_type: template_atom.atom_type.clone(),
                        charge: template_atom.charge,
                    };
                }
            }
        }
        Ok((params, assignments))
    }
}

/// Rejects periodic nonbonded methods without a box, or with a cutoff longer
/// than half the narrowest box width.
fn check_periodic_box(topology: &Topology, options: &EngineOptions) -> Result<(), EngineError> {
    let method = options.nonbonded_method;
    if !method.is_periodic() {
        return Ok(());
    }
    let [a, b, c] = topology
        .box_vectors
        .ok_or(EngineError::MissingPeriodicBox(method))?;

    let volume = a.dot(&b.cross(&c)).abs();
    let min_width = [b.cross(&c).norm(), c.cross(&a).norm(), a.cross(&b).norm()]
        .into_iter()
        .map(|area| volume / area)
        .fold(f64::INFINITY, f64::min);
    let max = 0.5 * min_width;
    if options.nonbonded_cutoff > max {
        return Err(EngineError::CutoffTooLarge {
            cutoff: options.nonbonded_cutoff,
            max,
        });
    }
    Ok(())
}

fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i < j { (i, j) } else { (j, i) }
}

impl ForceFieldEngine for TemplateForceField {
    #[instrument(
        skip_all,
        name = "template_forcefield",
        fields(atoms = topology.atom_count(), residues = topology.residue_count())
    )]
    fn create_system(
        &self,
        topology: &Topology,
        options: &EngineOptions,
        generator: Option<&mut dyn TemplateBackend>,
    ) -> Result<ParticleSystem, EngineError> {
        check_periodic_box(topology, options)?;
        let terms = BondedTerms::from_topology(topology)?;
        let (params, assignments) = self.assign_templates(topology, generator)?;

        let atoms = topology.atoms();
        let residues = topology.residues();
        let is_hydrogen = |i: usize| atoms[i].is_hydrogen();
        let in_water = |i: usize| residues[atoms[i].residue].is_water();

        let atom_types: Vec<&AtomTypeParam> = assignments
            .iter()
            .enumerate()
            .map(|(i, assignment)| {
                params.atom_type(&assignment.atom_type).ok_or_else(|| {
                    EngineError::MissingAtomType {
                        atom_type: assignment.atom_type.clone(),
                        residue_name: residues[atoms[i].residue].name.clone(),
                    }
                })
            })
            .collect::<Result<_, _>>()?;

        let mut system = ParticleSystem::new();
        system.box_vectors = topology.box_vectors;
        for atom_type in &atom_types {
            system.add_particle(atom_type.mass);
        }

        if let Some(hydrogen_mass) = options.hydrogen_mass {
            let masses = system.masses_mut();
            for &(i, j) in &terms.bonds {
                let is_heavy = |k: usize| atoms[k].element.is_some_and(|e| e != Element::H);
                let (h, heavy) = if is_hydrogen(i) && is_heavy(j) {
                    (i, j)
                } else if is_hydrogen(j) && is_heavy(i) {
                    (j, i)
                } else {
                    continue;
                };
                if in_water(h) {
                    continue;
                }
                let transfer = hydrogen_mass - masses[h];
                masses[h] += transfer;
                masses[heavy] -= transfer;
            }
        }

        // === Bonds ===
        let mut bond_lengths = BTreeMap::new();
        let mut bonds = Vec::with_capacity(terms.bonds.len());
        for &(i, j) in &terms.bonds {
            let (ti, tj) = (&assignments[i].atom_type, &assignments[j].atom_type);
            let param = params.find_bond(ti, tj).ok_or_else(|| {
                EngineError::MissingBondParameters {
                    types: [ti.clone(), tj.clone()],
                }
            })?;
            bond_lengths.insert(ordered(i, j), param.length);

            let constrained = match options.constraints {
                ConstraintMode::None => false,
                ConstraintMode::HBonds => is_hydrogen(i) || is_hydrogen(j),
                ConstraintMode::AllBonds | ConstraintMode::HAngles => true,
            } || (options.rigid_water && in_water(i) && in_water(j));

            if constrained {
                system.add_constraint(i, j, param.length);
            }
            if !constrained || options.flexible_constraints {
                bonds.push(HarmonicBond {
                    atoms: [i, j],
                    length: param.length,
                    k: param.k,
                });
            }
        }

        // === Angles ===
        let mut angles = Vec::with_capacity(terms.angles.len());
        for angle in &terms.angles {
            let [a, b, c] = angle.atoms();
            let types = [a, b, c].map(|k| assignments[k].atom_type.as_str());
            let param = params.find_angle(types[0], types[1], types[2]).ok_or_else(|| {
                EngineError::MissingAngleParameters {
                    types: types.map(str::to_string),
                }
            })?;

            let outer_hydrogens = usize::from(is_hydrogen(a)) + usize::from(is_hydrogen(c));
            let constrained = (options.constraints == ConstraintMode::HAngles
                && (outer_hydrogens == 2
                    || (outer_hydrogens == 1 && atoms[b].element == Some(Element::O))))
                || (options.rigid_water
                    && outer_hydrogens == 2
                    && [a, b, c].into_iter().all(|k| in_water(k)));

            if constrained {
                let arms = (
                    bond_lengths.get(&ordered(a, b)),
                    bond_lengths.get(&ordered(b, c)),
                );
                if let (Some(&r1), Some(&r2)) = arms {
                    system.add_constraint(a, c, law_of_cosines(r1, r2, param.angle));
                }
            }
            if !constrained || options.flexible_constraints {
                angles.push(HarmonicAngle {
                    atoms: [a, b, c],
                    theta0: param.angle,
                    k: param.k,
                });
            }
        }

        // === Torsions ===
        let mut torsions = Vec::new();
        let mut unmatched_propers = 0usize;
        for proper in &terms.propers {
            let indices = proper.atoms();
            let types = indices.map(|k| assignments[k].atom_type.as_str());
            match params.find_proper(types) {
                Some(param) => torsions.extend(param.terms.iter().map(|term| PeriodicTorsion {
                    atoms: indices,
                    periodicity: term.periodicity,
                    phase: term.phase,
                    k: term.k,
                })),
                None => unmatched_propers += 1,
            }
        }
        if unmatched_propers > 0 {
            debug!("{} proper torsions have no parameters and were skipped.", unmatched_propers);
        }

        // === Nonbonded ===
        let particles = assignments
            .iter()
            .zip(&atom_types)
            .map(|(assignment, atom_type)| NonbondedParticle {
                charge: assignment.charge,
                sigma: atom_type.sigma,
                epsilon: atom_type.epsilon,
            })
            .collect::<Vec<_>>();

        let pairs = terms.exclusion_pairs();
        let mut exceptions: Vec<NonbondedException> = pairs
            .one_two
            .iter()
            .chain(&pairs.one_three)
            .map(|&(i, j)| NonbondedException {
                atoms: [i, j],
                charge_prod: 0.0,
                sigma: 1.0,
                epsilon: 0.0,
            })
            .collect();
        exceptions.extend(pairs.one_four.iter().map(|&(i, j)| {
            let (pi, pj) = (&particles[i], &particles[j]);
            let (sigma, epsilon) = lorentz_berthelot(pi.sigma, pi.epsilon, pj.sigma, pj.epsilon);
            NonbondedException {
                atoms: [i, j],
                charge_prod: pi.charge * pj.charge * params.coulomb14scale,
                sigma,
                epsilon: epsilon * params.lj14scale,
            }
        }));

        info!(
            "Assembled {} bonds, {} angles, {} torsions, {} constraints.",
            bonds.len(),
            angles.len(),
            torsions.len(),
            system.constraints().len()
        );

        system.add_force(Force::HarmonicBond(HarmonicBondForce { bonds }));
        system.add_force(Force::HarmonicAngle(HarmonicAngleForce { angles }));
        system.add_force(Force::PeriodicTorsion(PeriodicTorsionForce { torsions }));
        system.add_force(Force::Nonbonded(NonbondedForce {
            method: options.nonbonded_method,
            cutoff: options.nonbonded_cutoff,
            particles,
            exceptions,
        }));
        if options.remove_cm_motion {
            system.add_force(Force::CmMotionRemover {
                frequency: CM_MOTION_REMOVAL_FREQUENCY,
            });
        }
        Ok(system)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::molecule::Molecule;
    use crate::core::models::system::NonbondedMethod;
    use crate::core::templates::backend::TemplateBackend;
    use crate::core::templates::dummy::DummyTemplateBackend;
    use nalgebra::Vector3;
    use std::fs;
    use tempfile::tempdir;

    const TEST_PARAMS: &str = r#"
        coulomb14scale = 0.5
        lj14scale = 0.5

        [atom_types.OW]
        mass = 15.999
        sigma = 0.315
        epsilon = 0.636

        [atom_types.HW]
        mass = 1.008
        sigma = 1.0
        epsilon = 0.0

        [atom_types.CT]
        mass = 12.011
        sigma = 0.34
        epsilon = 0.45

        [atom_types.HC]
        mass = 1.008
        sigma = 0.26
        epsilon = 0.06

        [[bonds]]
        types = ["OW", "HW"]
        length = 0.09572
        k = 462750.4

        [[bonds]]
        types = ["CT", "CT"]
        length = 0.1526
        k = 259408.0

        [[bonds]]
        types = ["CT", "HC"]
        length = 0.109
        k = 284512.0

        [[angles]]
        types = ["HW", "OW", "HW"]
        angle = 1.82421813418
        k = 836.8

        [[angles]]
        types = ["HC", "CT", "CT"]
        angle = 1.91113553093
        k = 418.4

        [[propers]]
        types = ["X", "CT", "CT", "X"]
        terms = [{ periodicity = 3, phase = 0.0, k = 0.6508 }]

        [residues.HOH]
        atoms = [
            { name = "O", type = "OW", charge = -0.834 },
            { name = "H1", type = "HW", charge = 0.417 },
            { name = "H2", type = "HW", charge = 0.417 },
        ]

        [residues.ETH]
        atoms = [
            { name = "C1", type = "CT", charge = -0.1 },
            { name = "C2", type = "CT", charge = -0.1 },
            { name = "H11", type = "HC", charge = 0.1 },
            { name = "H21", type = "HC", charge = 0.1 },
        ]
    "#;

    fn f64_approx_equal(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn forcefield() -> TemplateForceField {
        TemplateForceField::new(toml::from_str(TEST_PARAMS).unwrap())
    }

    fn add_water(top: &mut Topology) {
        let r = top.add_residue("HOH", 'W');
        let o = top.add_atom("O", Some(Element::O), r).unwrap();
        let h1 = top.add_atom("H1", Some(Element::H), r).unwrap();
        let h2 = top.add_atom("H2", Some(Element::H), r).unwrap();
        top.add_bond(o, h1);
        top.add_bond(o, h2);
    }

    // H11-C1-C2-H21: atoms 0..4 are C1, C2, H11, H21.
    fn add_ethane(top: &mut Topology) {
        let r = top.add_residue("ETH", 'A');
        let c1 = top.add_atom("C1", Some(Element::C), r).unwrap();
        let c2 = top.add_atom("C2", Some(Element::C), r).unwrap();
        let h11 = top.add_atom("H11", Some(Element::H), r).unwrap();
        let h21 = top.add_atom("H21", Some(Element::H), r).unwrap();
        top.add_bond(c1, c2);
        top.add_bond(c1, h11);
        top.add_bond(c2, h21);
    }

    fn ethane_and_water() -> Topology {
        let mut top = Topology::new();
        add_ethane(&mut top);
        add_water(&mut top);
        top
    }

    fn build(top: &Topology, options: &EngineOptions) -> Result<ParticleSystem, EngineError> {
        forcefield().create_system(top, options, None)
    }

    #[test]
    fn default_options_build_full_system_with_rigid_water() {
        let top = ethane_and_water();
        let system = build(&top, &EngineOptions::default()).unwrap();

        assert_eq!(system.particle_count(), 7);
        let names: Vec<_> = system.forces().iter().map(Force::name).collect();
        assert_eq!(
            names,
            [
                "HarmonicBondForce",
                "HarmonicAngleForce",
                "PeriodicTorsionForce",
                "NonbondedForce",
                "CMMotionRemover"
            ]
        );
        // Two O-H bonds and the H-H distance of the water.
        assert_eq!(system.constraints().len(), 3);
        assert_eq!(system.harmonic_bonds().count(), 3);
        assert_eq!(system.harmonic_angles().count(), 2);
        assert_eq!(system.periodic_torsions().count(), 1);

        let hh = system
            .constraints()
            .iter()
            .find(|c| c.atoms == [5, 6])
            .unwrap();
        assert!(f64_approx_equal(
            hh.distance,
            law_of_cosines(0.09572, 0.09572, 1.82421813418)
        ));
    }

    #[test]
    fn hbond_constraints_remove_hydrogen_bonds_from_harmonic_force() {
        let top = ethane_and_water();
        let options = EngineOptions {
            constraints: ConstraintMode::HBonds,
            ..EngineOptions::default()
        };
        let system = build(&top, &options).unwrap();
        assert_eq!(system.constraints().len(), 5);
        let bonds: Vec<_> = system.harmonic_bonds().collect();
        assert_eq!(bonds.len(), 1);
        assert_eq!(bonds[0].atoms, [0, 1]);
    }

    #[test]
    fn repeated_bonds_yield_one_constraint_each() {
        let mut top = ethane_and_water();
        top.add_bond(2, 0);
        top.add_bond(4, 5);
        let options = EngineOptions {
            constraints: ConstraintMode::HBonds,
            ..EngineOptions::default()
        };
        let system = build(&top, &options).unwrap();
        assert_eq!(system.constraints().len(), 5);
        assert_eq!(system.harmonic_bonds().count(), 1);
    }

    #[test]
    fn flexible_constraints_keep_harmonic_terms() {
        let top = ethane_and_water();
        let options = EngineOptions {
            constraints: ConstraintMode::AllBonds,
            flexible_constraints: true,
            ..EngineOptions::default()
        };
        let system = build(&top, &options).unwrap();
        assert_eq!(system.harmonic_bonds().count(), 5);
        assert_eq!(system.harmonic_angles().count(), 3);
        assert_eq!(system.constraints().len(), 6);
    }

    #[test]
    fn h_angle_constraints_cover_water_only_without_rigid_water() {
        let top = ethane_and_water();
        let options = EngineOptions {
            constraints: ConstraintMode::HAngles,
            rigid_water: false,
            ..EngineOptions::default()
        };
        let system = build(&top, &options).unwrap();
        // Five bonds plus the H-O-H angle; the ethane angles have one hydrogen on carbon.
        assert_eq!(system.constraints().len(), 6);
        assert_eq!(system.harmonic_angles().count(), 2);
    }

    #[test]
    fn hydrogen_mass_repartitioning_conserves_total_mass() {
        let top = ethane_and_water();
        let reference = build(&top, &EngineOptions::default()).unwrap();
        let options = EngineOptions {
            hydrogen_mass: Some(3.0),
            ..EngineOptions::default()
        };
        let system = build(&top, &options).unwrap();

        assert!(f64_approx_equal(system.total_mass(), reference.total_mass()));
        assert!(f64_approx_equal(system.mass(2).unwrap(), 3.0));
        assert!(f64_approx_equal(system.mass(0).unwrap(), 12.011 - 1.992));
        assert_eq!(system.mass(5), Some(1.008));
    }

    #[test]
    fn nonbonded_exceptions_zero_near_pairs_and_scale_one_four() {
        let top = ethane_and_water();
        let system = build(&top, &EngineOptions::default()).unwrap();
        let nonbonded = system.nonbonded().unwrap();

        assert_eq!(nonbonded.particles.len(), 7);
        assert_eq!(nonbonded.particles[4].charge, -0.834);

        let zeroed = nonbonded
            .exceptions
            .iter()
            .filter(|e| e.charge_prod == 0.0 && e.epsilon == 0.0)
            .count();
        // Ethane: 3 bonds + 2 angles; water: 2 bonds + 1 angle.
        assert_eq!(zeroed, 8);

        let one_four = nonbonded
            .exceptions
            .iter()
            .find(|e| e.atoms == [2, 3])
            .unwrap();
        assert!(f64_approx_equal(one_four.charge_prod, 0.1 * 0.1 * 0.5));
        assert!(f64_approx_equal(one_four.sigma, 0.26));
        assert!(f64_approx_equal(one_four.epsilon, 0.06 * 0.5));
    }

    #[test]
    fn unmatched_residue_is_reported_without_generator() {
        let mut top = ethane_and_water();
        let r = top.add_residue("MOH", 'L');
        top.add_atom("C1", Some(Element::C), r);

        match build(&top, &EngineOptions::default()) {
            Err(EngineError::UnmatchedResidue {
                residue_index,
                residue_name,
            }) => {
                assert_eq!(residue_index, 2);
                assert_eq!(residue_name, "MOH");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn generator_supplies_templates_for_unmatched_residues() {
        let mut mol = Molecule::new("MOH");
        let c = mol.add_atom("C1", Element::C, 0.2);
        let o = mol.add_atom("O1", Element::O, -0.2);
        mol.add_bond(c, o);

        let mut top = ethane_and_water();
        let r = top.add_residue("MOH", 'L');
        let tc = top.add_atom("C1", Some(Element::C), r).unwrap();
        let to = top.add_atom("O1", Some(Element::O), r).unwrap();
        top.add_bond(tc, to);

        let mut backend = DummyTemplateBackend::new("dummy", None).unwrap();
        backend.add_molecules(&[mol]).unwrap();

        let system = forcefield()
            .create_system(&top, &EngineOptions::default(), Some(&mut backend))
            .unwrap();
        assert_eq!(system.particle_count(), 9);
        assert_eq!(system.harmonic_bonds().count(), 4);
        assert_eq!(system.nonbonded().unwrap().particles[7].charge, 0.2);
    }

    #[test]
    fn missing_bond_parameters_are_an_error() {
        let mut params: ParameterSet = toml::from_str(TEST_PARAMS).unwrap();
        params.bonds.retain(|b| b.types != ["CT", "CT"]);
        let mut top = Topology::new();
        add_ethane(&mut top);

        let result = TemplateForceField::new(params).create_system(&top, &EngineOptions::default(), None);
        assert!(matches!(
            result,
            Err(EngineError::MissingBondParameters { .. })
        ));
    }

    #[test]
    fn torsions_without_parameters_are_skipped() {
        let mut params: ParameterSet = toml::from_str(TEST_PARAMS).unwrap();
        params.propers.clear();
        let mut top = Topology::new();
        add_ethane(&mut top);

        let system = TemplateForceField::new(params)
            .create_system(&top, &EngineOptions::default(), None)
            .unwrap();
        assert_eq!(system.periodic_torsions().count(), 0);
    }

    #[test]
    fn periodic_methods_require_box_vectors() {
        let top = ethane_and_water();
        let options = EngineOptions {
            nonbonded_method: NonbondedMethod::Pme,
            ..EngineOptions::default()
        };
        assert!(matches!(
            build(&top, &options),
            Err(EngineError::MissingPeriodicBox(NonbondedMethod::Pme))
        ));
    }

    #[test]
    fn periodic_cutoff_is_limited_by_box_width() {
        let mut top = ethane_and_water();
        top.box_vectors = Some([
            Vector3::new(3.0, 0.0, 0.0),
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(0.0, 0.0, 1.6),
        ]);
        let mut options = EngineOptions {
            nonbonded_method: NonbondedMethod::CutoffPeriodic,
            nonbonded_cutoff: 1.0,
            ..EngineOptions::default()
        };
        match build(&top, &options) {
            Err(EngineError::CutoffTooLarge { max, .. }) => assert!(f64_approx_equal(max, 0.8)),
            other => panic!("unexpected result: {other:?}"),
        }

        options.nonbonded_cutoff = 0.75;
        let system = build(&top, &options).unwrap();
        assert!(system.box_vectors.is_some());
        assert_eq!(system.nonbonded().unwrap().method, NonbondedMethod::CutoffPeriodic);
    }

    #[test]
    fn load_reads_and_stacks_parameter_files() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.toml");
        fs::write(&base, TEST_PARAMS).unwrap();

        let ff = TemplateForceField::load(&[base]).unwrap();
        assert_eq!(ff.params().residues.len(), 2);
        assert!(TemplateForceField::load(&[dir.path().join("missing.toml")]).is_err());
    }

    #[test]
    fn generator_trait_object_is_accepted() {
        let mut backend = DummyTemplateBackend::new("dummy", None).unwrap();
        let generator: &mut dyn TemplateBackend = &mut backend;
        let system = forcefield()
            .create_system(&ethane_and_water(), &EngineOptions::default(), Some(generator))
            .unwrap();
        assert_eq!(system.particle_count(), 7);
    }
}
