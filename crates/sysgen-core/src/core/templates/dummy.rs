use super::backend::{BackendError, TemplateBackend, TemplateBackendFactory};
use crate::core::forcefield::dummy::{
    BOND_LENGTH, DUMMY_MASS, REPULSION_LENGTH_SCALE, TORSION_PERIODICITY, angle_stiffness,
    bond_stiffness, equilibrium_angle,
};
use crate::core::forcefield::params::{
    AngleParam, AtomTypeParam, BondParam, ParameterSet, ProperParam, ResidueTemplate,
    TemplateAtom, TorsionTerm,
};
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::Topology;
use crate::core::topology::bonded::BondedTerms;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DUMMY_FORCEFIELDS: [&str; 1] = ["dummy"];

/// On-disk layout: force-field identifier, then molecule name.
type CacheFile = BTreeMap<String, BTreeMap<String, CacheEntry>>;

/// A generated parameter set with the element of each atom it was built for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CacheEntry {
    elements: BTreeMap<String, String>,
    params: ParameterSet,
}

impl CacheEntry {
    fn new(molecule: &Molecule, params: ParameterSet) -> Self {
        Self {
            elements: molecule
                .atoms
                .iter()
                .map(|a| (a.name.clone(), a.element.symbol().to_string()))
                .collect(),
            params,
        }
    }

    /// Whether this entry still describes `molecule`: same atoms, elements,
    /// charges and bonds.
    fn describes(&self, molecule: &Molecule) -> bool {
        let Some(template) = self.params.residues.get(&molecule.name) else {
            return false;
        };
        if template.atoms.len() != molecule.atoms.len()
            || self.elements.len() != molecule.atoms.len()
        {
            return false;
        }
        let atoms_match = molecule.atoms.iter().all(|atom| {
            template
                .atom(&atom.name)
                .is_some_and(|t| t.charge == atom.partial_charge)
                && self
                    .elements
                    .get(&atom.name)
                    .is_some_and(|symbol| symbol == atom.element.symbol())
        });
        if !atoms_match {
            return false;
        }

        let cached: BTreeSet<(&str, &str)> = template
            .bonds
            .iter()
            .map(|[a, b]| name_pair(a, b))
            .collect();
        let current: Option<BTreeSet<(&str, &str)>> = molecule
            .bonds
            .iter()
            .map(|&(a, b)| {
                let a = molecule.atoms.get(a)?;
                let b = molecule.atoms.get(b)?;
                Some(name_pair(&a.name, &b.name))
            })
            .collect();
        current.is_some_and(|current| current == cached)
    }
}

fn name_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a <= b { (a, b) } else { (b, a) }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DummyTemplateBackendFactory;

impl TemplateBackendFactory for DummyTemplateBackendFactory {
    fn name(&self) -> &str {
        "dummy"
    }

    fn supported_forcefields(&self) -> &[&str] {
        &DUMMY_FORCEFIELDS
    }

    fn create(
        &self,
        forcefield: &str,
        cache: Option<&Path>,
    ) -> Result<Box<dyn TemplateBackend>, BackendError> {
        if !DUMMY_FORCEFIELDS.iter().any(|f| *f == forcefield) {
            return Err(BackendError::UnsupportedForceField {
                backend: self.name().to_string(),
                forcefield: forcefield.to_string(),
            });
        }
        Ok(Box::new(DummyTemplateBackend::new(forcefield, cache)?))
    }
}

/// Parameterizes registered molecules with the placeholder dummy parameters.
///
/// Generated parameter sets are kept in memory and, when a cache path is
/// given, persisted to a TOML file shared with other force fields.
#[derive(Debug, Clone)]
pub struct DummyTemplateBackend {
    forcefield: String,
    cache_path: Option<PathBuf>,
    molecules: BTreeMap<String, Molecule>,
    cache: BTreeMap<String, CacheEntry>,
}

fn cache_error(path: &Path, reason: impl Display) -> BackendError {
    BackendError::Cache {
        path: path.to_string_lossy().to_string(),
        reason: reason.to_string(),
    }
}

fn read_cache_file(path: &Path) -> Result<CacheFile, BackendError> {
    if !path.exists() {
        return Ok(CacheFile::new());
    }
    let content = std::fs::read_to_string(path).map_err(|e| cache_error(path, e))?;
    toml::from_str(&content).map_err(|e| cache_error(path, e))
}

impl DummyTemplateBackend {
    pub fn new(forcefield: &str, cache_path: Option<&Path>) -> Result<Self, BackendError> {
        let cache = match cache_path {
            Some(path) => {
                let mut file = read_cache_file(path)?;
                let entries = file.remove(forcefield).unwrap_or_default();
                debug!(
                    "Loaded {} cached templates for '{}' from {}.",
                    entries.len(),
                    forcefield,
                    path.display()
                );
                entries
            }
            None => BTreeMap::new(),
        };
        Ok(Self {
            forcefield: forcefield.to_string(),
            cache_path: cache_path.map(Path::to_path_buf),
            molecules: BTreeMap::new(),
            cache,
        })
    }

    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    pub fn cached_molecules(&self) -> impl Iterator<Item = &str> {
        self.cache.keys().map(String::as_str)
    }

    pub fn molecules(&self) -> impl Iterator<Item = &Molecule> {
        self.molecules.values()
    }

    fn persist(&self, molecule: &str, entry: &CacheEntry) -> Result<(), BackendError> {
        let Some(path) = &self.cache_path else {
            return Ok(());
        };
        let mut file = read_cache_file(path)?;
        file.entry(self.forcefield.clone())
            .or_default()
            .insert(molecule.to_string(), entry.clone());
        let content = toml::to_string(&file).map_err(|e| cache_error(path, e))?;
        std::fs::write(path, content).map_err(|e| cache_error(path, e))
    }
}

/// Builds the dummy parameter set for one molecule.
///
/// Every atom gets its own type so bonded parameters never collide between
/// molecules sharing a cache.
pub fn parameterize(molecule: &Molecule) -> Result<ParameterSet, BackendError> {
    let terms = BondedTerms::from_bonds(molecule.atoms.len(), molecule.bonds.clone()).map_err(
        |source| BackendError::InvalidMolecule {
            molecule: molecule.name.clone(),
            source,
        },
    )?;
    let type_names: Vec<String> = molecule
        .atoms
        .iter()
        .map(|a| format!("{}-{}", molecule.name, a.name))
        .collect();

    let mut params = ParameterSet::default();
    for type_name in &type_names {
        params.atom_types.insert(
            type_name.clone(),
            AtomTypeParam {
                mass: DUMMY_MASS,
                sigma: REPULSION_LENGTH_SCALE,
                epsilon: 0.0,
            },
        );
    }

    let k_bond = bond_stiffness();
    params.bonds = terms
        .bonds
        .iter()
        .map(|&(a, b)| BondParam {
            types: [type_names[a].clone(), type_names[b].clone()],
            length: BOND_LENGTH,
            k: k_bond,
        })
        .collect();

    let k_angle = angle_stiffness();
    params.angles = terms
        .angles
        .iter()
        .map(|angle| AngleParam {
            types: angle.atoms().map(|i| type_names[i].clone()),
            angle: equilibrium_angle(terms.degree(angle.center())),
            k: k_angle,
        })
        .collect();

    params.propers = terms
        .propers
        .iter()
        .map(|proper| ProperParam {
            types: proper.atoms().map(|i| type_names[i].clone()),
            terms: vec![TorsionTerm {
                periodicity: TORSION_PERIODICITY,
                phase: 0.0,
                k: 0.0,
            }],
        })
        .collect();

    let template = ResidueTemplate {
        atoms: molecule
            .atoms
            .iter()
            .zip(&type_names)
            .map(|(atom, type_name)| TemplateAtom {
                name: atom.name.clone(),
                atom_type: type_name.clone(),
                charge: atom.partial_charge,
            })
            .collect(),
        bonds: terms
            .bonds
            .iter()
            .map(|&(a, b)| [molecule.atoms[a].name.clone(), molecule.atoms[b].name.clone()])
            .collect(),
    };
    params.residues.insert(molecule.name.clone(), template);
    Ok(params)
}

impl TemplateBackend for DummyTemplateBackend {
    fn forcefield(&self) -> &str {
        &self.forcefield
    }

    fn add_molecules(&mut self, molecules: &[Molecule]) -> Result<(), BackendError> {
        for molecule in molecules {
            if self
                .molecules
                .insert(molecule.name.clone(), molecule.clone())
                .is_some()
            {
                debug!("Replaced pending definition of molecule '{}'.", molecule.name);
            }
        }
        Ok(())
    }

    fn generate(
        &mut self,
        topology: &Topology,
        residue: usize,
    ) -> Result<Option<ParameterSet>, BackendError> {
        let Some(molecule) = self
            .molecules
            .values()
            .find(|m| m.matches_residue(topology, residue))
        else {
            return Ok(None);
        };

        if let Some(cached) = self.cache.get(&molecule.name) {
            if cached.describes(molecule) {
                debug!("Using cached templates for molecule '{}'.", molecule.name);
                return Ok(Some(cached.params.clone()));
            }
            debug!("Cached templates for molecule '{}' are stale.", molecule.name);
        }

        let entry = CacheEntry::new(molecule, parameterize(molecule)?);
        self.persist(&molecule.name, &entry)?;
        info!(
            "Generated '{}' templates for molecule '{}'.",
            self.forcefield, molecule.name
        );
        let params = entry.params.clone();
        self.cache.insert(molecule.name.clone(), entry);
        Ok(Some(params))
    }
}
