use crate::core::models::topology::Topology;
use crate::core::utils::identifiers::is_wildcard_type;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

const DEFAULT_COULOMB_14_SCALE: f64 = 1.0 / 1.2;
const DEFAULT_LJ_14_SCALE: f64 = 0.5;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AtomTypeParam {
    pub mass: f64,    // In amu
    pub sigma: f64,   // In nm
    pub epsilon: f64, // In kJ/mol
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BondParam {
    pub types: [String; 2],
    pub length: f64, // In nm
    pub k: f64,      // In kJ/mol/nm^2
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AngleParam {
    pub types: [String; 3],
    pub angle: f64, // In radians
    pub k: f64,     // In kJ/mol/rad^2
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TorsionTerm {
    pub periodicity: u32,
    pub phase: f64, // In radians
    pub k: f64,     // In kJ/mol
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProperParam {
    pub types: [String; 4],
    pub terms: Vec<TorsionTerm>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TemplateAtom {
    pub name: String,
    #[serde(rename = "type")]
    pub atom_type: String,
    pub charge: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ResidueTemplate {
    pub atoms: Vec<TemplateAtom>,
    #[serde(default)]
    pub bonds: Vec<[String; 2]>,
}

impl ResidueTemplate {
    pub fn atom(&self, name: &str) -> Option<&TemplateAtom> {
        self.atoms.iter().find(|a| a.name == name)
    }
}

/// A tabulated force field: atom types, bonded parameters, and residue templates.
///
/// Parameter sets are stored as TOML. Several sets can be stacked with
/// [`ParameterSet::merge`]; later definitions take precedence over earlier ones.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ParameterSet {
    #[serde(default = "default_coulomb14scale")]
    pub coulomb14scale: f64,
    #[serde(default = "default_lj14scale")]
    pub lj14scale: f64,
    #[serde(default)]
    pub atom_types: BTreeMap<String, AtomTypeParam>,
    #[serde(default)]
    pub bonds: Vec<BondParam>,
    #[serde(default)]
    pub angles: Vec<AngleParam>,
    #[serde(default)]
    pub propers: Vec<ProperParam>,
    #[serde(default)]
    pub residues: BTreeMap<String, ResidueTemplate>,
}

fn default_coulomb14scale() -> f64 {
    DEFAULT_COULOMB_14_SCALE
}

fn default_lj14scale() -> f64 {
    DEFAULT_LJ_14_SCALE
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            coulomb14scale: DEFAULT_COULOMB_14_SCALE,
            lj14scale: DEFAULT_LJ_14_SCALE,
            atom_types: BTreeMap::new(),
            bonds: Vec::new(),
            angles: Vec::new(),
            propers: Vec::new(),
            residues: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ParamLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

impl ParameterSet {
    pub fn load(path: &Path) -> Result<Self, ParamLoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| ParamLoadError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ParamLoadError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Loads and stacks several parameter files in order.
    pub fn load_all<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ParamLoadError> {
        let mut combined = Self::default();
        for path in paths {
            combined.merge(Self::load(path.as_ref())?);
        }
        Ok(combined)
    }

    /// Stacks `other` on top of `self`.
    ///
    /// Atom types and residue templates with the same name are replaced;
    /// bonded parameters are appended and shadow earlier matches.
    pub fn merge(&mut self, other: ParameterSet) {
        // 1-4 scale factors belong to the base force field and are kept.
        self.atom_types.extend(other.atom_types);
        self.residues.extend(other.residues);
        self.bonds.extend(other.bonds);
        self.angles.extend(other.angles);
        self.propers.extend(other.propers);
    }

    pub fn atom_type(&self, name: &str) -> Option<&AtomTypeParam> {
        self.atom_types.get(name)
    }

    pub fn find_bond(&self, t1: &str, t2: &str) -> Option<&BondParam> {
        self.bonds.iter().rev().find(|param| {
            let [a, b] = &param.types;
            (a == t1 && b == t2) || (a == t2 && b == t1)
        })
    }

    pub fn find_angle(&self, t1: &str, t2: &str, t3: &str) -> Option<&AngleParam> {
        self.angles.iter().rev().find(|p| {
            let [a, b, c] = &p.types;
            b == t2 && ((a == t1 && c == t3) || (a == t3 && c == t1))
        })
    }

    /// Finds the most specific proper torsion matching the four atom types.
    ///
    /// Exact matches beat wildcard (`X`) matches; among equally specific
    /// matches the most recently defined one wins.
    pub fn find_proper(&self, types: [&str; 4]) -> Option<&ProperParam> {
        let matches = |pattern: &[String; 4], wanted: [&str; 4]| -> Option<usize> {
            let mut wildcards = 0;
            for (p, t) in pattern.iter().zip(wanted) {
                if is_wildcard_type(p) {
                    wildcards += 1;
                } else if p != t {
                    return None;
                }
            }
            Some(wildcards)
        };
        let [t1, t2, t3, t4] = types;

        let mut best: Option<(usize, &ProperParam)> = None;
        for param in self.propers.iter().rev() {
            let score = [matches(&param.types, types), matches(&param.types, [t4, t3, t2, t1])]
                .into_iter()
                .flatten()
                .min();
            if let Some(score) = score {
                if best.is_none_or(|(best_score, _)| score < best_score) {
                    best = Some((score, param));
                }
            }
        }
        best.map(|(_, param)| param)
    }

    /// Finds the template for residue `residue` of `topology`.
    ///
    /// A template matches when it is registered under the residue's name and
    /// lists exactly the residue's atom names.
    pub fn match_residue(&self, topology: &Topology, residue: usize) -> Option<&ResidueTemplate> {
        let res = topology.residue(residue)?;
        let template = self.residues.get(&res.name)?;
        if template.atoms.len() != res.len() {
            return None;
        }
        let expected: BTreeSet<&str> = template.atoms.iter().map(|a| a.name.as_str()).collect();
        let found: BTreeSet<&str> = res
            .atoms()
            .iter()
            .filter_map(|&i| topology.atom(i))
            .map(|a| a.name.as_str())
            .collect();
        (expected == found).then_some(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Element;
    use std::fs;
    use tempfile::tempdir;

    const WATER_PARAMS: &str = r#"
        [atom_types.OW]
        mass = 15.999
        sigma = 0.315061
        epsilon = 0.636386

        [atom_types.HW]
        mass = 1.008
        sigma = 1.0
        epsilon = 0.0

        [[bonds]]
        types = ["OW", "HW"]
        length = 0.09572
        k = 462750.4

        [[angles]]
        types = ["HW", "OW", "HW"]
        angle = 1.82421813418
        k = 836.8

        [residues.HOH]
        atoms = [
            { name = "O", type = "OW", charge = -0.834 },
            { name = "H1", type = "HW", charge = 0.417 },
            { name = "H2", type = "HW", charge = 0.417 },
        ]
        bonds = [["O", "H1"], ["O", "H2"]]
    "#;

    fn torsion(types: [&str; 4], k: f64) -> ProperParam {
        ProperParam {
            types: types.map(str::to_string),
            terms: vec![TorsionTerm {
                periodicity: 3,
                phase: 0.0,
                k,
            }],
        }
    }

    #[test]
    fn load_succeeds_with_valid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("water.toml");
        fs::write(&path, WATER_PARAMS).unwrap();

        let params = ParameterSet::load(&path).unwrap();
        assert_eq!(params.atom_types.len(), 2);
        assert_eq!(params.atom_type("OW").unwrap().mass, 15.999);
        assert_eq!(params.residues["HOH"].atoms.len(), 3);
        assert_eq!(params.residues["HOH"].atom("H2").unwrap().atom_type, "HW");
        assert_eq!(params.coulomb14scale, DEFAULT_COULOMB_14_SCALE);
        assert_eq!(params.lj14scale, DEFAULT_LJ_14_SCALE);
    }

    #[test]
    fn load_fails_for_missing_file() {
        let dir = tempdir().unwrap();
        let result = ParameterSet::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(ParamLoadError::Io { .. })));
    }

    #[test]
    fn load_fails_for_malformed_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "this is not toml").unwrap();
        assert!(matches!(
            ParameterSet::load(&path),
            Err(ParamLoadError::Toml { .. })
        ));
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("typo.toml");
        fs::write(&path, "[atom_types.C]\nmass = 12.0\nsigma = 0.3\nepsilon = 0.1\nradius = 1.0\n").unwrap();
        assert!(matches!(
            ParameterSet::load(&path),
            Err(ParamLoadError::Toml { .. })
        ));
    }

    #[test]
    fn load_all_stacks_files_in_order() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("base.toml");
        let extra = dir.path().join("extra.toml");
        fs::write(&base, WATER_PARAMS).unwrap();
        fs::write(
            &extra,
            "[[bonds]]\ntypes = [\"HW\", \"OW\"]\nlength = 0.1\nk = 1.0\n",
        )
        .unwrap();

        let params = ParameterSet::load_all(&[base, extra]).unwrap();
        assert_eq!(params.bonds.len(), 2);
        assert_eq!(params.find_bond("OW", "HW").unwrap().length, 0.1);
    }

    #[test]
    fn find_bond_and_angle_match_either_direction() {
        let params: ParameterSet = toml::from_str(WATER_PARAMS).unwrap();
        assert!(params.find_bond("HW", "OW").is_some());
        assert!(params.find_bond("OW", "OW").is_none());
        assert!(params.find_angle("HW", "OW", "HW").is_some());
        assert!(params.find_angle("OW", "HW", "HW").is_none());
    }

    #[test]
    fn find_proper_prefers_exact_over_wildcard() {
        let mut params = ParameterSet::default();
        params.propers.push(torsion(["CT", "CT", "CT", "HC"], 1.0));
        params.propers.push(torsion(["X", "CT", "CT", "X"], 2.0));

        let exact = params.find_proper(["HC", "CT", "CT", "CT"]).unwrap();
        assert_eq!(exact.terms[0].k, 1.0);

        let generic = params.find_proper(["HC", "CT", "CT", "HC"]).unwrap();
        assert_eq!(generic.terms[0].k, 2.0);

        assert!(params.find_proper(["HC", "CT", "OH", "HO"]).is_none());
    }

    #[test]
    fn find_proper_prefers_later_definitions_among_equals() {
        let mut params = ParameterSet::default();
        params.propers.push(torsion(["X", "CT", "CT", "X"], 1.0));
        params.propers.push(torsion(["X", "CT", "CT", "X"], 3.0));
        assert_eq!(
            params.find_proper(["HC", "CT", "CT", "HC"]).unwrap().terms[0].k,
            3.0
        );
    }

    #[test]
    fn merge_overrides_types_and_templates() {
        let mut base: ParameterSet = toml::from_str(WATER_PARAMS).unwrap();
        let mut other = ParameterSet::default();
        other.atom_types.insert(
            "HW".to_string(),
            AtomTypeParam {
                mass: 2.0,
                sigma: 1.0,
                epsilon: 0.0,
            },
        );
        other.lj14scale = 1.0;
        base.merge(other);
        assert_eq!(base.atom_type("HW").unwrap().mass, 2.0);
        assert_eq!(base.lj14scale, DEFAULT_LJ_14_SCALE);
    }

    #[test]
    fn match_residue_requires_name_and_atom_set() {
        let params: ParameterSet = toml::from_str(WATER_PARAMS).unwrap();
        let mut top = Topology::new();
        let water = top.add_residue("HOH", 'W');
        top.add_atom("H1", Some(Element::H), water);
        top.add_atom("O", Some(Element::O), water);
        top.add_atom("H2", Some(Element::H), water);
        let partial = top.add_residue("HOH", 'W');
        top.add_atom("O", Some(Element::O), partial);

        assert!(params.match_residue(&top, water).is_some());
        assert!(params.match_residue(&top, partial).is_none());
        assert!(params.match_residue(&top, 9).is_none());
    }

    #[test]
    fn serialized_parameter_set_reloads_identically() {
        let params: ParameterSet = toml::from_str(WATER_PARAMS).unwrap();
        let text = toml::to_string(&params).unwrap();
        let reloaded: ParameterSet = toml::from_str(&text).unwrap();
        assert_eq!(params, reloaded);
    }
}
