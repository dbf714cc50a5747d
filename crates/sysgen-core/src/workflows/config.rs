use crate::core::forcefield::engine::EngineOptions;
use crate::core::models::system::{Force, MonteCarloBarostat, ParticleSystem};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },

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

const DEFAULT_BAROSTAT_FREQUENCY: u32 = 25;

fn default_barostat_frequency() -> u32 {
    DEFAULT_BAROSTAT_FREQUENCY
}

/// Monte Carlo barostat settings. Each generated system receives its own
/// instance with a freshly drawn seed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarostatSpec {
    pub pressure: f64,    // In bar
    pub temperature: f64, // In kelvin
    #[serde(default = "default_barostat_frequency")]
    pub frequency: u32,
}

impl BarostatSpec {
    pub fn new(pressure: f64, temperature: f64) -> Self {
        Self {
            pressure,
            temperature,
            frequency: DEFAULT_BAROSTAT_FREQUENCY,
        }
    }

    pub fn instantiate(&self, seed: i32) -> MonteCarloBarostat {
        MonteCarloBarostat {
            pressure: self.pressure,
            temperature: self.temperature,
            frequency: self.frequency,
            seed,
        }
    }
}

/// Switches for interaction terms the engine assigns. A disabled term keeps
/// its entries but with zeroed parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TermInclusion {
    pub particle_charges: bool,
    pub exception_charges: bool,
    pub particle_epsilons: bool,
    pub exception_epsilons: bool,
    pub torsions: bool,
}

impl Default for TermInclusion {
    fn default() -> Self {
        Self {
            particle_charges: true,
            exception_charges: true,
            particle_epsilons: true,
            exception_epsilons: true,
            torsions: true,
        }
    }
}

impl TermInclusion {
    pub fn includes_all(&self) -> bool {
        *self == Self::default()
    }

    /// Zeroes the parameters of every disabled term in `system`.
    pub fn apply(&self, system: &mut ParticleSystem) {
        for force in system.forces_mut() {
            match force {
                Force::Nonbonded(nonbonded) => {
                    for particle in &mut nonbonded.particles {
                        if !self.particle_charges {
                            particle.charge = 0.0;
                        }
                        if !self.particle_epsilons {
                            particle.epsilon = 0.0;
                        }
                    }
                    for exception in &mut nonbonded.exceptions {
                        if !self.exception_charges {
                            exception.charge_prod = 0.0;
                        }
                        if !self.exception_epsilons {
                            exception.epsilon = 0.0;
                        }
                    }
                }
                Force::PeriodicTorsion(periodic) if !self.torsions => {
                    for torsion in &mut periodic.torsions {
                        torsion.k = 0.0;
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Biopolymer parameter files, stacked in order.
    #[serde(default)]
    pub forcefields: Vec<PathBuf>,
    /// Identifier of the small-molecule force field; no template backend is
    /// installed when absent.
    #[serde(default)]
    pub small_molecule_forcefield: Option<String>,
    #[serde(default)]
    pub cache: Option<PathBuf>,
    #[serde(default)]
    pub engine: EngineOptions,
    #[serde(default)]
    pub barostat: Option<BarostatSpec>,
    #[serde(default)]
    pub terms: TermInclusion,
}

impl GeneratorConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::parse(&content, &path.to_string_lossy())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse(content, "<string>")
    }

    fn parse(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: origin.to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.forcefields.is_empty() {
            return Err(ConfigError::MissingParameter("forcefields"));
        }
        if !(self.engine.nonbonded_cutoff > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "engine.nonbonded_cutoff",
                reason: format!("must be positive, got {}", self.engine.nonbonded_cutoff),
            });
        }
        if let Some(mass) = self.engine.hydrogen_mass {
            if !(mass > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: "engine.hydrogen_mass",
                    reason: format!("must be positive, got {}", mass),
                });
            }
        }
        if let Some(barostat) = &self.barostat {
            if !(barostat.pressure > 0.0) || !(barostat.temperature > 0.0) {
                return Err(ConfigError::InvalidValue {
                    field: "barostat",
                    reason: "pressure and temperature must be positive".to_string(),
                });
            }
            if barostat.frequency == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "barostat.frequency",
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct GeneratorConfigBuilder {
    forcefields: Vec<PathBuf>,
    small_molecule_forcefield: Option<String>,
    cache: Option<PathBuf>,
    engine: Option<EngineOptions>,
    barostat: Option<BarostatSpec>,
    terms: Option<TermInclusion>,
}

impl GeneratorConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forcefield(mut self, path: PathBuf) -> Self {
        self.forcefields.push(path);
        self
    }
    pub fn forcefields(mut self, paths: Vec<PathBuf>) -> Self {
        self.forcefields.extend(paths);
        self
    }
    pub fn small_molecule_forcefield(mut self, identifier: &str) -> Self {
        self.small_molecule_forcefield = Some(identifier.to_string());
        self
    }
    pub fn cache(mut self, path: PathBuf) -> Self {
        self.cache = Some(path);
        self
    }
    pub fn engine_options(mut self, options: EngineOptions) -> Self {
        self.engine = Some(options);
        self
    }
    pub fn barostat(mut self, barostat: BarostatSpec) -> Self {
        self.barostat = Some(barostat);
        self
    }
    pub fn terms(mut self, terms: TermInclusion) -> Self {
        self.terms = Some(terms);
        self
    }

    pub fn build(self) -> Result<GeneratorConfig, ConfigError> {
        let config = GeneratorConfig {
            forcefields: self.forcefields,
            small_molecule_forcefield: self.small_molecule_forcefield,
            cache: self.cache,
            engine: self.engine.unwrap_or_default(),
            barostat: self.barostat,
            terms: self.terms.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
