use super::config::{BarostatSpec, ConfigError, GeneratorConfig, TermInclusion};
use crate::core::forcefield::engine::{EngineError, EngineOptions, ForceFieldEngine};
use crate::core::forcefield::params::ParamLoadError;
use crate::core::forcefield::template::TemplateForceField;
use crate::core::models::molecule::Molecule;
use crate::core::models::system::{Force, ParticleSystem};
use crate::core::models::topology::Topology;
use crate::core::templates::backend::{BackendError, TemplateBackend};
use crate::core::templates::registry::BackendRegistry;
use rand::{Rng, thread_rng};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, instrument};

pub type PostprocessError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    ParamLoad(#[from] ParamLoadError),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(
        "No small molecule template backend is installed; configure a small molecule force field before adding molecules"
    )]
    NoBackendInstalled,

    #[error("System post-processing failed: {0}")]
    Postprocess(#[source] PostprocessError),
}

/// A finishing step applied to every generated system.
pub trait SystemPostprocessor {
    fn postprocess(&self, system: ParticleSystem) -> Result<ParticleSystem, PostprocessError>;
}

impl<F> SystemPostprocessor for F
where
    F: Fn(ParticleSystem) -> Result<ParticleSystem, PostprocessError>,
{
    fn postprocess(&self, system: ParticleSystem) -> Result<ParticleSystem, PostprocessError> {
        self(system)
    }
}

/// Builds particle systems from topologies with a fixed force-field setup.
///
/// The engine assigns biopolymer parameters; residues it cannot match are
/// parameterized by the installed template backend, if any. Every system then
/// receives the configured barostat (with a fresh seed), has disabled terms
/// zeroed, and passes through the optional post-processor.
///
/// [`SystemGenerator::terms`] and [`SystemGenerator::barostat`] may be changed
/// between calls; they only affect systems created afterwards.
pub struct SystemGenerator<E = TemplateForceField> {
    engine: E,
    engine_options: EngineOptions,
    small_molecule_forcefield: Option<String>,
    backend: Option<Box<dyn TemplateBackend>>,
    postprocessor: Option<Box<dyn SystemPostprocessor>>,
    pub terms: TermInclusion,
    pub barostat: Option<BarostatSpec>,
}

impl SystemGenerator<TemplateForceField> {
    /// Loads the configured parameter files and selects the small-molecule
    /// backend from the built-in registry.
    pub fn new(config: GeneratorConfig, molecules: &[Molecule]) -> Result<Self, GeneratorError> {
        let engine = TemplateForceField::load(&config.forcefields)?;
        Self::with_engine(config, engine, &BackendRegistry::with_defaults(), molecules)
    }

    pub fn from_config_file(path: &Path, molecules: &[Molecule]) -> Result<Self, GeneratorError> {
        Self::new(GeneratorConfig::load(path)?, molecules)
    }
}

impl<E: ForceFieldEngine> SystemGenerator<E> {
    /// Uses `engine` as given; `config.forcefields` is not read.
    pub fn with_engine(
        config: GeneratorConfig,
        engine: E,
        registry: &BackendRegistry,
        molecules: &[Molecule],
    ) -> Result<Self, GeneratorError> {
        let backend = match &config.small_molecule_forcefield {
            Some(forcefield) => Some(registry.select(forcefield, config.cache.as_deref())?),
            None => None,
        };

        let mut generator = Self {
            engine,
            engine_options: config.engine,
            small_molecule_forcefield: config.small_molecule_forcefield,
            backend,
            postprocessor: None,
            terms: config.terms,
            barostat: config.barostat,
        };
        if !molecules.is_empty() {
            generator.add_molecules(molecules)?;
        }
        Ok(generator)
    }

    pub fn with_postprocessor<P: SystemPostprocessor + 'static>(mut self, postprocessor: P) -> Self {
        self.postprocessor = Some(Box::new(postprocessor));
        self
    }

    pub fn forcefield(&self) -> &E {
        &self.engine
    }

    pub fn small_molecule_forcefield(&self) -> Option<&str> {
        self.small_molecule_forcefield.as_deref()
    }

    pub fn engine_options(&self) -> &EngineOptions {
        &self.engine_options
    }

    pub fn backend(&self) -> Option<&dyn TemplateBackend> {
        self.backend.as_deref()
    }

    /// Registers molecules with the template backend for later parameterization.
    pub fn add_molecules(&mut self, molecules: &[Molecule]) -> Result<(), GeneratorError> {
        let backend = self
            .backend
            .as_mut()
            .ok_or(GeneratorError::NoBackendInstalled)?;
        backend.add_molecules(molecules)?;
        debug!("Registered {} molecules with the template backend.", molecules.len());
        Ok(())
    }

    #[instrument(skip_all, name = "create_system", fields(atoms = topology.atom_count()))]
    pub fn create_system(
        &mut self,
        topology: &Topology,
        molecules: &[Molecule],
    ) -> Result<ParticleSystem, GeneratorError> {
        if !molecules.is_empty() {
            self.add_molecules(molecules)?;
        }

        let generator = self
            .backend
            .as_deref_mut()
            .map(|backend| backend as &mut dyn TemplateBackend);
        let mut system = self
            .engine
            .create_system(topology, &self.engine_options, generator)?;

        if let Some(spec) = &self.barostat {
            let seed = thread_rng().gen_range(0..i32::MAX);
            system.add_force(Force::MonteCarloBarostat(spec.instantiate(seed)));
            debug!(seed, "Added Monte Carlo barostat.");
        }

        if !self.terms.includes_all() {
            self.terms.apply(&mut system);
            debug!(terms = ?self.terms, "Zeroed disabled interaction terms.");
        }

        if let Some(postprocessor) = &self.postprocessor {
            system = postprocessor
                .postprocess(system)
                .map_err(GeneratorError::Postprocess)?;
        }

        info!(
            "Created system with {} particles and {} forces.",
            system.particle_count(),
            system.forces().len()
        );
        Ok(system)
    }
}
