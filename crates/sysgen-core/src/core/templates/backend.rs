use crate::core::forcefield::params::ParameterSet;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::Topology;
use crate::core::topology::bonded::TopologyError;
use std::path::Path;
use thiserror::Error;

/// A registered backend's name together with the force-field identifiers it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendSummary {
    pub name: String,
    pub forcefields: Vec<String>,
}

fn describe_backends(backends: &[BackendSummary]) -> String {
    if backends.is_empty() {
        return "  (no backends registered)".to_string();
    }
    backends
        .iter()
        .map(|b| format!("  {}: {}", b.name, b.forcefields.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Template backend '{backend}' does not support force field '{forcefield}'")]
    UnsupportedForceField { backend: String, forcefield: String },

    #[error(
        "No registered small molecule template backend could load force field '{forcefield}'.\nAvailable installed force fields are:\n{}",
        describe_backends(.available)
    )]
    NoBackendForForceField {
        forcefield: String,
        available: Vec<BackendSummary>,
    },

    #[error("Molecule '{molecule}' could not be parameterized: {source}")]
    InvalidMolecule {
        molecule: String,
        source: TopologyError,
    },

    #[error("Template cache error for '{path}': {reason}")]
    Cache { path: String, reason: String },
}

/// Creates template backends for the force-field identifiers it recognizes.
pub trait TemplateBackendFactory {
    fn name(&self) -> &str;

    fn supported_forcefields(&self) -> &[&str];

    /// Fails with [`BackendError::UnsupportedForceField`] for unrecognized identifiers.
    fn create(
        &self,
        forcefield: &str,
        cache: Option<&Path>,
    ) -> Result<Box<dyn TemplateBackend>, BackendError>;

    fn summary(&self) -> BackendSummary {
        BackendSummary {
            name: self.name().to_string(),
            forcefields: self
                .supported_forcefields()
                .iter()
                .map(|f| f.to_string())
                .collect(),
        }
    }
}

/// A small-molecule parameterizer bound to one force field.
///
/// Molecules are registered ahead of time with [`TemplateBackend::add_molecules`];
/// the engine then asks [`TemplateBackend::generate`] for residues its own
/// templates cannot match.
pub trait TemplateBackend {
    fn forcefield(&self) -> &str;

    fn add_molecules(&mut self, molecules: &[Molecule]) -> Result<(), BackendError>;

    /// Parameters for residue `residue` of `topology`, or `None` if no
    /// registered molecule matches it.
    fn generate(
        &mut self,
        topology: &Topology,
        residue: usize,
    ) -> Result<Option<ParameterSet>, BackendError>;
}
