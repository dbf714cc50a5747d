use super::backend::{BackendError, BackendSummary, TemplateBackend, TemplateBackendFactory};
use super::dummy::DummyTemplateBackendFactory;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// An ordered list of template backend factories.
#[derive(Default)]
pub struct BackendRegistry {
    factories: Vec<Box<dyn TemplateBackendFactory>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the backends built into this crate.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(DummyTemplateBackendFactory);
        registry
    }

    pub fn register<F: TemplateBackendFactory + 'static>(&mut self, factory: F) -> &mut Self {
        self.factories.push(Box::new(factory));
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn summaries(&self) -> Vec<BackendSummary> {
        self.factories.iter().map(|f| f.summary()).collect()
    }

    /// Tries every factory in registration order and returns the backend from
    /// the last one that accepts `forcefield`.
    ///
    /// Factories that do not recognize `forcefield` are skipped. Any other
    /// construction failure is returned as is. When nothing accepts the
    /// identifier the error lists every registered backend with its supported
    /// identifiers.
    #[instrument(skip(self, cache), name = "select_template_backend")]
    pub fn select(
        &self,
        forcefield: &str,
        cache: Option<&Path>,
    ) -> Result<Box<dyn TemplateBackend>, BackendError> {
        let mut selected: Option<(&str, Box<dyn TemplateBackend>)> = None;

        for factory in &self.factories {
            debug!(backend = factory.name(), "Trying template backend.");
            match factory.create(forcefield, cache) {
                Ok(backend) => {
                    if let Some((previous, _)) = &selected {
                        warn!(
                            "Template backends '{}' and '{}' both accept force field '{}'; using '{}'.",
                            previous,
                            factory.name(),
                            forcefield,
                            factory.name()
                        );
                    }
                    selected = Some((factory.name(), backend));
                }
                Err(err @ BackendError::UnsupportedForceField { .. }) => {
                    debug!(backend = factory.name(), "{}", err);
                }
                Err(err) => {
                    warn!(backend = factory.name(), "Template backend failed to load: {}", err);
                    return Err(err);
                }
            }
        }

        match selected {
            Some((name, backend)) => {
                info!("Using template backend '{}' for force field '{}'.", name, forcefield);
                Ok(backend)
            }
            None => Err(BackendError::NoBackendForForceField {
                forcefield: forcefield.to_string(),
                available: self.summaries(),
            }),
        }
    }
}
