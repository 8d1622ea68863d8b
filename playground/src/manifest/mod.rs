//! The deployment manifest: every service of a run plus its shared context.

mod context;
pub use context::{DEFAULT_NETWORK, ExContext};

mod service;
pub use service::{Port, Protocol, Service, Volume, VolumeSource};

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    component::Component,
    error::{ManifestError, Result},
    template::{self, PortAllocator},
};

/// File name of the serialized manifest in the output directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Ordered collection of named services for one run.
///
/// Names are unique. Insertion order is kept for emitted files only; references
/// between services resolve the same way whatever order they were added in.
#[derive(Debug)]
pub struct Manifest {
    ctx: ExContext,
    services: Vec<Service>,
    allocator: PortAllocator,
    resolved: bool,
}

#[derive(Serialize)]
struct ManifestFile<'a> {
    network: &'a str,
    services: &'a [Service],
}

impl Manifest {
    /// Creates an empty manifest bound to `ctx`.
    pub fn new(ctx: ExContext) -> Self {
        Self { ctx, services: Vec::new(), allocator: PortAllocator::new(), resolved: false }
    }

    /// Returns the execution context.
    pub const fn ctx(&self) -> &ExContext {
        &self.ctx
    }

    /// Returns the run's port allocator.
    pub const fn allocator(&self) -> &PortAllocator {
        &self.allocator
    }

    /// Registers an empty service and returns it for population.
    pub fn new_service(&mut self, name: impl Into<String>) -> Result<&mut Service> {
        let name = name.into();
        if self.get_service(&name).is_some() {
            return Err(ManifestError::DuplicateName(name));
        }
        debug!(service = %name, "registering service");
        self.resolved = false;
        let index = self.services.len();
        self.services.push(Service::new(name));
        Ok(&mut self.services[index])
    }

    /// Registers a service populated by `component`.
    pub fn add_service<C>(&mut self, name: impl Into<String>, component: C) -> Result<&mut Service>
    where
        C: Component,
    {
        let name = name.into();
        info!(service = %name, component = component.name(), "adding service");
        let index = self.services.len();
        self.new_service(name)?;
        let service = &mut self.services[index];
        component.run(service, &self.ctx);
        service.component_name = Some(component.name().to_string());
        Ok(service)
    }

    /// Looks up a service by name.
    pub fn get_service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name() == name)
    }

    /// Looks up a service that must exist.
    pub fn require_service(&self, name: &str) -> Result<&Service> {
        self.get_service(name).ok_or_else(|| ManifestError::UnknownServiceReference(name.into()))
    }

    /// Iterates services in insertion order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter()
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns true when no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Returns true once every expression has been substituted.
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Allocates ports and substitutes every expression.
    ///
    /// Safe to call again after more services were added: existing assignments
    /// are kept and only new ports are allocated. On failure the manifest must
    /// be discarded.
    pub fn resolve(&mut self) -> Result<()> {
        template::resolve(&mut self.services, &self.ctx, &self.allocator)?;
        self.resolved = true;
        info!(services = self.services.len(), ports = self.allocator.len(), "resolved manifest");
        Ok(())
    }

    /// Writes the resolved manifest as JSON into the output directory.
    pub fn write(&self) -> Result<std::path::PathBuf> {
        if !self.resolved || template::has_expressions(&self.services) {
            return Err(ManifestError::Unresolved);
        }
        let file = ManifestFile { network: self.ctx.network(), services: &self.services };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| ManifestError::Serialize(MANIFEST_FILE, e))?;
        self.ctx.output().write_file(MANIFEST_FILE, json)
    }

    /// Appends an already populated service.
    ///
    /// Used by emitters, which build their sidecar fully before registering it.
    pub(crate) fn push_service(&mut self, service: Service) -> Result<()> {
        if self.get_service(service.name()).is_some() {
            return Err(ManifestError::DuplicateName(service.name().to_string()));
        }
        self.resolved = false;
        self.services.push(service);
        Ok(())
    }
}
