//! Service descriptors and their builder-style mutators.

use std::{collections::BTreeMap, fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// Transport protocol of a declared port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// TCP.
    #[default]
    Tcp,
    /// UDP.
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// A named port on a service.
///
/// `port` is the requested value until the resolution pass runs, after which it
/// holds the concrete container port chosen by the run's allocator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Logical name, unique within the service (e.g. `http`).
    pub name: String,
    /// Container port.
    pub port: u16,
    /// Optional fixed host mapping. Left to the runtime driver when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_port: Option<u16>,
    /// Transport protocol.
    pub protocol: Protocol,
}

/// Host side of a volume mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeSource {
    /// A file produced in the run's output directory, by name.
    Artifact(String),
    /// An absolute host path.
    Absolute(PathBuf),
}

/// A volume mounted into a service container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    /// Mount point inside the container.
    pub container_path: String,
    /// Host side of the mount.
    pub source: VolumeSource,
}

/// One deployable unit of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    name: String,
    /// Container image.
    pub image: String,
    /// Container image tag.
    pub tag: String,
    /// Entrypoint override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<String>,
    /// Command arguments, possibly holding expressions until resolved.
    pub args: Vec<String>,
    /// Environment variables, possibly holding expressions until resolved.
    pub env: BTreeMap<String, String>,
    /// Declared ports.
    pub ports: Vec<Port>,
    /// Volume mounts.
    pub volumes: Vec<Volume>,
    /// Free-form labels. Also used by components to publish values such as an enode.
    pub labels: BTreeMap<String, String>,
    /// Name of the component that populated this service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,
}

impl Service {
    /// Creates an empty service with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image: String::new(),
            tag: String::new(),
            entrypoint: None,
            args: Vec::new(),
            env: BTreeMap::new(),
            ports: Vec::new(),
            volumes: Vec::new(),
            labels: BTreeMap::new(),
            component_name: None,
        }
    }

    /// Returns the service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the image reference as `image:tag`.
    pub fn image_ref(&self) -> String {
        if self.tag.is_empty() { self.image.clone() } else { format!("{}:{}", self.image, self.tag) }
    }

    /// Sets the container image.
    pub fn with_image(&mut self, image: impl Into<String>) -> &mut Self {
        self.image = image.into();
        self
    }

    /// Sets the container image tag.
    pub fn with_tag(&mut self, tag: impl Into<String>) -> &mut Self {
        self.tag = tag.into();
        self
    }

    /// Sets the entrypoint.
    pub fn with_entrypoint(&mut self, entrypoint: impl Into<String>) -> &mut Self {
        self.entrypoint = Some(entrypoint.into());
        self
    }

    /// Appends command arguments.
    pub fn with_args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets an environment variable, replacing any previous value.
    pub fn with_env(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Declares a port. A port with the same name is replaced.
    pub fn with_port(
        &mut self,
        name: impl Into<String>,
        port: u16,
        protocol: Protocol,
    ) -> &mut Self {
        let name = name.into();
        let entry = Port { name, port, host_port: None, protocol };
        match self.ports.iter_mut().find(|p| p.name == entry.name) {
            Some(existing) => *existing = entry,
            None => self.ports.push(entry),
        }
        self
    }

    /// Pins the host mapping of an already declared port. Unknown names are ignored.
    pub fn with_host_port(&mut self, name: &str, host_port: u16) -> &mut Self {
        if let Some(port) = self.ports.iter_mut().find(|p| p.name == name) {
            port.host_port = Some(host_port);
        }
        self
    }

    /// Mounts a file from the run's output directory.
    pub fn with_artifact(
        &mut self,
        container_path: impl Into<String>,
        artifact: impl Into<String>,
    ) -> &mut Self {
        self.mount(container_path.into(), VolumeSource::Artifact(artifact.into()))
    }

    /// Mounts an absolute host path.
    pub fn with_absolute_volume(
        &mut self,
        container_path: impl Into<String>,
        host_path: impl Into<PathBuf>,
    ) -> &mut Self {
        self.mount(container_path.into(), VolumeSource::Absolute(host_path.into()))
    }

    /// Sets a label, replacing any previous value.
    pub fn with_label(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Looks up a port by logical name.
    pub fn port(&self, name: &str) -> Option<&Port> {
        self.ports.iter().find(|p| p.name == name)
    }

    fn mount(&mut self, container_path: String, source: VolumeSource) -> &mut Self {
        let entry = Volume { container_path, source };
        match self.volumes.iter_mut().find(|v| v.container_path == entry.container_path) {
            Some(existing) => *existing = entry,
            None => self.volumes.push(entry),
        }
        self
    }

    /// Visits every string field that may carry expressions.
    pub(crate) fn templated_fields_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.args.iter_mut().chain(self.env.values_mut()).chain(self.labels.values_mut())
    }

    /// Same as [`Self::templated_fields_mut`], read-only.
    pub(crate) fn templated_fields(&self) -> impl Iterator<Item = &String> {
        self.args.iter().chain(self.env.values()).chain(self.labels.values())
    }
}
