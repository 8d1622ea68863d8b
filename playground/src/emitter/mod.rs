//! Sidecar emitters that run once the topology is resolved.
//!
//! An emitter reads the resolved manifest, writes a config file for its
//! sidecar and only then appends the sidecar service. When it fails the
//! manifest is left as it was.

use std::{collections::BTreeMap, path::PathBuf};

use tracing::debug;

use crate::{
    Manifest,
    error::{ManifestError, Result},
    manifest::Port,
};

mod alloy;
pub use alloy::{ALLOY_CONFIG, ALLOY_SERVICE, AlloyEmitter, GRAFANA_ENV};

mod caddy;
pub use caddy::{CADDY_PORT, CADDY_SERVICE, CADDYFILE, CaddyEmitter};

/// Environment file read by [`ProcessEnv`] when present.
pub const GRAFANA_ENV_FILE: &str = ".env.grafana";

/// Port numbers treated as JSON-RPC endpoints whatever their name.
const WELL_KNOWN_RPC_PORTS: [u16; 2] = [8545, 8546];

/// Something that appends a sidecar service to a resolved manifest.
pub trait Emitter {
    /// Name of the sidecar service.
    fn name(&self) -> &'static str;

    /// Writes the sidecar config and registers the sidecar.
    ///
    /// Returns the path of the written config file.
    fn emit(&self, manifest: &mut Manifest) -> Result<PathBuf>;
}

/// A source of configuration values, usually the process environment.
pub trait ConfigSource {
    /// Returns the value of `key`. Empty values count as missing.
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment, optionally seeded from [`GRAFANA_ENV_FILE`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ProcessEnv {
    /// Loads [`GRAFANA_ENV_FILE`] from the working directory if it exists.
    ///
    /// Values already set in the environment win over the file.
    pub fn load() -> Self {
        match dotenvy::from_filename(GRAFANA_ENV_FILE) {
            Ok(path) => debug!(path = %path.display(), "loaded environment file"),
            Err(err) => debug!(%err, file = GRAFANA_ENV_FILE, "no environment file loaded"),
        }
        Self
    }
}

impl ConfigSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }
}

impl ConfigSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        BTreeMap::get(self, key).filter(|v| !v.is_empty()).cloned()
    }
}

/// Rejects a manifest that still holds expressions or a sidecar already present.
fn ensure_ready(manifest: &Manifest, sidecar: &str) -> Result<()> {
    if !manifest.is_resolved() {
        return Err(ManifestError::Unresolved);
    }
    if manifest.get_service(sidecar).is_some() {
        return Err(ManifestError::DuplicateName(sidecar.to_string()));
    }
    Ok(())
}

/// Runs `stage` and, if it fails, releases every port `sidecar` took from the
/// run's allocator in the meantime.
fn release_on_error<T>(
    manifest: &mut Manifest,
    sidecar: &str,
    stage: impl FnOnce(&mut Manifest) -> Result<T>,
) -> Result<T> {
    let result = stage(manifest);
    if result.is_err() {
        manifest.allocator().release(sidecar);
    }
    result
}

/// Whether a port looks like an HTTP or WebSocket endpoint worth exposing.
pub fn is_exposable(port: &Port) -> bool {
    port.name == "http"
        || port.name == "ws"
        || port.name.contains("rpc")
        || WELL_KNOWN_RPC_PORTS.contains(&port.port)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::manifest::Protocol;

    #[rstest]
    #[case("http", 9999, true)]
    #[case("ws", 9999, true)]
    #[case("authrpc", 8551, true)]
    #[case("rpc-admin", 1234, true)]
    #[case("custom", 8545, true)]
    #[case("metrics", 9090, false)]
    #[case("p2p", 30303, false)]
    fn test_is_exposable(#[case] name: &str, #[case] port: u16, #[case] expected: bool) {
        let port = Port { name: name.into(), port, host_port: None, protocol: Protocol::Tcp };
        assert_eq!(is_exposable(&port), expected);
    }

    #[test]
    fn test_map_source_treats_empty_as_missing() {
        let source = BTreeMap::from([
            ("A".to_string(), "1".to_string()),
            ("B".to_string(), String::new()),
        ]);
        assert_eq!(ConfigSource::get(&source, "A").as_deref(), Some("1"));
        assert_eq!(ConfigSource::get(&source, "B"), None);
        assert_eq!(ConfigSource::get(&source, "C"), None);
    }
}
