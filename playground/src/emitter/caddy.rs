//! Caddy reverse proxy sidecar routing `/<service>/<port>` to each endpoint.

use std::{fmt::Write as _, path::PathBuf};

use tracing::info;

use super::{Emitter, ensure_ready, is_exposable, release_on_error};
use crate::{
    Manifest,
    error::{ManifestError, Result},
    images,
    manifest::{Protocol, Service},
};

/// Name of the reverse proxy service.
pub const CADDY_SERVICE: &str = "caddy";

/// Config file written into the output directory.
pub const CADDYFILE: &str = "Caddyfile";

/// Port the proxy listens on, unless already taken.
pub const CADDY_PORT: u16 = 8888;

/// Routes `/<service>/<port>` to every exposable endpoint through Caddy.
#[derive(Debug, Clone, Default)]
pub struct CaddyEmitter {
    exposed: Option<Vec<String>>,
}

struct Route<'a> {
    service: &'a str,
    port_name: &'a str,
    port: u16,
}

impl CaddyEmitter {
    /// Proxies every service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only proxies the named services. An empty list proxies everything.
    pub fn with_exposed(mut self, services: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let exposed: Vec<String> = services.into_iter().map(Into::into).collect();
        self.exposed = (!exposed.is_empty()).then_some(exposed);
        self
    }

    fn routes<'a>(&self, manifest: &'a Manifest) -> Vec<Route<'a>> {
        manifest
            .services()
            .filter(|service| {
                self.exposed.as_ref().is_none_or(|names| names.iter().any(|n| n == service.name()))
            })
            .flat_map(|service| {
                service.ports.iter().filter(|port| is_exposable(port)).map(move |port| Route {
                    service: service.name(),
                    port_name: &port.name,
                    port: port.port,
                })
            })
            .collect()
    }
}

fn caddyfile(listen: u16, routes: &[Route<'_>]) -> String {
    let mut index = String::from("Available services:\\n");
    for route in routes {
        let (service, name) = (route.service, route.port_name);
        let _ = write!(index, "{service} ({name}): /{service}/{name}\\n");
    }

    let mut out = format!(":{listen} {{\n");
    out.push_str("  respond / 200 {\n");
    let _ = writeln!(out, "    body \"{index}\"");
    out.push_str("  }\n");
    for route in routes {
        out.push('\n');
        let _ = writeln!(out, "  handle_path /{}/{}/* {{", route.service, route.port_name);
        let _ = writeln!(out, "    reverse_proxy {}:{}", route.service, route.port);
        out.push_str("  }\n");
    }
    out.push_str("}\n");
    out
}

impl Emitter for CaddyEmitter {
    fn name(&self) -> &'static str {
        CADDY_SERVICE
    }

    fn emit(&self, manifest: &mut Manifest) -> Result<PathBuf> {
        ensure_ready(manifest, CADDY_SERVICE)?;
        if self.routes(manifest).is_empty() {
            return Err(ManifestError::NoEligibleTarget(CADDY_SERVICE));
        }

        release_on_error(manifest, CADDY_SERVICE, |manifest| {
            let routes = self.routes(manifest);
            let listen = manifest.allocator().allocate(CADDY_SERVICE, "http", CADDY_PORT)?;
            let config = caddyfile(listen, &routes);
            let route_count = routes.len();
            let path = manifest.ctx().output().write_file(CADDYFILE, config)?;

            let (image, tag) = images::CADDY;
            let mut service = Service::new(CADDY_SERVICE);
            service
                .with_image(image)
                .with_tag(tag)
                .with_port("http", listen, Protocol::Tcp)
                .with_artifact("/etc/caddy/Caddyfile", CADDYFILE);
            manifest.push_service(service)?;

            info!(routes = route_count, port = listen, "added reverse proxy");
            Ok(path)
        })
    }
}
