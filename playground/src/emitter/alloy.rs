//! Grafana Alloy sidecar shipping metrics, logs and traces to Grafana Cloud.

use std::{fmt::Write as _, path::PathBuf};

use tracing::{info, warn};

use super::{ConfigSource, Emitter, ensure_ready, release_on_error};
use crate::{
    Manifest,
    error::{ManifestError, Result},
    images,
    manifest::{Protocol, Service},
};

/// Name of the observability sidecar.
pub const ALLOY_SERVICE: &str = "grafana-alloy";

/// Config file written into the output directory.
pub const ALLOY_CONFIG: &str = "alloy.river";

/// Values the collector needs to ship metrics, logs and traces to Grafana.
pub const GRAFANA_ENV: [&str; 13] = [
    "GRAFANA_REMOTE_URL",
    "GRAFANA_INSTANCE_ID",
    "GRAFANA_REMOTE_USERNAME",
    "GRAFANA_REMOTE_PASSWORD",
    "GRAFANA_METRICS_URL",
    "GRAFANA_METRICS_USERNAME",
    "GRAFANA_METRICS_PASSWORD",
    "GRAFANA_LOGS_URL",
    "GRAFANA_LOGS_USERNAME",
    "GRAFANA_LOGS_PASSWORD",
    "GRAFANA_TRACES_URL",
    "GRAFANA_TRACES_USERNAME",
    "GRAFANA_TRACES_PASSWORD",
];

const METRICS_PORT_NAME: &str = "metrics";
const DEFAULT_METRICS_PATH: &str = "/metrics";
const DOCKER_SOCKET: &str = "/var/run/docker.sock";
const CONFIG_MOUNT: &str = "/etc/alloy/alloy.river";

/// Ships metrics of every `metrics` port plus container logs to Grafana Cloud.
#[derive(Debug)]
pub struct AlloyEmitter<S> {
    source: S,
}

struct ScrapeTarget<'a> {
    service: &'a str,
    port: u16,
    path: &'a str,
}

#[derive(Debug, Clone, Copy)]
struct CollectorPorts {
    metrics: u16,
    otlp_grpc: u16,
    otlp_http: u16,
}

impl<S: ConfigSource> AlloyEmitter<S> {
    /// Creates an emitter reading Grafana settings from `source`.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Reads every required value, reporting all missing names at once.
    fn settings(&self) -> Result<Vec<(&'static str, String)>> {
        let mut values = Vec::with_capacity(GRAFANA_ENV.len());
        let mut missing = Vec::new();
        for name in GRAFANA_ENV {
            match self.source.get(name) {
                Some(value) => values.push((name, value)),
                None => missing.push(name.to_string()),
            }
        }
        if missing.is_empty() { Ok(values) } else { Err(ManifestError::MissingConfiguration(missing)) }
    }
}

fn scrape_targets(manifest: &Manifest) -> Vec<ScrapeTarget<'_>> {
    manifest
        .services()
        .flat_map(|service| {
            let path = service
                .labels
                .get(crate::component::METRICS_PATH_LABEL)
                .map_or(DEFAULT_METRICS_PATH, String::as_str);
            service.ports.iter().filter(|p| p.name == METRICS_PORT_NAME).map(move |p| {
                ScrapeTarget { service: service.name(), port: p.port, path }
            })
        })
        .collect()
}

fn river_config(targets: &[ScrapeTarget<'_>], ports: CollectorPorts) -> String {
    let mut out = String::new();
    out.push_str(
        r#"remotecfg {
  url            = sys.env("GRAFANA_REMOTE_URL")
  id             = sys.env("GRAFANA_INSTANCE_ID")
  poll_frequency = "10s"

  basic_auth {
    username = sys.env("GRAFANA_REMOTE_USERNAME")
    password = sys.env("GRAFANA_REMOTE_PASSWORD")
  }
}

prometheus.remote_write "metrics_service" {
  endpoint {
    url = sys.env("GRAFANA_METRICS_URL")

    basic_auth {
      username = sys.env("GRAFANA_METRICS_USERNAME")
      password = sys.env("GRAFANA_METRICS_PASSWORD")
    }
  }
}

loki.write "grafana_cloud_loki" {
  endpoint {
    url = sys.env("GRAFANA_LOGS_URL")

    basic_auth {
      username = sys.env("GRAFANA_LOGS_USERNAME")
      password = sys.env("GRAFANA_LOGS_PASSWORD")
    }
  }
}

"#,
    );

    out.push_str("otelcol.receiver.otlp \"otlp_receiver\" {\n");
    let _ = writeln!(out, "  grpc {{\n    endpoint = \"0.0.0.0:{}\"\n  }}", ports.otlp_grpc);
    let _ = writeln!(out, "  http {{\n    endpoint = \"0.0.0.0:{}\"\n  }}", ports.otlp_http);
    out.push_str("  output {\n    traces = [otelcol.exporter.otlp.grafanacloud.input]\n  }\n}\n\n");

    out.push_str("prometheus.scrape \"default\" {\n  targets = [\n");
    for target in targets {
        let _ = writeln!(
            out,
            "    {{__address__ = \"{}:{}\", __metrics_path__ = \"{}\"}},",
            target.service, target.port, target.path
        );
    }
    out.push_str(
        r#"  ]
  forward_to      = [prometheus.remote_write.metrics_service.receiver]
  scrape_interval = "10s"
  scrape_timeout  = "1s"
}

otelcol.exporter.otlp "grafanacloud" {
  client {
    endpoint = sys.env("GRAFANA_TRACES_URL")
    auth     = otelcol.auth.basic.grafanacloud.handler
  }
}

otelcol.auth.basic "grafanacloud" {
  username = sys.env("GRAFANA_TRACES_USERNAME")
  password = sys.env("GRAFANA_TRACES_PASSWORD")
}

discovery.docker "linux" {
  host = "unix:///var/run/docker.sock"
}

loki.source.docker "container_logs" {
  host       = "unix:///var/run/docker.sock"
  targets    = discovery.docker.linux.targets
  forward_to = [loki.write.grafana_cloud_loki.receiver]
}
"#,
    );
    out
}

impl<S: ConfigSource> Emitter for AlloyEmitter<S> {
    fn name(&self) -> &'static str {
        ALLOY_SERVICE
    }

    fn emit(&self, manifest: &mut Manifest) -> Result<PathBuf> {
        ensure_ready(manifest, ALLOY_SERVICE)?;
        let settings = self.settings()?;

        release_on_error(manifest, ALLOY_SERVICE, |manifest| {
            let targets = scrape_targets(manifest);
            if targets.is_empty() {
                warn!("no service exposes a metrics port, only logs will be collected");
            }
            let allocator = manifest.allocator();
            let ports = CollectorPorts {
                metrics: allocator.allocate(ALLOY_SERVICE, "metrics", 4000)?,
                otlp_grpc: allocator.allocate(ALLOY_SERVICE, "otlp-grpc", 4317)?,
                otlp_http: allocator.allocate(ALLOY_SERVICE, "otlp-http", 4318)?,
            };
            let config = river_config(&targets, ports);
            let target_count = targets.len();
            let path = manifest.ctx().output().write_file(ALLOY_CONFIG, config)?;

            let (image, tag) = images::GRAFANA_ALLOY;
            let mut service = Service::new(ALLOY_SERVICE);
            service
                .with_image(image)
                .with_tag(tag)
                .with_args([
                    "run".to_string(),
                    format!("--server.http.listen-addr=0.0.0.0:{}", ports.metrics),
                    CONFIG_MOUNT.to_string(),
                ])
                .with_port("metrics", ports.metrics, Protocol::Tcp)
                .with_port("otlp-grpc", ports.otlp_grpc, Protocol::Tcp)
                .with_port("otlp-http", ports.otlp_http, Protocol::Tcp)
                .with_artifact(CONFIG_MOUNT, ALLOY_CONFIG)
                .with_absolute_volume(DOCKER_SOCKET, DOCKER_SOCKET);
            for (name, value) in settings {
                service.with_env(name, value);
            }
            manifest.push_service(service)?;

            info!(targets = target_count, "added grafana alloy");
            Ok(path)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::{ExContext, OutputDir, component::METRICS_PATH_LABEL, template::port};

    fn full_source() -> BTreeMap<String, String> {
        GRAFANA_ENV.iter().map(|name| (name.to_string(), format!("value-of-{name}"))).collect()
    }

    fn manifest(dir: &std::path::Path) -> Manifest {
        let mut manifest = Manifest::new(ExContext::new(OutputDir::create(dir).unwrap()));
        manifest
            .new_service("op-geth")
            .unwrap()
            .with_args([port("metrics", 6061)])
            .with_label(METRICS_PATH_LABEL, "/debug/metrics/prometheus");
        manifest.new_service("op-node").unwrap().with_args([port("metrics", 7300)]);
        manifest.resolve().unwrap();
        manifest
    }

    #[test]
    fn test_missing_configuration_is_aggregated() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = manifest(temp.path());
        let before: Vec<Service> = manifest.services().cloned().collect();

        let err = AlloyEmitter::new(BTreeMap::new()).emit(&mut manifest).unwrap_err();

        let ManifestError::MissingConfiguration(missing) = &err else {
            panic!("unexpected error: {err}");
        };
        assert_eq!(missing, &GRAFANA_ENV.map(String::from).to_vec());
        assert!(manifest.services().eq(before.iter()));
        assert!(!temp.path().join(ALLOY_CONFIG).exists());
    }

    #[test]
    fn test_partial_configuration_lists_only_missing() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = manifest(temp.path());
        let mut source = full_source();
        source.remove("GRAFANA_LOGS_URL");
        source.insert("GRAFANA_TRACES_URL".into(), String::new());

        let err = AlloyEmitter::new(source).emit(&mut manifest).unwrap_err();

        assert!(matches!(
            err,
            ManifestError::MissingConfiguration(ref missing)
                if missing == &["GRAFANA_LOGS_URL", "GRAFANA_TRACES_URL"]
        ));
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_unresolved_manifest_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = Manifest::new(ExContext::new(OutputDir::create(temp.path()).unwrap()));
        manifest.new_service("node").unwrap().with_args([port("metrics", 4000)]);

        let err = AlloyEmitter::new(full_source()).emit(&mut manifest).unwrap_err();

        assert!(matches!(err, ManifestError::Unresolved));
        assert_eq!(manifest.len(), 1);
        assert!(manifest.allocator().is_empty());
        assert!(!temp.path().join(ALLOY_CONFIG).exists());

        manifest.resolve().unwrap();
        let path = AlloyEmitter::new(full_source()).emit(&mut manifest).unwrap();
        let config = std::fs::read_to_string(path).unwrap();
        assert!(config.contains(r#"__address__ = "node:4000""#));
        let alloy = manifest.require_service(ALLOY_SERVICE).unwrap();
        assert_eq!(alloy.port("metrics").unwrap().port, 4001);
    }

    #[test]
    fn test_failed_write_releases_collector_ports() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = manifest(temp.path());
        std::fs::create_dir(temp.path().join(ALLOY_CONFIG)).unwrap();
        let allocated = manifest.allocator().len();

        let err = AlloyEmitter::new(full_source()).emit(&mut manifest).unwrap_err();

        assert!(matches!(err, ManifestError::Io { .. }));
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.allocator().len(), allocated);
        assert_eq!(manifest.allocator().get(ALLOY_SERVICE, "otlp-grpc"), None);
        assert_eq!(manifest.allocator().allocate("collector", "otlp", 4317).unwrap(), 4317);
    }

    #[test]
    fn test_scrapes_metrics_ports() {
        let temp = tempfile::tempdir().unwrap();
        let mut manifest = manifest(temp.path());

        let path = AlloyEmitter::new(full_source()).emit(&mut manifest).unwrap();
        manifest.resolve().unwrap();

        let config = std::fs::read_to_string(path).unwrap();
        assert!(config.contains(
            r#"{__address__ = "op-geth:6061", __metrics_path__ = "/debug/metrics/prometheus"}"#
        ));
        assert!(config.contains(r#"{__address__ = "op-node:7300", __metrics_path__ = "/metrics"}"#));

        let alloy = manifest.require_service(ALLOY_SERVICE).unwrap();
        assert_eq!(alloy.image_ref(), "grafana/alloy:latest");
        assert_eq!(alloy.env.len(), GRAFANA_ENV.len());
        assert_eq!(alloy.port("otlp-grpc").unwrap().port, 4317);
        assert_eq!(alloy.volumes.len(), 2);
    }
}
