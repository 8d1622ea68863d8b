//! Container images used by the components.

/// Reth, used as the L1 execution client.
pub const RETH: (&str, &str) = ("ghcr.io/paradigmxyz/reth", "v1.10.2");
/// Lighthouse beacon node and validator client.
pub const LIGHTHOUSE: (&str, &str) = ("sigp/lighthouse", "v8.0.1");
/// op-geth, the L2 execution client.
pub const OP_GETH: (&str, &str) =
    ("us-docker.pkg.dev/oplabs-tools-artifacts/images/op-geth", "v1.101511.1");
/// op-node, the L2 rollup node.
pub const OP_NODE: (&str, &str) =
    ("us-docker.pkg.dev/oplabs-tools-artifacts/images/op-node", "v1.16.2");
/// op-batcher.
pub const OP_BATCHER: (&str, &str) =
    ("us-docker.pkg.dev/oplabs-tools-artifacts/images/op-batcher", "v1.16.3");
/// rollup-boost, the engine API multiplexer in front of an external builder.
pub const ROLLUP_BOOST: (&str, &str) = ("docker.io/flashbots/rollup-boost", "v0.7.5");
/// Assertion DA server.
pub const ASSERTION_DA: &str = "ghcr.io/phylax-systems/assertion-da/assertion-da";
/// Assertion DA server, development build.
pub const ASSERTION_DA_DEV: &str = "ghcr.io/phylax-systems/assertion-da/assertion-da-dev";
/// op-talos block builder.
pub const OP_TALOS: (&str, &str) = ("ghcr.io/phylax-systems/op-talos/op-rbuilder", "main");
/// Caddy reverse proxy.
pub const CADDY: (&str, &str) = ("caddy", "2");
/// Grafana Alloy collector.
pub const GRAFANA_ALLOY: (&str, &str) = ("grafana/alloy", "latest");
