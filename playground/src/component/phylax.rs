//! Phylax components: the assertion DA server and the op-talos builder.

use super::{Component, cors_flags};
use crate::{
    artifacts::{JWT_SECRET, L2_GENESIS},
    config::{ASSERTION_DA, DETERMINISTIC_ENODE_ID},
    images,
    manifest::{ExContext, Service},
    template::{addr, connect, connect_with_scheme, port},
};

const ASSERTION_DA_TAG: &str = "main";

/// Assertion data-availability server.
#[derive(Debug, Clone)]
pub struct AssertionDa {
    /// Use the development image.
    pub dev_mode: bool,
    /// Hex private key the server signs with.
    pub private_key: String,
}

impl Default for AssertionDa {
    fn default() -> Self {
        Self { dev_mode: false, private_key: ASSERTION_DA.private_key_hex() }
    }
}

impl Component for AssertionDa {
    fn name(&self) -> &str {
        if self.dev_mode { "assertion-da-dev" } else { "assertion-da" }
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let image = if self.dev_mode { images::ASSERTION_DA_DEV } else { images::ASSERTION_DA };
        service.with_image(image).with_tag(ASSERTION_DA_TAG).with_args([
            "--listen-addr".to_string(),
            addr("http", 5000),
            "--private-key".to_string(),
            self.private_key.clone(),
        ]);
    }
}

/// op-talos, an op-rbuilder flavour that validates transactions against assertions.
#[derive(Debug, Clone)]
pub struct OpTalos {
    /// Assertion DA service queried for assertion bytecode.
    pub assertion_da: String,
    /// Execution client to peer with over devp2p, dialled by its deterministic enode.
    pub trusted_peer: Option<String>,
}

impl Component for OpTalos {
    fn name(&self) -> &str {
        "op-talos"
    }

    fn run(&self, service: &mut Service, ctx: &ExContext) {
        let (image, tag) = images::OP_TALOS;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("op-rbuilder")
            .with_args([
                "node".to_string(),
                "--chain=/data/l2-genesis.json".to_string(),
                "--datadir=/data_op_talos".to_string(),
                "--http".to_string(),
                "--http.addr=0.0.0.0".to_string(),
                format!("--http.port={}", port("http", 8545)),
                "--authrpc.addr=0.0.0.0".to_string(),
                format!("--authrpc.port={}", port("authrpc", 8551)),
                "--authrpc.jwtsecret=/data/jwtsecret".to_string(),
                format!("--port={}", port("p2p", 30303)),
                "--disable-discovery".to_string(),
                format!("--metrics={}", addr("metrics", 9091)),
                format!("--ae.rpc_da_url={}", connect(&self.assertion_da, "http")),
            ])
            .with_args(cors_flags(ctx, &["--http.corsdomain"]))
            .with_artifact("/data/l2-genesis.json", L2_GENESIS)
            .with_artifact("/data/jwtsecret", JWT_SECRET);

        if let Some(peer) = &self.trusted_peer {
            service.with_args([format!(
                "--trusted-peers=enode://{DETERMINISTIC_ENODE_ID}@{}",
                connect_with_scheme(peer, "p2p", "")
            )]);
        }
    }
}
