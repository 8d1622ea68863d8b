//! L1 components: Reth execution client with a Lighthouse beacon node and validator.

use super::{Component, cors_flags};
use crate::{
    artifacts::{JWT_SECRET, L1_GENESIS, TESTNET_DIR},
    images,
    manifest::{ExContext, Service},
    template::{addr, connect, port},
};

const GENESIS_PATH: &str = "/data/genesis.json";
const JWT_PATH: &str = "/data/jwtsecret";
const TESTNET_PATH: &str = "/data/testnet";

/// Reth running as the L1 execution client.
#[derive(Debug, Clone, Default)]
pub struct RethEl;

impl Component for RethEl {
    fn name(&self) -> &str {
        "reth"
    }

    fn run(&self, service: &mut Service, ctx: &ExContext) {
        let (image, tag) = images::RETH;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("reth")
            .with_args([
                "node".to_string(),
                format!("--chain={GENESIS_PATH}"),
                "--datadir=/data_reth".to_string(),
                "--http".to_string(),
                "--http.addr=0.0.0.0".to_string(),
                format!("--http.port={}", port("http", 8545)),
                "--http.api=admin,eth,web3,net,rpc,debug,txpool".to_string(),
                "--ws".to_string(),
                "--ws.addr=0.0.0.0".to_string(),
                format!("--ws.port={}", port("ws", 8546)),
                "--authrpc.addr=0.0.0.0".to_string(),
                format!("--authrpc.port={}", port("authrpc", 8551)),
                format!("--authrpc.jwtsecret={JWT_PATH}"),
                format!("--port={}", port("p2p", 30303)),
                format!("--metrics={}", addr("metrics", 9090)),
                "--disable-discovery".to_string(),
                "-vvv".to_string(),
            ])
            .with_args(cors_flags(ctx, &["--http.corsdomain", "--ws.origins"]))
            .with_artifact(GENESIS_PATH, L1_GENESIS)
            .with_artifact(JWT_PATH, JWT_SECRET);
    }
}

/// Lighthouse beacon node driving an execution client over the engine API.
#[derive(Debug, Clone)]
pub struct LighthouseBeaconNode {
    /// Name of the execution client service.
    pub execution_node: String,
}

impl Component for LighthouseBeaconNode {
    fn name(&self) -> &str {
        "lighthouse-beacon-node"
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let (image, tag) = images::LIGHTHOUSE;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("lighthouse")
            .with_args([
                "bn".to_string(),
                format!("--testnet-dir={TESTNET_PATH}"),
                "--datadir=/data_beacon".to_string(),
                "--enable-private-discovery".to_string(),
                "--disable-peer-scoring".to_string(),
                "--disable-packet-filter".to_string(),
                "--staking".to_string(),
                "--http".to_string(),
                "--http-address=0.0.0.0".to_string(),
                format!("--http-port={}", port("http", 3500)),
                "--http-allow-origin=*".to_string(),
                format!("--port={}", port("p2p", 9000)),
                "--target-peers=0".to_string(),
                "--metrics".to_string(),
                "--metrics-address=0.0.0.0".to_string(),
                format!("--metrics-port={}", port("metrics", 5054)),
                format!("--execution-endpoint={}", connect(&self.execution_node, "authrpc")),
                format!("--execution-jwt={JWT_PATH}"),
            ])
            .with_artifact(TESTNET_PATH, TESTNET_DIR)
            .with_artifact(JWT_PATH, JWT_SECRET);
    }
}

/// Lighthouse validator client attached to a beacon node.
#[derive(Debug, Clone)]
pub struct LighthouseValidator {
    /// Name of the beacon node service.
    pub beacon_node: String,
}

impl Component for LighthouseValidator {
    fn name(&self) -> &str {
        "lighthouse-validator"
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let (image, tag) = images::LIGHTHOUSE;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("lighthouse")
            .with_args([
                "vc".to_string(),
                format!("--testnet-dir={TESTNET_PATH}"),
                format!("--datadir={TESTNET_PATH}/validator_data"),
                format!("--beacon-nodes={}", connect(&self.beacon_node, "http")),
                "--init-slashing-protection".to_string(),
                "--suggested-fee-recipient=0x690B9A9E9aa1C9dB991C7721a92d351Db4FaC990".to_string(),
            ])
            .with_artifact(TESTNET_PATH, TESTNET_DIR);
    }
}
