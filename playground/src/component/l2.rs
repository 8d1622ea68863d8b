//! L2 components: op-geth, op-node, op-batcher and rollup-boost.

use super::{Component, ENODE_LABEL, METRICS_PATH_LABEL, cors_flags};
use crate::{
    artifacts::{JWT_SECRET, L2_GENESIS, P2P_KEY, ROLLUP_CONFIG},
    config::{BATCHER, DETERMINISTIC_ENODE_ID, SEQUENCER},
    images,
    manifest::{ExContext, Protocol, Service},
    template::{connect, port},
};

const JWT_PATH: &str = "/data/jwtsecret";
const L2_GENESIS_PATH: &str = "/data/l2-genesis.json";
const ROLLUP_CONFIG_PATH: &str = "/data/rollup.json";
const P2P_KEY_PATH: &str = "/data/p2p_key.txt";

/// op-geth, the L2 execution client.
#[derive(Debug, Clone, Default)]
pub struct OpGeth {
    /// Start with the fixed devp2p key so peers can dial a known enode.
    pub use_deterministic_p2p_key: bool,
}

impl Component for OpGeth {
    fn name(&self) -> &str {
        "op-geth"
    }

    fn run(&self, service: &mut Service, ctx: &ExContext) {
        let (image, tag) = images::OP_GETH;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("geth")
            .with_args([
                "--datadir=/data_opgeth".to_string(),
                "--http".to_string(),
                "--http.addr=0.0.0.0".to_string(),
                format!("--http.port={}", port("http", 8545)),
                "--http.api=web3,debug,eth,txpool,net,engine,miner".to_string(),
                "--ws".to_string(),
                "--ws.addr=0.0.0.0".to_string(),
                format!("--ws.port={}", port("ws", 8546)),
                "--ws.api=debug,eth,txpool,net,engine".to_string(),
                "--authrpc.addr=0.0.0.0".to_string(),
                format!("--authrpc.port={}", port("authrpc", 8551)),
                "--authrpc.vhosts=*".to_string(),
                format!("--authrpc.jwtsecret={JWT_PATH}"),
                "--syncmode=full".to_string(),
                "--gcmode=archive".to_string(),
                "--rollup.disabletxpoolgossip=true".to_string(),
                "--nodiscover".to_string(),
                "--maxpeers=5".to_string(),
                format!("--port={}", port("p2p", 30303)),
                "--metrics".to_string(),
                "--metrics.addr=0.0.0.0".to_string(),
                format!("--metrics.port={}", port("metrics", 6061)),
            ])
            .with_args(cors_flags(ctx, &["--http.corsdomain", "--ws.origins"]))
            .with_artifact(L2_GENESIS_PATH, L2_GENESIS)
            .with_artifact(JWT_PATH, JWT_SECRET)
            .with_label(METRICS_PATH_LABEL, "/debug/metrics/prometheus");

        if self.use_deterministic_p2p_key {
            let enode =
                format!("enode://{DETERMINISTIC_ENODE_ID}@{}:{}", service.name(), port("p2p", 30303));
            service
                .with_args([format!("--nodekey={P2P_KEY_PATH}")])
                .with_artifact(P2P_KEY_PATH, P2P_KEY)
                .with_label(ENODE_LABEL, enode);
        }
    }
}

/// op-node, the rollup node deriving L2 blocks from L1 and sequencing.
#[derive(Debug, Clone)]
pub struct OpNode {
    /// L1 execution client service.
    pub l1_node: String,
    /// L1 beacon node service.
    pub l1_beacon: String,
    /// Service exposing the L2 engine API (`authrpc`).
    pub l2_node: String,
}

impl Component for OpNode {
    fn name(&self) -> &str {
        "op-node"
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let (image, tag) = images::OP_NODE;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("op-node")
            .with_args([
                format!("--l1={}", connect(&self.l1_node, "http")),
                format!("--l1.beacon={}", connect(&self.l1_beacon, "http")),
                "--l1.epoch-poll-interval=12s".to_string(),
                "--l1.http-poll-interval=6s".to_string(),
                format!("--l2={}", connect(&self.l2_node, "authrpc")),
                format!("--l2.jwt-secret={JWT_PATH}"),
                format!("--rollup.config={ROLLUP_CONFIG_PATH}"),
                "--sequencer.enabled".to_string(),
                "--sequencer.l1-confs=0".to_string(),
                "--verifier.l1-confs=0".to_string(),
                format!("--p2p.sequencer.key={}", SEQUENCER.private_key),
                "--p2p.listen.ip=0.0.0.0".to_string(),
                format!("--p2p.listen.tcp={}", port("p2p", 9003)),
                format!("--p2p.listen.udp={}", port("p2p-udp", 9003)),
                "--p2p.scoring.peers=none".to_string(),
                "--p2p.ban.peers=false".to_string(),
                "--rpc.addr=0.0.0.0".to_string(),
                format!("--rpc.port={}", port("http", 8549)),
                "--rpc.enable-admin".to_string(),
                "--metrics.enabled".to_string(),
                "--metrics.addr=0.0.0.0".to_string(),
                format!("--metrics.port={}", port("metrics", 7300)),
                "--safedb.path=/data_db".to_string(),
            ])
            .with_port("p2p-udp", 9003, Protocol::Udp)
            .with_artifact(ROLLUP_CONFIG_PATH, ROLLUP_CONFIG)
            .with_artifact(JWT_PATH, JWT_SECRET);
    }
}

/// op-batcher, submitting L2 batches to L1.
#[derive(Debug, Clone)]
pub struct OpBatcher {
    /// L1 execution client service.
    pub l1_node: String,
    /// L2 execution client service.
    pub l2_node: String,
    /// Rollup node service.
    pub rollup_node: String,
    /// Maximum channel duration in L1 blocks.
    pub max_channel_duration: u64,
}

impl Component for OpBatcher {
    fn name(&self) -> &str {
        "op-batcher"
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let (image, tag) = images::OP_BATCHER;
        service.with_image(image).with_tag(tag).with_entrypoint("op-batcher").with_args([
            format!("--l1-eth-rpc={}", connect(&self.l1_node, "http")),
            format!("--l2-eth-rpc={}", connect(&self.l2_node, "http")),
            format!("--rollup-rpc={}", connect(&self.rollup_node, "http")),
            format!("--max-channel-duration={}", self.max_channel_duration),
            "--sub-safety-margin=4".to_string(),
            "--poll-interval=1s".to_string(),
            "--num-confirmations=1".to_string(),
            format!("--private-key={}", BATCHER.private_key_hex()),
            "--metrics.enabled".to_string(),
            "--metrics.addr=0.0.0.0".to_string(),
            format!("--metrics.port={}", port("metrics", 7300)),
        ]);
    }
}

/// rollup-boost, multiplexing the engine API between the local client and a builder.
#[derive(Debug, Clone)]
pub struct RollupBoost {
    /// Local L2 execution client service.
    pub el_node: String,
    /// Builder engine API URL, either literal or an expression.
    pub builder: String,
}

impl Component for RollupBoost {
    fn name(&self) -> &str {
        "rollup-boost"
    }

    fn run(&self, service: &mut Service, _ctx: &ExContext) {
        let (image, tag) = images::ROLLUP_BOOST;
        service
            .with_image(image)
            .with_tag(tag)
            .with_entrypoint("/usr/local/bin/rollup-boost")
            .with_args([
                "--rpc-host=0.0.0.0".to_string(),
                format!("--rpc-port={}", port("authrpc", 8551)),
                format!("--l2-jwt-path={JWT_PATH}"),
                format!("--l2-url={}", connect(&self.el_node, "authrpc")),
                format!("--builder-jwt-path={JWT_PATH}"),
                format!("--builder-url={}", self.builder),
                "--metrics".to_string(),
                "--metrics-host=0.0.0.0".to_string(),
                format!("--metrics-port={}", port("metrics", 9090)),
            ])
            .with_artifact(JWT_PATH, JWT_SECRET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Manifest, OutputDir};

    #[test]
    fn test_op_geth_enode_only_with_deterministic_key() {
        let ctx = ExContext::new(OutputDir::new_unchecked("/tmp/l2"));

        let mut random = Service::new("op-geth");
        OpGeth::default().run(&mut random, &ctx);
        assert!(!random.labels.contains_key(ENODE_LABEL));
        assert!(!random.args.iter().any(|a| a.starts_with("--nodekey")));

        let mut fixed = Service::new("op-geth");
        OpGeth { use_deterministic_p2p_key: true }.run(&mut fixed, &ctx);
        assert!(fixed.labels.contains_key(ENODE_LABEL));
        assert!(fixed.args.contains(&format!("--nodekey={P2P_KEY_PATH}")));
    }

    #[test]
    fn test_l2_wiring_resolves() {
        let ctx = ExContext::new(OutputDir::new_unchecked("/tmp/l2"));
        let mut manifest = Manifest::new(ctx);
        manifest.new_service("el").unwrap().with_args([port("http", 8545)]);
        manifest.new_service("beacon").unwrap().with_args([port("http", 3500)]);
        manifest
            .add_service(
                "rollup-boost",
                RollupBoost { el_node: "op-geth".into(), builder: "http://builder:8551".into() },
            )
            .unwrap();
        manifest
            .add_service(
                "op-node",
                OpNode { l1_node: "el".into(), l1_beacon: "beacon".into(), l2_node: "rollup-boost".into() },
            )
            .unwrap();
        manifest.add_service("op-geth", OpGeth { use_deterministic_p2p_key: true }).unwrap();
        manifest
            .add_service(
                "op-batcher",
                OpBatcher {
                    l1_node: "el".into(),
                    l2_node: "op-geth".into(),
                    rollup_node: "op-node".into(),
                    max_channel_duration: 2,
                },
            )
            .unwrap();
        manifest.resolve().unwrap();

        let op_geth = manifest.require_service("op-geth").unwrap();
        let p2p = op_geth.port("p2p").unwrap().port;
        assert_eq!(
            op_geth.labels[ENODE_LABEL],
            format!("enode://{DETERMINISTIC_ENODE_ID}@op-geth:{p2p}")
        );

        let boost = manifest.require_service("rollup-boost").unwrap();
        let boost_port = boost.port("authrpc").unwrap().port;
        let op_node = manifest.require_service("op-node").unwrap();
        assert!(op_node.args.contains(&format!("--l2=http://rollup-boost:{boost_port}")));
        assert!(op_node.args.contains(&"--l1=http://el:8545".to_string()));

        let batcher = manifest.require_service("op-batcher").unwrap();
        assert!(batcher.args.contains(&"--max-channel-duration=2".to_string()));
        let op_node_http = op_node.port("http").unwrap().port;
        assert!(batcher.args.contains(&format!("--rollup-rpc=http://op-node:{op_node_http}")));

        let tcp = op_node.port("p2p").unwrap();
        let udp = op_node.port("p2p-udp").unwrap();
        assert_eq!((tcp.protocol, udp.protocol), (Protocol::Tcp, Protocol::Udp));
        assert!(op_node.args.contains(&format!("--p2p.listen.tcp={}", tcp.port)));
        assert!(op_node.args.contains(&format!("--p2p.listen.udp={}", udp.port)));

        // op-node and op-batcher both ask for 7300.
        assert_ne!(
            op_node.port("metrics").unwrap().port,
            batcher.port("metrics").unwrap().port
        );
    }
}
