//! The op-talos recipe: an OP stack with assertion DA and an optional external builder.

use std::collections::BTreeMap;

use clap::Args;
use tracing::debug;

use super::{Recipe, flags_of};
use crate::{
    Manifest,
    artifacts::{Artifacts, ArtifactsBuilder, DEFAULT_OP_BLOCK_TIME},
    component::{
        AssertionDa, ENODE_LABEL, LighthouseBeaconNode, LighthouseValidator, OpBatcher, OpGeth,
        OpNode, OpTalos, RethEl, RollupBoost,
    },
    error::Result,
    manifest::ExContext,
    template::connect,
};

/// `--external-builder` value that deploys op-talos inside the run.
pub const LOCAL_OP_TALOS: &str = "op-talos";

/// Output key carrying the op-geth enode.
pub const OP_GETH_ENODE: &str = "op-geth-enode";

/// Parses a fork activation block. Negative and non-numeric values are rejected.
pub fn parse_fork_block(value: &str) -> std::result::Result<u64, String> {
    let value = value.trim();
    if value.starts_with('-') {
        return Err(format!("fork block must be non-negative, got {value}"));
    }
    value.parse::<u64>().map_err(|e| format!("invalid fork block {value:?}: {e}"))
}

/// An OP stack on top of an L1 devnet, with assertion DA and an optional external builder.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct OpTalosRecipe {
    /// External builder URL. `op-talos` deploys the builder in the run. Empty disables it.
    #[arg(long = "external-builder", default_value = "")]
    pub external_builder: String,

    /// Activate the latest L2 fork at this block. Disabled when absent.
    #[arg(long = "enable-latest-fork", value_parser = parse_fork_block, allow_negative_numbers = true)]
    pub enable_latest_fork: Option<u64>,

    /// L2 block time in seconds.
    #[arg(long = "block-time", default_value_t = DEFAULT_OP_BLOCK_TIME)]
    pub block_time: u64,

    /// Maximum channel duration for the batcher, in L1 blocks.
    #[arg(long = "batcher-max-channel-duration", default_value_t = 2)]
    pub batcher_max_channel_duration: u64,
}

impl Default for OpTalosRecipe {
    fn default() -> Self {
        Self {
            external_builder: String::new(),
            enable_latest_fork: None,
            block_time: DEFAULT_OP_BLOCK_TIME,
            batcher_max_channel_duration: 2,
        }
    }
}

impl OpTalosRecipe {
    /// Whether sequencing goes through rollup-boost to an external builder.
    pub fn external_building(&self) -> bool {
        !self.external_builder.is_empty()
    }
}

impl Recipe for OpTalosRecipe {
    fn name(&self) -> &'static str {
        "op-talos"
    }

    fn description(&self) -> &'static str {
        "Deploy an OP stack with assertion DA and an optional external builder"
    }

    fn flags(&self) -> clap::Command {
        flags_of::<Self>(self.name(), self.description())
    }

    fn artifacts(&self) -> ArtifactsBuilder {
        ArtifactsBuilder::new()
            .apply_latest_l2_fork(self.enable_latest_fork)
            .op_block_time(self.block_time)
    }

    fn apply(&self, ctx: ExContext, _artifacts: &Artifacts) -> Result<Manifest> {
        let mut manifest = Manifest::new(ctx);
        manifest.add_service("el", RethEl)?;
        manifest.add_service("beacon", LighthouseBeaconNode { execution_node: "el".into() })?;
        manifest.add_service("validator", LighthouseValidator { beacon_node: "beacon".into() })?;

        manifest.add_service("assertion-da", AssertionDa::default())?;

        let mut builder = self.external_builder.clone();
        if self.external_builder == LOCAL_OP_TALOS {
            manifest.add_service(
                LOCAL_OP_TALOS,
                OpTalos {
                    assertion_da: "assertion-da".into(),
                    trusted_peer: Some("op-geth".into()),
                },
            )?;
            builder = connect(LOCAL_OP_TALOS, "authrpc");
        }

        let mut l2_node = "op-geth";
        if self.external_building() {
            debug!(builder = %builder, "routing engine API through rollup-boost");
            l2_node = "rollup-boost";
            manifest.add_service("rollup-boost", RollupBoost { el_node: "op-geth".into(), builder })?;
        }

        manifest.add_service(
            "op-node",
            OpNode { l1_node: "el".into(), l1_beacon: "beacon".into(), l2_node: l2_node.into() },
        )?;
        manifest.add_service(
            "op-geth",
            OpGeth { use_deterministic_p2p_key: self.external_building() },
        )?;
        manifest.add_service(
            "op-batcher",
            OpBatcher {
                l1_node: "el".into(),
                l2_node: "op-geth".into(),
                rollup_node: "op-node".into(),
                max_channel_duration: self.batcher_max_channel_duration,
            },
        )?;
        Ok(manifest)
    }

    fn output(&self, manifest: &Manifest) -> BTreeMap<String, serde_json::Value> {
        manifest
            .get_service("op-geth")
            .and_then(|op_geth| op_geth.labels.get(ENODE_LABEL))
            .map(|enode| (OP_GETH_ENODE.to_string(), serde_json::Value::from(enode.as_str())))
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use rstest::rstest;

    use super::*;
    use crate::{OutputDir, config::DETERMINISTIC_ENODE_ID};

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        recipe: OpTalosRecipe,
    }

    fn plan(recipe: &OpTalosRecipe) -> Manifest {
        let out = OutputDir::new_unchecked("/tmp/op-talos");
        let artifacts = Artifacts::new_unchecked(out.clone(), recipe.artifacts().validate().unwrap());
        recipe.apply(ExContext::new(out), &artifacts).unwrap()
    }

    fn names(manifest: &Manifest) -> Vec<&str> {
        manifest.services().map(|s| s.name()).collect()
    }

    #[test]
    fn test_defaults_match_cli() {
        let parsed = TestCli::parse_from(["test"]).recipe;
        assert_eq!(parsed, OpTalosRecipe::default());
        assert_eq!(parsed.enable_latest_fork, None);
    }

    #[rstest]
    #[case(&[], None)]
    #[case(&["--enable-latest-fork", "0"], Some(0))]
    #[case(&["--enable-latest-fork", "42"], Some(42))]
    fn test_fork_flag(#[case] args: &[&str], #[case] expected: Option<u64>) {
        let cli = TestCli::parse_from(std::iter::once("test").chain(args.iter().copied()));
        assert_eq!(cli.recipe.enable_latest_fork, expected);
    }

    #[rstest]
    #[case("-1")]
    #[case("soon")]
    fn test_fork_flag_rejected(#[case] value: &str) {
        assert!(TestCli::try_parse_from(["test", "--enable-latest-fork", value]).is_err());
    }

    #[test]
    fn test_without_external_builder() {
        let recipe = OpTalosRecipe::default();
        let mut manifest = plan(&recipe);
        assert_eq!(
            names(&manifest),
            ["el", "beacon", "validator", "assertion-da", "op-node", "op-geth", "op-batcher"]
        );

        manifest.resolve().unwrap();
        let op_node = manifest.require_service("op-node").unwrap();
        let authrpc = manifest.require_service("op-geth").unwrap().port("authrpc").unwrap().port;
        assert!(op_node.args.contains(&format!("--l2=http://op-geth:{authrpc}")));
        assert!(recipe.output(&manifest).is_empty());
    }

    #[test]
    fn test_local_op_talos_builder() {
        let recipe =
            OpTalosRecipe { external_builder: LOCAL_OP_TALOS.into(), ..Default::default() };
        let mut manifest = plan(&recipe);
        assert_eq!(
            names(&manifest),
            [
                "el",
                "beacon",
                "validator",
                "assertion-da",
                "op-talos",
                "rollup-boost",
                "op-node",
                "op-geth",
                "op-batcher",
            ]
        );

        manifest.resolve().unwrap();
        let talos_authrpc =
            manifest.require_service("op-talos").unwrap().port("authrpc").unwrap().port;
        let boost = manifest.require_service("rollup-boost").unwrap();
        assert!(boost.args.contains(&format!("--builder-url=http://op-talos:{talos_authrpc}")));

        let boost_authrpc = boost.port("authrpc").unwrap().port;
        let op_node = manifest.require_service("op-node").unwrap();
        assert!(op_node.args.contains(&format!("--l2=http://rollup-boost:{boost_authrpc}")));

        let output = recipe.output(&manifest);
        let enode = output[OP_GETH_ENODE].as_str().unwrap();
        assert!(enode.starts_with(&format!("enode://{DETERMINISTIC_ENODE_ID}@op-geth:")));
    }

    #[test]
    fn test_remote_builder_used_verbatim() {
        let recipe = OpTalosRecipe {
            external_builder: "http://builder.example:8551".into(),
            ..Default::default()
        };
        let mut manifest = plan(&recipe);
        assert!(manifest.get_service(LOCAL_OP_TALOS).is_none());
        manifest.resolve().unwrap();

        let boost = manifest.require_service("rollup-boost").unwrap();
        assert!(boost.args.contains(&"--builder-url=http://builder.example:8551".to_string()));
        assert!(recipe.output(&manifest).contains_key(OP_GETH_ENODE));
    }

    #[test]
    fn test_topology_is_deterministic() {
        let recipe =
            OpTalosRecipe { external_builder: LOCAL_OP_TALOS.into(), ..Default::default() };
        let mut first = plan(&recipe);
        let mut second = plan(&recipe);
        first.resolve().unwrap();
        second.resolve().unwrap();
        assert!(first.services().eq(second.services()));
    }
}
