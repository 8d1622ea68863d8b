//! L1-only recipe: Reth with a Lighthouse beacon node and validator.

use std::collections::BTreeMap;

use clap::Args;

use super::{Recipe, flags_of};
use crate::{
    Manifest,
    artifacts::{Artifacts, ArtifactsBuilder, DEFAULT_L1_BLOCK_TIME},
    component::{LighthouseBeaconNode, LighthouseValidator, RethEl},
    error::Result,
    manifest::ExContext,
};

/// An L1 devnet on its own.
#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct L1Recipe {
    /// L1 slot time in seconds.
    #[arg(long = "block-time", default_value_t = DEFAULT_L1_BLOCK_TIME)]
    pub block_time: u64,
}

impl Default for L1Recipe {
    fn default() -> Self {
        Self { block_time: DEFAULT_L1_BLOCK_TIME }
    }
}

impl Recipe for L1Recipe {
    fn name(&self) -> &'static str {
        "l1"
    }

    fn description(&self) -> &'static str {
        "Deploy an L1 devnet"
    }

    fn flags(&self) -> clap::Command {
        flags_of::<Self>(self.name(), self.description())
    }

    fn artifacts(&self) -> ArtifactsBuilder {
        ArtifactsBuilder::new().l1_block_time(self.block_time)
    }

    fn apply(&self, ctx: ExContext, _artifacts: &Artifacts) -> Result<Manifest> {
        let mut manifest = Manifest::new(ctx);
        manifest.add_service("el", RethEl)?;
        manifest.add_service("beacon", LighthouseBeaconNode { execution_node: "el".into() })?;
        manifest.add_service("validator", LighthouseValidator { beacon_node: "beacon".into() })?;
        Ok(manifest)
    }

    fn output(&self, _manifest: &Manifest) -> BTreeMap<String, serde_json::Value> {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputDir;

    #[test]
    fn test_l1_topology() {
        let temp = tempfile::tempdir().unwrap();
        let recipe = L1Recipe::default();
        let artifacts = recipe.artifacts().build(OutputDir::create(temp.path()).unwrap()).unwrap();
        assert_eq!(artifacts.params().l1_block_time, DEFAULT_L1_BLOCK_TIME);

        let mut manifest =
            recipe.apply(ExContext::new(artifacts.out().clone()), &artifacts).unwrap();
        manifest.resolve().unwrap();

        let names: Vec<_> = manifest.services().map(|s| s.name()).collect();
        assert_eq!(names, ["el", "beacon", "validator"]);
        assert!(recipe.output(&manifest).is_empty());
    }
}
