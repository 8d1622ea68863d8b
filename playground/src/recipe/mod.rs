//! Recipes turn a handful of flags into a complete topology.
//!
//! A recipe decides which services exist and how they reference each other.
//! It never picks ports or addresses itself; those stay as expressions until
//! [`Manifest::resolve`] runs.

use std::{collections::BTreeMap, fmt};

use clap::{Args, Subcommand};

use crate::{
    Manifest,
    artifacts::{Artifacts, ArtifactsBuilder},
    error::Result,
    manifest::ExContext,
};

mod l1;
pub use l1::L1Recipe;

mod op_talos;
pub use op_talos::{LOCAL_OP_TALOS, OP_GETH_ENODE, OpTalosRecipe, parse_fork_block};

/// A flag-driven planner for one kind of network.
pub trait Recipe: fmt::Debug {
    /// Name used on the command line.
    fn name(&self) -> &'static str;

    /// One-line description.
    fn description(&self) -> &'static str;

    /// The recipe's flags as a clap command.
    fn flags(&self) -> clap::Command;

    /// Shared files this topology needs, configured from the flags.
    fn artifacts(&self) -> ArtifactsBuilder;

    /// Registers every service of the topology.
    fn apply(&self, ctx: ExContext, artifacts: &Artifacts) -> Result<Manifest>;

    /// Values worth reporting once the manifest is resolved.
    fn output(&self, manifest: &Manifest) -> BTreeMap<String, serde_json::Value>;
}

/// Builds the flag command of a recipe from its derived [`Args`].
pub(crate) fn flags_of<A: Args>(name: &'static str, description: &'static str) -> clap::Command {
    A::augment_args(clap::Command::new(name).about(description))
}

/// Every recipe the binary knows, with default flags.
pub fn all_recipes() -> Vec<Box<dyn Recipe>> {
    vec![Box::new(L1Recipe::default()), Box::new(OpTalosRecipe::default())]
}

/// Recipe selection on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum RecipeCommand {
    /// Deploy an L1 only: Reth with a Lighthouse beacon node and validator.
    L1(L1Recipe),
    /// Deploy an OP stack with assertion DA and an optional external builder.
    OpTalos(OpTalosRecipe),
}

impl RecipeCommand {
    /// Returns the selected recipe.
    pub fn recipe(&self) -> &dyn Recipe {
        match self {
            Self::L1(recipe) => recipe,
            Self::OpTalos(recipe) => recipe,
        }
    }
}
