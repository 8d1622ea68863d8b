//! CLI definitions for the `playground` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{logging::LogArgs, recipe::RecipeCommand};

/// Build deployment manifests for local test networks
#[derive(Parser, Debug)]
#[command(name = "playground", version, about = "Build deployment manifests for local test networks")]
pub struct PlaygroundCli {
    /// Logging flags
    #[command(flatten)]
    pub log: LogArgs,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands for the playground CLI
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Plan a recipe and write its artifacts and manifest
    Cook(CookArgs),
    /// List available recipes and their flags
    Recipes,
}

/// Arguments of `cook`, shared by every recipe.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CookArgs {
    /// Output directory for artifacts and the manifest.
    #[arg(long, default_value = "output", env = "PLAYGROUND_OUTPUT", global = true)]
    pub output: PathBuf,

    /// Docker network name. A unique name is generated when unset.
    #[arg(long, env = "PLAYGROUND_NETWORK", global = true)]
    pub network: Option<String>,

    /// Front the run with a Caddy reverse proxy.
    #[arg(long, env = "PLAYGROUND_WITH_CADDY", global = true)]
    pub with_caddy: bool,

    /// Ship metrics and logs with Grafana Alloy.
    #[arg(long, env = "PLAYGROUND_WITH_ALLOY", global = true)]
    pub with_alloy: bool,

    /// Only proxy these services. Defaults to every service.
    #[arg(long = "expose", value_delimiter = ',', global = true)]
    pub expose: Vec<String>,

    /// Recipe to cook.
    #[command(subcommand)]
    pub recipe: RecipeCommand,
}
