//! CLI binary for building local test network manifests.

use clap::Parser;
use eyre::{Result, WrapErr};
use playground::{
    AlloyEmitter, CaddyEmitter, Emitter, ExContext, OutputDir, ProcessEnv,
    cli::{Command, CookArgs, PlaygroundCli},
    recipe::all_recipes,
    unique_name,
};
use tracing::info;

fn main() -> Result<()> {
    let cli = PlaygroundCli::parse();
    cli.log.init_tracing_subscriber()?;

    match cli.command {
        Command::Cook(args) => cook(args),
        Command::Recipes => {
            list_recipes();
            Ok(())
        }
    }
}

fn cook(args: CookArgs) -> Result<()> {
    let recipe = args.recipe.recipe();
    info!(recipe = recipe.name(), output = %args.output.display(), "cooking recipe");

    let out = OutputDir::create(&args.output)
        .wrap_err_with(|| format!("Failed to create output directory {}", args.output.display()))?;
    let artifacts =
        recipe.artifacts().build(out).wrap_err("Failed to generate shared artifacts")?;

    let network = args.network.clone().unwrap_or_else(|| unique_name("playground"));
    let ctx = ExContext::new(artifacts.out().clone())
        .with_network(network)
        .with_reverse_proxy(args.with_caddy);

    let mut manifest = recipe
        .apply(ctx, &artifacts)
        .wrap_err_with(|| format!("Failed to plan recipe {}", recipe.name()))?;
    manifest.resolve().wrap_err("Failed to resolve manifest")?;

    let mut emitters: Vec<Box<dyn Emitter>> = Vec::new();
    if args.with_caddy {
        emitters.push(Box::new(CaddyEmitter::new().with_exposed(args.expose.iter().cloned())));
    }
    if args.with_alloy {
        emitters.push(Box::new(AlloyEmitter::new(ProcessEnv::load())));
    }
    for emitter in &emitters {
        emitter
            .emit(&mut manifest)
            .wrap_err_with(|| format!("Failed to add {}", emitter.name()))?;
        manifest.resolve().wrap_err("Failed to resolve manifest")?;
    }

    let path = manifest.write().wrap_err("Failed to write manifest")?;

    println!("Manifest written to {}", path.display());
    println!("Network: {}", manifest.ctx().network());
    for service in manifest.services() {
        let ports: Vec<String> =
            service.ports.iter().map(|p| format!("{}={}", p.name, p.port)).collect();
        println!("  {:<16} {:<64} {}", service.name(), service.image_ref(), ports.join(" "));
    }

    let output = recipe.output(&manifest);
    if !output.is_empty() {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

fn list_recipes() {
    for recipe in all_recipes() {
        println!("{:<12} {}", recipe.name(), recipe.description());
        for arg in recipe.flags().get_arguments() {
            let Some(long) = arg.get_long() else { continue };
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            println!("    --{long:<32} {help}");
        }
    }
}
