#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/base/base/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod error;
pub use error::{ManifestError, Result};

mod output;
pub use output::OutputDir;

mod utils;
pub use utils::unique_name;

pub mod artifacts;
pub mod cli;
pub mod component;
pub mod config;
pub mod emitter;
pub mod images;
pub mod logging;
pub mod manifest;
pub mod recipe;
pub mod template;

pub use artifacts::{Artifacts, ArtifactsBuilder};
pub use component::Component;
pub use emitter::{AlloyEmitter, CaddyEmitter, ConfigSource, Emitter, ProcessEnv};
pub use manifest::{ExContext, Manifest, Service};
pub use recipe::{L1Recipe, OpTalosRecipe, Recipe};
