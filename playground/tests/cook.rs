//! End-to-end tests cooking recipes into a temporary output directory.

use std::collections::{BTreeMap, HashSet};

use playground::{
    AlloyEmitter, CaddyEmitter, Emitter, ExContext, ManifestError, OpTalosRecipe, OutputDir,
    Recipe,
    artifacts::{JWT_SECRET, L2_GENESIS, P2P_KEY},
    emitter::{ALLOY_CONFIG, ALLOY_SERVICE, CADDY_SERVICE, CADDYFILE, GRAFANA_ENV},
    logging::init_test_tracing,
    manifest::MANIFEST_FILE,
    recipe::{LOCAL_OP_TALOS, OP_GETH_ENODE},
};

fn grafana_env() -> BTreeMap<String, String> {
    GRAFANA_ENV.iter().map(|name| (name.to_string(), "set".to_string())).collect()
}

#[test]
fn test_cook_op_talos_with_sidecars() {
    init_test_tracing();
    let temp = tempfile::tempdir().unwrap();

    let recipe = OpTalosRecipe {
        external_builder: LOCAL_OP_TALOS.into(),
        enable_latest_fork: Some(0),
        ..Default::default()
    };
    let artifacts = recipe.artifacts().build(OutputDir::create(temp.path()).unwrap()).unwrap();
    for file in [JWT_SECRET, P2P_KEY, L2_GENESIS] {
        assert!(artifacts.out().exists(file), "{file} missing");
    }

    let ctx = ExContext::new(artifacts.out().clone()).with_reverse_proxy(true);
    let mut manifest = recipe.apply(ctx, &artifacts).unwrap();
    manifest.resolve().unwrap();

    CaddyEmitter::new().emit(&mut manifest).unwrap();
    assert!(!manifest.is_resolved());
    assert!(matches!(
        AlloyEmitter::new(grafana_env()).emit(&mut manifest),
        Err(ManifestError::Unresolved)
    ));
    manifest.resolve().unwrap();
    AlloyEmitter::new(grafana_env()).emit(&mut manifest).unwrap();
    manifest.resolve().unwrap();

    assert!(manifest.get_service(CADDY_SERVICE).is_some());
    assert!(manifest.get_service(ALLOY_SERVICE).is_some());
    assert!(artifacts.out().exists(CADDYFILE));
    assert!(artifacts.out().exists(ALLOY_CONFIG));

    let path = manifest.write().unwrap();
    assert!(path.ends_with(MANIFEST_FILE));
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("{{"), "unresolved expression in manifest");

    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let services = json["services"].as_array().unwrap();
    assert_eq!(services.len(), manifest.len());

    let ports: Vec<u64> = services
        .iter()
        .flat_map(|s| s["ports"].as_array().unwrap().iter().map(|p| p["port"].as_u64().unwrap()))
        .collect();
    let unique: HashSet<_> = ports.iter().collect();
    assert_eq!(unique.len(), ports.len(), "port assigned twice");

    let output = recipe.output(&manifest);
    assert!(output[OP_GETH_ENODE].as_str().unwrap().starts_with("enode://"));
}

#[test]
fn test_invalid_block_time_writes_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let recipe = OpTalosRecipe { block_time: 0, ..Default::default() };

    let err = recipe.artifacts().build(OutputDir::create(temp.path()).unwrap()).unwrap_err();

    assert!(matches!(err, ManifestError::InvalidParameter { name: "block-time", .. }));
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 0);
}

#[test]
fn test_alloy_missing_configuration_keeps_manifest() {
    let temp = tempfile::tempdir().unwrap();
    let recipe = OpTalosRecipe::default();
    let artifacts = recipe.artifacts().build(OutputDir::create(temp.path()).unwrap()).unwrap();
    let mut manifest =
        recipe.apply(ExContext::new(artifacts.out().clone()), &artifacts).unwrap();
    manifest.resolve().unwrap();
    let before = manifest.len();

    let err = AlloyEmitter::new(BTreeMap::new()).emit(&mut manifest).unwrap_err();

    assert!(matches!(err, ManifestError::MissingConfiguration(ref names) if names.len() == 13));
    assert_eq!(manifest.len(), before);
    manifest.write().unwrap();
}
