//! Shared files consumed by several services: chain configs, JWT secret, keys.
//!
//! Recipes describe the parameters through an [`ArtifactsBuilder`]; calling
//! [`ArtifactsBuilder::build`] validates them and writes every file before any
//! service is registered, so components can mount them by name.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::RngCore;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::{
    OutputDir,
    config::{DETERMINISTIC_P2P_KEY, L1_CHAIN_ID, L2_CHAIN_ID},
    error::{ManifestError, Result},
};

/// Hex-encoded engine API JWT secret.
pub const JWT_SECRET: &str = "jwtsecret";
/// L1 execution genesis.
pub const L1_GENESIS: &str = "genesis.json";
/// L2 execution genesis.
pub const L2_GENESIS: &str = "l2-genesis.json";
/// Rollup configuration for op-node.
pub const ROLLUP_CONFIG: &str = "rollup.json";
/// Beacon chain testnet directory.
pub const TESTNET_DIR: &str = "testnet";
/// Fixed devp2p key for execution clients with a stable enode.
pub const P2P_KEY: &str = "deterministic_p2p_key.txt";

/// Default L1 slot duration in seconds.
pub const DEFAULT_L1_BLOCK_TIME: u64 = 12;
/// Default L2 block time in seconds.
pub const DEFAULT_OP_BLOCK_TIME: u64 = 2;

/// Validated chain parameters written into the generated files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainParams {
    /// L1 chain id.
    pub l1_chain_id: u64,
    /// L2 chain id.
    pub l2_chain_id: u64,
    /// Genesis timestamp shared by L1 and L2.
    pub genesis_time: u64,
    /// L1 slot duration in seconds.
    pub l1_block_time: u64,
    /// L2 block time in seconds.
    pub l2_block_time: u64,
    /// L2 block at which the latest fork activates. `None` keeps it disabled.
    pub latest_fork_block: Option<u64>,
    /// Timestamp matching `latest_fork_block`.
    pub latest_fork_time: Option<u64>,
}

/// Accumulates recipe-level parameters for the shared files.
#[derive(Debug, Clone)]
pub struct ArtifactsBuilder {
    l1_block_time: u64,
    op_block_time: u64,
    latest_l2_fork: Option<u64>,
    genesis_time: Option<u64>,
}

impl Default for ArtifactsBuilder {
    fn default() -> Self {
        Self {
            l1_block_time: DEFAULT_L1_BLOCK_TIME,
            op_block_time: DEFAULT_OP_BLOCK_TIME,
            latest_l2_fork: None,
            genesis_time: None,
        }
    }
}

impl ArtifactsBuilder {
    /// Creates a builder with default block times and the latest fork disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Activates the latest L2 fork at the given block, or disables it with `None`.
    ///
    /// `Some(0)` activates the fork at genesis; it is not the same as `None`.
    pub const fn apply_latest_l2_fork(mut self, block: Option<u64>) -> Self {
        self.latest_l2_fork = block;
        self
    }

    /// Sets the L2 block time in seconds.
    pub const fn op_block_time(mut self, seconds: u64) -> Self {
        self.op_block_time = seconds;
        self
    }

    /// Sets the L1 slot duration in seconds.
    pub const fn l1_block_time(mut self, seconds: u64) -> Self {
        self.l1_block_time = seconds;
        self
    }

    /// Pins the genesis timestamp. Defaults to the current time.
    pub const fn genesis_time(mut self, timestamp: u64) -> Self {
        self.genesis_time = Some(timestamp);
        self
    }

    /// Checks the parameters without writing anything.
    pub fn validate(&self) -> Result<ChainParams> {
        if self.l1_block_time == 0 {
            return Err(invalid("l1-block-time", "must be greater than zero"));
        }
        if self.op_block_time == 0 {
            return Err(invalid("block-time", "must be greater than zero"));
        }

        let genesis_time = self.genesis_time.unwrap_or_else(now);
        let latest_fork_time = self
            .latest_l2_fork
            .map(|block| {
                block
                    .checked_mul(self.op_block_time)
                    .and_then(|offset| offset.checked_add(genesis_time))
                    .ok_or_else(|| {
                        invalid("enable-latest-fork", format!("block {block} is out of range"))
                    })
            })
            .transpose()?;

        Ok(ChainParams {
            l1_chain_id: L1_CHAIN_ID,
            l2_chain_id: L2_CHAIN_ID,
            genesis_time,
            l1_block_time: self.l1_block_time,
            l2_block_time: self.op_block_time,
            latest_fork_block: self.latest_l2_fork,
            latest_fork_time,
        })
    }

    /// Validates the parameters and writes every shared file into `out`.
    ///
    /// Nothing is written when validation fails.
    pub fn build(self, out: OutputDir) -> Result<Artifacts> {
        let params = self.validate()?;

        out.write_file(JWT_SECRET, random_jwt_secret_hex())?;
        out.write_file(P2P_KEY, DETERMINISTIC_P2P_KEY)?;
        out.write_file(L1_GENESIS, pretty(L1_GENESIS, &l1_genesis(&params))?)?;
        out.write_file(L2_GENESIS, pretty(L2_GENESIS, &l2_genesis(&params))?)?;
        out.write_file(ROLLUP_CONFIG, pretty(ROLLUP_CONFIG, &rollup_config(&params))?)?;
        out.write_file(&format!("{TESTNET_DIR}/config.yaml"), beacon_config(&params))?;
        out.write_file(&format!("{TESTNET_DIR}/deploy_block.txt"), "0")?;

        info!(
            out = %out.path().display(),
            block_time = params.l2_block_time,
            latest_fork_block = ?params.latest_fork_block,
            "generated artifacts"
        );
        Ok(Artifacts { out, params })
    }
}

/// The realized shared files of a run.
#[derive(Debug, Clone)]
pub struct Artifacts {
    out: OutputDir,
    params: ChainParams,
}

impl Artifacts {
    /// Pairs validated parameters with a directory, without writing anything.
    #[cfg(test)]
    pub(crate) const fn new_unchecked(out: OutputDir, params: ChainParams) -> Self {
        Self { out, params }
    }

    /// Returns the directory the files were written to.
    pub const fn out(&self) -> &OutputDir {
        &self.out
    }

    /// Returns the chain parameters the files were generated from.
    pub const fn params(&self) -> &ChainParams {
        &self.params
    }
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ManifestError {
    ManifestError::InvalidParameter { name, reason: reason.into() }
}

fn now() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or_default()
}

fn random_jwt_secret_hex() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn pretty(name: &'static str, value: &serde_json::Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ManifestError::Serialize(name, e))
}

fn l1_genesis(params: &ChainParams) -> serde_json::Value {
    json!({
        "config": {
            "chainId": params.l1_chain_id,
            "terminalTotalDifficulty": 0,
            "shanghaiTime": 0,
            "cancunTime": 0,
            "pragueTime": 0,
        },
        "timestamp": format!("{:#x}", params.genesis_time),
        "gasLimit": "0x1c9c380",
        "difficulty": "0x0",
        "alloc": {},
    })
}

fn l2_genesis(params: &ChainParams) -> serde_json::Value {
    json!({
        "config": {
            "chainId": params.l2_chain_id,
            "bedrockBlock": 0,
            "regolithTime": 0,
            "canyonTime": 0,
            "ecotoneTime": 0,
            "fjordTime": 0,
            "graniteTime": 0,
            "holoceneTime": 0,
            "isthmusTime": params.latest_fork_time,
            "optimism": {
                "eip1559Elasticity": 6,
                "eip1559Denominator": 50,
                "eip1559DenominatorCanyon": 250,
            },
        },
        "timestamp": format!("{:#x}", params.genesis_time),
        "gasLimit": "0x3938700",
        "alloc": {},
    })
}

fn rollup_config(params: &ChainParams) -> serde_json::Value {
    json!({
        "genesis": {
            "l1": { "number": 0 },
            "l2": { "number": 0 },
            "l2_time": params.genesis_time,
        },
        "block_time": params.l2_block_time,
        "max_sequencer_drift": 600,
        "seq_window_size": 3600,
        "channel_timeout": 300,
        "l1_chain_id": params.l1_chain_id,
        "l2_chain_id": params.l2_chain_id,
        "isthmus_time": params.latest_fork_time,
    })
}

fn beacon_config(params: &ChainParams) -> String {
    format!(
        "PRESET_BASE: 'mainnet'\n\
         CONFIG_NAME: 'playground'\n\
         MIN_GENESIS_TIME: {genesis}\n\
         GENESIS_DELAY: 0\n\
         SECONDS_PER_SLOT: {slot}\n\
         DEPOSIT_CHAIN_ID: {chain}\n\
         DEPOSIT_NETWORK_ID: {chain}\n",
        genesis = params.genesis_time,
        slot = params.l1_block_time,
        chain = params.l1_chain_id,
    )
}
