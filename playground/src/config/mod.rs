//! Static configuration shared by components: dev keys and chain ids.

mod accounts;
pub use accounts::{
    ASSERTION_DA, BATCHER, DETERMINISTIC_ENODE_ID, DETERMINISTIC_P2P_KEY, DevAccount, SEQUENCER,
};

/// L1 chain id of generated networks.
pub const L1_CHAIN_ID: u64 = 1337;

/// L2 chain id of generated networks.
pub const L2_CHAIN_ID: u64 = 84538453;
