//! Well-known development keys baked into generated services.
//!
//! These are the public Anvil test keys. They must never hold real funds.

/// A development account used by one of the network roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DevAccount {
    /// Role name.
    pub role: &'static str,
    /// Hex-encoded private key, without `0x`.
    pub private_key: &'static str,
}

impl DevAccount {
    /// Returns the private key with a `0x` prefix.
    pub fn private_key_hex(&self) -> String {
        format!("0x{}", self.private_key)
    }
}

/// Key signing unsafe L2 blocks gossiped by the sequencer op-node.
pub const SEQUENCER: DevAccount = DevAccount {
    role: "sequencer",
    private_key: "8b3a350cf5c34c9194ca85829a2df0ec3153be0318b5e2d3348e872092edffba",
};

/// Key the batcher submits L1 transactions with.
pub const BATCHER: DevAccount = DevAccount {
    role: "batcher",
    private_key: "59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d",
};

/// Key the assertion DA server signs responses with.
pub const ASSERTION_DA: DevAccount = DevAccount {
    role: "assertion-da",
    private_key: "5de4111afa1a4b94908f83103eb1f1706367c2e68ca870fc3fb9a804cdab365a",
};

/// Fixed devp2p node key for execution clients that peers must dial by enode.
pub const DETERMINISTIC_P2P_KEY: &str =
    "a11ac89899cd86e36b6fb881ec1255b8a92a688790b7d950f8b7d8dd626671fb";

/// Public node id derived from [`DETERMINISTIC_P2P_KEY`].
pub const DETERMINISTIC_ENODE_ID: &str = "3479db4d9217fb5d7a8ed4d61ac36e120b05d36c2eefb795dc42ff2e971f251a2315f5649ea1833271e020b9adc98d5db9973c7ed92d6b2f1f2223088c3d852f";
