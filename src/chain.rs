use std::fmt;

use alloy::primitives::{address, Address};
use url::Url;

pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const BASE_SEPOLIA_CHAIN_ID: u64 = 84_532;
pub const ARBITRUM_SEPOLIA_CHAIN_ID: u64 = 421_614;

/// OP-stack `L2StandardBridge` predeploy.
pub const L2_STANDARD_BRIDGE: Address = address!("4200000000000000000000000000000000000010");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkId {
    Sepolia,
    T1Devnet,
    BaseSepolia,
    ArbitrumSepolia,
}

impl NetworkId {
    /// Display order of the balance panel.
    pub const ALL: [NetworkId; 4] = [
        NetworkId::Sepolia,
        NetworkId::T1Devnet,
        NetworkId::BaseSepolia,
        NetworkId::ArbitrumSepolia,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NetworkId::Sepolia => "Sepolia",
            NetworkId::T1Devnet => "T1 Devnet",
            NetworkId::BaseSepolia => "Base Sepolia",
            NetworkId::ArbitrumSepolia => "Arbitrum Sepolia",
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub id: NetworkId,
    /// Networks without an endpoint are shown on the balance panel but never sent from.
    pub rpc_url: Option<Url>,
    pub chain_id: u64,
    pub bridge_contract: Address,
}

impl Network {
    pub fn name(&self) -> &'static str {
        self.id.name()
    }
}

/// The fixed set of networks the bot knows about, built once at startup.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: [Network; 4],
}

impl NetworkRegistry {
    pub fn new(
        sepolia: Network,
        t1: Network,
        base_sepolia: Network,
        arbitrum_sepolia: Network,
    ) -> Self {
        let mut networks = [sepolia, t1, base_sepolia, arbitrum_sepolia];
        networks.sort_by_key(|network| network.id as usize);
        debug_assert!(
            networks.iter().zip(NetworkId::ALL).all(|(network, id)| network.id == id),
            "registry needs exactly one network per id"
        );
        Self { networks }
    }

    pub fn get(&self, id: NetworkId) -> &Network {
        // Sorted by id in `new`.
        &self.networks[id as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Network> {
        self.networks.iter()
    }

    pub fn pair(&self, pair: BridgePair) -> (&Network, &Network) {
        (self.get(pair.source), self.get(pair.destination))
    }
}

/// Direction of one bridge attempt. Consecutive cycles rotate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgePair {
    pub source: NetworkId,
    pub destination: NetworkId,
}

impl BridgePair {
    pub const SEPOLIA_TO_T1: BridgePair = BridgePair {
        source: NetworkId::Sepolia,
        destination: NetworkId::T1Devnet,
    };
    pub const ARBITRUM_TO_BASE: BridgePair = BridgePair {
        source: NetworkId::ArbitrumSepolia,
        destination: NetworkId::BaseSepolia,
    };
    pub const BASE_TO_ARBITRUM: BridgePair = BridgePair {
        source: NetworkId::BaseSepolia,
        destination: NetworkId::ArbitrumSepolia,
    };

    #[must_use]
    pub fn rotate(self) -> Self {
        Self {
            source: self.destination,
            destination: self.source,
        }
    }
}

impl fmt::Display for BridgePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.destination)
    }
}
