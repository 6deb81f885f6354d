//! Immutable registry of supported networks.
//!
//! Each entry ties a chain id to its indexer deployment and to the platform key
//! the price catalog uses for contract addresses on that chain.

use crate::domain::ChainId;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub chain_id: ChainId,
    pub slug: &'static str,
    pub name: &'static str,
    /// Path segment of the indexer deployment for this chain.
    pub subgraph_id: &'static str,
    /// Price catalog platform key; `None` for testnets without market data.
    pub price_platform: Option<&'static str>,
    /// Catalog id of the chain's native asset, used for native super tokens.
    pub native_price_id: Option<&'static str>,
}

const NETWORKS: &[Network] = &[
    Network {
        chain_id: ChainId(1),
        slug: "eth-mainnet",
        name: "Ethereum",
        subgraph_id: "protocol-v1-eth-mainnet",
        price_platform: Some("ethereum"),
        native_price_id: Some("ethereum"),
    },
    Network {
        chain_id: ChainId(5),
        slug: "goerli",
        name: "Goerli",
        subgraph_id: "protocol-v1-goerli",
        price_platform: None,
        native_price_id: None,
    },
    Network {
        chain_id: ChainId(10),
        slug: "optimism",
        name: "Optimism",
        subgraph_id: "protocol-v1-optimism-mainnet",
        price_platform: Some("optimistic-ethereum"),
        native_price_id: Some("ethereum"),
    },
    Network {
        chain_id: ChainId(56),
        slug: "bsc",
        name: "BNB Smart Chain",
        subgraph_id: "protocol-v1-bsc-mainnet",
        price_platform: Some("binance-smart-chain"),
        native_price_id: Some("binancecoin"),
    },
    Network {
        chain_id: ChainId(100),
        slug: "gnosis",
        name: "Gnosis Chain",
        subgraph_id: "protocol-v1-xdai",
        price_platform: Some("xdai"),
        native_price_id: Some("xdai"),
    },
    Network {
        chain_id: ChainId(137),
        slug: "polygon",
        name: "Polygon",
        subgraph_id: "protocol-v1-matic",
        price_platform: Some("polygon-pos"),
        native_price_id: Some("matic-network"),
    },
    Network {
        chain_id: ChainId(8453),
        slug: "base",
        name: "Base",
        subgraph_id: "protocol-v1-base-mainnet",
        price_platform: Some("base"),
        native_price_id: Some("ethereum"),
    },
    Network {
        chain_id: ChainId(42161),
        slug: "arbitrum-one",
        name: "Arbitrum One",
        subgraph_id: "protocol-v1-arbitrum-one",
        price_platform: Some("arbitrum-one"),
        native_price_id: Some("ethereum"),
    },
    Network {
        chain_id: ChainId(42220),
        slug: "celo",
        name: "Celo",
        subgraph_id: "protocol-v1-celo-mainnet",
        price_platform: Some("celo"),
        native_price_id: Some("celo"),
    },
    Network {
        chain_id: ChainId(43113),
        slug: "avalanche-fuji",
        name: "Fuji (C-Chain)",
        subgraph_id: "protocol-v1-avalanche-fuji",
        price_platform: None,
        native_price_id: None,
    },
    Network {
        chain_id: ChainId(43114),
        slug: "avalanche",
        name: "Avalanche C",
        subgraph_id: "protocol-v1-avalanche-c",
        price_platform: Some("avalanche"),
        native_price_id: Some("avalanche-2"),
    },
    Network {
        chain_id: ChainId(80001),
        slug: "polygon-mumbai",
        name: "Polygon Mumbai",
        subgraph_id: "protocol-v1-mumbai",
        price_platform: None,
        native_price_id: None,
    },
    Network {
        chain_id: ChainId(84532),
        slug: "base-sepolia",
        name: "Base Sepolia",
        subgraph_id: "protocol-v1-base-sepolia",
        price_platform: Some("base-sepolia"),
        native_price_id: None,
    },
    Network {
        chain_id: ChainId(534352),
        slug: "scroll",
        name: "Scroll",
        subgraph_id: "protocol-v1-scroll-mainnet",
        price_platform: Some("scroll"),
        native_price_id: Some("ethereum"),
    },
    Network {
        chain_id: ChainId(666666666),
        slug: "degen",
        name: "Degen Chain",
        subgraph_id: "protocol-v1-degenchain",
        price_platform: Some("degen"),
        native_price_id: Some("degen-base"),
    },
    Network {
        chain_id: ChainId(11155420),
        slug: "optimism-sepolia",
        name: "Optimism Sepolia",
        subgraph_id: "protocol-v1-optimism-sepolia",
        price_platform: Some("optimism-sepolia"),
        native_price_id: None,
    },
];

/// Lookup table from chain id to [`Network`]; built once and shared read-only.
#[derive(Debug, Clone)]
pub struct NetworkRegistry {
    networks: BTreeMap<ChainId, Network>,
}

impl NetworkRegistry {
    pub fn new(networks: impl IntoIterator<Item = Network>) -> Self {
        Self {
            networks: networks.into_iter().map(|n| (n.chain_id, n)).collect(),
        }
    }

    /// Registry of all networks with a known indexer deployment.
    pub fn builtin() -> Self {
        Self::new(NETWORKS.iter().cloned())
    }

    pub fn get(&self, chain_id: ChainId) -> Option<&Network> {
        self.networks.get(&chain_id)
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.networks.keys().copied()
    }
}

impl Default for NetworkRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registry_lookup() {
        let registry = NetworkRegistry::builtin();
        let polygon = registry.get(ChainId(137)).unwrap();
        assert_eq!(polygon.slug, "polygon");
        assert_eq!(polygon.price_platform, Some("polygon-pos"));
        assert!(registry.get(ChainId(999_999)).is_none());
    }

    #[test]
    fn test_chain_ids_are_unique() {
        let registry = NetworkRegistry::builtin();
        assert_eq!(registry.chain_ids().count(), NETWORKS.len());
    }
}
