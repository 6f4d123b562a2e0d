use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a settlement currency, e.g. `ETH-sepolia` or `USDC-mainnet`.
///
/// The id encodes both the asset and the network it settles on; the same
/// asset on two networks is two distinct currencies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyId(pub String);

impl CurrencyId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CurrencyId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Chain a currency settles on. The wallet adapter is asked to switch to this
/// network before any transaction is submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Sepolia,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Sepolia => write!(f, "sepolia"),
        }
    }
}

/// How the asset is settled on chain.
///
/// ERC-20 settlements need a token allowance before the payment itself, so
/// the payment executor plans an extra approval transaction for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum AssetKind {
    Native,
    Erc20 { token_address: String },
}

/// Static catalog entry for a supported settlement currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub symbol: String,
    pub name: String,
    pub network: Network,
    pub decimals: u32,
    pub kind: AssetKind,
}

impl Currency {
    fn native(id: &str, symbol: &str, name: &str, network: Network, decimals: u32) -> Self {
        Self {
            id: CurrencyId::from(id),
            symbol: symbol.to_string(),
            name: name.to_string(),
            network,
            decimals,
            kind: AssetKind::Native,
        }
    }

    fn erc20(
        id: &str,
        symbol: &str,
        name: &str,
        network: Network,
        decimals: u32,
        token_address: &str,
    ) -> Self {
        Self {
            id: CurrencyId::from(id),
            symbol: symbol.to_string(),
            name: name.to_string(),
            network,
            decimals,
            kind: AssetKind::Erc20 {
                token_address: token_address.to_string(),
            },
        }
    }

    /// All currencies the engine knows how to settle.
    pub fn known() -> Vec<Currency> {
        vec![
            Currency::native("ETH-mainnet", "ETH", "Ether", Network::Mainnet, 18),
            Currency::native("ETH-sepolia", "ETH", "Sepolia Ether", Network::Sepolia, 18),
            Currency::erc20(
                "USDC-mainnet",
                "USDC",
                "USD Coin",
                Network::Mainnet,
                6,
                "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48",
            ),
            Currency::erc20(
                "USDT-mainnet",
                "USDT",
                "Tether USD",
                Network::Mainnet,
                6,
                "0xdAC17F958D2ee523a2206206994597C13D831ec7",
            ),
            Currency::erc20(
                "DAI-mainnet",
                "DAI",
                "Dai Stablecoin",
                Network::Mainnet,
                18,
                "0x6B175474E89094C44Da98b954EedeAC495271d0F",
            ),
            Currency::erc20(
                "fUSDT-sepolia",
                "fUSDT",
                "Faucet Tether USD",
                Network::Sepolia,
                6,
                "0x419Fe9f14Ff3aA22e46ff1d03a73EdF3b70A62ED",
            ),
            Currency::erc20(
                "FAU-sepolia",
                "FAU",
                "Faucet Token",
                Network::Sepolia,
                18,
                "0xFab46E002BbF0b4509813474841E0716E6730136",
            ),
        ]
    }

    /// Catalog lookup by id.
    pub fn lookup(id: &CurrencyId) -> Option<Currency> {
        Currency::known().into_iter().find(|c| &c.id == id)
    }

    /// Whether settling this currency requires a pre-approval transaction.
    pub fn requires_approval(&self) -> bool {
        matches!(self.kind, AssetKind::Erc20 { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_currency() {
        let eth = Currency::lookup(&CurrencyId::from("ETH-sepolia")).unwrap();
        assert_eq!(eth.symbol, "ETH");
        assert_eq!(eth.network, Network::Sepolia);
        assert_eq!(eth.decimals, 18);
        assert!(!eth.requires_approval());
    }

    #[test]
    fn test_lookup_unknown_currency() {
        assert!(Currency::lookup(&CurrencyId::from("DOGE-mainnet")).is_none());
    }

    #[test]
    fn test_erc20_requires_approval() {
        let fau = Currency::lookup(&CurrencyId::from("FAU-sepolia")).unwrap();
        assert!(fau.requires_approval());
        match fau.kind {
            AssetKind::Erc20 { token_address } => {
                assert!(token_address.starts_with("0x"));
            }
            AssetKind::Native => panic!("FAU should be an ERC-20 token"),
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let all = Currency::known();
        let mut ids: Vec<_> = all.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), all.len());
    }
}
