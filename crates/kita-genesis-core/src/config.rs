//! Chain configuration: naming, denominations and address prefixes.

use crate::address::AddressCodec;

/// Static chain configuration.
///
/// Passed by value into everything that formats addresses or coins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// Application name.
    pub app_name: String,
    /// Base bech32 prefix; the other prefixes are derived from it.
    pub bech32_prefix: String,
    /// Staking and reward denomination.
    pub bond_denom: String,
    /// Tokens per unit of consensus power.
    pub power_reduction: u128,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            app_name: "dns-shop".into(),
            bech32_prefix: "kita".into(),
            bond_denom: "kita".into(),
            power_reduction: 1_000_000,
        }
    }
}

impl ChainConfig {
    /// Prefix for account addresses.
    pub fn account_prefix(&self) -> String {
        self.bech32_prefix.clone()
    }

    /// Prefix for account public keys.
    pub fn account_pubkey_prefix(&self) -> String {
        format!("{}pub", self.bech32_prefix)
    }

    /// Prefix for validator operator addresses.
    pub fn validator_prefix(&self) -> String {
        format!("{}valoper", self.bech32_prefix)
    }

    /// Prefix for validator operator public keys.
    pub fn validator_pubkey_prefix(&self) -> String {
        format!("{}valoperpub", self.bech32_prefix)
    }

    /// Prefix for consensus node addresses.
    pub fn consensus_prefix(&self) -> String {
        format!("{}valcons", self.bech32_prefix)
    }

    /// Prefix for consensus node public keys.
    pub fn consensus_pubkey_prefix(&self) -> String {
        format!("{}valconspub", self.bech32_prefix)
    }

    /// Codec for account addresses.
    pub fn account_codec(&self) -> AddressCodec {
        AddressCodec::new(self.account_prefix())
    }

    /// Codec for validator operator addresses.
    pub fn validator_codec(&self) -> AddressCodec {
        AddressCodec::new(self.validator_prefix())
    }

    /// Codec for consensus node addresses.
    pub fn consensus_codec(&self) -> AddressCodec {
        AddressCodec::new(self.consensus_prefix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let config = ChainConfig::default();
        assert_eq!(config.account_prefix(), "kita");
        assert_eq!(config.account_pubkey_prefix(), "kitapub");
        assert_eq!(config.validator_prefix(), "kitavaloper");
        assert_eq!(config.validator_pubkey_prefix(), "kitavaloperpub");
        assert_eq!(config.consensus_prefix(), "kitavalcons");
        assert_eq!(config.consensus_pubkey_prefix(), "kitavalconspub");
    }

    #[test]
    fn test_custom_prefix_flows_into_codecs() {
        let config = ChainConfig {
            bech32_prefix: "test".into(),
            ..ChainConfig::default()
        };
        assert_eq!(config.validator_codec().prefix(), "testvaloper");
    }
}
