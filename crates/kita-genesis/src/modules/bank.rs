use kita_genesis_core::{ChainConfig, Coin};
use kita_genesis_store::LedgerState;
use serde::{Deserialize, Serialize};

use super::{encode_address, ModuleExporter};
use crate::error::{ExportError, Result, Stage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub address: String,
    pub coins: Vec<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankGenesis {
    pub balances: Vec<Balance>,
    /// Sum of all exported balances.
    pub supply: Vec<Coin>,
}

/// Account balances in the bond denomination.
#[derive(Debug, Clone, Copy, Default)]
pub struct BankModule;

impl<S: LedgerState> ModuleExporter<S> for BankModule {
    fn name(&self) -> &'static str {
        "bank"
    }

    fn export_genesis(&self, state: &S, config: &ChainConfig) -> Result<serde_json::Value> {
        let codec = config.account_codec();
        let mut balances = Vec::new();
        let mut supply: u128 = 0;

        for (address, amount) in state
            .all_balances()
            .map_err(ExportError::store(Stage::ExportModules))?
        {
            if amount == 0 {
                continue;
            }
            supply = supply.checked_add(amount).ok_or_else(|| ExportError::Store {
                stage: Stage::ExportModules,
                source: kita_genesis_store::StoreError::InvalidData("supply overflow".into()),
            })?;
            balances.push(Balance {
                address: encode_address(address.as_bytes(), &codec)?,
                coins: vec![Coin::new(&config.bond_denom, amount)],
            });
        }

        let supply = if supply == 0 {
            vec![]
        } else {
            vec![Coin::new(&config.bond_denom, supply)]
        };
        Ok(serde_json::to_value(BankGenesis { balances, supply })?)
    }
}
