//! Ledger fixtures.
//!
//! Builds ledger states through the same reward hooks a running chain
//! fires, so reward bookkeeping in a fixture is always consistent.

use ed25519_dalek::SigningKey;
use kita_genesis::hooks::{DistributionHooks, LifecycleHooks};
use kita_genesis::{power, rewards};
use kita_genesis_core::{
    AccAddress, ChainConfig, ConsensusPubKey, Dec, Delegation, DelegationKey, Redelegation,
    RedelegationEntry, UnbondingDelegation, UnbondingDelegationEntry, ValAddress, Validator,
    ValidatorUpdate,
};
use kita_genesis_store::{Context, DistributionStore, MemoryState, StakingStore};

/// First byte of every fixture delegator address, keeping delegators apart
/// from operator accounts.
const DELEGATOR_TAG: u8 = 0xde;

/// A ledger under construction.
///
/// Helpers panic on failure; fixtures are test setup.
#[derive(Debug, Clone)]
pub struct LedgerFixture {
    pub state: MemoryState,
    pub config: ChainConfig,
}

impl LedgerFixture {
    /// An empty ledger at height 1.
    pub fn new() -> Self {
        Self::at_height(1)
    }

    pub fn at_height(height: i64) -> Self {
        let mut state = MemoryState::new();
        state.set_block_height(height);
        Self {
            state,
            config: ChainConfig::default(),
        }
    }

    /// Operator address of the fixture validator with `seed`.
    pub fn validator_address(seed: u8) -> ValAddress {
        ValAddress::from_bytes([seed; 20])
    }

    /// Address of the fixture delegator with `seed`.
    pub fn delegator_address(seed: u8) -> AccAddress {
        let mut bytes = [seed; 20];
        bytes[0] = DELEGATOR_TAG;
        AccAddress::from_bytes(bytes)
    }

    /// Bech32 operator address of the fixture validator with `seed`.
    pub fn validator_bech32(&self, seed: u8) -> String {
        Self::validator_address(seed)
            .to_bech32(&self.config.validator_codec())
            .expect("fixture address encodes")
    }

    /// Register a validator whose consensus key is derived from `seed`.
    pub fn add_validator(&mut self, seed: u8, commission_rate: &str) -> ValAddress {
        let key = SigningKey::from_bytes(&[seed; 32]).verifying_key();
        let validator = Validator::new(
            Self::validator_address(seed),
            ConsensusPubKey::from(key),
            format!("validator-{}", seed),
            commission_rate.parse().expect("valid commission rate"),
        );
        let address = validator.operator_address.clone();
        self.state.set_validator(validator).expect("store validator");
        DistributionHooks
            .after_validator_created(&mut self.state, &address)
            .expect("after_validator_created");
        address
    }

    /// Bond `amount` tokens from a new delegator to `validator`.
    pub fn delegate(
        &mut self,
        delegator_seed: u8,
        validator: &ValAddress,
        amount: u128,
    ) -> AccAddress {
        let delegator = Self::delegator_address(delegator_seed);
        let key = DelegationKey::new(delegator.clone(), validator.clone());
        assert!(
            self.state.delegation(&key).expect("load delegation").is_none(),
            "fixture delegates once per pair"
        );

        let mut hooks = DistributionHooks;
        hooks
            .before_delegation_created(&mut self.state, &delegator, validator)
            .expect("before_delegation_created");

        let mut record = self.validator(validator);
        let shares = record.shares_from_tokens(amount).expect("shares");
        record.tokens += amount;
        record.delegator_shares = record.delegator_shares.checked_add(shares).expect("shares");
        self.state.set_validator(record).expect("store validator");
        self.state
            .set_delegation(Delegation {
                delegator: delegator.clone(),
                validator: validator.clone(),
                shares,
            })
            .expect("store delegation");

        hooks
            .after_delegation_modified(&mut self.state, &delegator, validator)
            .expect("after_delegation_modified");
        delegator
    }

    /// Distribute `amount` of rewards to `validator` and its delegators.
    pub fn allocate(&mut self, validator: &ValAddress, amount: &str) {
        let record = self.validator(validator);
        rewards::allocate_tokens_to_validator(
            &mut self.state,
            &record,
            amount.parse().expect("valid amount"),
        )
        .expect("allocate");
    }

    /// Slash `validator` by `fraction` at the current height.
    pub fn slash(&mut self, validator: &ValAddress, fraction: &str) {
        let fraction: Dec = fraction.parse().expect("valid fraction");
        let mut record = self.validator(validator);
        rewards::update_validator_slash_fraction(&mut self.state, &record, fraction)
            .expect("slash");
        let burned = Dec::from_int(record.tokens)
            .and_then(|tokens| tokens.checked_mul(fraction))
            .and_then(|burned| burned.truncate_int())
            .expect("burn");
        record.tokens -= burned;
        self.state.set_validator(record).expect("store validator");
    }

    /// Recompute the bonded set.
    pub fn bond(&mut self) -> Vec<ValidatorUpdate> {
        power::apply_and_return_validator_set_updates(&mut self.state, self.config.power_reduction)
            .expect("apply validator set updates")
    }

    pub fn jail(&mut self, validator: &ValAddress) {
        let mut record = self.validator(validator);
        record.jailed = true;
        self.state.set_validator(record).expect("store validator");
    }

    pub fn set_unbonding_height(&mut self, validator: &ValAddress, height: i64) {
        let mut record = self.validator(validator);
        record.unbonding_height = height;
        self.state.set_validator(record).expect("store validator");
    }

    /// Queue an unbonding entry created at `creation_height`.
    pub fn add_unbonding(
        &mut self,
        delegator_seed: u8,
        validator: &ValAddress,
        creation_height: i64,
        balance: u128,
    ) {
        let delegator = Self::delegator_address(delegator_seed);
        let key = DelegationKey::new(delegator.clone(), validator.clone());
        let entry = UnbondingDelegationEntry {
            creation_height,
            completion_time: creation_height + 1_814_400,
            initial_balance: balance,
            balance,
        };
        let mut ubd = self
            .state
            .unbonding_delegation(&key)
            .expect("load unbonding delegation")
            .unwrap_or(UnbondingDelegation {
                delegator,
                validator: validator.clone(),
                entries: Vec::new(),
            });
        ubd.entries.push(entry);
        self.state
            .set_unbonding_delegation(ubd)
            .expect("store unbonding delegation");
    }

    /// Queue a redelegation entry created at `creation_height`.
    pub fn add_redelegation(
        &mut self,
        delegator_seed: u8,
        src: &ValAddress,
        dst: &ValAddress,
        creation_height: i64,
        balance: u128,
    ) {
        let red = Redelegation {
            delegator: Self::delegator_address(delegator_seed),
            validator_src: src.clone(),
            validator_dst: dst.clone(),
            entries: vec![RedelegationEntry {
                creation_height,
                completion_time: creation_height + 1_814_400,
                initial_balance: balance,
                shares_dst: Dec::from_int(balance).expect("shares"),
            }],
        };
        let key = red.key();
        let mut merged = self
            .state
            .redelegation(&key)
            .expect("load redelegation")
            .unwrap_or(Redelegation {
                entries: Vec::new(),
                ..red.clone()
            });
        merged.entries.extend(red.entries);
        self.state.set_redelegation(merged).expect("store redelegation");
    }

    /// Add `amount` to the community pool.
    pub fn fund_community_pool(&mut self, amount: &str) {
        let mut pool = self.state.fee_pool().expect("fee pool");
        pool.community_pool = pool
            .community_pool
            .checked_add(amount.parse().expect("valid amount"))
            .expect("pool overflow");
        self.state.set_fee_pool(pool).expect("store fee pool");
    }

    pub fn set_height(&mut self, height: i64) {
        self.state.set_block_height(height);
    }

    pub fn validator(&self, address: &ValAddress) -> Validator {
        self.state
            .validator(address)
            .expect("load validator")
            .expect("validator exists")
    }

    /// The finished ledger, ready to be exported.
    pub fn into_snapshot(self) -> MemoryState {
        self.state
    }
}

impl Default for LedgerFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Validators `1..=count`, each with one 1_000_000-token delegation from the
/// delegator of the same seed, bonded.
pub fn bonded_ledger(count: u8) -> LedgerFixture {
    let mut fixture = LedgerFixture::at_height(50);
    for seed in 1..=count {
        let validator = fixture.add_validator(seed, "0.1");
        fixture.delegate(seed, &validator, 1_000_000 * u128::from(seed));
    }
    fixture.bond();
    fixture
}

#[cfg(test)]
mod tests {
    use super::*;
    use kita_genesis_store::BankStore;

    #[test]
    fn test_delegate_updates_validator() {
        let mut fixture = LedgerFixture::new();
        let v = fixture.add_validator(1, "0");
        fixture.delegate(1, &v, 500);
        fixture.delegate(2, &v, 1_500);

        let record = fixture.validator(&v);
        assert_eq!(record.tokens, 2_000);
        assert_eq!(record.delegator_shares, Dec::from_int(2_000).unwrap());
    }

    #[test]
    fn test_rewards_follow_stake() {
        let mut fixture = LedgerFixture::new();
        let v = fixture.add_validator(1, "0");
        let d1 = fixture.delegate(1, &v, 100);
        let d2 = fixture.delegate(2, &v, 300);
        fixture.allocate(&v, "40");

        for d in [&d1, &d2] {
            rewards::withdraw_delegation_rewards(
                &mut fixture.state,
                &DelegationKey::new(d.clone(), v.clone()),
                "kita",
            )
            .unwrap();
        }
        assert_eq!(fixture.state.balance(&d1).unwrap(), 10);
        assert_eq!(fixture.state.balance(&d2).unwrap(), 30);
    }

    #[test]
    fn test_bonded_ledger() {
        let fixture = bonded_ledger(3);
        assert_eq!(fixture.state.last_total_power().unwrap(), 6);
        assert!(fixture.validator(&LedgerFixture::validator_address(2)).is_bonded());
    }

    #[test]
    fn test_delegator_and_operator_accounts_differ() {
        assert_ne!(
            LedgerFixture::delegator_address(1),
            LedgerFixture::validator_address(1).to_account()
        );
    }
}
