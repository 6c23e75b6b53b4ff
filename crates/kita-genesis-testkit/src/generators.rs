//! Proptest generators for property-based testing.

use proptest::prelude::*;

use kita_genesis_core::{Dec, ValAddress};

use crate::fixtures::LedgerFixture;

/// Generate a commission rate between 0 and 1 with two decimals.
pub fn commission_rate() -> impl Strategy<Value = Dec> {
    (0u128..=100).prop_map(|pct| Dec::from_raw(pct * 10_000_000_000_000_000))
}

/// Generate a bonded amount. Large enough to carry consensus power at the
/// default power reduction most of the time.
pub fn bond_amount() -> impl Strategy<Value = u128> {
    1u128..=50_000_000
}

/// Generate a reward allocation with a fractional part.
pub fn reward_amount() -> impl Strategy<Value = Dec> {
    (0u128..=1_000_000, 0u128..1_000_000_000_000_000_000)
        .prop_map(|(whole, frac)| Dec::from_raw(whole * 1_000_000_000_000_000_000 + frac))
}

/// Generate a community pool balance.
pub fn pool_amount() -> impl Strategy<Value = Dec> {
    (0u128..=1_000u128).prop_map(|whole| Dec::from_raw(whole * 1_000_000_000_000_000_000 + 5))
}

/// One delegation and the rewards allocated right after it.
#[derive(Debug, Clone)]
pub struct DelegationParams {
    pub amount: u128,
    pub reward: Dec,
}

/// Parameters for one validator.
#[derive(Debug, Clone)]
pub struct ValidatorParams {
    pub commission_rate: Dec,
    /// At least one; delegator seeds are assigned by position.
    pub delegations: Vec<DelegationParams>,
    pub allowed: bool,
    pub unbonding_height: i64,
}

/// Parameters for generating a ledger.
#[derive(Debug, Clone)]
pub struct LedgerParams {
    pub height: i64,
    pub community_pool: Dec,
    pub validators: Vec<ValidatorParams>,
}

impl LedgerParams {
    /// Validators the allow-list should exempt, by seed.
    pub fn allowed_seeds(&self) -> Vec<u8> {
        self.validators
            .iter()
            .enumerate()
            .filter(|(_, v)| v.allowed)
            .map(|(i, _)| seed(i))
            .collect()
    }
}

fn seed(index: usize) -> u8 {
    index as u8 + 1
}

fn delegation_params() -> impl Strategy<Value = DelegationParams> {
    (bond_amount(), reward_amount()).prop_map(|(amount, reward)| DelegationParams { amount, reward })
}

fn validator_params() -> impl Strategy<Value = ValidatorParams> {
    (
        commission_rate(),
        prop::collection::vec(delegation_params(), 1..=4),
        any::<bool>(),
        0i64..=40,
    )
        .prop_map(|(commission_rate, delegations, allowed, unbonding_height)| ValidatorParams {
            commission_rate,
            delegations,
            allowed,
            unbonding_height,
        })
}

impl Arbitrary for LedgerParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            41i64..=10_000, // height
            pool_amount(),
            prop::collection::vec(validator_params(), 1..=5),
        )
            .prop_map(|(height, community_pool, validators)| LedgerParams {
                height,
                community_pool,
                validators,
            })
            .boxed()
    }
}

/// Build a bonded ledger from parameters.
///
/// Rewards are allocated after each delegation, so every delegation spans
/// several reward periods.
pub fn fixture_from_params(params: &LedgerParams) -> LedgerFixture {
    let mut fixture = LedgerFixture::at_height(params.height);
    fixture.fund_community_pool(&params.community_pool.to_string());

    for (index, v) in params.validators.iter().enumerate() {
        let validator = fixture.add_validator(seed(index), &v.commission_rate.to_string());
        for (position, d) in v.delegations.iter().enumerate() {
            fixture.delegate(seed(position), &validator, d.amount);
            fixture.allocate(&validator, &d.reward.to_string());
        }
        fixture.set_unbonding_height(&validator, v.unbonding_height);
    }
    fixture.bond();
    fixture
}

/// The allow-list for `params`, as bech32 operator addresses.
pub fn allow_list_from_params(fixture: &LedgerFixture, params: &LedgerParams) -> Vec<String> {
    params
        .allowed_seeds()
        .into_iter()
        .map(|seed| fixture.validator_bech32(seed))
        .collect()
}

/// Operator addresses of every validator in `params`, in seed order.
pub fn validator_addresses(params: &LedgerParams) -> Vec<ValAddress> {
    (0..params.validators.len())
        .map(|i| LedgerFixture::validator_address(seed(i)))
        .collect()
}
