//! Property tests for zero-height normalization over generated ledgers.

use proptest::prelude::*;

use kita_genesis::core::{BondStatus, Dec};
use kita_genesis::store::{BankStore, Context, DistributionStore, MemoryState, StakingStore};
use kita_genesis::{
    ChainConfig, DistributionHooks, ExportRequest, GenesisExporter, NormalizationReport,
    ZeroHeightNormalizer,
};
use kita_genesis_testkit::generators::{
    allow_list_from_params, fixture_from_params, validator_addresses, LedgerParams,
};

/// Community pool, outstanding rewards and paid balances, summed.
fn total_value(state: &MemoryState) -> Dec {
    let mut total = state.fee_pool().unwrap().community_pool;
    for (_, outstanding) in state.all_outstanding_rewards().unwrap() {
        total = total.checked_add(outstanding).unwrap();
    }
    for (_, amount) in state.all_balances().unwrap() {
        total = total.checked_add(Dec::from_int(amount).unwrap()).unwrap();
    }
    total
}

fn normalize(params: &LedgerParams) -> (MemoryState, MemoryState, NormalizationReport) {
    let fixture = fixture_from_params(params);
    let allow = allow_list_from_params(&fixture, params);
    let before = fixture.state.clone();
    let mut state = fixture.state.clone();

    let mut normalizer = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks);
    let report = normalizer.normalize(&mut state, &allow).unwrap();
    (before, state, report)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn settlement_conserves_value(params: LedgerParams) {
        let (before, after, report) = normalize(&params);

        prop_assert_eq!(total_value(&before), total_value(&after));
        prop_assert_eq!(
            report.community_pool_after,
            report.community_pool_before_sweep.checked_add(report.scraps_swept).unwrap()
        );
        for (_, outstanding) in after.all_outstanding_rewards().unwrap() {
            prop_assert!(outstanding.is_zero());
        }
        prop_assert_eq!(after.fee_pool().unwrap().community_pool, report.community_pool_after);
    }

    #[test]
    fn settlement_is_idempotent(params: LedgerParams) {
        let (_, mut state, first) = normalize(&params);
        let balances = state.all_balances().unwrap();

        let mut normalizer = ZeroHeightNormalizer::new(ChainConfig::default(), DistributionHooks);
        let second = normalizer.normalize(&mut state, &[]).unwrap();

        prop_assert_eq!(second.commissions_withdrawn, 0);
        prop_assert_eq!(second.rewards_withdrawn, 0);
        prop_assert!(second.scraps_swept.is_zero());
        prop_assert_eq!(second.community_pool_after, first.community_pool_after);
        prop_assert_eq!(state.all_balances().unwrap(), balances);
    }

    #[test]
    fn jailing_follows_allow_list(params: LedgerParams) {
        let (_, state, report) = normalize(&params);
        let enforce = params.validators.iter().any(|v| v.allowed);

        for (address, v) in validator_addresses(&params).iter().zip(&params.validators) {
            let validator = state.validator(address).unwrap().unwrap();
            prop_assert_eq!(validator.jailed, enforce && !v.allowed);
            prop_assert_eq!(report.jailed.contains(address), validator.jailed);
        }
    }

    #[test]
    fn heights_restart_at_zero(params: LedgerParams) {
        let (_, state, _) = normalize(&params);

        prop_assert_eq!(state.block_height(), params.height);
        for (_, info) in state.all_starting_infos().unwrap() {
            prop_assert_eq!(info.height, 0);
        }
        prop_assert!(state.all_slash_events().unwrap().is_empty());
        for address in validator_addresses(&params) {
            let validator = state.validator(&address).unwrap().unwrap();
            // Validators leaving the bonded set in the final recompute start
            // unbonding at the working height.
            let reset = validator.unbonding_height == 0
                || (validator.status == BondStatus::Unbonding
                    && validator.unbonding_height == params.height);
            prop_assert!(reset, "unbonding height {}", validator.unbonding_height);
        }
    }

    #[test]
    fn validator_list_matches_bonded_set(params: LedgerParams) {
        let fixture = fixture_from_params(&params);
        let request = ExportRequest::zero_height(allow_list_from_params(&fixture, &params));
        let config = fixture.config.clone();
        let snapshot = fixture.into_snapshot();

        let mut exporter = GenesisExporter::new(config.clone());
        let (app, report) = exporter.export_with_report(&snapshot, &request).unwrap();
        let report = report.unwrap();

        let mut working = snapshot.clone();
        let mut normalizer = ZeroHeightNormalizer::new(config.clone(), DistributionHooks);
        let direct = normalizer.normalize(&mut working, &request.jail_allowed_addrs).unwrap();
        prop_assert_eq!(&direct, &report);

        let mut expected: Vec<String> = validator_addresses(&params)
            .iter()
            .map(|address| working.validator(address).unwrap().unwrap())
            .filter(|v| !v.jailed && v.consensus_power(config.power_reduction) > 0)
            .map(|v| v.moniker)
            .collect();
        let mut names: Vec<String> = app.validators.iter().map(|v| v.name.clone()).collect();
        names.sort();
        expected.sort();
        prop_assert_eq!(names, expected);

        let total: i64 = app.validators.iter().map(|v| v.power).sum();
        prop_assert_eq!(total, working.last_total_power().unwrap());
    }

    #[test]
    fn exports_are_deterministic(params: LedgerParams) {
        let a = fixture_from_params(&params);
        let b = fixture_from_params(&params);
        prop_assert_eq!(&a.state, &b.state);

        let ra = ExportRequest::zero_height(allow_list_from_params(&a, &params));
        let rb = ExportRequest::zero_height(allow_list_from_params(&b, &params));
        let mut exporter = GenesisExporter::new(ChainConfig::default());
        let first = exporter.export(&a.into_snapshot(), &ra).unwrap();
        let second = exporter.export(&b.into_snapshot(), &rb).unwrap();
        prop_assert_eq!(first.app_state_hash(), second.app_state_hash());
    }
}
