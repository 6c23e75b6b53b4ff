//! Zero-height export scenarios, end to end through the exporter.

use kita_genesis::core::{BondStatus, Dec, DelegationKey};
use kita_genesis::modules::{DistributionGenesis, StakingGenesis};
use kita_genesis::store::{BankStore, Context, DistributionStore, MemoryState, StakingStore};
use kita_genesis::{
    ChainConfig, DistributionHooks, ExportError, ExportRequest, ExportedApp, GenesisExporter,
    Stage, ZeroHeightNormalizer,
};
use kita_genesis_testkit::{bonded_ledger, FailingHooks, HookKind, LedgerFixture, RecordingHooks};

fn dec(text: &str) -> Dec {
    text.parse().unwrap()
}

fn staking(app: &ExportedApp) -> StakingGenesis {
    let state = app.decode_app_state().unwrap();
    serde_json::from_value(state["staking"].clone()).unwrap()
}

fn distribution(app: &ExportedApp) -> DistributionGenesis {
    let state = app.decode_app_state().unwrap();
    serde_json::from_value(state["distribution"].clone()).unwrap()
}

fn zero_height(fixture: &LedgerFixture, allowed: &[u8]) -> ExportRequest {
    ExportRequest::zero_height(allowed.iter().map(|seed| fixture.validator_bech32(*seed)))
}

#[test]
fn test_allow_list_jails_everyone_else() {
    let fixture = bonded_ledger(3);
    let request = zero_height(&fixture, &[1]);
    let v2 = LedgerFixture::validator_address(2);
    let v3 = LedgerFixture::validator_address(3);
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let (app, report) = exporter.export_with_report(&snapshot, &request).unwrap();
    let report = report.unwrap();

    assert_eq!(report.jailed, vec![v3.clone(), v2.clone()]);
    assert_eq!(report.validator_updates.len(), 2);
    assert!(report.validator_updates.iter().all(|u| u.power == 0));

    // Only the allowed validator reaches consensus.
    assert_eq!(app.validators.len(), 1);
    assert_eq!(app.validators[0].name, "validator-1");
    assert_eq!(app.validators[0].power, 1);

    let genesis = staking(&app);
    assert_eq!(genesis.last_total_power, 1);
    for record in &genesis.validators {
        let jailed = record.moniker != "validator-1";
        assert_eq!(record.jailed, jailed, "{}", record.moniker);
    }
}

#[test]
fn test_empty_allow_list_keeps_existing_jail_flags() {
    let mut fixture = bonded_ledger(3);
    let v2 = LedgerFixture::validator_address(2);
    fixture.jail(&v2);
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let (app, report) = exporter
        .export_with_report(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();
    let report = report.unwrap();

    assert!(report.jailed.is_empty());
    let genesis = staking(&app);
    let jailed: Vec<_> = genesis
        .validators
        .iter()
        .filter(|v| v.jailed)
        .map(|v| v.moniker.as_str())
        .collect();
    assert_eq!(jailed, vec!["validator-2"]);

    // The jailed validator leaves the bonded set during the final recompute.
    let names: Vec<_> = app.validators.iter().map(|v| v.name.as_str()).collect();
    assert_eq!(names, vec!["validator-1", "validator-3"]);
}

#[test]
fn test_allow_list_does_not_unjail() {
    let mut fixture = bonded_ledger(2);
    fixture.jail(&LedgerFixture::validator_address(2));
    let request = zero_height(&fixture, &[1, 2]);
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let app = exporter.export(&snapshot, &request).unwrap();

    let genesis = staking(&app);
    let v2 = genesis
        .validators
        .iter()
        .find(|v| v.moniker == "validator-2")
        .unwrap();
    assert!(v2.jailed);
}

#[test]
fn test_settlement_sweeps_scraps_into_pool() {
    let mut fixture = LedgerFixture::at_height(20);
    let v1 = fixture.add_validator(1, "0.1");
    let d1 = fixture.delegate(1, &v1, 1_000_000);
    fixture.allocate(&v1, "10.5");
    fixture.bond();
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let (app, report) = exporter
        .export_with_report(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();
    let report = report.unwrap();

    // Commission 1.05: one coin paid, 0.05 left behind.
    assert_eq!(report.commissions_withdrawn, 1);
    // Delegation 9.45: nine coins paid, 0.45 to the pool.
    assert_eq!(report.rewards_withdrawn, 9);
    assert_eq!(report.community_pool_before_sweep, dec("0.45"));
    assert_eq!(report.scraps_swept, dec("0.05"));
    assert_eq!(report.community_pool_after, dec("0.5"));

    let genesis = distribution(&app);
    assert_eq!(genesis.fee_pool.community_pool, dec("0.5"));
    assert!(genesis
        .outstanding_rewards
        .iter()
        .all(|r| r.outstanding_rewards.is_zero()));
    assert!(genesis
        .validator_accumulated_commissions
        .iter()
        .all(|r| r.accumulated.is_zero()));

    let bank: serde_json::Value = app.decode_app_state().unwrap()["bank"].clone();
    let balances = bank["balances"].as_array().unwrap();
    assert_eq!(balances.len(), 2);

    // The snapshot still owes the rewards.
    assert_eq!(snapshot.balance(&d1).unwrap(), 0);
    assert_eq!(snapshot.outstanding_rewards(&v1).unwrap(), Some(dec("10.5")));
}

#[test]
fn test_settlement_with_eighteen_decimal_denom() {
    const UNIT: u128 = 1_000_000_000_000_000_000;

    let mut fixture = LedgerFixture::at_height(20);
    fixture.config.power_reduction = UNIT;
    let v1 = fixture.add_validator(1, "0.1");
    let d1 = fixture.delegate(1, &v1, 2_000 * UNIT);
    fixture.allocate(&v1, "30000000000000000000");
    fixture.bond();
    let config = fixture.config.clone();
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(config);
    let (app, report) = exporter
        .export_with_report(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();
    let report = report.unwrap();

    assert_eq!(report.commissions_withdrawn, 3 * UNIT);
    assert_eq!(report.rewards_withdrawn, 27 * UNIT);
    assert!(report.community_pool_after.is_zero());
    assert_eq!(app.validators.len(), 1);
    assert_eq!(app.validators[0].power, 2_000);

    let genesis = staking(&app);
    assert_eq!(genesis.validators[0].tokens, 2_000 * UNIT);
    assert_eq!(snapshot.balance(&d1).unwrap(), 0);
}

#[test]
fn test_second_settlement_pays_nothing() {
    let mut fixture = bonded_ledger(2);
    fixture.allocate(&LedgerFixture::validator_address(1), "7.25");
    fixture.allocate(&LedgerFixture::validator_address(2), "3");

    let config = fixture.config.clone();
    let mut state = fixture.into_snapshot();
    let mut normalizer = ZeroHeightNormalizer::new(config, DistributionHooks);

    let first = normalizer.normalize(&mut state, &[]).unwrap();
    assert!(first.rewards_withdrawn > 0);

    let second = normalizer.normalize(&mut state, &[]).unwrap();
    assert_eq!(second.commissions_withdrawn, 0);
    assert_eq!(second.rewards_withdrawn, 0);
    assert!(second.scraps_swept.is_zero());
    assert_eq!(second.community_pool_after, first.community_pool_after);
}

#[test]
fn test_entries_and_rewards_restart_at_height_zero() {
    let mut fixture = bonded_ledger(2);
    let v1 = LedgerFixture::validator_address(1);
    let v2 = LedgerFixture::validator_address(2);
    fixture.set_height(60);
    fixture.slash(&v2, "0.01");
    fixture.add_unbonding(1, &v1, 55, 500);
    fixture.add_unbonding(1, &v1, 58, 250);
    fixture.add_redelegation(2, &v2, &v1, 59, 1_000);
    fixture.set_unbonding_height(&v2, 12);
    fixture.set_height(70);
    fixture.bond();
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let (app, report) = exporter
        .export_with_report(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();
    let report = report.unwrap();
    assert_eq!(app.height, 0);
    assert_eq!(report.entries_reset, 3);
    assert_eq!(report.slash_events_cleared, 1);

    let genesis = staking(&app);
    assert!(genesis
        .unbonding_delegations
        .iter()
        .flat_map(|u| &u.entries)
        .all(|e| e.creation_height == 0));
    assert!(genesis
        .redelegations
        .iter()
        .flat_map(|r| &r.entries)
        .all(|e| e.creation_height == 0));
    assert!(genesis.validators.iter().all(|v| v.unbonding_height == 0));
    assert!(genesis.validators.iter().all(|v| v.status == BondStatus::Bonded));

    let rewards = distribution(&app);
    assert!(rewards.validator_slash_events.is_empty());
    assert_eq!(rewards.delegator_starting_infos.len(), 2);
    for record in &rewards.delegator_starting_infos {
        assert_eq!(record.starting_info.height, 0);
        assert_eq!(record.starting_info.previous_period, 1);
    }
    for record in &rewards.validator_current_rewards {
        assert_eq!(record.rewards.period, 2);
        assert!(record.rewards.rewards.is_zero());
    }
}

#[test]
fn test_hooks_replay_in_order_at_height_zero() {
    let fixture = bonded_ledger(2);
    let v1 = LedgerFixture::validator_address(1);
    let d1 = LedgerFixture::delegator_address(1);
    let snapshot = fixture.into_snapshot();

    let mut exporter =
        GenesisExporter::with_hooks(ChainConfig::default(), RecordingHooks::wrap(DistributionHooks));
    exporter
        .export(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();
    let hooks = exporter.hooks();

    assert_eq!(hooks.events().len(), 6);
    assert!(hooks.events().iter().all(|e| e.height == 0));

    let created = hooks
        .position(HookKind::AfterValidatorCreated, None, &v1)
        .unwrap();
    let before = hooks
        .position(HookKind::BeforeDelegationCreated, Some(&d1), &v1)
        .unwrap();
    let after = hooks
        .position(HookKind::AfterDelegationModified, Some(&d1), &v1)
        .unwrap();
    assert!(created < before);
    assert!(before < after);
    assert_eq!(hooks.events_for(&v1).len(), 3);
}

#[test]
fn test_plain_export_fires_no_hooks() {
    let snapshot = bonded_ledger(2).into_snapshot();
    let mut exporter =
        GenesisExporter::with_hooks(ChainConfig::default(), RecordingHooks::wrap(DistributionHooks));
    let app = exporter.export(&snapshot, &ExportRequest::default()).unwrap();

    assert_eq!(app.height, 51);
    assert!(exporter.hooks().events().is_empty());
}

#[test]
fn test_malformed_allow_list_leaves_state_untouched() {
    let fixture = bonded_ledger(2);
    let mut state = fixture.state.clone();
    let account = LedgerFixture::delegator_address(1)
        .to_bech32(&fixture.config.account_codec())
        .unwrap();

    let mut normalizer = ZeroHeightNormalizer::new(fixture.config.clone(), DistributionHooks);
    for bad in ["kitavaloper1notbech32", account.as_str(), ""] {
        let allow = vec![fixture.validator_bech32(1), bad.to_string()];
        let err = normalizer.normalize(&mut state, &allow).unwrap_err();
        match err {
            ExportError::InvalidAddress { stage, address, .. } => {
                assert_eq!(stage, Stage::ValidateAllowList);
                assert_eq!(address, bad);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(state, fixture.state);
    }
}

#[test]
fn test_hook_failure_releases_cursors_and_height() {
    let fixture = bonded_ledger(3);
    let mut state: MemoryState = fixture.state.clone();

    let mut normalizer = ZeroHeightNormalizer::new(
        fixture.config.clone(),
        FailingHooks::on_nth(HookKind::AfterValidatorCreated, 1),
    );
    let err = normalizer.normalize(&mut state, &[]).unwrap_err();

    match err {
        ExportError::HookFailure {
            stage,
            hook,
            subject,
            ..
        } => {
            assert_eq!(stage, Stage::ReinitializeValidators);
            assert_eq!(hook, "after_validator_created");
            // Visited in descending order: V3 passes, V2 fails.
            assert_eq!(subject, LedgerFixture::validator_address(2).to_string());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(state.open_cursors(), 0);
    assert_eq!(state.block_height(), 50);
}

#[test]
fn test_delegation_hook_failure_names_the_pair() {
    let snapshot = bonded_ledger(2).into_snapshot();
    let mut exporter = GenesisExporter::with_hooks(
        ChainConfig::default(),
        FailingHooks::on(HookKind::AfterDelegationModified),
    );

    let err = exporter
        .export(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::ReinitializeDelegations));
    let text = err.to_string();
    assert!(text.contains("after_delegation_modified"));
    assert!(text.contains(&LedgerFixture::delegator_address(1).to_string()));
}

#[test]
fn test_missing_delegation_validator_is_not_found() {
    let mut fixture = bonded_ledger(1);
    let v1 = LedgerFixture::validator_address(1);
    fixture.state.remove_validator(&v1).unwrap();
    let mut state = fixture.state.clone();

    let mut normalizer = ZeroHeightNormalizer::new(fixture.config.clone(), DistributionHooks);
    let err = normalizer.normalize(&mut state, &[]).unwrap_err();
    assert!(matches!(
        err,
        ExportError::NotFound {
            stage: Stage::WithdrawDelegationRewards,
            ..
        }
    ));
    assert_eq!(state.open_cursors(), 0);
}

#[test]
fn test_delegations_survive_with_rewards_reset() {
    let mut fixture = bonded_ledger(2);
    fixture.allocate(&LedgerFixture::validator_address(2), "100");
    let snapshot = fixture.into_snapshot();

    let mut exporter = GenesisExporter::new(ChainConfig::default());
    let app = exporter
        .export(&snapshot, &ExportRequest::zero_height(Vec::<String>::new()))
        .unwrap();

    let genesis = staking(&app);
    assert_eq!(genesis.delegations.len(), 2);
    assert_eq!(genesis.validators.len(), 2);
    assert!(genesis.exported);

    // 90 of 100 went to the single delegator of V2, 10 to its operator.
    let bank = app.decode_app_state().unwrap()["bank"].clone();
    let mut amounts: Vec<&str> = bank["balances"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["coins"][0]["amount"].as_str().unwrap())
        .collect();
    amounts.sort();
    assert_eq!(amounts, vec!["10", "90"]);

    let key = DelegationKey::new(
        LedgerFixture::delegator_address(2),
        LedgerFixture::validator_address(2),
    );
    assert!(snapshot.starting_info(&key).unwrap().is_some());
}
