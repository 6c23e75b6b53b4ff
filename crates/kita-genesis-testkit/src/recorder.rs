//! Hook recorders and fault injection.

use kita_genesis::hooks::{DistributionHooks, LifecycleHooks};
use kita_genesis::RewardError;
use kita_genesis_core::{AccAddress, ValAddress};
use kita_genesis_store::{LedgerState, StoreError};

/// Which lifecycle hook fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    AfterValidatorCreated,
    BeforeDelegationCreated,
    AfterDelegationModified,
}

impl HookKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            HookKind::AfterValidatorCreated => "after_validator_created",
            HookKind::BeforeDelegationCreated => "before_delegation_created",
            HookKind::AfterDelegationModified => "after_delegation_modified",
        }
    }
}

/// One observed hook invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookEvent {
    pub kind: HookKind,
    pub delegator: Option<AccAddress>,
    pub validator: ValAddress,
    /// Working height when the hook fired.
    pub height: i64,
}

/// Records every hook invocation, then forwards it.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks<H = DistributionHooks> {
    inner: H,
    events: Vec<HookEvent>,
}

impl<H> RecordingHooks<H> {
    pub fn wrap(inner: H) -> Self {
        Self {
            inner,
            events: Vec::new(),
        }
    }

    pub fn events(&self) -> &[HookEvent] {
        &self.events
    }

    /// Events that concern `validator`, in firing order.
    pub fn events_for(&self, validator: &ValAddress) -> Vec<&HookEvent> {
        self.events
            .iter()
            .filter(|event| &event.validator == validator)
            .collect()
    }

    /// Position of the first event matching `kind`, `delegator` and `validator`.
    pub fn position(
        &self,
        kind: HookKind,
        delegator: Option<&AccAddress>,
        validator: &ValAddress,
    ) -> Option<usize> {
        self.events.iter().position(|event| {
            event.kind == kind
                && event.delegator.as_ref() == delegator
                && &event.validator == validator
        })
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    fn record<S: LedgerState>(
        &mut self,
        state: &S,
        kind: HookKind,
        delegator: Option<&AccAddress>,
        validator: &ValAddress,
    ) {
        self.events.push(HookEvent {
            kind,
            delegator: delegator.cloned(),
            validator: validator.clone(),
            height: state.block_height(),
        });
    }
}

impl<S: LedgerState, H: LifecycleHooks<S>> LifecycleHooks<S> for RecordingHooks<H> {
    fn after_validator_created(
        &mut self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.record(state, HookKind::AfterValidatorCreated, None, validator);
        self.inner.after_validator_created(state, validator)
    }

    fn before_delegation_created(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.record(state, HookKind::BeforeDelegationCreated, Some(delegator), validator);
        self.inner.before_delegation_created(state, delegator, validator)
    }

    fn after_delegation_modified(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.record(state, HookKind::AfterDelegationModified, Some(delegator), validator);
        self.inner.after_delegation_modified(state, delegator, validator)
    }
}

/// Reward hooks that fail on the `n`th call of one hook kind.
#[derive(Debug, Clone)]
pub struct FailingHooks {
    fail_on: HookKind,
    remaining: usize,
    inner: DistributionHooks,
}

impl FailingHooks {
    /// Fail the first call of `kind`.
    pub fn on(kind: HookKind) -> Self {
        Self::on_nth(kind, 0)
    }

    /// Let `skip` calls of `kind` through, then fail.
    pub fn on_nth(kind: HookKind, skip: usize) -> Self {
        Self {
            fail_on: kind,
            remaining: skip,
            inner: DistributionHooks,
        }
    }

    fn check(&mut self, kind: HookKind) -> Result<(), RewardError> {
        if kind != self.fail_on {
            return Ok(());
        }
        if self.remaining == 0 {
            return Err(RewardError::Store(StoreError::InvalidData(format!(
                "injected {} failure",
                kind.as_str()
            ))));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl<S: LedgerState> LifecycleHooks<S> for FailingHooks {
    fn after_validator_created(
        &mut self,
        state: &mut S,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.check(HookKind::AfterValidatorCreated)?;
        self.inner.after_validator_created(state, validator)
    }

    fn before_delegation_created(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.check(HookKind::BeforeDelegationCreated)?;
        self.inner.before_delegation_created(state, delegator, validator)
    }

    fn after_delegation_modified(
        &mut self,
        state: &mut S,
        delegator: &AccAddress,
        validator: &ValAddress,
    ) -> Result<(), RewardError> {
        self.check(HookKind::AfterDelegationModified)?;
        self.inner.after_delegation_modified(state, delegator, validator)
    }
}
