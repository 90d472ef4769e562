use crate::domain::transaction::TransactionKind;
use serde::Serialize;
use std::fmt;
use StepId::*;

/// Canonical step ordering. Every plan visits a subsequence of these, in
/// this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Selection,
    Verification,
    AmountEntry,
    Quote,
    Authorization,
    Result,
}

impl StepId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Selection => "selection",
            StepId::Verification => "verification",
            StepId::AmountEntry => "amount_entry",
            StepId::Quote => "quote",
            StepId::Authorization => "authorization",
            StepId::Result => "result",
        }
    }

    /// The remote call a step's primary action triggers once its input is
    /// valid.
    pub fn gateway(&self) -> StepGateway {
        match self {
            StepId::Selection | StepId::AmountEntry => StepGateway::Local,
            StepId::Verification => StepGateway::Verify,
            StepId::Quote => StepGateway::Initiate,
            StepId::Authorization => StepGateway::Authorize,
            StepId::Result => StepGateway::Terminal,
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepGateway {
    /// Validated on the device, no network call.
    Local,
    Verify,
    Initiate,
    Authorize,
    /// Accepts no input.
    Terminal,
}

const VERIFIED_QUOTED: &[StepId] = &[
    Selection,
    Verification,
    AmountEntry,
    Quote,
    Authorization,
    Result,
];
const VERIFIED_DIRECT: &[StepId] =
    &[Selection, Verification, AmountEntry, Authorization, Result];
const QUOTED: &[StepId] = &[Selection, AmountEntry, Quote, Authorization, Result];
const DIRECT: &[StepId] = &[Selection, AmountEntry, Authorization, Result];

/// The ordered steps one transaction kind walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepPlan {
    kind: TransactionKind,
    steps: &'static [StepId],
}

impl StepPlan {
    pub fn for_kind(kind: TransactionKind) -> Self {
        let steps = match kind {
            TransactionKind::BankTransfer
            | TransactionKind::WalletTransfer
            | TransactionKind::ElectricityPurchase => VERIFIED_QUOTED,
            TransactionKind::CableTvSubscription => VERIFIED_DIRECT,
            TransactionKind::CryptoTransfer
            | TransactionKind::CurrencySwap
            | TransactionKind::FixedDepositInvestment => QUOTED,
            TransactionKind::AirtimePurchase | TransactionKind::DataBundlePurchase => DIRECT,
        };
        Self { kind, steps }
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn steps(&self) -> &'static [StepId] {
        self.steps
    }

    pub fn first(&self) -> StepId {
        self.steps[0]
    }

    pub fn contains(&self, step: StepId) -> bool {
        self.steps.contains(&step)
    }

    pub fn requires_verification(&self) -> bool {
        self.contains(Verification)
    }

    pub fn requires_quote(&self) -> bool {
        self.contains(Quote)
    }

    pub fn next(&self, step: StepId) -> Option<StepId> {
        let position = self.steps.iter().position(|s| *s == step)?;
        self.steps.get(position + 1).copied()
    }

    pub fn previous(&self, step: StepId) -> Option<StepId> {
        let position = self.steps.iter().position(|s| *s == step)?;
        position.checked_sub(1).map(|p| self.steps[p])
    }

    /// Whether the plan is a strictly ordered subsequence of the canonical
    /// steps, starting at `Selection` and ending at `Result`.
    pub fn is_well_formed(&self) -> bool {
        self.steps.first() == Some(&Selection)
            && self.steps.last() == Some(&Result)
            && self.steps.windows(2).all(|pair| pair[0] < pair[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_plan_is_well_formed() {
        for kind in TransactionKind::ALL {
            let plan = StepPlan::for_kind(kind);
            assert!(plan.is_well_formed(), "{kind} plan is out of order");
            assert!(plan.contains(AmountEntry), "{kind} plan skips amount entry");
            assert!(plan.contains(Authorization), "{kind} plan skips authorization");
            assert_eq!(plan.kind(), kind);
        }
    }

    #[test]
    fn test_verification_matches_lookup_provider() {
        for kind in TransactionKind::ALL {
            let plan = StepPlan::for_kind(kind);
            assert_eq!(plan.requires_verification(), kind.lookup_provider().is_some());
        }
    }

    #[test]
    fn test_navigation_within_plan() {
        let plan = StepPlan::for_kind(TransactionKind::AirtimePurchase);
        assert_eq!(plan.first(), Selection);
        assert_eq!(plan.next(Selection), Some(AmountEntry));
        assert_eq!(plan.next(AmountEntry), Some(Authorization));
        assert_eq!(plan.next(Result), None);
        assert_eq!(plan.previous(Authorization), Some(AmountEntry));
        assert_eq!(plan.previous(Selection), None);
        assert_eq!(plan.next(Quote), None);
        assert!(!plan.requires_quote());
    }

    #[test]
    fn test_bank_transfer_visits_every_step() {
        let plan = StepPlan::for_kind(TransactionKind::BankTransfer);
        assert_eq!(
            plan.steps(),
            &[Selection, Verification, AmountEntry, Quote, Authorization, Result]
        );
    }

    #[test]
    fn test_step_gateways() {
        assert_eq!(Selection.gateway(), StepGateway::Local);
        assert_eq!(Verification.gateway(), StepGateway::Verify);
        assert_eq!(Quote.gateway(), StepGateway::Initiate);
        assert_eq!(Authorization.gateway(), StepGateway::Authorize);
        assert_eq!(Result.gateway(), StepGateway::Terminal);
    }
}
