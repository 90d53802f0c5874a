//! Overdue / Due-Date Engine
//!
//! A contract with an open balance is due again a fixed term after its
//! latest payment, or after the contract date when nothing has been paid
//! since. It is overdue once that date lies before today. Nothing here is
//! stored; every view is derived from the contracts and payments at the
//! time of the call.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::temporal::{add_days, days_between};
use core_kernel::{Clock, Money};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::contract::Contract;
use crate::error::SalesError;
use crate::payment::{self, Payment};
use crate::ports::SalesPort;

/// Default installment term in days
pub const DEFAULT_TERM_DAYS: u32 = 30;

/// Which contracts a non-blank search may return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
    /// Every contract with an open balance, overdue or not
    #[default]
    OpenBalances,
    /// Only contracts that are past their due date
    OverdueOnly,
}

/// Rules for deriving due dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueDatePolicy {
    pub term_days: u32,
    /// Use the latest payment's `next_payment_due_date` when it is set
    pub honor_payment_override: bool,
    pub search_scope: SearchScope,
}

impl Default for DueDatePolicy {
    fn default() -> Self {
        Self {
            term_days: DEFAULT_TERM_DAYS,
            honor_payment_override: false,
            search_scope: SearchScope::OpenBalances,
        }
    }
}

impl DueDatePolicy {
    /// Next due date of a contract given its payments
    pub fn next_due_date(&self, contract: &Contract, payments: &[Payment]) -> NaiveDate {
        match payment::latest(payments) {
            Some(last) => match last.next_payment_due_date {
                Some(agreed) if self.honor_payment_override => agreed,
                _ => self.after_term(last.payment_date),
            },
            None => self.after_term(contract.contract_date),
        }
    }

    fn after_term(&self, from: NaiveDate) -> NaiveDate {
        add_days(from, self.term_days).unwrap_or(NaiveDate::MAX)
    }

    /// Annotates a contract with its due state
    ///
    /// Returns `None` for contracts without an open balance.
    pub fn assess(&self, contract: Contract, payments: &[Payment], today: NaiveDate) -> Option<DebtAssessment> {
        let remaining_amount = contract.remaining_amount();
        if !remaining_amount.is_positive() {
            return None;
        }
        let next_due_date = self.next_due_date(&contract, payments);
        let days_overdue = days_between(next_due_date, today).max(0);
        Some(DebtAssessment {
            last_payment_date: payment::latest(payments).map(|p| p.payment_date),
            contract,
            remaining_amount,
            next_due_date,
            days_overdue,
        })
    }
}

/// A contract with an open balance and its due state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtAssessment {
    #[serde(flatten)]
    pub contract: Contract,
    pub remaining_amount: Money,
    pub next_due_date: NaiveDate,
    /// Whole days past the due date, 0 when not yet due
    pub days_overdue: i64,
    pub last_payment_date: Option<NaiveDate>,
}

impl DebtAssessment {
    /// Past the due date with money still owed
    pub fn is_overdue(&self) -> bool {
        self.days_overdue > 0
    }
}

/// Case-insensitive match on buyer name, substring match on mobile number
/// and house number
pub fn matches_term(contract: &Contract, term: &str) -> bool {
    let needle = term.trim();
    let lowered = needle.to_lowercase();
    contract.buyer_name.to_lowercase().contains(&lowered)
        || contract.mobile_number.contains(needle)
        || contract.house_number.to_string().contains(needle)
}

/// Most overdue first; equal values keep their input order
pub fn sort_most_overdue_first(assessments: &mut [DebtAssessment]) {
    assessments.sort_by(|a, b| b.days_overdue.cmp(&a.days_overdue));
}

/// Computes the debts view over a contract population
///
/// `payments_of` supplies the payments of one contract.
pub fn overdue_among<'a, F>(
    policy: &DueDatePolicy,
    contracts: impl IntoIterator<Item = Contract>,
    mut payments_of: F,
    today: NaiveDate,
) -> Vec<DebtAssessment>
where
    F: FnMut(&Contract) -> &'a [Payment],
{
    let mut overdue: Vec<DebtAssessment> = contracts
        .into_iter()
        .filter_map(|c| {
            let payments = payments_of(&c);
            policy.assess(c, payments, today)
        })
        .filter(DebtAssessment::is_overdue)
        .collect();
    sort_most_overdue_first(&mut overdue);
    overdue
}

/// Debts view over a [`SalesPort`]
///
/// Works against either backend. "Today" comes from the injected clock.
pub struct OverdueEngine {
    port: Arc<dyn SalesPort>,
    clock: Arc<dyn Clock>,
    policy: DueDatePolicy,
}

impl OverdueEngine {
    pub fn new(port: Arc<dyn SalesPort>, clock: Arc<dyn Clock>, policy: DueDatePolicy) -> Self {
        Self { port, clock, policy }
    }

    pub fn policy(&self) -> &DueDatePolicy {
        &self.policy
    }

    /// Every overdue contract, most overdue first
    #[instrument(skip(self))]
    pub async fn list_overdue_contracts(&self) -> Result<Vec<DebtAssessment>, SalesError> {
        let today = self.clock.today();
        let mut assessed = self.assess_open_balances(today).await?;
        assessed.retain(DebtAssessment::is_overdue);
        sort_most_overdue_first(&mut assessed);
        debug!(count = assessed.len(), %today, "Overdue contracts listed");
        Ok(assessed)
    }

    /// Contracts matching `term`; a blank term lists the overdue contracts
    ///
    /// Whether non-overdue open balances are included follows
    /// [`DueDatePolicy::search_scope`].
    #[instrument(skip(self))]
    pub async fn search_overdue_contracts(&self, term: &str) -> Result<Vec<DebtAssessment>, SalesError> {
        if term.trim().is_empty() {
            return self.list_overdue_contracts().await;
        }
        let today = self.clock.today();
        let mut assessed = self.assess_open_balances(today).await?;
        assessed.retain(|a| matches_term(&a.contract, term));
        if self.policy.search_scope == SearchScope::OverdueOnly {
            assessed.retain(DebtAssessment::is_overdue);
        }
        sort_most_overdue_first(&mut assessed);
        debug!(count = assessed.len(), "Debt search finished");
        Ok(assessed)
    }

    async fn assess_open_balances(&self, today: NaiveDate) -> Result<Vec<DebtAssessment>, SalesError> {
        let contracts = self.port.list_contracts().await?;
        let mut assessed = Vec::new();
        for contract in contracts.into_iter().filter(Contract::has_open_balance) {
            let payments = self.port.payments_for_contract(contract.id).await?;
            if let Some(a) = self.policy.assess(contract, &payments, today) {
                assessed.push(a);
            }
        }
        Ok(assessed)
    }
}
