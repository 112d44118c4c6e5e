//! Equal-split settlement: who is owed, who owes, and who pays whom.

use exchange_rates::round_amount;
use serde::{Deserialize, Serialize};

use super::summary::{ExpenseSummary, Tally};
use super::traveler::Traveler;
use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceStatus {
    Owed,
    Owes,
    Settled,
}

impl BalanceStatus {
    /// Classifies a balance after rounding it to cents.
    pub fn classify(balance: f64) -> Self {
        let rounded = round_amount(balance);
        if rounded > 0.0 {
            BalanceStatus::Owed
        } else if rounded < 0.0 {
            BalanceStatus::Owes
        } else {
            BalanceStatus::Settled
        }
    }
}

/// One traveler's position in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub person: String,
    pub paid: f64,
    pub fair_share: f64,
    /// `paid - fair_share`; positive means the traveler is owed money
    pub balance: f64,
    pub status: BalanceStatus,
}

/// A suggested payment that moves the ledger toward zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub from: String,
    pub to: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub total: f64,
    pub fair_share: f64,
    /// Sorted by balance, largest first
    pub balances: Vec<LedgerEntry>,
    pub transfers: Vec<Transfer>,
    /// Expenses whose `split_with` list was not taken into account
    pub split_with_ignored: usize,
}

impl Ledger {
    /// Splits `total` equally over `travelers` and compares against what
    /// each one paid.
    ///
    /// Payers that are not travelers still count toward `total` but get no
    /// ledger entry.
    pub fn compute(
        person_totals: &Tally<String>,
        total: f64,
        travelers: &[Traveler],
    ) -> Result<Self, DomainError> {
        if travelers.is_empty() {
            return Err(DomainError::NoParticipants);
        }

        let fair_share = total / travelers.len() as f64;
        let mut balances: Vec<LedgerEntry> = travelers
            .iter()
            .map(|traveler| {
                let paid = person_totals.amount_of(&traveler.name);
                let balance = paid - fair_share;
                LedgerEntry {
                    person: traveler.name.clone(),
                    paid,
                    fair_share,
                    balance,
                    status: BalanceStatus::classify(balance),
                }
            })
            .collect();
        balances.sort_by(|a, b| b.balance.total_cmp(&a.balance));

        let transfers = suggest_transfers(&balances);
        Ok(Self {
            total,
            fair_share,
            balances,
            transfers,
            split_with_ignored: 0,
        })
    }

    pub fn from_summary(
        summary: &ExpenseSummary,
        travelers: &[Traveler],
    ) -> Result<Self, DomainError> {
        let mut ledger = Self::compute(&summary.people, summary.total, travelers)?;
        ledger.split_with_ignored = summary.split_with_count;
        Ok(ledger)
    }

    pub fn balance_of(&self, person: &str) -> Option<f64> {
        self.balances
            .iter()
            .find(|e| e.person == person)
            .map(|e| e.balance)
    }

    /// Sum of all balances. Zero up to float error unless some payer is
    /// not a traveler.
    pub fn imbalance(&self) -> f64 {
        self.balances.iter().map(|e| e.balance).sum()
    }
}

/// Greedy matching of the largest creditor with the largest debtor, in
/// whole cents.
///
/// Rounding each balance to cents can leave the two sides up to one cent
/// per traveler apart. That residue is charged to the largest debtor (or
/// credited to the largest creditor) so every rounded credit is paid in
/// full. A larger gap comes from payers outside the trip and is left alone.
fn suggest_transfers(balances: &[LedgerEntry]) -> Vec<Transfer> {
    let to_cents = |v: f64| (round_amount(v) * 100.0).round() as i64;

    let mut creditors: Vec<(&str, i64)> = balances
        .iter()
        .map(|e| (e.person.as_str(), to_cents(e.balance)))
        .filter(|(_, c)| *c > 0)
        .collect();
    let mut debtors: Vec<(&str, i64)> = balances
        .iter()
        .map(|e| (e.person.as_str(), -to_cents(e.balance)))
        .filter(|(_, c)| *c > 0)
        .collect();

    let residue: i64 = creditors.iter().map(|(_, c)| c).sum::<i64>()
        - debtors.iter().map(|(_, c)| c).sum::<i64>();
    if residue != 0 && residue.unsigned_abs() < balances.len() as u64 {
        let side = if residue > 0 { &mut debtors } else { &mut creditors };
        if let Some(i) = largest(side) {
            side[i].1 += residue.abs();
        }
    }

    let mut transfers = Vec::new();
    loop {
        let Some(ci) = largest(&creditors) else { break };
        let Some(di) = largest(&debtors) else { break };

        let amount = creditors[ci].1.min(debtors[di].1);
        creditors[ci].1 -= amount;
        debtors[di].1 -= amount;
        transfers.push(Transfer {
            from: debtors[di].0.to_string(),
            to: creditors[ci].0.to_string(),
            amount: amount as f64 / 100.0,
        });
    }
    transfers
}

fn largest(side: &[(&str, i64)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, (_, cents)) in side.iter().enumerate() {
        if *cents > 0 && best.is_none_or(|b| *cents > side[b].1) {
            best = Some(i);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Expense;
    use exchange_rates::CurrencyCode;

    fn travelers(names: &[&str]) -> Vec<Traveler> {
        names.iter().map(|n| Traveler::new(*n, "").unwrap()).collect()
    }

    fn paid(entries: &[(&str, f64)]) -> ExpenseSummary {
        let expenses: Vec<Expense> = entries
            .iter()
            .map(|(who, amount)| {
                Expense::new("", *amount, CurrencyCode::USD, "misc", *who).unwrap()
            })
            .collect();
        ExpenseSummary::from_expenses(&expenses)
    }

    #[test]
    fn test_two_way_split() {
        let summary = paid(&[("A", 100.0), ("B", 50.0)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B"])).unwrap();

        assert_eq!(ledger.total, 150.0);
        assert_eq!(ledger.fair_share, 75.0);
        assert_eq!(ledger.balances[0].person, "A");
        assert_eq!(ledger.balances[0].balance, 25.0);
        assert_eq!(ledger.balances[0].status, BalanceStatus::Owed);
        assert_eq!(ledger.balances[1].balance, -25.0);
        assert_eq!(ledger.balances[1].status, BalanceStatus::Owes);

        assert_eq!(
            ledger.transfers,
            vec![Transfer {
                from: "B".into(),
                to: "A".into(),
                amount: 25.0
            }]
        );
    }

    #[test]
    fn test_no_travelers_fails() {
        let summary = paid(&[("A", 10.0)]);
        assert!(matches!(
            Ledger::from_summary(&summary, &[]),
            Err(DomainError::NoParticipants)
        ));
    }

    #[test]
    fn test_balances_sum_to_zero() {
        let summary = paid(&[("A", 10.0), ("B", 33.33), ("C", 0.01), ("A", 7.5)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B", "C", "D"])).unwrap();
        assert!(ledger.imbalance().abs() < 1e-9);
    }

    #[test]
    fn test_three_way_split_with_idle_traveler() {
        let summary = paid(&[("A", 90.0)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B", "C"])).unwrap();

        assert_eq!(ledger.fair_share, 30.0);
        assert_eq!(ledger.balance_of("A"), Some(60.0));
        assert_eq!(ledger.balance_of("B"), Some(-30.0));
        // ties keep traveler order
        assert_eq!(ledger.balances[1].person, "B");
        assert_eq!(ledger.balances[2].person, "C");

        let total_moved: f64 = ledger.transfers.iter().map(|t| t.amount).sum();
        assert_eq!(total_moved, 60.0);
        assert!(ledger.transfers.iter().all(|t| t.to == "A"));
    }

    #[test]
    fn test_three_way_rounding_residue_is_paid() {
        let summary = paid(&[("A", 100.0)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B", "C"])).unwrap();

        assert_eq!(ledger.balance_of("A").map(round_amount), Some(66.67));
        assert_eq!(ledger.balance_of("B").map(round_amount), Some(-33.33));

        let cents: i64 = ledger
            .transfers
            .iter()
            .map(|t| (t.amount * 100.0).round() as i64)
            .sum();
        assert_eq!(cents, 6667);
        assert_eq!(ledger.transfers.len(), 2);
        assert_eq!(ledger.transfers[0].from, "B");
        assert_eq!(ledger.transfers[0].amount, 33.34);
        assert_eq!(ledger.transfers[1].amount, 33.33);
    }

    #[test]
    fn test_outside_payer_gap_is_not_charged() {
        let summary = paid(&[("A", 40.0), ("Guide", 20.0)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B"])).unwrap();
        // B owes 30, A is owed 10: only the 10 moves
        assert_eq!(
            ledger.transfers,
            vec![Transfer {
                from: "B".into(),
                to: "A".into(),
                amount: 10.0
            }]
        );
    }

    #[test]
    fn test_no_expenses_is_settled() {
        let summary = paid(&[]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B"])).unwrap();
        assert!(ledger
            .balances
            .iter()
            .all(|e| e.status == BalanceStatus::Settled));
        assert!(ledger.transfers.is_empty());
    }

    #[test]
    fn test_non_traveler_payer_has_no_entry() {
        let summary = paid(&[("A", 40.0), ("Guide", 20.0)]);
        let ledger = Ledger::from_summary(&summary, &travelers(&["A", "B"])).unwrap();
        assert_eq!(ledger.total, 60.0);
        assert_eq!(ledger.balance_of("Guide"), None);
        assert_eq!(ledger.balance_of("A"), Some(10.0));
    }

    #[test]
    fn test_tiny_balance_is_settled() {
        assert_eq!(BalanceStatus::classify(0.004), BalanceStatus::Settled);
        assert_eq!(BalanceStatus::classify(-0.004), BalanceStatus::Settled);
        assert_eq!(BalanceStatus::classify(0.006), BalanceStatus::Owed);
    }

    #[test]
    fn test_split_with_ignored_is_reported() {
        let mut summary = paid(&[("A", 10.0)]);
        summary.split_with_count = 2;
        let ledger = Ledger::from_summary(&summary, &travelers(&["A"])).unwrap();
        assert_eq!(ledger.split_with_ignored, 2);
    }
}
