//! Aggregation over a snapshot of expenses.
//!
//! Amounts are summed in their original currency. A trip with expenses in
//! several currencies therefore gets commingled totals; the per-currency
//! breakdowns show the split.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use exchange_rates::{CurrencyCode, round_dp};
use serde::Serialize;

use super::expense::Expense;

/// Running total and count for one group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bucket {
    pub amount: f64,
    pub count: usize,
}

/// Totals keyed by `K`, remembering the order keys were first seen.
#[derive(Debug, Clone)]
pub struct Tally<K> {
    entries: Vec<(K, Bucket)>,
    index: HashMap<K, usize>,
}

impl<K> Default for Tally<K> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> Tally<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &K, amount: f64) {
        let slot = match self.index.get(key) {
            Some(slot) => *slot,
            None => {
                self.entries.push((key.clone(), Bucket::default()));
                self.index.insert(key.clone(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let bucket = &mut self.entries[slot].1;
        bucket.amount += amount;
        bucket.count += 1;
    }

    pub fn get(&self, key: &K) -> Option<&Bucket> {
        self.index.get(key).map(|slot| &self.entries[*slot].1)
    }

    /// Amount for `key`, 0 when the key never appeared.
    pub fn amount_of(&self, key: &K) -> f64 {
        self.get(key).map_or(0.0, |b| b.amount)
    }

    /// Entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Bucket)> {
        self.entries.iter().map(|(k, b)| (k, b))
    }

    /// Entries sorted by amount, largest first. Ties keep first-seen order.
    pub fn ranked(&self) -> Vec<(&K, &Bucket)> {
        let mut ranked: Vec<_> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.amount.total_cmp(&a.1.amount));
        ranked
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, b)| b.amount).sum()
    }
}

/// Everything the reports need from a list of expenses, built in one pass.
#[derive(Debug, Clone, Default)]
pub struct ExpenseSummary {
    pub total: f64,
    pub count: usize,
    pub categories: Tally<String>,
    pub people: Tally<String>,
    pub currencies: BTreeMap<CurrencyCode, f64>,
    pub category_currencies: HashMap<String, BTreeMap<CurrencyCode, f64>>,
    /// Expenses that name a `split_with` list
    pub split_with_count: usize,
}

impl ExpenseSummary {
    pub fn from_expenses<'a, I>(expenses: I) -> Self
    where
        I: IntoIterator<Item = &'a Expense>,
    {
        let mut summary = Self::default();
        for expense in expenses {
            summary.total += expense.amount;
            summary.count += 1;
            summary.categories.add(&expense.category, expense.amount);
            summary.people.add(&expense.paid_by, expense.amount);
            *summary.currencies.entry(expense.currency).or_default() += expense.amount;
            *summary
                .category_currencies
                .entry(expense.category.clone())
                .or_default()
                .entry(expense.currency)
                .or_default() += expense.amount;
            if !expense.split_with.is_empty() {
                summary.split_with_count += 1;
            }
        }
        summary
    }

    pub fn average(&self) -> f64 {
        average(self.total, self.count)
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Share of `total` taken by `part`, in percent with one decimal. 0 when
/// there is no total.
pub fn percentage(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        return 0.0;
    }
    round_dp(part / total * 100.0, 1)
}

pub fn average(total: f64, count: usize) -> f64 {
    if count == 0 {
        return 0.0;
    }
    total / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expense(amount: f64, currency: CurrencyCode, category: &str, paid_by: &str) -> Expense {
        Expense::new("", amount, currency, category, paid_by).unwrap()
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense(30.0, CurrencyCode::USD, "food", "Ana"),
            expense(20.0, CurrencyCode::EUR, "food", "Bo"),
            expense(50.0, CurrencyCode::USD, "transport", "Ana"),
        ]
    }

    #[test]
    fn test_category_totals() {
        let summary = ExpenseSummary::from_expenses(&sample());
        assert_eq!(summary.categories.amount_of(&"food".to_string()), 50.0);
        assert_eq!(summary.categories.amount_of(&"transport".to_string()), 50.0);
        assert_eq!(percentage(50.0, summary.total), 50.0);
    }

    #[test]
    fn test_sums_agree() {
        let summary = ExpenseSummary::from_expenses(&sample());
        assert!((summary.categories.total() - summary.total).abs() < 1e-9);
        assert!((summary.people.total() - summary.total).abs() < 1e-9);
        let by_currency: f64 = summary.currencies.values().sum();
        assert!((by_currency - summary.total).abs() < 1e-9);
    }

    #[test]
    fn test_empty_input_yields_zeros() {
        let summary = ExpenseSummary::from_expenses(&[]);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.average(), 0.0);
        assert!(summary.categories.is_empty());
        assert!(summary.people.is_empty());
        assert_eq!(percentage(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_currency_breakdowns() {
        let summary = ExpenseSummary::from_expenses(&sample());
        assert_eq!(summary.currencies[&CurrencyCode::USD], 80.0);
        assert_eq!(summary.currencies[&CurrencyCode::EUR], 20.0);

        let food = &summary.category_currencies["food"];
        assert_eq!(food[&CurrencyCode::USD], 30.0);
        assert_eq!(food[&CurrencyCode::EUR], 20.0);
    }

    #[test]
    fn test_people_counts() {
        let summary = ExpenseSummary::from_expenses(&sample());
        let ana = summary.people.get(&"Ana".to_string()).unwrap();
        assert_eq!(ana.amount, 80.0);
        assert_eq!(ana.count, 2);
    }

    #[test]
    fn test_ranked_ties_keep_first_seen_order() {
        let summary = ExpenseSummary::from_expenses(&sample());
        let ranked: Vec<&str> = summary
            .categories
            .ranked()
            .into_iter()
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(ranked, vec!["food", "transport"]);

        let mut tally = Tally::new();
        tally.add(&"a", 1.0);
        tally.add(&"b", 5.0);
        tally.add(&"c", 1.0);
        let order: Vec<&str> = tally.ranked().into_iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_split_with_is_counted() {
        let mut expenses = sample();
        expenses[0].split_with = vec!["Bo".into()];
        let summary = ExpenseSummary::from_expenses(&expenses);
        assert_eq!(summary.split_with_count, 1);
    }

    #[test]
    fn test_average() {
        assert_eq!(average(90.0, 3), 30.0);
        assert_eq!(average(90.0, 0), 0.0);
    }
}
