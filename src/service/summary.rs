use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::db::models::{Entry, Payment};
use crate::types::Month;

/// Totals for one month.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub total_liters: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    /// Billed minus paid; negative when overpaid.
    pub balance: f64,
    /// Entries with a positive quantity.
    pub total_days: usize,
}

impl MonthlySummary {
    /// Aggregate the month's entries and payments as returned by the month query.
    pub fn compute(entries: &[Entry], payments: &[Payment]) -> Self {
        let total_liters = entries.iter().map(|e| e.quantity).sum();
        let total_amount: f64 = entries.iter().map(Entry::amount).sum();
        let paid_amount: f64 = payments.iter().map(|p| p.amount).sum();
        let total_days = entries.iter().filter(|e| e.quantity > 0.0).count();
        Self {
            total_liters,
            total_amount,
            paid_amount,
            balance: total_amount - paid_amount,
            total_days,
        }
    }
}

/// One bar of the daily chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Day of month, `01`..`31`.
    pub date: String,
    pub liters: f64,
    pub full_date: String,
}

/// A point for every day of `month`, zero where no entry exists.
pub fn daily_series(month: Month, entries: &[Entry]) -> Vec<ChartPoint> {
    let by_date: HashMap<_, _> = entries.iter().map(|e| (e.date, e.quantity)).collect();
    month
        .days()
        .map(|day| ChartPoint {
            date: day.format("%d").to_string(),
            liters: by_date.get(&day).copied().unwrap_or(0.0),
            full_date: day.format("%Y-%m-%d").to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: i64, date: &str, quantity: f64, rate: f64) -> Entry {
        Entry {
            id,
            date: date.parse().unwrap(),
            quantity,
            rate,
        }
    }

    fn payment(id: i64, date: &str, amount: f64) -> Payment {
        Payment {
            id,
            date: date.parse().unwrap(),
            amount,
        }
    }

    #[test]
    fn march_example() {
        let entries = [
            entry(1, "2024-03-01", 1.0, 60.0),
            entry(2, "2024-03-02", 2.0, 60.0),
        ];
        let payments = [payment(1, "2024-03-01", 100.0)];
        let s = MonthlySummary::compute(&entries, &payments);
        assert_eq!(
            s,
            MonthlySummary {
                total_liters: 3.0,
                total_amount: 180.0,
                paid_amount: 100.0,
                balance: 80.0,
                total_days: 2,
            }
        );
    }

    #[test]
    fn overpaid_and_even_balances() {
        let entries = [entry(1, "2024-03-01", 1.0, 60.0)];
        let over = MonthlySummary::compute(&entries, &[payment(1, "2024-03-01", 100.0)]);
        assert_eq!(over.balance, -40.0);

        let even = MonthlySummary::compute(&entries, &[payment(1, "2024-03-05", 60.0)]);
        assert_eq!(even.balance, 0.0);
    }

    #[test]
    fn zero_quantity_days_do_not_count() {
        let entries = [
            entry(1, "2024-03-01", 0.0, 60.0),
            entry(2, "2024-03-02", 1.5, 60.0),
        ];
        let s = MonthlySummary::compute(&entries, &[]);
        assert_eq!(s.total_days, 1);
        assert_eq!(s.total_amount, 90.0);
        assert_eq!(s.balance, 90.0);
    }

    #[test]
    fn serializes_in_camel_case() {
        let v = serde_json::to_value(MonthlySummary::default()).unwrap();
        for key in ["totalLiters", "totalAmount", "paidAmount", "balance", "totalDays"] {
            assert!(v.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn series_covers_every_day() {
        let month: Month = "2024-02".parse().unwrap();
        let series = daily_series(month, &[entry(1, "2024-02-10", 2.0, 60.0)]);
        assert_eq!(series.len(), 29);
        assert_eq!(series[0].date, "01");
        assert_eq!(series[9].liters, 2.0);
        assert_eq!(series[9].full_date, "2024-02-10");
        assert_eq!(series.iter().map(|p| p.liters).sum::<f64>(), 2.0);
    }
}
