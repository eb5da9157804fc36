//! Aggregations behind the financial reports.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::dtos::report::{BalanceSheet, CashFlowDay, MonthlyReport};
use crate::services::format::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashFlowKind {
    Inflow,
    Outflow,
}

impl CashFlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CashFlowKind::Inflow => "inflow",
            CashFlowKind::Outflow => "outflow",
        }
    }

    /// Sign applied to the amount when accumulating a balance.
    pub fn signed(self, amount: f64) -> f64 {
        match self {
            CashFlowKind::Inflow => amount,
            CashFlowKind::Outflow => -amount,
        }
    }
}

impl FromStr for CashFlowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inflow" => Ok(CashFlowKind::Inflow),
            "outflow" => Ok(CashFlowKind::Outflow),
            other => Err(format!("Invalid cash flow kind: {other}")),
        }
    }
}

pub fn balance_sheet<R, E>(as_of: NaiveDate, revenues: R, expenses: E) -> BalanceSheet
where
    R: IntoIterator<Item = f64>,
    E: IntoIterator<Item = f64>,
{
    let total_revenue = round_money(revenues.into_iter().sum());
    let total_expenses = round_money(expenses.into_iter().sum());
    BalanceSheet {
        as_of,
        total_revenue,
        total_expenses,
        balance: round_money(total_revenue - total_expenses),
    }
}

pub fn monthly_profitability(
    year: i32,
    month: u32,
    revenue: f64,
    cost_of_goods: f64,
    expenses: f64,
    sales_count: i64,
) -> MonthlyReport {
    let revenue = round_money(revenue);
    let cost_of_goods = round_money(cost_of_goods);
    let expenses = round_money(expenses);
    let gross_profit = round_money(revenue - cost_of_goods);
    let net_profit = round_money(gross_profit - expenses);
    let margin_percent = if revenue > 0.0 {
        round_money(net_profit / revenue * 100.0)
    } else {
        0.0
    };
    let average_ticket = if sales_count > 0 {
        round_money(revenue / sales_count as f64)
    } else {
        0.0
    };

    MonthlyReport {
        year,
        month,
        revenue,
        cost_of_goods,
        gross_profit,
        expenses,
        net_profit,
        margin_percent,
        sales_count,
        average_ticket,
    }
}

/// Groups entries per day in date order and carries a running balance from `opening`.
pub fn cash_flow_series(opening: f64, entries: &[(NaiveDate, CashFlowKind, f64)]) -> Vec<CashFlowDay> {
    let mut per_day: BTreeMap<NaiveDate, (f64, f64)> = BTreeMap::new();
    for (date, kind, amount) in entries {
        let slot = per_day.entry(*date).or_default();
        match kind {
            CashFlowKind::Inflow => slot.0 += amount,
            CashFlowKind::Outflow => slot.1 += amount,
        }
    }

    let mut balance = opening;
    per_day
        .into_iter()
        .map(|(date, (inflow, outflow))| {
            let net = inflow - outflow;
            balance += net;
            CashFlowDay {
                date,
                inflow: round_money(inflow),
                outflow: round_money(outflow),
                net: round_money(net),
                balance: round_money(balance),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn balance_is_revenue_minus_expenses() {
        let sheet = balance_sheet(day(30), vec![100.0, 250.5], vec![80.25]);
        assert_eq!(sheet.total_revenue, 350.5);
        assert_eq!(sheet.total_expenses, 80.25);
        assert_eq!(sheet.balance, 270.25);
    }

    #[test]
    fn empty_inputs_give_zero_balance() {
        let sheet = balance_sheet(day(1), Vec::new(), Vec::new());
        assert_eq!(sheet.balance, 0.0);
    }

    #[test]
    fn profitability_subtraction_chain() {
        let report = monthly_profitability(2024, 6, 1000.0, 300.0, 200.0, 4);
        assert_eq!(report.gross_profit, 700.0);
        assert_eq!(report.net_profit, 500.0);
        assert_eq!(report.margin_percent, 50.0);
        assert_eq!(report.average_ticket, 250.0);
    }

    #[test]
    fn profitability_without_revenue_has_zero_margin() {
        let report = monthly_profitability(2024, 6, 0.0, 0.0, 120.0, 0);
        assert_eq!(report.net_profit, -120.0);
        assert_eq!(report.margin_percent, 0.0);
        assert_eq!(report.average_ticket, 0.0);
    }

    #[test]
    fn series_groups_by_day_and_runs_balance() {
        let entries = vec![
            (day(3), CashFlowKind::Outflow, 40.0),
            (day(1), CashFlowKind::Inflow, 100.0),
            (day(3), CashFlowKind::Inflow, 10.0),
        ];
        let series = cash_flow_series(50.0, &entries);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, day(1));
        assert_eq!(series[0].balance, 150.0);
        assert_eq!(series[1].inflow, 10.0);
        assert_eq!(series[1].outflow, 40.0);
        assert_eq!(series[1].net, -30.0);
        assert_eq!(series[1].balance, 120.0);
    }

    #[test]
    fn kind_sign() {
        assert_eq!(CashFlowKind::Outflow.signed(5.0), -5.0);
        assert_eq!("inflow".parse::<CashFlowKind>(), Ok(CashFlowKind::Inflow));
        assert!("sideways".parse::<CashFlowKind>().is_err());
    }
}
