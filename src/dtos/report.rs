use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dtos::goal::GoalProgress;
use crate::dtos::product::StockSummary;

#[derive(Debug, Deserialize)]
pub struct BalanceSheetQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct MonthlyQuery {
    pub year: i32,
    pub month: u32,
}

#[derive(Debug, Serialize)]
pub struct BalanceSheet {
    pub as_of: NaiveDate,
    pub total_revenue: f64,
    pub total_expenses: f64,
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub revenue: f64,
    pub cost_of_goods: f64,
    pub gross_profit: f64,
    pub expenses: f64,
    pub net_profit: f64,
    pub margin_percent: f64,
    pub sales_count: i64,
    pub average_ticket: f64,
}

#[derive(Debug, Serialize)]
pub struct CashFlowDay {
    pub date: NaiveDate,
    pub inflow: f64,
    pub outflow: f64,
    pub net: f64,
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub month: MonthlyReport,
    pub stock: StockSummary,
    pub pending_redemptions: i64,
    pub new_leads: i64,
    pub goals: Vec<GoalProgress>,
}
