use std::str::FromStr;

use crate::services::format::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalMetric {
    Revenue,
    SalesCount,
    ItemsSold,
}

impl GoalMetric {
    pub fn as_str(self) -> &'static str {
        match self {
            GoalMetric::Revenue => "revenue",
            GoalMetric::SalesCount => "sales_count",
            GoalMetric::ItemsSold => "items_sold",
        }
    }
}

impl FromStr for GoalMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "revenue" => Ok(GoalMetric::Revenue),
            "sales_count" => Ok(GoalMetric::SalesCount),
            "items_sold" => Ok(GoalMetric::ItemsSold),
            other => Err(format!("Invalid goal metric: {other}")),
        }
    }
}

/// `current / target` as a percentage, clipped to 0..=100.
pub fn progress_percent(current: f64, target: f64) -> f64 {
    if target <= 0.0 || !target.is_finite() || !current.is_finite() {
        return 0.0;
    }
    round_money((current / target * 100.0).clamp(0.0, 100.0))
}
