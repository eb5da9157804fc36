use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::goals::GoalMetric;
use crate::services::validation::{require_non_blank, require_positive, validate_date_range};

#[derive(Debug, Deserialize)]
pub struct GoalRequest {
    pub title: String,
    pub metric: String,
    pub target: f64,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub seller_id: Option<i64>,
}

impl GoalRequest {
    pub fn validate(&self) -> Result<GoalMetric, AppError> {
        require_non_blank("Goal title", &self.title)?;
        let metric: GoalMetric = self.metric.parse().map_err(AppError::validation)?;
        require_positive("Target", self.target)?;
        if metric != GoalMetric::Revenue && self.target.fract() != 0.0 {
            return Err(AppError::validation("Count targets must be whole numbers"));
        }
        validate_date_range(Some(self.starts_on), Some(self.ends_on))?;
        Ok(metric)
    }
}

#[derive(Debug, Serialize)]
pub struct GoalProgress {
    pub goal_id: i64,
    pub title: String,
    pub metric: String,
    pub seller_id: Option<i64>,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub target: f64,
    pub current: f64,
    pub percent: f64,
    pub achieved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(metric: &str, target: f64) -> GoalRequest {
        GoalRequest {
            title: "Meta de junho".into(),
            metric: metric.into(),
            target,
            starts_on: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            ends_on: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
            seller_id: None,
        }
    }

    #[test]
    fn valid_goals() {
        assert_eq!(goal("revenue", 5000.5).validate().unwrap(), GoalMetric::Revenue);
        assert_eq!(goal("sales_count", 40.0).validate().unwrap(), GoalMetric::SalesCount);
    }

    #[test]
    fn invalid_goals() {
        assert!(goal("revenue", 0.0).validate().is_err());
        assert!(goal("items_sold", 10.5).validate().is_err());
        assert!(goal("profit", 10.0).validate().is_err());
        let mut reversed = goal("revenue", 10.0);
        reversed.ends_on = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(reversed.validate().is_err());
    }
}
