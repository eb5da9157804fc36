use std::str::FromStr;

use chrono::NaiveDate;

use crate::models::commission::CommissionRule;
use crate::services::format::round_money;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommissionKind {
    Percentage,
    Fixed,
}

impl CommissionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommissionKind::Percentage => "percentage",
            CommissionKind::Fixed => "fixed",
        }
    }
}

impl FromStr for CommissionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(CommissionKind::Percentage),
            "fixed" => Ok(CommissionKind::Fixed),
            other => Err(format!("Invalid commission kind: {other}")),
        }
    }
}

impl CommissionRule {
    /// Active and inside the optional, inclusive date window.
    pub fn applies_on(&self, date: NaiveDate) -> bool {
        self.active
            && self.starts_on.map_or(true, |start| start <= date)
            && self.ends_on.map_or(true, |end| date <= end)
    }

    pub fn commission_for(&self, sale_total: f64) -> f64 {
        let amount = match self.kind.parse::<CommissionKind>() {
            Ok(CommissionKind::Percentage) => sale_total * self.value / 100.0,
            Ok(CommissionKind::Fixed) => self.value,
            Err(_) => 0.0,
        };
        round_money(amount.max(0.0))
    }
}

/// Picks the rule for a sale: seller-specific beats global, newer beats older.
pub fn select_rule(
    rules: &[CommissionRule],
    seller_id: i64,
    sale_date: NaiveDate,
) -> Option<&CommissionRule> {
    rules
        .iter()
        .filter(|r| r.applies_on(sale_date))
        .filter(|r| r.seller_id.map_or(true, |id| id == seller_id))
        .max_by_key(|r| (r.seller_id.is_some(), r.created_at, r.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn rule(id: i64, seller_id: Option<i64>, kind: &str, value: f64) -> CommissionRule {
        CommissionRule {
            id,
            name: format!("rule {id}"),
            seller_id,
            kind: kind.to_string(),
            value,
            active: true,
            starts_on: None,
            ends_on: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, id as u32, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn percentage_and_fixed_amounts() {
        assert_eq!(rule(1, None, "percentage", 10.0).commission_for(250.0), 25.0);
        assert_eq!(rule(1, None, "percentage", 3.33).commission_for(99.99), 3.33);
        assert_eq!(rule(1, None, "fixed", 15.0).commission_for(250.0), 15.0);
        assert_eq!(rule(1, None, "bogus", 15.0).commission_for(250.0), 0.0);
    }

    #[test]
    fn half_cent_commission_rounds_up() {
        assert_eq!(rule(1, None, "percentage", 10.0).commission_for(10.05), 1.01);
    }

    #[test]
    fn window_and_active_flag() {
        let mut r = rule(1, None, "fixed", 5.0);
        r.starts_on = Some(day(10));
        r.ends_on = Some(day(20));
        assert!(!r.applies_on(day(9)));
        assert!(r.applies_on(day(10)));
        assert!(r.applies_on(day(20)));
        assert!(!r.applies_on(day(21)));

        r.active = false;
        assert!(!r.applies_on(day(15)));
    }

    #[test]
    fn seller_specific_rule_wins_over_newer_global_rule() {
        let rules = vec![rule(1, Some(7), "percentage", 5.0), rule(2, None, "percentage", 10.0)];
        assert_eq!(select_rule(&rules, 7, day(1)).map(|r| r.id), Some(1));
        assert_eq!(select_rule(&rules, 8, day(1)).map(|r| r.id), Some(2));
    }

    #[test]
    fn newest_rule_wins_among_equals() {
        let rules = vec![rule(3, None, "fixed", 1.0), rule(4, None, "fixed", 2.0)];
        assert_eq!(select_rule(&rules, 1, day(1)).map(|r| r.id), Some(4));
    }

    #[test]
    fn no_rule_when_none_apply() {
        let mut expired = rule(1, None, "fixed", 1.0);
        expired.ends_on = Some(day(1));
        assert!(select_rule(&[expired], 1, day(2)).is_none());
        assert!(select_rule(&[], 1, day(2)).is_none());
    }
}
