use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedemptionStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl RedemptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RedemptionStatus::Pending => "pending",
            RedemptionStatus::Approved => "approved",
            RedemptionStatus::Rejected => "rejected",
            RedemptionStatus::Cancelled => "cancelled",
        }
    }

    /// Only pending requests move, and only to a final state.
    pub fn can_transition_to(self, next: RedemptionStatus) -> bool {
        self == RedemptionStatus::Pending && next != RedemptionStatus::Pending
    }
}

impl FromStr for RedemptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RedemptionStatus::Pending),
            "approved" => Ok(RedemptionStatus::Approved),
            "rejected" => Ok(RedemptionStatus::Rejected),
            "cancelled" => Ok(RedemptionStatus::Cancelled),
            other => Err(format!("Invalid redemption status: {other}")),
        }
    }
}

/// Whole points earned for a purchase total.
pub fn points_for(total: f64, points_per_currency_unit: f64) -> i64 {
    if total <= 0.0 || points_per_currency_unit <= 0.0 {
        return 0;
    }
    // 0.29 * 100.0 is 28.999..., the epsilon keeps it at 29.
    (total * points_per_currency_unit + 1e-9).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use RedemptionStatus::*;

    #[test]
    fn pending_moves_to_any_final_state() {
        for next in [Approved, Rejected, Cancelled] {
            assert!(Pending.can_transition_to(next));
        }
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn final_states_are_terminal() {
        for from in [Approved, Rejected, Cancelled] {
            for next in [Pending, Approved, Rejected, Cancelled] {
                assert!(!from.can_transition_to(next));
            }
        }
    }

    #[test]
    fn points_are_floored() {
        assert_eq!(points_for(99.99, 1.0), 99);
        assert_eq!(points_for(100.0, 1.0), 100);
        assert_eq!(points_for(50.0, 0.5), 25);
        assert_eq!(points_for(0.29, 100.0), 29);
        assert_eq!(points_for(100.0, 0.0), 0);
        assert_eq!(points_for(-5.0, 1.0), 0);
    }
}
