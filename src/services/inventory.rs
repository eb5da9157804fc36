use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductStatus {
    Available,
    Reserved,
    Sold,
    Inactive,
}

impl ProductStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Available => "available",
            ProductStatus::Reserved => "reserved",
            ProductStatus::Sold => "sold",
            ProductStatus::Inactive => "inactive",
        }
    }

    /// Manual transitions. `sold` is entered by a sale and left by its cancellation only.
    pub fn can_transition_to(self, next: ProductStatus) -> bool {
        use ProductStatus::*;
        matches!(
            (self, next),
            (Available, Reserved)
                | (Reserved, Available)
                | (Available, Inactive)
                | (Reserved, Inactive)
                | (Inactive, Available)
        )
    }

    pub fn is_sellable(self) -> bool {
        matches!(self, ProductStatus::Available | ProductStatus::Reserved)
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ProductStatus::Available),
            "reserved" => Ok(ProductStatus::Reserved),
            "sold" => Ok(ProductStatus::Sold),
            "inactive" => Ok(ProductStatus::Inactive),
            other => Err(format!("Invalid product status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductCondition {
    New,
    LikeNew,
    Good,
    Fair,
}

impl ProductCondition {
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCondition::New => "new",
            ProductCondition::LikeNew => "like_new",
            ProductCondition::Good => "good",
            ProductCondition::Fair => "fair",
        }
    }
}

impl FromStr for ProductCondition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ProductCondition::New),
            "like_new" => Ok(ProductCondition::LikeNew),
            "good" => Ok(ProductCondition::Good),
            "fair" => Ok(ProductCondition::Fair),
            other => Err(format!("Invalid product condition: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ProductStatus::*;

    #[test]
    fn manual_transitions() {
        assert!(Available.can_transition_to(Reserved));
        assert!(Reserved.can_transition_to(Available));
        assert!(Inactive.can_transition_to(Available));
        assert!(Reserved.can_transition_to(Inactive));
        assert!(!Inactive.can_transition_to(Reserved));
    }

    #[test]
    fn sold_is_not_reachable_or_leavable_by_hand() {
        for status in [Available, Reserved, Inactive] {
            assert!(!status.can_transition_to(Sold));
            assert!(!Sold.can_transition_to(status));
        }
    }

    #[test]
    fn only_available_and_reserved_can_be_sold() {
        assert!(Available.is_sellable());
        assert!(Reserved.is_sellable());
        assert!(!Sold.is_sellable());
        assert!(!Inactive.is_sellable());
    }

    #[test]
    fn parses_names() {
        assert_eq!("like_new".parse::<ProductCondition>(), Ok(ProductCondition::LikeNew));
        assert!("mint".parse::<ProductCondition>().is_err());
        assert_eq!("sold".parse::<ProductStatus>(), Ok(Sold));
    }
}
