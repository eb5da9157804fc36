use serde::Deserialize;

use crate::error::AppError;
use crate::services::validation::require_non_blank;

#[derive(Debug, Deserialize)]
pub struct CreateRedemptionRequest {
    pub customer_id: i64,
    pub points: i64,
    pub reward: String,
}

impl CreateRedemptionRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.points <= 0 {
            return Err(AppError::validation("Points must be greater than 0"));
        }
        require_non_blank("Reward", &self.reward)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReviewRedemptionRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RedemptionFilter {
    pub status: Option<String>,
    pub customer_id: Option<i64>,
}
