use std::str::FromStr;

use serde::Deserialize;

use crate::error::AppError;
use crate::services::validation::{clean_optional, require_non_blank, validate_optional_contact};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStatus {
    New,
    Contacted,
    Converted,
    Discarded,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Converted => "converted",
            LeadStatus::Discarded => "discarded",
        }
    }
}

impl FromStr for LeadStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(LeadStatus::New),
            "contacted" => Ok(LeadStatus::Contacted),
            "converted" => Ok(LeadStatus::Converted),
            "discarded" => Ok(LeadStatus::Discarded),
            other => Err(format!("Invalid lead status: {other}")),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SubmitLeadRequest {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub source: Option<String>,
}

impl SubmitLeadRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Name", &self.name)?;
        let has = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        if !has(&self.email) && !has(&self.phone) {
            return Err(AppError::validation("Email or phone is required"));
        }
        validate_optional_contact(self.email.as_deref(), self.phone.as_deref())?;
        if self.message.as_deref().is_some_and(|m| m.len() > 2000) {
            return Err(AppError::validation("Message is too long"));
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.email = clean_optional(self.email).map(|e| e.to_lowercase());
        self.phone = clean_optional(self.phone);
        self.message = clean_optional(self.message);
        self.source = clean_optional(self.source).or_else(|| Some("site".to_string()));
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateLeadRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LeadFilter {
    pub status: Option<String>,
}
