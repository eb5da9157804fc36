use serde::Deserialize;

use crate::error::AppError;
use crate::services::validation::{
    clean_optional, require_non_blank, validate_optional_contact,
};

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Category name", &self.name)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = &self.name {
            require_non_blank("Category name", name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct SupplierRequest {
    pub name: String,
    pub document: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub consignment: bool,
    pub consignment_rate: Option<f64>,
}

impl SupplierRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        require_non_blank("Supplier name", &self.name)?;
        validate_optional_contact(self.email.as_deref(), self.phone.as_deref())?;
        let rate = self.consignment_rate.unwrap_or(0.0);
        if !(0.0..=100.0).contains(&rate) {
            return Err(AppError::validation("Consignment rate must be between 0 and 100"));
        }
        if !self.consignment && rate > 0.0 {
            return Err(AppError::validation("Consignment rate requires a consignment supplier"));
        }
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.document = clean_optional(self.document);
        self.email = clean_optional(self.email);
        self.phone = clean_optional(self.phone);
        self.notes = clean_optional(self.notes);
        self
    }
}
