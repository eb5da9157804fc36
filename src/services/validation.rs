//! Field checks shared by the request DTOs.

use chrono::NaiveDate;

use crate::error::AppError;

pub fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

pub fn require_positive(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(AppError::validation(format!("{field} must be greater than 0")));
    }
    Ok(())
}

pub fn require_non_negative(field: &str, value: f64) -> Result<(), AppError> {
    if !value.is_finite() || value < 0.0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}

pub fn validate_email(value: &str) -> Result<(), AppError> {
    let invalid = || AppError::validation(format!("Invalid email: {value}"));
    let value = value.trim();
    if value.contains(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = value.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || tld.len() < 2 {
        return Err(invalid());
    }
    Ok(())
}

/// Brazilian phone numbers: 10 or 11 digits once punctuation is stripped.
pub fn validate_phone(value: &str) -> Result<(), AppError> {
    let allowed = |c: char| c.is_ascii_digit() || " ()-+".contains(c);
    let mut digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if value.trim_start().starts_with("+55") {
        digits = digits.split_off(2);
    }
    if !value.chars().all(allowed) || !(10..=11).contains(&digits.len()) {
        return Err(AppError::validation(format!("Invalid phone: {value}")));
    }
    Ok(())
}

pub fn validate_cpf(value: &str) -> Result<(), AppError> {
    if cpf_is_valid(value) {
        Ok(())
    } else {
        Err(AppError::validation(format!("Invalid CPF: {value}")))
    }
}

fn cpf_is_valid(value: &str) -> bool {
    if !value.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return false;
    }
    let digits: Vec<u32> = value.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    let check = |len: usize| {
        let sum: u32 = digits[..len]
            .iter()
            .enumerate()
            .map(|(i, d)| d * (len as u32 + 1 - i as u32))
            .sum();
        match sum * 10 % 11 {
            10 => 0,
            r => r,
        }
    };
    check(9) == digits[9] && check(10) == digits[10]
}

/// Keeps only the digits of a CPF so the unique constraint sees one spelling.
pub fn normalize_cpf(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

pub fn validate_date_range(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<(), AppError> {
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(AppError::validation("Start date must be on or before end date"));
        }
    }
    Ok(())
}

pub fn validate_optional_contact(email: Option<&str>, phone: Option<&str>) -> Result<(), AppError> {
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        validate_email(email)?;
    }
    if let Some(phone) = phone.filter(|p| !p.trim().is_empty()) {
        validate_phone(phone)?;
    }
    Ok(())
}

/// Trims and turns blank strings into `None`.
pub fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!(require_non_blank("name", "  ").is_err());
        assert!(require_non_blank("name", "Vestido").is_ok());
    }

    #[test]
    fn amounts_respect_sign_rules() {
        assert!(require_positive("amount", 0.0).is_err());
        assert!(require_positive("amount", f64::NAN).is_err());
        assert!(require_positive("amount", 0.01).is_ok());
        assert!(require_non_negative("price", 0.0).is_ok());
        assert!(require_non_negative("price", -1.0).is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("maria@brecho.com.br").is_ok());
        assert!(validate_email("maria@brecho").is_err());
        assert!(validate_email("@brecho.com").is_err());
        assert!(validate_email("ma ria@brecho.com").is_err());
        assert!(validate_email("a@b@c.com").is_err());
    }

    #[test]
    fn phones() {
        assert!(validate_phone("(11) 98765-4321").is_ok());
        assert!(validate_phone("1133334444").is_ok());
        assert!(validate_phone("+55 11 98765-4321").is_ok());
        assert!(validate_phone("98765-4321").is_err());
        assert!(validate_phone("11 9876x4321").is_err());
    }

    #[test]
    fn cpf_check_digits() {
        assert!(validate_cpf("529.982.247-25").is_ok());
        assert!(validate_cpf("11144477735").is_ok());
        assert!(validate_cpf("529.982.247-26").is_err());
        assert!(validate_cpf("111.111.111-11").is_err());
        assert!(validate_cpf("1234").is_err());
        assert_eq!(normalize_cpf("529.982.247-25"), "52998224725");
    }

    #[test]
    fn date_ranges() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 1);
        let b = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert!(validate_date_range(a, b).is_ok());
        assert!(validate_date_range(a, a).is_ok());
        assert!(validate_date_range(b, a).is_err());
        assert!(validate_date_range(None, a).is_ok());
    }

    #[test]
    fn optional_contact_skips_blank_values() {
        assert!(validate_optional_contact(Some(""), None).is_ok());
        assert!(validate_optional_contact(Some("bad"), None).is_err());
        assert!(validate_optional_contact(None, Some("123")).is_err());
        assert_eq!(clean_optional(Some("  ".into())), None);
        assert_eq!(clean_optional(Some(" P ".into())), Some("P".into()));
    }
}
