use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;

static PAN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());
static AADHAAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[2-9][0-9]{11}$").unwrap());
static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap());
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[6-9][0-9]{9}$").unwrap());

/// Validates a PAN (10 characters, AAAAA9999A)
pub fn validate_pan(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("PAN cannot be empty".to_string());
    }
    if !PAN_REGEX.is_match(value) {
        return Err(format!("Invalid PAN format: {value}"));
    }
    Ok(())
}

/// Validates an Aadhaar number (12 digits, first digit 2-9)
pub fn validate_aadhaar(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Aadhaar number cannot be empty".to_string());
    }
    if !AADHAAR_REGEX.is_match(value) {
        return Err(format!("Invalid Aadhaar number: {value}"));
    }
    Ok(())
}

/// Validates an email address
pub fn validate_email(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Email cannot be empty".to_string());
    }
    if !EMAIL_REGEX.is_match(value) {
        return Err(format!("Invalid email address: {value}"));
    }
    Ok(())
}

/// Validates an Indian mobile number (10 digits, first digit 6-9)
pub fn validate_phone(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Phone number cannot be empty".to_string());
    }
    if !PHONE_REGEX.is_match(value) {
        return Err(format!("Invalid phone number: {value}"));
    }
    Ok(())
}

/// Validates a date of birth in DD/MM/YYYY form within a sane range
pub fn validate_date_of_birth(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("Date of birth cannot be empty".to_string());
    }
    let parsed = NaiveDate::parse_from_str(value, "%d/%m/%Y")
        .map_err(|e| format!("Invalid date of birth: {e}"))?;
    let today = Utc::now().date_naive();
    if parsed > today {
        return Err("Date of birth cannot be in the future".to_string());
    }
    // Oldest accepted record
    let floor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
    if parsed < floor {
        return Err("Date of birth is out of range".to_string());
    }
    Ok(())
}

/// Validates HTTP/HTTPS URL
pub fn validate_http_url(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err("URL cannot be empty".to_string());
    }
    let url = url::Url::parse(value).map_err(|e| format!("Invalid URL: {}", e))?;
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err("URL must use http or https scheme".to_string()),
    }
    if url.host_str().filter(|h| !h.is_empty()).is_none() {
        return Err("URL must have a valid host".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pan() {
        assert_eq!(validate_pan("ABCDE1234F"), Ok(()));
        assert_eq!(validate_pan(""), Err("PAN cannot be empty".to_string()));
        assert_eq!(
            validate_pan("abcde1234f"),
            Err("Invalid PAN format: abcde1234f".to_string())
        );
        assert_eq!(
            validate_pan("ABCD51234F"),
            Err("Invalid PAN format: ABCD51234F".to_string())
        );
        assert_eq!(
            validate_pan("ABCDE1234FX"),
            Err("Invalid PAN format: ABCDE1234FX".to_string())
        );
    }

    #[test]
    fn test_validate_aadhaar() {
        assert_eq!(validate_aadhaar("234567890123"), Ok(()));
        assert_eq!(
            validate_aadhaar(""),
            Err("Aadhaar number cannot be empty".to_string())
        );
        // First digit must be 2-9
        assert_eq!(
            validate_aadhaar("123456789012"),
            Err("Invalid Aadhaar number: 123456789012".to_string())
        );
        assert_eq!(
            validate_aadhaar("23456789012"),
            Err("Invalid Aadhaar number: 23456789012".to_string())
        );
        assert_eq!(
            validate_aadhaar("2345678901234"),
            Err("Invalid Aadhaar number: 2345678901234".to_string())
        );
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("user@example.com"), Ok(()));
        assert_eq!(validate_email("a.b+c@sub.example.in"), Ok(()));
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("9876543210"), Ok(()));
        assert!(validate_phone("1234567890").is_err());
        assert!(validate_phone("98765").is_err());
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn test_validate_date_of_birth() {
        assert_eq!(validate_date_of_birth("15/08/1990"), Ok(()));
        assert!(validate_date_of_birth("31/02/1990").is_err());
        assert!(validate_date_of_birth("1990-08-15").is_err());
        assert!(validate_date_of_birth("01/01/1850").is_err());
        assert!(validate_date_of_birth("01/01/2999").is_err());
        assert!(validate_date_of_birth("").is_err());
    }

    #[test]
    fn test_validate_http_url() {
        assert_eq!(validate_http_url("https://api.sandbox.co.in"), Ok(()));
        assert_eq!(validate_http_url("http://localhost:8080"), Ok(()));
        assert_eq!(
            validate_http_url("ftp://api.sandbox.co.in"),
            Err("URL must use http or https scheme".to_string())
        );
        assert_eq!(
            validate_http_url("api.sandbox.co.in"),
            Err("Invalid URL: relative URL without a base".to_string())
        );
        assert_eq!(validate_http_url(""), Err("URL cannot be empty".to_string()));
    }
}
