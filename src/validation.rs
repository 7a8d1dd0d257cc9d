use crate::error::{AcademyError, Result};
use crate::labels::ascii_digits;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
// Iranian mobile numbers: 09xxxxxxxxx, 9xxxxxxxxx or +989xxxxxxxxx
static IRAN_MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+98|0)?9[0-9]{9}$").expect("valid regex"));

/// Returns the trimmed value, or `None` when it is missing or blank.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn require<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    present(value).ok_or_else(|| AcademyError::validation(format!("{field} is required")))
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email.trim())
}

/// Strips whitespace from a phone number as typed by the visitor and folds
/// Persian or Arabic-Indic digits to ASCII.
pub fn normalize_phone(phone: &str) -> String {
    ascii_digits(phone).chars().filter(|c| !c.is_whitespace()).collect()
}

pub fn is_valid_phone(phone: &str) -> bool {
    IRAN_MOBILE.is_match(&normalize_phone(phone))
}

pub fn non_negative(value: i64, field: &str) -> Result<i64> {
    if value < 0 {
        return Err(AcademyError::validation(format!("{field} must not be negative")));
    }
    Ok(value)
}

/// A single path component that cannot escape the directory it is joined to.
pub fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && !name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("sara@hiarchitect.ir"));
        assert!(is_valid_email("  a@b.co "));
        assert!(!is_valid_email("sara@hiarchitect"));
        assert!(!is_valid_email("sara hiarchitect.ir"));
        assert!(!is_valid_email("@b.co"));
    }

    #[test]
    fn iranian_mobile_numbers() {
        assert!(is_valid_phone("09121234567"));
        assert!(is_valid_phone("0912 123 4567"));
        assert!(is_valid_phone("+989121234567"));
        assert!(is_valid_phone("9121234567"));
        assert!(!is_valid_phone("02112345678"));
        assert!(!is_valid_phone("0912123456"));
        assert!(!is_valid_phone("+18005551234"));
    }

    #[test]
    fn eastern_digits_are_folded_before_matching() {
        assert!(is_valid_phone("۰۹۱۲۱۲۳۴۵۶۷"));
        assert!(is_valid_phone("09١٢٣٤٥٦٧٨٩"));
        assert_eq!(normalize_phone("09١٢٣ ٤٥٦٧٨٩"), "09123456789");
        // Other Unicode digit sets stay invalid
        assert!(!is_valid_phone("09१२३४५६७८९"));
    }

    #[test]
    fn presence_trims_blanks() {
        assert_eq!(present(Some("  x ")), Some("x"));
        assert_eq!(present(Some("   ")), None);
        assert_eq!(present(None), None);
        assert!(require(Some(""), "title").is_err());
    }

    #[test]
    fn unsafe_file_names() {
        assert!(is_safe_file_name("thumbnail.jpg"));
        assert!(is_safe_file_name("ویدیو معرفی.mp4"));
        assert!(!is_safe_file_name("../secret"));
        assert!(!is_safe_file_name("a/b.png"));
        assert!(!is_safe_file_name(".."));
        assert!(!is_safe_file_name(".env"));
        assert!(!is_safe_file_name(""));
    }
}
