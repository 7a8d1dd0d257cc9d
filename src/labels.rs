//! Persian presentation helpers used by the page templates.

const PERSIAN_DIGITS: [char; 10] = ['۰', '۱', '۲', '۳', '۴', '۵', '۶', '۷', '۸', '۹'];
const THOUSANDS_SEPARATOR: char = '٬';

pub const FREE_LABEL: &str = "رایگان";
pub const CURRENCY: &str = "تومان";

/// Replaces ASCII digits with their Persian forms, leaving everything else.
pub fn persian_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => PERSIAN_DIGITS[d as usize],
            _ => c,
        })
        .collect()
}

/// Folds Persian (`۰-۹`) and Arabic-Indic (`٠-٩`) digits to ASCII.
pub fn ascii_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '۰'..='۹' => char::from(b'0' + (c as u32 - '۰' as u32) as u8),
            '٠'..='٩' => char::from(b'0' + (c as u32 - '٠' as u32) as u8),
            other => other,
        })
        .collect()
}

/// Groups thousands the way `Intl.NumberFormat("fa-IR")` does.
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() * 2);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(c);
    }
    let sign = if value < 0 { "-" } else { "" };
    persian_digits(&format!("{sign}{grouped}"))
}

pub fn format_price(price: i64) -> String {
    if price <= 0 {
        return FREE_LABEL.to_string();
    }
    format!("{} {}", format_number(price), CURRENCY)
}

pub fn format_duration(minutes: i64) -> String {
    format!("{} دقیقه", format_number(minutes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_both_eastern_digit_sets() {
        assert_eq!(ascii_digits("۰۹۱۲"), "0912");
        assert_eq!(ascii_digits("٠٩١٢"), "0912");
        assert_eq!(ascii_digits("a-۵٥5"), "a-555");
    }

    #[test]
    fn prices_use_persian_grouping() {
        assert_eq!(format_price(2_500_000), "۲٬۵۰۰٬۰۰۰ تومان");
        assert_eq!(format_price(950), "۹۵۰ تومان");
        assert_eq!(format_price(0), "رایگان");
    }

    #[test]
    fn numbers_and_digits() {
        assert_eq!(format_number(1234), "۱٬۲۳۴");
        assert_eq!(format_number(-1000), "-۱٬۰۰۰");
        assert_eq!(persian_digits("Lesson 12"), "Lesson ۱۲");
        assert_eq!(format_duration(45), "۴۵ دقیقه");
    }
}
