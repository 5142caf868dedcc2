//! Phone number utilities

use once_cell::sync::Lazy;
use regex::Regex;

// International phone number regex (E.164 format)
static E164_PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{6,14}$").expect("E.164 pattern is valid")
});

/// Characters a user may type between digits that carry no meaning
const FORMATTING_CHARS: [char; 5] = [' ', '-', '.', '(', ')'];

/// Normalize a phone number by removing common formatting characters
///
/// Only visual separators are stripped. Anything else (letters, symbols) is
/// kept so that validation rejects it instead of silently producing a
/// different number.
pub fn normalize_phone_number(phone: &str) -> String {
    phone
        .trim()
        .chars()
        .filter(|c| !FORMATTING_CHARS.contains(c))
        .collect()
}

/// Check if an already normalized phone number is in E.164 shape
pub fn is_e164(phone: &str) -> bool {
    E164_PHONE_REGEX.is_match(phone)
}

/// Check if a phone number is valid (international E.164 format)
pub fn is_valid_international_phone(phone: &str) -> bool {
    is_e164(&normalize_phone_number(phone))
}

/// Mask a phone number for logging, keeping only the last 4 digits
///
/// ```
/// use pv_shared::utils::phone::mask_phone_number;
///
/// assert_eq!(mask_phone_number("+15551234567"), "+*******4567");
/// ```
pub fn mask_phone_number(phone: &str) -> String {
    let visible_digits = 4;
    let char_count = phone.chars().count();
    if char_count <= visible_digits {
        return "*".repeat(char_count);
    }

    let last_digits: String = phone.chars().skip(char_count - visible_digits).collect();
    let masked_count = char_count - visible_digits;

    if phone.starts_with('+') {
        format!("+{}{}", "*".repeat(masked_count - 1), last_digits)
    } else {
        format!("{}{}", "*".repeat(masked_count), last_digits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_phone_number() {
        assert_eq!(normalize_phone_number("+1 (555) 123-4567"), "+15551234567");
        assert_eq!(normalize_phone_number(" +86 138.1234.5678 "), "+8613812345678");
        assert_eq!(normalize_phone_number("+1555abc4567"), "+1555abc4567");
    }

    #[test]
    fn test_is_valid_international_phone() {
        assert!(is_valid_international_phone("+15551234567"));
        assert!(is_valid_international_phone("+8613812345678"));
        assert!(is_valid_international_phone("+44 20 7183 8750"));
        assert!(!is_valid_international_phone("15551234567")); // Missing +
        assert!(!is_valid_international_phone("+0123456789")); // Invalid country code
        assert!(!is_valid_international_phone("+1555abc4567"));
        assert!(!is_valid_international_phone("+12345")); // Too short
        assert!(!is_valid_international_phone("+1234567890123456")); // Too long
        assert!(!is_valid_international_phone(""));
    }

    #[test]
    fn test_mask_phone_number() {
        assert_eq!(mask_phone_number("+1234567890"), "+******7890");
        assert_eq!(mask_phone_number("1234567890"), "******7890");
        assert_eq!(mask_phone_number("123"), "***");
        assert_eq!(mask_phone_number("1234"), "****");
        assert_eq!(mask_phone_number(""), "");
    }
}
