//! Field validators of the intake form.
//!
//! Validators are pure: they see a value (and whether the field was touched) and return a
//! [`FieldCheck`]. Lengths are counted in characters after trimming, except for the live
//! details counter, which counts the raw value.

use url::Url;

pub const ADDRESS_MIN: usize = 5;
pub const ADDRESS_MAX: usize = 200;
pub const LANDLORD_NAME_MAX: usize = 100;
pub const URL_MIN: usize = 5;
pub const URL_MAX: usize = 500;
pub const DETAILS_MAX: usize = 10_000;
pub const DETAILS_WARN: usize = 8_000;
pub const DETAILS_DANGER: usize = 9_500;

/// Outcome of one field rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCheck {
    Valid,
    Invalid(&'static str),
}

impl FieldCheck {
    pub fn is_valid(self) -> bool {
        self == FieldCheck::Valid
    }

    pub fn message(self) -> Option<&'static str> {
        match self {
            FieldCheck::Valid => None,
            FieldCheck::Invalid(message) => Some(message),
        }
    }
}

/// Colour band of the details character counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterLevel {
    Normal,
    Warn,
    Danger,
}

impl CounterLevel {
    pub fn color(self) -> &'static str {
        match self {
            CounterLevel::Normal => "#6b7280",
            CounterLevel::Warn => "#f59e0b",
            CounterLevel::Danger => "#dc2626",
        }
    }
}

/// Band for a raw details length.
pub fn counter_level(len: usize) -> CounterLevel {
    if len > DETAILS_DANGER {
        CounterLevel::Danger
    } else if len > DETAILS_WARN {
        CounterLevel::Warn
    } else {
        CounterLevel::Normal
    }
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_address(value: &str, touched: bool) -> FieldCheck {
    let value = value.trim();
    if value.is_empty() {
        return if touched {
            FieldCheck::Invalid("House address is required")
        } else {
            FieldCheck::Valid
        };
    }
    let len = char_len(value);
    if len < ADDRESS_MIN {
        FieldCheck::Invalid("Address must be at least 5 characters long")
    } else if len > ADDRESS_MAX {
        FieldCheck::Invalid("Address must be less than 200 characters")
    } else {
        FieldCheck::Valid
    }
}

pub fn validate_landlord_name(value: &str, touched: bool) -> FieldCheck {
    let value = value.trim();
    if value.is_empty() {
        return if touched {
            FieldCheck::Invalid("Landlord name is required")
        } else {
            FieldCheck::Valid
        };
    }
    if char_len(value) > LANDLORD_NAME_MAX {
        FieldCheck::Invalid("Landlord name must be less than 100 characters")
    } else {
        FieldCheck::Valid
    }
}

pub fn validate_listing_url(value: &str, touched: bool) -> FieldCheck {
    let value = value.trim();
    if value.is_empty() {
        return if touched {
            FieldCheck::Invalid("Listing URL is required")
        } else {
            FieldCheck::Valid
        };
    }
    let len = char_len(value);
    if len < URL_MIN {
        return FieldCheck::Invalid("URL must be at least 5 characters long");
    }
    if len > URL_MAX {
        return FieldCheck::Invalid("URL must be less than 500 characters");
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => FieldCheck::Valid,
        Ok(_) => FieldCheck::Invalid("URL must start with http:// or https://"),
        Err(_) => FieldCheck::Invalid("Please enter a valid URL"),
    }
}

pub fn validate_details(value: &str) -> FieldCheck {
    if char_len(value.trim()) > DETAILS_MAX {
        FieldCheck::Invalid("Details must be less than 10,000 characters")
    } else {
        FieldCheck::Valid
    }
}

pub fn validate_consent(checked: bool) -> FieldCheck {
    if checked {
        FieldCheck::Valid
    } else {
        FieldCheck::Invalid("You must agree to the Privacy Policy")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_rules() {
        assert_eq!(validate_address("", false), FieldCheck::Valid);
        assert_eq!(
            validate_address("   ", true).message(),
            Some("House address is required")
        );
        assert_eq!(
            validate_address(" 1 A ", false).message(),
            Some("Address must be at least 5 characters long")
        );
        assert!(validate_address("12 Main St", false).is_valid());
        assert_eq!(
            validate_address(&"x".repeat(201), false).message(),
            Some("Address must be less than 200 characters")
        );
        assert!(validate_address(&"x".repeat(200), false).is_valid());
    }

    #[test]
    fn test_landlord_name_rules() {
        assert!(validate_landlord_name("", false).is_valid());
        assert_eq!(
            validate_landlord_name("", true).message(),
            Some("Landlord name is required")
        );
        assert!(validate_landlord_name("J", true).is_valid());
        assert!(!validate_landlord_name(&"n".repeat(101), true).is_valid());
    }

    #[test]
    fn test_listing_url_rules() {
        assert_eq!(
            validate_listing_url("", true).message(),
            Some("Listing URL is required")
        );
        assert_eq!(
            validate_listing_url("ab", true).message(),
            Some("URL must be at least 5 characters long")
        );
        assert_eq!(
            validate_listing_url("ftp://example.com", true).message(),
            Some("URL must start with http:// or https://")
        );
        assert_eq!(
            validate_listing_url("example.com/listing", true).message(),
            Some("Please enter a valid URL")
        );
        assert!(validate_listing_url(" https://example.com/l/1 ", true).is_valid());
        let long = format!("https://example.com/{}", "a".repeat(500));
        assert_eq!(
            validate_listing_url(&long, true).message(),
            Some("URL must be less than 500 characters")
        );
    }

    #[test]
    fn test_details_and_counter() {
        assert!(validate_details("").is_valid());
        assert!(validate_details(&format!("{}   ", "d".repeat(10_000))).is_valid());
        assert!(!validate_details(&"d".repeat(10_001)).is_valid());

        assert_eq!(counter_level(8_000), CounterLevel::Normal);
        assert_eq!(counter_level(8_001), CounterLevel::Warn);
        assert_eq!(counter_level(9_501), CounterLevel::Danger);
        assert_eq!(CounterLevel::Warn.color(), "#f59e0b");
    }

    #[test]
    fn test_consent() {
        assert!(validate_consent(true).is_valid());
        assert_eq!(
            validate_consent(false).message(),
            Some("You must agree to the Privacy Policy")
        );
    }
}
