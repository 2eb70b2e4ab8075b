// SPDX-FileCopyrightText: 2026 Dunning Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recipient phone number validation and E.164 normalization.

/// Minimum and maximum digit counts of an E.164 number, country code included.
const E164_MIN_DIGITS: usize = 8;
const E164_MAX_DIGITS: usize = 15;

/// Length of a national subscriber number without country code.
const NATIONAL_DIGITS: usize = 10;

/// Why a phone number was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PhoneError {
    #[error("no phone number on file")]
    Missing,
    #[error("phone number contains non-digit characters")]
    InvalidCharacters,
    #[error("phone number has {0} digits")]
    InvalidLength(usize),
}

/// Normalizes `raw` to `+<country><number>`.
///
/// Spaces, dashes, dots and parentheses are ignored. A leading `+` or `00`
/// marks an international number. A bare 10-digit number is treated as
/// national and prefixed with `default_country_code`; a leading trunk `0`
/// before 10 digits is dropped.
pub fn normalize_phone(raw: Option<&str>, default_country_code: &str) -> Result<String, PhoneError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(PhoneError::Missing);
    }

    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    let (international, digits) = if let Some(rest) = compact.strip_prefix('+') {
        (true, rest)
    } else if let Some(rest) = compact.strip_prefix("00") {
        (true, rest)
    } else {
        (false, compact.as_str())
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PhoneError::InvalidCharacters);
    }

    let full = if international {
        digits.to_string()
    } else {
        let national = match digits.strip_prefix('0') {
            Some(rest) if rest.len() == NATIONAL_DIGITS => rest,
            _ => digits,
        };
        if national.len() == NATIONAL_DIGITS {
            format!("{default_country_code}{national}")
        } else if national.len() == default_country_code.len() + NATIONAL_DIGITS
            && national.starts_with(default_country_code)
        {
            national.to_string()
        } else {
            return Err(PhoneError::InvalidLength(national.len()));
        }
    };

    if !(E164_MIN_DIGITS..=E164_MAX_DIGITS).contains(&full.len()) || full.starts_with('0') {
        return Err(PhoneError::InvalidLength(full.len()));
    }

    Ok(format!("+{full}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_number_gets_default_country_code() {
        assert_eq!(
            normalize_phone(Some("98765 43210"), "91").unwrap(),
            "+919876543210"
        );
        assert_eq!(
            normalize_phone(Some("(987) 654-3210"), "1").unwrap(),
            "+19876543210"
        );
    }

    #[test]
    fn trunk_zero_is_dropped() {
        assert_eq!(
            normalize_phone(Some("09876543210"), "91").unwrap(),
            "+919876543210"
        );
    }

    #[test]
    fn country_code_without_plus_is_accepted() {
        assert_eq!(
            normalize_phone(Some("919876543210"), "91").unwrap(),
            "+919876543210"
        );
    }

    #[test]
    fn international_prefixes_are_kept() {
        assert_eq!(
            normalize_phone(Some("+44 20 7946 0958"), "91").unwrap(),
            "+442079460958"
        );
        assert_eq!(
            normalize_phone(Some("0044 20 7946 0958"), "91").unwrap(),
            "+442079460958"
        );
    }

    #[test]
    fn rejects_missing_and_malformed_numbers() {
        assert_eq!(normalize_phone(None, "91"), Err(PhoneError::Missing));
        assert_eq!(normalize_phone(Some("   "), "91"), Err(PhoneError::Missing));
        assert_eq!(
            normalize_phone(Some("98765abc10"), "91"),
            Err(PhoneError::InvalidCharacters)
        );
        assert_eq!(
            normalize_phone(Some("12345"), "91"),
            Err(PhoneError::InvalidLength(5))
        );
        assert!(normalize_phone(Some("+1234567890123456"), "91").is_err());
        assert!(normalize_phone(Some("+"), "91").is_err());
    }

    proptest::proptest! {
        #[test]
        fn any_ten_digit_number_is_national(digits in "[1-9][0-9]{9}") {
            let spaced = format!("{} {}", &digits[..5], &digits[5..]);
            proptest::prop_assert_eq!(
                normalize_phone(Some(&spaced), "91").unwrap(),
                format!("+91{digits}")
            );
        }

        #[test]
        fn normalized_numbers_are_fixed_points(raw in "\\+?[0-9 ()-]{8,20}") {
            if let Ok(once) = normalize_phone(Some(&raw), "91") {
                proptest::prop_assert_eq!(normalize_phone(Some(&once), "91").unwrap(), once);
            }
        }
    }
}
