//! UPC / GTIN normalization.
//!
//! Vendors ship product codes in every imaginable shape: UPC-A with or
//! without its check digit, EAN-13, GTIN-14 with a packaging prefix,
//! hyphenated, zero-padded, or mangled into floats by a spreadsheet round
//! trip (`"123456789012.0"`). Two normal forms are used throughout the
//! system:
//!
//! - [`canonical`] is the storage key: a zero-padded 12-digit string,
//!   used as `products.sku`.
//! - [`match_key`] is the join key used to match a vendor's cost list
//!   against the point-of-sale movement report. It strips check digits
//!   and filters out short company-internal codes, which measurably
//!   improves cross-vendor match rates.

/// Normalize a raw code into the canonical zero-padded 12-digit form.
///
/// All non-digit characters are dropped, then the *last* 12 digits are
/// kept (a GTIN-14 carries its extra digits as a prefix) and the result
/// is left-padded with zeros to exactly 12 characters.
pub fn canonical(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    let start = digits.len().saturating_sub(12);
    format!("{:0>12}", &digits[start..])
}

/// Normalize a raw code into the cross-vendor matching key.
///
/// Returns `None` when the input carries no usable code: empty cells,
/// all-zero padding, or codes of five digits or fewer (those are
/// vendor-internal item numbers, not consumer UPCs).
///
/// Numeric codes are reduced as follows:
/// - anything after a `.` is discarded (spreadsheet float artifacts),
/// - hyphens, spaces and leading zeros are dropped,
/// - 13 digits (EAN-13) lose their check digit, leaving 12,
/// - 12 digits (UPC-A) lose their check digit, leaving 11,
/// - 6-11 digit codes and 8-digit UPC-E codes are kept as-is.
///
/// Non-numeric codes pass through unchanged so they surface verbatim in
/// downstream review instead of silently vanishing.
pub fn match_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    // "123456789012.0" and friends: everything after the dot is noise
    let stem = trimmed.split('.').next().unwrap_or_default();

    let cleaned: String = stem
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Some(cleaned);
    }

    let digits = cleaned.trim_start_matches('0');
    if digits.is_empty() {
        return None;
    }
    if digits.len() <= 5 {
        return None;
    }

    let key = match digits.len() {
        13 => &digits[..12],
        12 => &digits[..11],
        _ => digits,
    };
    Some(key.to_owned())
}
