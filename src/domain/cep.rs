//! Brazilian postal code (CEP) helpers.
//!
//! A CEP is eight digits, displayed as `NNNNN-NNN`.

/// Keeps only the ASCII digits of `value`.
pub fn cep_digits(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes CEP input as it is typed.
///
/// Non-digits are dropped, anything past the eighth digit is discarded and
/// the separator is inserted once a sixth digit appears.
///
/// # Examples
///
/// ```
/// use cepbook::domain::format_cep;
///
/// assert_eq!(format_cep("12345678"), "12345-678");
/// assert_eq!(format_cep("123"), "123");
/// assert_eq!(format_cep("12.345-6789"), "12345-678");
/// ```
pub fn format_cep(value: &str) -> String {
    let digits = cep_digits(value);
    if digits.len() <= 5 {
        return digits;
    }
    let tail_end = digits.len().min(8);
    format!("{}-{}", &digits[..5], &digits[5..tail_end])
}

/// Checks for `NNNNN-NNN` or `NNNNNNNN`.
///
/// # Examples
///
/// ```
/// use cepbook::domain::is_valid_cep;
///
/// assert!(is_valid_cep("12345-678"));
/// assert!(is_valid_cep("12345678"));
/// assert!(!is_valid_cep("1234-567"));
/// ```
pub fn is_valid_cep(value: &str) -> bool {
    let bytes = value.as_bytes();
    let all_digits = |part: &[u8]| part.iter().all(u8::is_ascii_digit);
    match bytes.len() {
        8 => all_digits(bytes),
        9 => bytes[5] == b'-' && all_digits(&bytes[..5]) && all_digits(&bytes[6..]),
        _ => false,
    }
}
