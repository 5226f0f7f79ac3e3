//! Turning user text into numbers, reporting bad tokens instead of panicking.

use std::num::IntErrorKind;

use crate::error::InputError;

/// Parses one token; `position` is only used in the error.
pub fn parse_number(token: &str, position: usize) -> Result<i64, InputError> {
    token.trim().parse::<i64>().map_err(|err| match err.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => InputError::OutOfRange {
            position,
            token: token.to_string(),
        },
        _ => InputError::NotANumber {
            position,
            token: token.to_string(),
        },
    })
}

/// Parses whitespace- or comma-separated integers.
pub fn parse_numbers(text: &str) -> Result<Vec<i64>, InputError> {
    let tokens: Vec<&str> = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(InputError::Empty);
    }

    tokens
        .iter()
        .enumerate()
        .map(|(position, token)| parse_number(token, position))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_separators() {
        assert_eq!(parse_numbers("1, 2,3  -4\n5"), Ok(vec![1, 2, 3, -4, 5]));
    }

    #[test]
    fn test_reports_first_bad_token() {
        assert_eq!(
            parse_numbers("1 2 three 4 five"),
            Err(InputError::NotANumber {
                position: 2,
                token: "three".to_string()
            })
        );
    }

    #[test]
    fn test_overflow_is_out_of_range() {
        let err = parse_number("99999999999999999999", 0).unwrap_err();
        assert!(matches!(err, InputError::OutOfRange { position: 0, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_numbers(""), Err(InputError::Empty));
        assert_eq!(parse_numbers(" , ,"), Err(InputError::Empty));
    }

    #[test]
    fn test_error_message_names_token() {
        let err = parse_number("4.5", 3).unwrap_err();
        assert_eq!(err.to_string(), "Expected a number at position 3, got '4.5'");
    }
}
