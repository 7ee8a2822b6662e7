//! Brazilian-convention numeric tokens: thousands `.`, decimal `,`,
//! optional trailing `%`.

use crate::error::IngestError;

/// Convert a Brazilian-formatted token to a float: `"3.012,64"` → `3012.64`,
/// `"0,13%"` → `0.13`. The convention is fixed; there is no locale detection.
pub fn parse_br_number(token: &str) -> Result<f64, IngestError> {
    let t = token.trim().trim_end_matches('%').trim_end();
    if !t.chars().any(|c| c.is_ascii_digit()) {
        return Err(IngestError::Format(token.to_string()));
    }
    t.replace('.', "")
        .replace(',', ".")
        .parse::<f64>()
        .map_err(|_| IngestError::Format(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Re-format a float back into the Brazilian convention (test helper for
    /// the round-trip check).
    fn br_format(v: f64) -> String {
        let s = format!("{:.2}", v);
        let (int_part, dec_part) = s.split_once('.').unwrap();
        let mut grouped = String::new();
        for (i, c) in int_part.chars().rev().enumerate() {
            if i > 0 && i % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(c);
        }
        let int_grouped: String = grouped.chars().rev().collect();
        format!("{},{}", int_grouped, dec_part)
    }

    #[test]
    fn thousands_and_decimal() {
        assert_eq!(parse_br_number("3.012,64").unwrap(), 3012.64);
        assert_eq!(parse_br_number("1.234.567,89").unwrap(), 1234567.89);
    }

    #[test]
    fn percent_suffix_stripped() {
        assert_eq!(parse_br_number("0,13%").unwrap(), 0.13);
        assert_eq!(parse_br_number("4,32 %").unwrap(), 4.32);
    }

    #[test]
    fn plain_integer_part() {
        assert_eq!(parse_br_number("10,00").unwrap(), 10.0);
    }

    #[test]
    fn no_digits_fails() {
        assert!(matches!(
            parse_br_number("abc"),
            Err(IngestError::Format(t)) if t == "abc"
        ));
        assert!(matches!(parse_br_number("%"), Err(IngestError::Format(_))));
    }

    #[test]
    fn mismatched_separators_fail() {
        assert!(matches!(
            parse_br_number("1,2,3"),
            Err(IngestError::Format(_))
        ));
    }

    #[test]
    fn round_trips_under_canonical_reformat() {
        for token in ["3.012,64", "0,13", "4,32", "1.234.567,89", "10,00"] {
            let v = parse_br_number(token).unwrap();
            assert_eq!(br_format(v), token, "token {} did not round-trip", token);
        }
    }
}
