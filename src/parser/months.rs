//! Portuguese month abbreviations and the reporting/reference period rule.

use std::fmt;

use crate::error::IngestError;

/// Closed vocabulary of three-letter Portuguese month abbreviations, as they
/// appear in the recognized bulletin text.
pub const MONTH_ABBREVIATIONS: [&str; 12] = [
    "JAN", "FEV", "MAR", "ABR", "MAI", "JUN", "JUL", "AGO", "SET", "OUT", "NOV", "DEZ",
];

/// Map an abbreviation to its month number (1-12). Anything outside the
/// vocabulary fails; no fuzzy matching.
pub fn resolve_month(token: &str) -> Result<u32, IngestError> {
    MONTH_ABBREVIATIONS
        .iter()
        .position(|m| *m == token)
        .map(|i| i as u32 + 1)
        .ok_or_else(|| IngestError::UnknownMonth(token.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The two periods a bulletin speaks about: the month whose index data was
/// computed (reference) and the month the published figure applies to
/// (reporting).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodPair {
    pub reference: YearMonth,
    pub reporting: YearMonth,
}

/// Resolve the period pair from the two month tokens in document order
/// (reference first, usage second) and the document's declared year.
///
/// The index is always one month behind publication: a January usage month
/// refers back to December of the prior year, every other month shares the
/// document year. Fixed domain convention; do not alter without a new
/// explicit rule.
pub fn resolve_period_pair(
    reference_token: &str,
    usage_token: &str,
    document_year: i32,
) -> Result<PeriodPair, IngestError> {
    let reference_month = resolve_month(reference_token)?;
    let usage_month = resolve_month(usage_token)?;

    let reference_year = if usage_month == 1 {
        document_year - 1
    } else {
        document_year
    };

    Ok(PeriodPair {
        reference: YearMonth {
            year: reference_year,
            month: reference_month,
        },
        reporting: YearMonth {
            year: document_year,
            month: usage_month,
        },
    })
}
