//! Six-digit `YYYYMM` period codes: parsing, month stepping, backfill ranges.

use crate::error::IngestError;

/// Guard against a malformed end period causing an unbounded walk
/// (2000 periods is roughly 166 years of monthly data).
pub const MAX_RANGE: usize = 2000;

const MONTH_NAMES: [&str; 12] = [
    "Janeiro",
    "Fevereiro",
    "Março",
    "Abril",
    "Maio",
    "Junho",
    "Julho",
    "Agosto",
    "Setembro",
    "Outubro",
    "Novembro",
    "Dezembro",
];

/// Full Portuguese month name for period labels.
pub fn month_name(month: u32) -> Option<&'static str> {
    MONTH_NAMES.get(month.checked_sub(1)? as usize).copied()
}

/// Split a `YYYYMM` code into (year, month). Only the shape is checked here;
/// month range validation belongs to the callers that step through periods.
pub fn parse_period(code: &str) -> Result<(i32, u32), IngestError> {
    if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IngestError::MalformedPeriod(code.to_string()));
    }
    let year = code[..4]
        .parse()
        .map_err(|_| IngestError::MalformedPeriod(code.to_string()))?;
    let month = code[4..]
        .parse()
        .map_err(|_| IngestError::MalformedPeriod(code.to_string()))?;
    Ok((year, month))
}

/// The next calendar month, rolling the year over at December.
pub fn next_period(code: &str) -> Result<String, IngestError> {
    let (year, month) = parse_period(code)?;
    if !(1..=12).contains(&month) {
        return Err(IngestError::InvalidPeriod(code.to_string()));
    }
    if month == 12 {
        Ok(format!("{}01", year + 1))
    } else {
        Ok(format!("{}{:02}", year, month + 1))
    }
}

/// Every period from `first` to `last` inclusive, stepping one calendar month
/// at a time. An end period that is never reached going forward trips the
/// range bound.
pub fn build_periods(first: &str, last: &str) -> Result<Vec<String>, IngestError> {
    for endpoint in [first, last] {
        let (_, month) = parse_period(endpoint)?;
        if !(1..=12).contains(&month) {
            return Err(IngestError::InvalidPeriod(endpoint.to_string()));
        }
    }

    let mut periods = vec![first.to_string()];
    let mut current = first.to_string();
    while current != last {
        current = next_period(&current)?;
        periods.push(current.clone());
        if periods.len() > MAX_RANGE {
            return Err(IngestError::RangeTooLarge(MAX_RANGE));
        }
    }
    Ok(periods)
}
