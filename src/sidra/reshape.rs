//! Pivot the long table into one row per period with fixed, human-labeled
//! columns.

use std::collections::BTreeMap;

use crate::error::IngestError;
use crate::sidra::period::{month_name, parse_period};
use crate::sidra::table::SidraTable;

/// Variable codes of IBGE table 1737 mapped to the published column labels,
/// in output order. Codes are the authoritative key; a code outside this
/// list is dropped silently (responses carry extra variables not needed
/// downstream).
pub const VAR_MAP: [(&str, &str); 6] = [
    ("2266", "NUMERO INDICE"),
    ("63", "MES_VAR"),
    ("2263", "3 Meses"),
    ("2264", "6 MESES"),
    ("69", "ANO_VAR"),
    ("2265", "12 MESES"),
];

/// What to do with a period code that is not exactly six digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodParsing {
    /// Abort the run. Default.
    Strict,
    /// Keep the row with blank year/month labels.
    BestEffort,
}

/// One pivoted row. `values` is aligned with [`VAR_MAP`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub period_code: String,
    pub year: Option<i32>,
    pub month: Option<String>,
    pub values: Vec<Option<f64>>,
}

/// Column headers of the pivoted sheet, in the declared order.
pub fn wide_headers() -> Vec<String> {
    let mut headers = vec!["ANO".to_string(), "MES".to_string()];
    headers.extend(VAR_MAP.iter().map(|(_, label)| label.to_string()));
    headers
}

/// Pivot to one row per period: restrict to mapped variable codes, first
/// value wins on duplicates (well-formed input has none), label each period
/// with year + Portuguese month, round to two decimals. Rows come out in
/// ascending period order.
pub fn reshape(table: &SidraTable, mode: PeriodParsing) -> Result<Vec<WideRow>, IngestError> {
    table.require_columns(&["D2C", "D3C", "V"])?;

    // period code -> slot index -> value; BTreeMap gives the ascending order.
    let mut by_period: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();

    for record in &table.records {
        let (Some(variable), Some(period)) =
            (record.variable_code.as_deref(), record.period_code.as_deref())
        else {
            continue;
        };
        let Some(slot) = VAR_MAP.iter().position(|(code, _)| *code == variable) else {
            continue;
        };
        let row = by_period
            .entry(period.to_string())
            .or_insert_with(|| vec![None; VAR_MAP.len()]);
        if row[slot].is_none() {
            row[slot] = record.value;
        }
    }

    let mut rows = Vec::with_capacity(by_period.len());
    for (period_code, values) in by_period {
        let (year, month) = match parse_period(&period_code) {
            Ok((y, m)) => (Some(y), month_name(m).map(|n| n.to_string())),
            Err(e) => match mode {
                PeriodParsing::Strict => return Err(e),
                PeriodParsing::BestEffort => (None, None),
            },
        };
        rows.push(WideRow {
            period_code,
            year,
            month,
            values: values.into_iter().map(|v| v.map(round2)).collect(),
        });
    }
    Ok(rows)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
