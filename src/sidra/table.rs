//! Long-format table model for dimension-coded statistical responses.

use std::collections::BTreeMap;

use crate::error::IngestError;

/// Dimension keys as they appear in the API payload, in fixed order.
pub const RAW_KEYS: [&str; 11] = [
    "D1C", "D1N", "D2C", "D2N", "D3C", "D3N", "MC", "MN", "NC", "NN", "V",
];

/// Some response shapes carry an injected label row whose geography code
/// reads like `"Brasil (Código)"`. Harmless, but it must not survive into
/// any sink.
const HEADER_MARKER: &str = "(Código)";

/// One cleaned row: codes and names trimmed, value coerced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidraRecord {
    pub geography_code: Option<String>,
    pub geography_name: Option<String>,
    pub variable_code: Option<String>,
    pub variable_name: Option<String>,
    pub period_code: Option<String>,
    pub period_name: Option<String>,
    pub measure_unit_code: Option<String>,
    pub measure_unit_name: Option<String>,
    pub level_code: Option<String>,
    pub level_name: Option<String>,
    pub value: Option<f64>,
}

/// A decoded long-format response: the column set as decoded, the raw rows
/// verbatim (for the audit sheet), and the cleaned typed records.
#[derive(Debug, Clone)]
pub struct SidraTable {
    pub columns: Vec<String>,
    pub raw_rows: Vec<BTreeMap<String, String>>,
    pub records: Vec<SidraRecord>,
}

impl SidraTable {
    /// Clean decoded rows into a table: drop injected header-marker rows,
    /// trim fields, coerce values (non-numeric becomes null, never an
    /// error; sparse data is expected).
    pub fn from_raw(columns: Vec<String>, rows: Vec<BTreeMap<String, String>>) -> SidraTable {
        let raw_rows: Vec<_> = rows
            .into_iter()
            .filter(|r| !r.get("D1C").is_some_and(|v| v.contains(HEADER_MARKER)))
            .collect();

        let records = raw_rows
            .iter()
            .map(|r| {
                let field = |key: &str| r.get(key).map(|v| v.trim().to_string());
                SidraRecord {
                    geography_code: field("D1C"),
                    geography_name: field("D1N"),
                    variable_code: field("D2C"),
                    variable_name: field("D2N"),
                    period_code: field("D3C"),
                    period_name: field("D3N"),
                    measure_unit_code: field("MC"),
                    measure_unit_name: field("MN"),
                    level_code: field("NC"),
                    level_name: field("NN"),
                    value: field("V").and_then(|v| v.parse::<f64>().ok()),
                }
            })
            .collect();

        SidraTable {
            columns,
            raw_rows,
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c == key)
    }

    /// Schema is the contract: reshaping and period resolution need their
    /// columns present, whatever the source format was.
    pub fn require_columns(&self, keys: &[&str]) -> Result<(), IngestError> {
        for key in keys {
            if !self.has_column(key) {
                return Err(IngestError::Schema((*key).to_string()));
            }
        }
        Ok(())
    }

    /// Numerically largest period code in the table.
    pub fn max_period(&self) -> Result<String, IngestError> {
        self.require_columns(&["D3C"])?;
        self.records
            .iter()
            .filter_map(|r| r.period_code.as_deref())
            .filter_map(|p| p.parse::<u64>().ok().map(|n| (n, p)))
            .max_by_key(|(n, _)| *n)
            .map(|(_, p)| p.to_string())
            .ok_or_else(|| IngestError::MalformedPeriod("no numeric period in D3C".to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn raw_row(d1c: &str, d2c: &str, d3c: &str, v: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("D1C".to_string(), d1c.to_string()),
            ("D1N".to_string(), "Brasil".to_string()),
            ("D2C".to_string(), d2c.to_string()),
            ("D2N".to_string(), format!("Variável {}", d2c)),
            ("D3C".to_string(), d3c.to_string()),
            ("D3N".to_string(), format!("Período {}", d3c)),
            ("MC".to_string(), "2".to_string()),
            ("MN".to_string(), "%".to_string()),
            ("NC".to_string(), "1".to_string()),
            ("NN".to_string(), "Brasil".to_string()),
            ("V".to_string(), v.to_string()),
        ])
    }

    pub(crate) fn columns() -> Vec<String> {
        RAW_KEYS.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn header_marker_row_dropped() {
        let rows = vec![
            raw_row("Brasil (Código)", "Variável (Código)", "Mês (Código)", "Valor"),
            raw_row("1", "63", "202601", "0.52"),
        ];
        let table = SidraTable::from_raw(columns(), rows);
        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].geography_code.as_deref(), Some("1"));
    }

    #[test]
    fn value_coercion_non_numeric_becomes_null() {
        let rows = vec![
            raw_row("1", "63", "202601", "0.52"),
            raw_row("1", "63", "202602", "..."),
            raw_row("1", "63", "202603", "-"),
        ];
        let table = SidraTable::from_raw(columns(), rows);
        assert_eq!(table.records[0].value, Some(0.52));
        assert_eq!(table.records[1].value, None);
        assert_eq!(table.records[2].value, None);
    }

    #[test]
    fn fields_trimmed() {
        let rows = vec![raw_row("1", " 63 ", " 202601 ", "1.0")];
        let table = SidraTable::from_raw(columns(), rows);
        assert_eq!(table.records[0].variable_code.as_deref(), Some("63"));
        assert_eq!(table.records[0].period_code.as_deref(), Some("202601"));
    }

    #[test]
    fn max_period_picks_numeric_max() {
        let rows = vec![
            raw_row("1", "63", "202512", "1.0"),
            raw_row("1", "63", "202601", "1.0"),
            raw_row("1", "63", "202511", "1.0"),
        ];
        let table = SidraTable::from_raw(columns(), rows);
        assert_eq!(table.max_period().unwrap(), "202601");
    }

    #[test]
    fn max_period_requires_column() {
        let table = SidraTable::from_raw(vec!["D1C".to_string()], vec![]);
        assert!(matches!(table.max_period(), Err(IngestError::Schema(c)) if c == "D3C"));
    }

    #[test]
    fn max_period_with_no_numeric_periods() {
        let rows = vec![raw_row("1", "63", "??", "1.0")];
        let table = SidraTable::from_raw(columns(), rows);
        assert!(matches!(table.max_period(), Err(IngestError::MalformedPeriod(_))));
    }

    #[test]
    fn require_columns_reports_missing() {
        let table = SidraTable::from_raw(vec!["D1C".to_string()], vec![]);
        assert!(matches!(
            table.require_columns(&["D2C", "D3C", "V"]),
            Err(IngestError::Schema(c)) if c == "D2C"
        ));
    }
}
