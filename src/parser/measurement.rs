//! Field extraction from recognized bulletin text.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::IngestError;
use crate::parser::months::{resolve_period_pair, YearMonth};
use crate::parser::numeric::parse_br_number;

static MONTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(JAN|FEV|MAR|ABR|MAI|JUN|JUL|AGO|SET|OUT|NOV|DEZ)\b").unwrap()
});
static BR_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:\.\d{3})*,\d{2}%?\b").unwrap());

// Label-anchored patterns, one per quantity, in output order.
static ANCHOR_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)CUB\s*M[ÉE]DIO.*?(\d{1,3}(?:\.\d{3})*,\d{2})").unwrap());
static ANCHOR_MONTH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%\s*M[ÊE]S.*?(\d{1,3},\d{2})\s*%").unwrap());
static ANCHOR_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%\s*ANO.*?(\d{1,3},\d{2})\s*%").unwrap());
static ANCHOR_12M_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)%\s*12\s*MESES.*?(\d{1,3},\d{2})\s*%").unwrap());

/// One monthly bulletin measurement. Constructed once per run from an
/// immutable text blob; never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMeasurement {
    pub reporting_period: YearMonth,
    pub reference_period: YearMonth,
    pub index_value: f64,
    pub pct_change_month: f64,
    pub pct_change_year: f64,
    pub pct_change_12m: f64,
    pub source_checksum: String,
}

/// How to recover the four quantities (index, %month, %year, %12m) from
/// recognized text. The positional extractor is the default contract; the
/// anchored one locates each quantity by its printed label instead.
pub trait NumberExtractor {
    fn numbers(&self, text: &str) -> Result<[f64; 4], IngestError>;
}

/// First four Brazilian-numeric tokens in order of appearance, matched after
/// stripping space characters (OCR splits digit groups with stray spaces;
/// line breaks stay, they delimit tokens). Deliberately brittle: assumes the
/// quantities appear in fixed order with no intervening unrelated numbers,
/// and makes no attempt at label-based disambiguation.
pub struct PositionalExtractor;

impl NumberExtractor for PositionalExtractor {
    fn numbers(&self, text: &str) -> Result<[f64; 4], IngestError> {
        let compact = text.replace(' ', "");
        let tokens: Vec<&str> = BR_NUMBER_RE
            .find_iter(&compact)
            .map(|m| m.as_str())
            .collect();
        if tokens.len() < 4 {
            return Err(IngestError::MissingField("numbers"));
        }
        Ok([
            parse_br_number(tokens[0])?,
            parse_br_number(tokens[1])?,
            parse_br_number(tokens[2])?,
            parse_br_number(tokens[3])?,
        ])
    }
}

/// Each quantity located by its anchor phrase in the bulletin layout.
pub struct AnchoredExtractor;

impl NumberExtractor for AnchoredExtractor {
    fn numbers(&self, text: &str) -> Result<[f64; 4], IngestError> {
        let grab = |re: &Regex| -> Result<f64, IngestError> {
            let token = re
                .captures(text)
                .and_then(|c| c.get(1))
                .ok_or(IngestError::MissingField("numbers"))?;
            parse_br_number(token.as_str())
        };
        Ok([
            grab(&ANCHOR_INDEX_RE)?,
            grab(&ANCHOR_MONTH_RE)?,
            grab(&ANCHOR_YEAR_RE)?,
            grab(&ANCHOR_12M_RE)?,
        ])
    }
}

/// Extract one measurement with the default positional strategy.
pub fn extract_measurement(
    text: &str,
    document_year: i32,
    source_checksum: String,
) -> Result<ExtractedMeasurement, IngestError> {
    extract_measurement_with(&PositionalExtractor, text, document_year, source_checksum)
}

/// Pure transform: identical text always yields the identical record or the
/// identical failure.
pub fn extract_measurement_with(
    strategy: &dyn NumberExtractor,
    text: &str,
    document_year: i32,
    source_checksum: String,
) -> Result<ExtractedMeasurement, IngestError> {
    let upper = text.to_uppercase();

    let months: Vec<&str> = MONTH_RE.find_iter(&upper).map(|m| m.as_str()).collect();
    if months.len() < 2 {
        return Err(IngestError::MissingField("months"));
    }

    let [index_value, pct_change_month, pct_change_year, pct_change_12m] =
        strategy.numbers(&upper)?;

    let pair = resolve_period_pair(months[0], months[1], document_year)?;

    Ok(ExtractedMeasurement {
        reporting_period: pair.reporting,
        reference_period: pair.reference,
        index_value,
        pct_change_month,
        pct_change_year,
        pct_change_12m,
        source_checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Dados do mês de: DEZ\nPara ser usado em: JAN\n\
                          CUB médio R$/m²: 3.012,64\n% mês: 0,13%\n% ano: 4,32%\n% 12 meses: 4,32%";

    #[test]
    fn end_to_end_positional() {
        let m = extract_measurement(SAMPLE, 2026, "abc123".into()).unwrap();
        assert_eq!(m.reporting_period, YearMonth { year: 2026, month: 1 });
        assert_eq!(m.reference_period, YearMonth { year: 2025, month: 12 });
        assert_eq!(m.index_value, 3012.64);
        assert_eq!(m.pct_change_month, 0.13);
        assert_eq!(m.pct_change_year, 4.32);
        assert_eq!(m.pct_change_12m, 4.32);
        assert_eq!(m.source_checksum, "abc123");
    }

    #[test]
    fn anchored_agrees_on_well_labeled_text() {
        let positional = extract_measurement(SAMPLE, 2026, String::new()).unwrap();
        let anchored =
            extract_measurement_with(&AnchoredExtractor, SAMPLE, 2026, String::new()).unwrap();
        assert_eq!(positional, anchored);
    }

    #[test]
    fn one_month_fails() {
        let text = "Para ser usado em: JAN\n3.012,64\n0,13%\n4,32%\n4,32%";
        assert!(matches!(
            extract_measurement(text, 2026, String::new()),
            Err(IngestError::MissingField("months"))
        ));
    }

    #[test]
    fn three_numbers_fail() {
        let text = "DEZ JAN\n3.012,64\n0,13%\n4,32%";
        assert!(matches!(
            extract_measurement(text, 2026, String::new()),
            Err(IngestError::MissingField("numbers"))
        ));
    }

    #[test]
    fn stray_spaces_inside_numbers() {
        let text = "DEZ JAN\n3.012 ,64\n0, 13%\n4,32%\n4,32%";
        let m = extract_measurement(text, 2026, String::new()).unwrap();
        assert_eq!(m.index_value, 3012.64);
        assert_eq!(m.pct_change_month, 0.13);
    }

    #[test]
    fn deterministic() {
        let a = extract_measurement(SAMPLE, 2026, "h".into());
        let b = extract_measurement(SAMPLE, 2026, "h".into());
        assert_eq!(a, b);
    }

    #[test]
    fn fixture_bulletin() {
        let text = std::fs::read_to_string("tests/fixtures/cub_bulletin_ocr.txt").unwrap();
        let m = extract_measurement(&text, 2026, String::new()).unwrap();
        assert_eq!(m.reporting_period, YearMonth { year: 2026, month: 1 });
        assert_eq!(m.reference_period, YearMonth { year: 2025, month: 12 });
        assert_eq!(m.index_value, 3012.64);
    }
}
