use thiserror::Error;

/// Failures raised by the extraction and reshaping layers. All are raised
/// synchronously and are non-recoverable at the point of detection; the
/// calling command decides whether to abort, skip a period, or dump
/// diagnostics.
#[derive(Debug, Error, PartialEq)]
pub enum IngestError {
    #[error("malformed numeric token: {0:?}")]
    Format(String),

    #[error("unknown month token: {0:?}")]
    UnknownMonth(String),

    #[error("missing {0} in recognized text")]
    MissingField(&'static str),

    #[error("malformed period code: {0:?} (expected YYYYMM)")]
    MalformedPeriod(String),

    #[error("invalid period: {0:?} (month component outside 1-12)")]
    InvalidPeriod(String),

    #[error("period range exceeds {0} entries")]
    RangeTooLarge(usize),

    #[error("required column absent: {0}")]
    Schema(String),
}
