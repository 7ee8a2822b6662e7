pub mod measurement;
pub mod months;
pub mod numeric;

pub use measurement::{
    extract_measurement, extract_measurement_with, AnchoredExtractor, ExtractedMeasurement,
    NumberExtractor, PositionalExtractor,
};
pub use months::YearMonth;
