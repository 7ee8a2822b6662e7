pub mod payload;
pub mod period;
pub mod reshape;
pub mod table;

pub use payload::decode_payload;
pub use reshape::{reshape, PeriodParsing, WideRow};
pub use table::{SidraRecord, SidraTable};
