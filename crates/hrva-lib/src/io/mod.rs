//! Interval readers for text and CSV sources.

pub mod csv;
pub mod text;

pub use self::csv::{parse_rr_column, read_rr_column};
pub use text::{parse_rr_series, read_rr_series};
