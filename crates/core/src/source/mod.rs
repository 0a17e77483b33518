//! Record sources.

mod http;

pub use http::{extract_records, HttpGetter};
