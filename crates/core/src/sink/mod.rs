//! Record sinks.

mod http;

pub use http::{attach_fetch_id, HttpStorer};
