//! Output module for persisting crawl results
//!
//! The visited set is written once, at the end of a crawl, as plain text:
//! one absolute URL per line, sorted, no duplicates.

mod writer;

pub use writer::{output_file_name, write_url_list, ResultSink};
