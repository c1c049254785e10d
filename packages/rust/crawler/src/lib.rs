//! Schedule crawler.
//!
//! This crate provides:
//! - [`parser`] — Row, pagination and heading extraction for schedule pages
//! - [`engine`] — Rate-limited, sequential crawler over a term's page chain

pub mod engine;
pub mod parser;

pub use engine::{CrawlProgress, CrawlResult, Crawler, SilentCrawl, TermCrawl, TermMeta};
pub use parser::{SchedulePage, parse_schedule_page, parse_term_title};
