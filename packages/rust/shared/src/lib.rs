//! Shared types, error model, and configuration for schedkit.
//!
//! This crate is the foundation depended on by all other schedkit crates.
//! It provides:
//! - [`SchedKitError`] — the unified error type
//! - Domain types ([`RawSection`], [`Section`], [`Course`], [`Instructor`], [`Subject`], [`Bundle`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, CrawlSettings, TablesConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{Result, SchedKitError};
pub use types::{Bundle, Course, Instructor, RawCredits, RawSection, Section, Subject, Tag};
