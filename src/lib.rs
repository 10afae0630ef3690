//! pagelens: structured section extraction from web pages
//!
//! Pipeline:
//! - fetch: static HTTP GET
//! - quality: decide whether the static markup is good enough
//! - render: headless Chrome when it is not
//! - segment / metadata: typed sections and page metadata
//! - interact: bounded tab, load-more, pagination and scroll discovery
//! - orchestrator: ties the stages together, collecting failures as data
//!
//! `api` serves the pipeline over HTTP; `cli` backs the binary.

pub mod api;
pub mod browser;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod interact;
pub mod metadata;
pub mod model;
pub mod orchestrator;
pub mod quality;
pub mod render;
pub mod segment;

pub use config::ScrapeConfig;
pub use error::{Result, ScrapeError};
pub use model::{ScraperResult, Section, SectionType};
pub use orchestrator::{Outcome, Scraper};
