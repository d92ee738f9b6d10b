//! Personal link collection with title-scraping ingestion.
//!
//! The pipeline for a candidate URL: validate the scheme, fetch a bounded
//! prefix of the page, scrape a `<title>` out of it (best effort, never
//! fatal), check the owner's collection for a duplicate, persist. Batch
//! ingestion runs the same pipeline per item against one upfront snapshot
//! of existing URLs, skipping past individual failures.

pub mod collection;
pub mod error;
pub mod fetch;
pub mod ingest;
pub mod storage;
pub mod title;
pub mod types;

pub use collection::{delete_link, edit_title, export_urls, list_links};
pub use error::LinkError;
pub use fetch::{FetchConfig, HttpFetcher, PageFetcher};
pub use ingest::{add_link, add_links, BatchItem, ItemOutcome};
pub use storage::{LinkStore, MemoryStore, PostgresStore};
pub use title::{extract_title, PARSE_FAILED_TITLE, TITLE_SCAN_LIMIT};
pub use types::{Link, LinkId, SavedLink, User, UserId};
