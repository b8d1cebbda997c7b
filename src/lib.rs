//! # contact-harvest
//!
//! Paginated contact-list extraction over the Chrome DevTools Protocol.
//!
//! A run logs in, waits out interstitial challenge pages, then walks the list
//! page by page: every page is parsed with a declarative rule table, the ragged
//! per-field value lists are aligned into rows, and the rows are merged into a
//! CSV file where exact duplicates collapse and the latest copy wins.
//!
//! ## Running
//!
//! ```bash
//! # .env: HARVEST_EMAIL, HARVEST_PASSWORD, HARVEST_URL
//! cargo run -- run --pages 5 --output contacts.csv
//!
//! # With a visible browser (useful for debugging)
//! cargo run -- run --headed
//!
//! # Clean an existing file
//! cargo run -- dedup contacts.csv --output cleaned.csv
//! ```
//!
//! ## Library Usage
//!
//! ```rust,no_run
//! use contact_harvest::{BrowserSession, HarvestConfig, Orchestrator, SessionController};
//! use contact_harvest::extract::presets;
//!
//! # fn main() -> contact_harvest::Result<()> {
//! let config = HarvestConfig::from_env()?;
//! let driver = BrowserSession::launch(config.launch.clone())?;
//! let controller = SessionController::new(driver, config.session.clone());
//!
//! let mut orchestrator = Orchestrator::new(controller, &presets::people(), config.run.clone())?;
//! let summary = orchestrator.run(&config.credentials)?;
//! println!("{} rows written", summary.rows_written);
//! # Ok(())
//! # }
//! ```
//!
//! ### Parsing a Saved Page
//!
//! ```rust
//! use contact_harvest::dom::DomSnapshot;
//! use contact_harvest::extract::{ExtractionRule, PageParser, RowAligner, RuleSet};
//!
//! # fn main() -> contact_harvest::Result<()> {
//! let rules = RuleSet::new(
//!     "people",
//!     vec![
//!         ExtractionRule::new("Name", "div.name").paired_split("First Name", "Last Name"),
//!         ExtractionRule::new("Company", "div.company").default_value("Company not found"),
//!     ],
//! );
//!
//! let page = DomSnapshot::parse(r#"<div class="name">Ada Lovelace</div><div class="name">Grace</div>"#);
//! let fields = PageParser::new(&rules)?.parse(&page);
//! let records = RowAligner::new(&rules).align(&fields);
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].get("First Name"), Some("Grace"));
//! assert_eq!(records[1].get("Company"), Some("Company not found"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`browser`]: the [`BrowserDriver`] seam and its Chrome implementation
//! - [`dom`]: parsed page snapshots
//! - [`extract`]: extraction rules, the page parser and the row aligner
//! - [`store`]: records, datasets and the deduplicating CSV store
//! - [`session`]: login, challenge waiting and pagination
//! - [`orchestrator`]: the page loop
//! - [`config`]: environment and run configuration
//! - [`error`]: Error types and result aliases

pub mod browser;
pub mod config;
pub mod dom;
pub mod error;
pub mod extract;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use browser::{BrowserDriver, BrowserSession, ConnectionOptions, ElementLocator, LaunchOptions};
pub use config::{Credentials, HarvestConfig, RunConfig};
pub use error::{HarvestError, Result};
pub use orchestrator::{Orchestrator, RunSummary, StopReason};
pub use session::{Advance, ChallengeOutcome, RetryPolicy, Session, SessionConfig, SessionController, SessionState};
pub use store::{Dataset, DedupMode, IncrementalStore, Record, Schema};
