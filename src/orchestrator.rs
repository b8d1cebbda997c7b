use crate::browser::BrowserDriver;
use crate::config::{Credentials, RunConfig, login_screenshot_path};
use crate::dom::{DomSnapshot, Page};
use crate::error::{HarvestError, Result};
use crate::extract::{PageParser, RowAligner, RuleSet};
use crate::session::{Advance, SessionController};
use crate::store::{DedupMode, DedupReport, IncrementalStore, MergeOutcome, deduplicate};
use std::path::{Path, PathBuf};

/// Why the page loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    BudgetReached,
    /// The list had no next page
    Exhausted,
}

/// What a finished run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub pages_attempted: usize,
    pub pages_failed: usize,
    pub rows_written: usize,
    /// Backup files written in place of the main artifact
    pub backups: Vec<PathBuf>,
    pub stop: StopReason,
    /// Present when the run used the post-pass dedup mode
    pub dedup: Option<DedupReport>,
}

/// Runs the page loop: parse, align, persist, advance.
///
/// Per-page failures are logged and the loop moves on; only an authentication
/// failure ends a run with an error.
pub struct Orchestrator<D: BrowserDriver> {
    controller: SessionController<D>,
    parser: PageParser,
    aligner: RowAligner,
    store: IncrementalStore,
    config: RunConfig,
}

impl<D: BrowserDriver> Orchestrator<D> {
    pub fn new(controller: SessionController<D>, rules: &RuleSet, config: RunConfig) -> Result<Self> {
        config.validate()?;
        let parser = PageParser::new(rules)?;
        let aligner = RowAligner::new(rules);
        let store = IncrementalStore::new(&config.output_path, aligner.schema().clone(), config.dedup_mode);

        Ok(Self { controller, parser, aligner, store, config })
    }

    pub fn controller(&self) -> &SessionController<D> {
        &self.controller
    }

    pub fn store(&self) -> &IncrementalStore {
        &self.store
    }

    /// Hand back the controller, and with it the browser
    pub fn into_controller(self) -> SessionController<D> {
        self.controller
    }

    pub fn run(&mut self, credentials: &Credentials) -> Result<RunSummary> {
        if let Err(e) = self.controller.authenticate(credentials) {
            if e.is_fatal() {
                log::error!("{}", e);
                self.debug_screenshot(&login_screenshot_path(&self.config.debug_dir));
            }
            return Err(e);
        }

        let mut summary = RunSummary {
            pages_attempted: 0,
            pages_failed: 0,
            rows_written: 0,
            backups: Vec::new(),
            stop: StopReason::BudgetReached,
            dedup: None,
        };

        loop {
            let ordinal = self.controller.session().ordinal;
            summary.pages_attempted += 1;
            log::info!("Processing page {} of {}", ordinal, self.config.page_budget);

            match self.process_page(ordinal) {
                Ok(MergeOutcome::Written { rows, .. }) => summary.rows_written += rows,
                Ok(MergeOutcome::Backup { path, .. }) => summary.backups.push(path),
                Ok(MergeOutcome::Skipped) => {}
                Err(e) => {
                    summary.pages_failed += 1;
                    log::warn!("Page {} failed, moving on: {}", ordinal, e);
                    let name = format!("debug_error_page_{}.png", ordinal);
                    self.debug_screenshot(&self.config.debug_dir.join(name));
                }
            }

            if ordinal >= self.config.page_budget {
                break;
            }
            match self.controller.advance()? {
                Advance::Advanced(_) => {}
                Advance::Exhausted => {
                    summary.stop = StopReason::Exhausted;
                    break;
                }
            }
        }

        if self.config.dedup_mode == DedupMode::PostPass {
            summary.dedup = self.post_pass();
        }

        log::info!(
            "Run finished ({:?}): {} pages, {} failed, {} rows written, {} backups",
            summary.stop,
            summary.pages_attempted,
            summary.pages_failed,
            summary.rows_written,
            summary.backups.len()
        );
        Ok(summary)
    }

    fn process_page(&self, ordinal: usize) -> Result<MergeOutcome> {
        let page_error = |e: HarvestError| HarvestError::PageProcessing { page: ordinal, reason: e.to_string() };

        let page = Page::new(ordinal, DomSnapshot::capture(self.controller.driver()).map_err(page_error)?);
        let fields = self.parser.parse(&page.snapshot);
        let records = self.aligner.align(&fields);
        log::info!("Page {}: {} rows", page.ordinal, records.len());

        self.store.merge_page(page.ordinal, &records).map_err(page_error)
    }

    fn post_pass(&self) -> Option<DedupReport> {
        let output = self.store.path();
        if !output.exists() {
            log::info!("Nothing was written, skipping dedup pass");
            return None;
        }
        match deduplicate(output, &self.config.cleaned_path()) {
            Ok(report) => Some(report),
            Err(e) => {
                log::error!("Dedup pass over {} failed: {}", output.display(), e);
                None
            }
        }
    }

    fn debug_screenshot(&self, path: &Path) {
        if !self.config.screenshots_on_failure {
            return;
        }
        if let Err(e) = self.controller.driver().screenshot(path) {
            log::warn!("Could not save debug screenshot {}: {}", path.display(), e);
        }
    }
}
