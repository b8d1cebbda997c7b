use crate::browser::BrowserDriver;
use crate::error::Result;
use scraper::Html;

/// A parsed copy of one rendered page's markup, captured at a point in time
pub struct DomSnapshot {
    document: Html,
}

impl DomSnapshot {
    /// Parse raw page markup
    pub fn parse(markup: &str) -> Self {
        Self { document: Html::parse_document(markup) }
    }

    /// Capture the page currently rendered by the driver
    pub fn capture<D: BrowserDriver + ?Sized>(driver: &D) -> Result<Self> {
        let markup = driver.page_source()?;
        log::debug!("Captured page source ({} bytes)", markup.len());
        Ok(Self::parse(&markup))
    }

    pub fn document(&self) -> &Html {
        &self.document
    }
}

/// One snapshot plus its 1-based position in the paginated sequence
pub struct Page {
    pub ordinal: usize,
    pub snapshot: DomSnapshot,
}

impl Page {
    pub fn new(ordinal: usize, snapshot: DomSnapshot) -> Self {
        Self { ordinal, snapshot }
    }
}
