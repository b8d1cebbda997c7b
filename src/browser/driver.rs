use crate::error::Result;
use std::fmt;
use std::path::Path;

/// A located element, identified by the CSS selector that found it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLocator {
    /// CSS selector for the element
    pub css_selector: String,

    /// Element's text content (truncated for display)
    pub text: Option<String>,
}

impl ElementLocator {
    pub fn new(css_selector: impl Into<String>) -> Self {
        Self { css_selector: css_selector.into(), text: None }
    }

    /// Builder method: set text content, truncated to 50 characters
    pub fn with_text(mut self, text: &str) -> Self {
        let truncated = if text.chars().count() > 50 {
            format!("{}...", text.chars().take(47).collect::<String>())
        } else {
            text.to_string()
        };
        self.text = Some(truncated);
        self
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.text {
            Some(text) if !text.is_empty() => write!(f, "{} \"{}\"", self.css_selector, text),
            _ => f.write_str(&self.css_selector),
        }
    }
}

/// The blocking browser capability the session controller and orchestrator drive.
///
/// Every call blocks the calling thread until the browser answers. Implementations
/// must report a missing element as [`HarvestError::ElementNotFound`](crate::HarvestError::ElementNotFound)
/// so callers can tell "not there yet" apart from a broken browser.
pub trait BrowserDriver {
    fn navigate(&self, url: &str) -> Result<()>;

    fn find_element(&self, css_selector: &str) -> Result<ElementLocator>;

    fn click(&self, element: &ElementLocator) -> Result<()>;

    fn type_text(&self, element: &ElementLocator, text: &str) -> Result<()>;

    /// Serialized markup of the currently rendered page
    fn page_source(&self) -> Result<String>;

    fn current_url(&self) -> Result<String>;

    fn screenshot(&self, path: &Path) -> Result<()>;
}

impl<D: BrowserDriver + ?Sized> BrowserDriver for &D {
    fn navigate(&self, url: &str) -> Result<()> {
        (**self).navigate(url)
    }

    fn find_element(&self, css_selector: &str) -> Result<ElementLocator> {
        (**self).find_element(css_selector)
    }

    fn click(&self, element: &ElementLocator) -> Result<()> {
        (**self).click(element)
    }

    fn type_text(&self, element: &ElementLocator, text: &str) -> Result<()> {
        (**self).type_text(element, text)
    }

    fn page_source(&self) -> Result<String> {
        (**self).page_source()
    }

    fn current_url(&self) -> Result<String> {
        (**self).current_url()
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        (**self).screenshot(path)
    }
}
