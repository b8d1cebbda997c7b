use crate::browser::config::{ConnectionOptions, LaunchOptions};
use crate::browser::driver::{BrowserDriver, ElementLocator};
use crate::error::{HarvestError, Result};
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::{Browser, Tab};
use std::{ffi::OsStr, fs, path::Path, sync::Arc, time::Duration};

/// Browser session that manages a Chrome/Chromium instance and the tab being scraped.
///
/// Dropping the session releases the browser.
pub struct BrowserSession {
    /// Owns the Chrome process; dropping it closes the browser
    _browser: Browser,

    /// The tab every driver call operates on
    tab: Arc<Tab>,
}

impl BrowserSession {
    /// Launch a new browser instance with the given options
    pub fn launch(options: LaunchOptions) -> Result<Self> {
        let user_agent_arg = options.user_agent.as_ref().map(|ua| format!("--user-agent={}", ua));
        let mut launch_opts = headless_chrome::LaunchOptions::default();

        // Ignore default arguments to prevent detection by anti-bot services
        launch_opts.ignore_default_args.push(OsStr::new("--enable-automation"));
        launch_opts.args.push(OsStr::new("--disable-blink-features=AutomationControlled"));

        if let Some(arg) = &user_agent_arg {
            launch_opts.args.push(OsStr::new(arg));
        }

        // A long run can sit on one page for minutes while challenges resolve
        launch_opts.idle_browser_timeout = Duration::from_secs(60 * 60);

        launch_opts.headless = options.headless;
        launch_opts.window_size = Some((options.window_width, options.window_height));
        launch_opts.path = options.chrome_path;
        launch_opts.user_data_dir = options.user_data_dir;
        launch_opts.sandbox = options.sandbox;

        let browser = Browser::new(launch_opts).map_err(|e| HarvestError::LaunchFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| HarvestError::LaunchFailed(format!("Failed to create tab: {}", e)))?;

        log::info!("Browser launched (headless: {})", options.headless);
        Ok(Self { _browser: browser, tab })
    }

    /// Connect to an existing browser instance via WebSocket
    pub fn connect(options: ConnectionOptions) -> Result<Self> {
        let browser = Browser::connect_with_timeout(options.ws_url, Duration::from_millis(options.timeout))
            .map_err(|e| HarvestError::ConnectionFailed(e.to_string()))?;

        let tab = browser
            .new_tab()
            .map_err(|e| HarvestError::TabOperationFailed(format!("Failed to create tab: {}", e)))?;

        Ok(Self { _browser: browser, tab })
    }

    fn element<'a>(&'a self, css_selector: &str) -> Result<headless_chrome::Element<'a>> {
        self.tab
            .find_element(css_selector)
            .map_err(|e| HarvestError::ElementNotFound(format!("Element '{}' not found: {}", css_selector, e)))
    }
}

impl BrowserDriver for BrowserSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| HarvestError::NavigationFailed(format!("Failed to navigate to {}: {}", url, e)))?
            .wait_until_navigated()
            .map_err(|e| HarvestError::NavigationFailed(format!("Navigation timeout: {}", e)))?;

        Ok(())
    }

    fn find_element(&self, css_selector: &str) -> Result<ElementLocator> {
        let element = self.element(css_selector)?;
        let locator = ElementLocator::new(css_selector);

        Ok(match element.get_inner_text() {
            Ok(text) => locator.with_text(text.trim()),
            Err(_) => locator,
        })
    }

    fn click(&self, element: &ElementLocator) -> Result<()> {
        self.element(&element.css_selector)?
            .click()
            .map_err(|e| HarvestError::InteractionFailed { selector: element.css_selector.clone(), reason: e.to_string() })?;

        Ok(())
    }

    fn type_text(&self, element: &ElementLocator, text: &str) -> Result<()> {
        self.element(&element.css_selector)?
            .type_into(text)
            .map_err(|e| HarvestError::InteractionFailed { selector: element.css_selector.clone(), reason: e.to_string() })?;

        Ok(())
    }

    fn page_source(&self) -> Result<String> {
        self.tab.get_content().map_err(|e| HarvestError::PageReadFailed(e.to_string()))
    }

    fn current_url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }

    fn screenshot(&self, path: &Path) -> Result<()> {
        let png = self
            .tab
            .capture_screenshot(CaptureScreenshotFormatOption::Png, None, None, true)
            .map_err(|e| HarvestError::ScreenshotFailed(e.to_string()))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, png)?;

        log::info!("Screenshot saved: {}", path.display());
        Ok(())
    }
}
