use crate::browser::LaunchOptions;
use crate::error::{HarvestError, Result};
use crate::session::SessionConfig;
use crate::store::DedupMode;
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PAGE_BUDGET: usize = 5;

/// Login credentials. The password is never printed.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("email", &self.email).field("password", &"<redacted>").finish()
    }
}

/// Parameters of one run, injected into the orchestrator
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Maximum number of pages to visit, at least 1
    pub page_budget: usize,
    pub output_path: PathBuf,
    pub dedup_mode: DedupMode,
    /// Where the post-pass writes; see [`RunConfig::cleaned_path`]
    pub cleaned_path: Option<PathBuf>,
    /// Where debug screenshots go
    pub debug_dir: PathBuf,
    pub screenshots_on_failure: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            page_budget: DEFAULT_PAGE_BUDGET,
            output_path: default_output_path(),
            dedup_mode: DedupMode::Merge,
            cleaned_path: None,
            debug_dir: PathBuf::from("."),
            screenshots_on_failure: true,
        }
    }
}

impl RunConfig {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self { output_path: output_path.into(), ..Self::default() }
    }

    pub fn page_budget(mut self, pages: usize) -> Self {
        self.page_budget = pages;
        self
    }

    pub fn dedup_mode(mut self, mode: DedupMode) -> Self {
        self.dedup_mode = mode;
        self
    }

    pub fn debug_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.debug_dir = dir.into();
        self
    }

    pub fn screenshots_on_failure(mut self, enabled: bool) -> Self {
        self.screenshots_on_failure = enabled;
        self
    }

    /// The post-pass output: the explicit path, else `cleaned_<output name>` beside the output
    pub fn cleaned_path(&self) -> PathBuf {
        match &self.cleaned_path {
            Some(path) => path.clone(),
            None => cleaned_path_for(&self.output_path),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_budget == 0 {
            return Err(HarvestError::Config("page budget must be at least 1".into()));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(HarvestError::Config("output path must not be empty".into()));
        }
        if self.dedup_mode == DedupMode::PostPass && self.cleaned_path() == self.output_path {
            return Err(HarvestError::Config("cleaned path must differ from the output path".into()));
        }
        Ok(())
    }
}

/// `data_YYYYmmdd_HHMMSS.csv` in the working directory
pub fn default_output_path() -> PathBuf {
    PathBuf::from(format!("data_{}.csv", chrono::Local::now().format("%Y%m%d_%H%M%S")))
}

/// `cleaned_<name>` beside `path`
pub fn cleaned_path_for(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("cleaned_{}", name))
}

/// `debug_login_error_<timestamp>.png` inside `dir`
pub fn login_screenshot_path(dir: &Path) -> PathBuf {
    dir.join(format!("debug_login_error_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S")))
}

/// Everything a run needs
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub credentials: Credentials,
    pub session: SessionConfig,
    pub run: RunConfig,
    pub launch: LaunchOptions,
}

impl HarvestConfig {
    /// Load from the environment, reading a `.env` file first if one exists.
    ///
    /// `HARVEST_EMAIL`, `HARVEST_PASSWORD` and `HARVEST_URL` are required;
    /// `HARVEST_LOGIN_URL` defaults to `HARVEST_URL` and `HARVEST_PAGES` to 5.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HarvestError::Config(format!("{} must be set", key)))
        };

        let credentials = Credentials::new(required("HARVEST_EMAIL")?, required("HARVEST_PASSWORD")?);
        let list_url = required("HARVEST_URL")?;
        let login_url = lookup("HARVEST_LOGIN_URL").filter(|v| !v.trim().is_empty()).unwrap_or_else(|| list_url.clone());

        let page_budget = match lookup("HARVEST_PAGES") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| HarvestError::Config(format!("HARVEST_PAGES must be a positive number, got {:?}", raw)))?,
            None => DEFAULT_PAGE_BUDGET,
        };

        let run = RunConfig::default().page_budget(page_budget);
        run.validate()?;

        Ok(Self { credentials, session: SessionConfig::new(login_url, list_url), run, launch: LaunchOptions::default() })
    }
}
