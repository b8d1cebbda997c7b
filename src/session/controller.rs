use crate::browser::{BrowserDriver, ElementLocator};
use crate::config::Credentials;
use crate::error::{HarvestError, Result};
use crate::session::retry::RetryPolicy;
use crate::session::state::{Advance, ChallengeOutcome, Session, SessionState};
use std::time::Duration;

/// Every URL, selector, marker and bound the controller works with
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub login_url: String,
    /// The first page of the list to scrape
    pub list_url: String,

    pub email_selector: String,
    pub password_selector: String,
    /// Tried in order until one is found
    pub submit_selectors: Vec<String>,

    /// After login the URL must contain none of these (case-insensitive)
    pub authenticated_url_exclusions: Vec<String>,
    /// If set, this element must also be present after login
    pub authenticated_marker: Option<String>,

    /// Case-insensitive markers of an interstitial challenge page
    pub challenge_markers: Vec<String>,
    /// URL fragment present while the challenge is still running
    pub challenge_url_marker: String,

    /// Next-page controls, tried in order
    pub next_page_selectors: Vec<String>,

    pub element_wait: RetryPolicy,
    pub login_verification: RetryPolicy,
    pub challenge_wait: RetryPolicy,
    /// One pause after every navigation, login or page advance
    pub settle: RetryPolicy,
}

impl SessionConfig {
    pub fn new(login_url: impl Into<String>, list_url: impl Into<String>) -> Self {
        Self {
            login_url: login_url.into(),
            list_url: list_url.into(),
            email_selector: r#"input[name="email"]"#.to_string(),
            password_selector: r#"input[name="password"]"#.to_string(),
            submit_selectors: vec![
                r#"button[type="submit"]"#.to_string(),
                r#"input[type="submit"]"#.to_string(),
                "form button".to_string(),
            ],
            authenticated_url_exclusions: vec!["login".to_string()],
            authenticated_marker: None,
            challenge_markers: [
                "Checking your browser before accessing",
                "This process is automatic",
                "DDoS protection by Cloudflare",
                "Please wait while we verify that you're a real person",
                "cf-browser-verification",
                "Ray ID",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            challenge_url_marker: "challenge".to_string(),
            next_page_selectors: vec![
                r#"button[aria-label="Next"]"#.to_string(),
                r#"button[aria-label="Next"].zp_NbJqo.zp_hgBYR"#.to_string(),
            ],
            element_wait: RetryPolicy::new(10, Duration::from_secs(1)),
            login_verification: RetryPolicy::new(15, Duration::from_secs(1)).jitter(Duration::from_millis(500)),
            challenge_wait: RetryPolicy::new(11, Duration::from_secs(2)).jitter(Duration::from_secs(1)),
            settle: RetryPolicy::new(1, Duration::from_secs(3)).jitter(Duration::from_secs(2)),
        }
    }

    /// Builder method: replace every wait with an immediate policy of the same length
    pub fn without_delays(mut self) -> Self {
        for policy in [&mut self.element_wait, &mut self.login_verification, &mut self.challenge_wait, &mut self.settle] {
            *policy = RetryPolicy::immediate(policy.max_attempts);
        }
        self
    }
}

/// Drives login, challenge waiting and pagination as an explicit state machine.
///
/// Owns the driver for the lifetime of the run; dropping the controller
/// releases the browser and ends the session.
pub struct SessionController<D: BrowserDriver> {
    driver: D,
    config: SessionConfig,
    session: Session,
}

impl<D: BrowserDriver> SessionController<D> {
    pub fn new(driver: D, config: SessionConfig) -> Self {
        Self { driver, config, session: Session::default() }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    /// Log in and open the first list page.
    ///
    /// Every failure is reported as [`HarvestError::Auth`] and leaves the
    /// session `Failed`.
    pub fn authenticate(&mut self, credentials: &Credentials) -> Result<Session> {
        self.expect_state(SessionState::Unauthenticated, "authenticate")?;
        self.session.state = SessionState::Authenticating;
        log::info!("Logging in at {}", self.config.login_url);

        match self.login(credentials).and_then(|_| self.open_list()) {
            Ok(()) => {
                self.session = Session { state: SessionState::Ready, ordinal: 1 };
                log::info!("Logged in, on page 1 of {}", self.config.list_url);
                Ok(self.session)
            }
            Err(e) => {
                self.session.state = SessionState::Failed;
                Err(match e {
                    HarvestError::Auth(_) => e,
                    other => HarvestError::Auth(other.to_string()),
                })
            }
        }
    }

    /// Wait out an interstitial challenge page, if one is showing.
    ///
    /// Never fails: a page that cannot be read or a challenge that outlasts
    /// the wait both come back as `TimedOut`.
    pub fn await_challenge(&mut self) -> ChallengeOutcome {
        let source = match self.driver.page_source() {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Could not read page while checking for a challenge: {}", e);
                return ChallengeOutcome::TimedOut;
            }
        };

        if !self.has_challenge_marker(&source) {
            return ChallengeOutcome::Clear;
        }

        let previous = self.session.state;
        self.session.state = SessionState::ChallengePending;
        log::warn!("Challenge page detected, waiting up to {:?} for it to resolve", self.config.challenge_wait.max_wait());

        let policy = self.config.challenge_wait;
        let resolved = policy
            .poll(|attempt| {
                // first look comes after one pause
                if attempt == 1 {
                    return None;
                }
                self.challenge_resolved().then_some(())
            })
            .is_some();

        self.session.state = previous;
        if resolved {
            log::info!("Challenge resolved");
            ChallengeOutcome::Resolved
        } else {
            log::warn!("Challenge may still be active, continuing anyway");
            ChallengeOutcome::TimedOut
        }
    }

    /// Activate the next-page control.
    ///
    /// Strategies are tried in order; a control that is found but cannot be
    /// clicked falls through to the next one. When none works the session is
    /// `Exhausted`, which is not an error.
    pub fn advance(&mut self) -> Result<Advance> {
        self.expect_state(SessionState::Ready, "advance")?;
        let from = self.session.ordinal;
        self.session.state = SessionState::Navigating;
        log::info!("Navigating from page {} to page {}", from, from + 1);

        for (i, selector) in self.config.next_page_selectors.iter().enumerate() {
            let outcome = self.driver.find_element(selector).and_then(|button| self.driver.click(&button).map(|_| button));
            match outcome {
                Ok(button) => {
                    log::debug!("Next-page strategy {} clicked {}", i + 1, button);
                    self.config.settle.pause();
                    self.session = Session { state: SessionState::Ready, ordinal: from + 1 };
                    return Ok(Advance::Advanced(from + 1));
                }
                Err(e) => log::debug!("Next-page strategy {} ({}) failed: {}", i + 1, selector, e),
            }
        }

        log::info!("No next page after page {}", from);
        self.session.state = SessionState::Exhausted;
        Ok(Advance::Exhausted)
    }

    fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let login_url = self.config.login_url.clone();
        self.driver.navigate(&login_url)?;
        self.config.settle.pause();
        self.await_challenge();

        let email = self.wait_for(&self.config.email_selector, "email input")?;
        self.driver.type_text(&email, &credentials.email)?;

        let password = self.wait_for(&self.config.password_selector, "password input")?;
        self.driver.type_text(&password, &credentials.password)?;

        let submit = self.wait_for_any(&self.config.submit_selectors, "submit control")?;
        self.driver.click(&submit)?;
        log::info!("Credentials submitted via {}, waiting for login to complete", submit);

        self.await_challenge();
        self.verify_authenticated()?;
        self.session.state = SessionState::Authenticated;
        Ok(())
    }

    fn open_list(&mut self) -> Result<()> {
        self.session.state = SessionState::Navigating;
        let list_url = self.config.list_url.clone();
        self.driver
            .navigate(&list_url)
            .map_err(|e| HarvestError::Auth(format!("could not open {}: {}", list_url, e)))?;
        self.await_challenge();
        self.config.settle.pause();
        Ok(())
    }

    fn verify_authenticated(&self) -> Result<()> {
        let verified = self.config.login_verification.poll(|_| {
            let url = self.driver.current_url().ok()?.to_ascii_lowercase();
            if self.config.authenticated_url_exclusions.iter().any(|x| url.contains(&x.to_ascii_lowercase())) {
                return None;
            }
            match &self.config.authenticated_marker {
                Some(marker) => self.driver.find_element(marker).ok().map(|_| ()),
                None => Some(()),
            }
        });

        verified.ok_or_else(|| {
            let url = self.driver.current_url().unwrap_or_default();
            HarvestError::Auth(format!("login was not confirmed within {:?} (still at {})", self.config.login_verification.max_wait(), url))
        })
    }

    fn wait_for(&self, selector: &str, what: &str) -> Result<ElementLocator> {
        self.config
            .element_wait
            .retry(|_| self.driver.find_element(selector))
            .map_err(|e| HarvestError::Auth(format!("{} not found: {}", what, e)))
    }

    fn wait_for_any(&self, selectors: &[String], what: &str) -> Result<ElementLocator> {
        self.config
            .element_wait
            .poll(|_| selectors.iter().find_map(|s| self.driver.find_element(s).ok()))
            .ok_or_else(|| HarvestError::Auth(format!("{} not found (tried {})", what, selectors.join(", "))))
    }

    fn challenge_resolved(&self) -> bool {
        let url_clear = self
            .driver
            .current_url()
            .map(|url| !url.to_ascii_lowercase().contains(&self.config.challenge_url_marker.to_ascii_lowercase()))
            .unwrap_or(false);

        url_clear && self.driver.page_source().map(|source| !self.has_challenge_marker(&source)).unwrap_or(false)
    }

    fn has_challenge_marker(&self, source: &str) -> bool {
        let source = source.to_ascii_lowercase();
        self.config.challenge_markers.iter().any(|m| source.contains(&m.to_ascii_lowercase()))
    }

    fn expect_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        if self.session.state == expected {
            Ok(())
        } else {
            Err(HarvestError::InvalidState { state: self.session.state.to_string(), operation: operation.to_string() })
        }
    }
}
