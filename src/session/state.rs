use std::fmt;

/// Where the session is in the login and pagination lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Navigating,
    ChallengePending,
    /// Positioned on a list page that can be parsed
    Ready,
    /// Authentication failed; nothing more can be done with this session
    Failed,
    /// No next page; the list is finished
    Exhausted,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Exhausted)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Unauthenticated => "unauthenticated",
            SessionState::Authenticating => "authenticating",
            SessionState::Authenticated => "authenticated",
            SessionState::Navigating => "navigating",
            SessionState::ChallengePending => "waiting on a challenge",
            SessionState::Ready => "ready",
            SessionState::Failed => "failed",
            SessionState::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// Authentication state plus the 1-based ordinal of the current page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    /// 0 until the first list page is reached
    pub ordinal: usize,
}

impl Default for Session {
    fn default() -> Self {
        Self { state: SessionState::Unauthenticated, ordinal: 0 }
    }
}

/// Result of waiting out an interstitial challenge page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// No challenge markers were present
    Clear,
    Resolved,
    /// Still challenged after the bounded wait; callers carry on regardless
    TimedOut,
}

/// Result of trying to move to the next list page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now on the page with this ordinal
    Advanced(usize),
    Exhausted,
}
