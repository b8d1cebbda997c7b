//! Login, challenge waiting and pagination
//!
//! [`SessionController`] moves a [`Session`] through
//! `Unauthenticated -> Authenticating -> Authenticated -> Navigating <-> ChallengePending -> Ready`,
//! ending in `Failed` when login cannot be confirmed or `Exhausted` when the list
//! has no next page. All waiting is bounded by a [`RetryPolicy`] and blocks the
//! calling thread.

pub mod controller;
pub mod retry;
pub mod state;

pub use controller::{SessionConfig, SessionController};
pub use retry::RetryPolicy;
pub use state::{Advance, ChallengeOutcome, Session, SessionState};
