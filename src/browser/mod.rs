//! Browser automation layer
//!
//! [`BrowserDriver`] is the blocking capability the rest of the crate talks to;
//! [`BrowserSession`] implements it on top of a headless_chrome tab.

pub mod config;
pub mod driver;
pub mod session;

pub use config::{ConnectionOptions, LaunchOptions};
pub use driver::{BrowserDriver, ElementLocator};
pub use session::BrowserSession;
