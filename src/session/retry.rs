use rand::Rng;
use std::time::Duration;

/// A bounded number of attempts with a fixed pause between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    /// Upper bound of a random extra added to every pause
    pub jitter: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay, jitter: Duration::ZERO }
    }

    /// Builder method: add up to `jitter` to every pause
    pub fn jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// No pauses at all; for scripted drivers
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Longest time `poll` can block, ignoring the time spent in attempts
    pub fn max_wait(&self) -> Duration {
        (self.delay + self.jitter) * self.max_attempts.saturating_sub(1)
    }

    /// Block for one delay plus jitter
    pub fn pause(&self) {
        let extra = if self.jitter.is_zero() {
            Duration::ZERO
        } else {
            let millis = self.jitter.as_millis().min(u64::MAX as u128) as u64;
            Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
        };
        let total = self.delay + extra;
        if !total.is_zero() {
            std::thread::sleep(total);
        }
    }

    /// Call `attempt` until it yields a value or attempts run out.
    ///
    /// `attempt` receives the 1-based attempt number. There is no pause before
    /// the first attempt or after the last.
    pub fn poll<T>(&self, mut attempt: impl FnMut(u32) -> Option<T>) -> Option<T> {
        for n in 1..=self.max_attempts {
            if let Some(value) = attempt(n) {
                return Some(value);
            }
            if n < self.max_attempts {
                self.pause();
            }
        }
        None
    }

    /// Like [`poll`](Self::poll) but keeps the last error
    pub fn retry<T, E>(&self, mut attempt: impl FnMut(u32) -> Result<T, E>) -> Result<T, E> {
        let mut n = 1;
        loop {
            match attempt(n) {
                Ok(value) => return Ok(value),
                Err(e) if n >= self.max_attempts => return Err(e),
                Err(_) => {
                    self.pause();
                    n += 1;
                }
            }
        }
    }
}
