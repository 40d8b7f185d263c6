//! Collaborators injected into migration steps

use chrono::{DateTime, Utc};
use cruise_secure::SecureCipher;
use std::fmt;

/// Time source for migration timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// What every step may use: the cipher for re-encrypting tokens and the clock.
#[derive(Debug, Clone, Copy)]
pub struct MigrationContext<'a> {
    pub cipher: &'a SecureCipher,
    pub clock: &'a dyn Clock,
}

impl<'a> MigrationContext<'a> {
    /// Context using the system clock.
    pub fn new(cipher: &'a SecureCipher) -> Self {
        Self {
            cipher,
            clock: &SystemClock,
        }
    }

    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }
}
