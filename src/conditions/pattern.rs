//! regex execution behind a wall-clock timeout
//!
//! every regex-backed operator goes through [`PatternGuard`]. user-authored
//! patterns are compiled and matched on a helper thread; the caller waits
//! at most the configured timeout and gets [`PatternError::Timeout`]
//! otherwise. the built-in email and phone patterns are fixed and run
//! inline on the caller's thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// default time a single match may take
pub const DEFAULT_PATTERN_TIMEOUT: Duration = Duration::from_millis(100);

/// upper bound on the compiled size of user-authored patterns
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";
const PHONE_PATTERN: &str = r"^\+?[0-9\s\-().]{7,20}$";

lazy_static::lazy_static! {
    static ref EMAIL_REGEX: Result<Regex, regex::Error> = Regex::new(EMAIL_PATTERN);
    static ref PHONE_REGEX: Result<Regex, regex::Error> = Regex::new(PHONE_PATTERN);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("invalid pattern: {0}")]
    Invalid(String),
    #[error("pattern match exceeded {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("pattern worker failed: {0}")]
    Aborted(String),
}

/// runs regex matches with a hard timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternGuard {
    timeout: Duration,
}

impl Default for PatternGuard {
    fn default() -> Self {
        Self::new(DEFAULT_PATTERN_TIMEOUT)
    }
}

impl PatternGuard {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// match a user-authored pattern against the input
    pub fn is_match(&self, pattern: &str, input: &str) -> Result<bool, PatternError> {
        let pattern = pattern.to_string();
        let input = input.to_string();
        self.run(move || {
            let regex = compile(&pattern)?;
            Ok(regex.is_match(&input))
        })
    }

    pub fn is_valid_email(&self, input: &str) -> Result<bool, PatternError> {
        run_builtin(&EMAIL_REGEX, input)
    }

    pub fn is_valid_phone(&self, input: &str) -> Result<bool, PatternError> {
        run_builtin(&PHONE_REGEX, input)
    }

    fn run<F>(&self, job: F) -> Result<bool, PatternError>
    where
        F: FnOnce() -> Result<bool, PatternError> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);

        thread::Builder::new()
            .name("formrules-pattern".to_string())
            .spawn(move || {
                // receiver is gone after a timeout
                let _ = tx.send(job());
            })
            .map_err(|e| PatternError::Aborted(e.to_string()))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => Err(PatternError::Timeout(self.timeout)),
            Err(RecvTimeoutError::Disconnected) => {
                Err(PatternError::Aborted("worker exited without a result".to_string()))
            }
        }
    }
}

/// built-in patterns are fixed and linear, so they run on the caller's thread
fn run_builtin(regex: &Result<Regex, regex::Error>, input: &str) -> Result<bool, PatternError> {
    let regex = regex
        .as_ref()
        .map_err(|e| PatternError::Invalid(e.to_string()))?;
    Ok(regex.is_match(input.trim()))
}

/// compile a user-authored pattern with size limits applied
pub fn compile(pattern: &str) -> Result<Regex, PatternError> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .dfa_size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| PatternError::Invalid(e.to_string()))
}
