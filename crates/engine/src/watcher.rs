// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Readiness watcher
//!
//! Tails a log stream until a registered phrase shows up, a line budget is
//! spent, the wall-clock budget elapses, or the bring-up is cancelled. Every
//! call produces exactly one outcome.

use ns_adapters::LogStream;
use ns_core::StartupLogsKwargs;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// What a matched phrase means for the watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The service is ready; stop watching.
    Ready,
    /// Progress marker; record it and keep watching.
    Continue,
}

type Check = Box<dyn Fn(&str) -> Result<Verdict, String> + Send + Sync>;

/// A literal phrase and the validation run when a line contains it.
///
/// A check returning `Err` means the observed output contradicts the
/// service's configuration.
pub struct PhraseHandler {
    phrase: String,
    check: Check,
}

impl PhraseHandler {
    pub fn new(
        phrase: impl Into<String>,
        check: impl Fn(&str) -> Result<Verdict, String> + Send + Sync + 'static,
    ) -> Self {
        Self { phrase: phrase.into(), check: Box::new(check) }
    }

    pub fn ready(phrase: impl Into<String>) -> Self {
        Self::new(phrase, |_| Ok(Verdict::Ready))
    }

    pub fn progress(phrase: impl Into<String>) -> Self {
        Self::new(phrase, |_| Ok(Verdict::Continue))
    }

    pub fn fatal(phrase: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(phrase, move |_| Err(message.clone()))
    }

    pub fn phrase(&self) -> &str {
        &self.phrase
    }
}

impl fmt::Debug for PhraseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhraseHandler").field("phrase", &self.phrase).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub timeout: Duration,
    /// `None` scans until the timeout.
    pub max_lines: Option<usize>,
}

impl WatchOptions {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, max_lines: None }
    }

    ns_core::setters! {
        option { max_lines: usize }
    }
}

impl From<StartupLogsKwargs> for WatchOptions {
    fn from(kwargs: StartupLogsKwargs) -> Self {
        Self {
            timeout: Duration::from_secs(kwargs.timeout),
            max_lines: (kwargs.lines > 0).then_some(kwargs.lines),
        }
    }
}

/// Why a watch ended without a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCause {
    Deadline,
    LineBudget,
    /// The stream ended, usually because the process exited.
    StreamClosed,
}

ns_core::simple_display! {
    TimeoutCause {
        Deadline => "deadline elapsed",
        LineBudget => "line budget exhausted",
        StreamClosed => "log stream closed",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    Matched { phrase: String, line: String },
    Timeout(TimeoutCause),
    /// Interrupted by a stack-level stop. Treated like a timeout by callers.
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchReport {
    pub outcome: WatchOutcome,
    /// Progress phrases seen before the outcome, in order.
    pub observed: Vec<String>,
    pub lines: usize,
}

impl WatchReport {
    pub fn matched(&self) -> bool {
        matches!(self.outcome, WatchOutcome::Matched { .. })
    }

    pub fn saw(&self, phrase: &str) -> bool {
        self.observed.iter().any(|p| p == phrase)
            || matches!(&self.outcome, WatchOutcome::Matched { phrase: p, .. } if p == phrase)
    }
}

/// A phrase check rejected a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (phrase {phrase:?} in {line:?})")]
pub struct FatalPhrase {
    pub phrase: String,
    pub line: String,
    pub message: String,
}

/// Watch `stream` for the handlers' phrases.
///
/// Matching is case-sensitive substring search; when a line contains several
/// phrases the first registered handler wins.
pub async fn watch(
    stream: &mut LogStream,
    handlers: &[PhraseHandler],
    options: WatchOptions,
    cancel: &CancellationToken,
) -> Result<WatchReport, FatalPhrase> {
    let deadline = tokio::time::Instant::now() + options.timeout;
    let mut observed = Vec::new();
    let mut lines = 0usize;

    loop {
        if options.max_lines.is_some_and(|max| lines >= max) {
            return Ok(report(WatchOutcome::Timeout(TimeoutCause::LineBudget), observed, lines));
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Ok(report(WatchOutcome::Cancelled, observed, lines));
            }
            _ = tokio::time::sleep_until(deadline) => {
                return Ok(report(WatchOutcome::Timeout(TimeoutCause::Deadline), observed, lines));
            }
            line = stream.next_line() => line,
        };

        let Some(line) = next else {
            return Ok(report(WatchOutcome::Timeout(TimeoutCause::StreamClosed), observed, lines));
        };
        lines += 1;
        tracing::debug!(%line, "log");

        let Some(handler) = handlers.iter().find(|h| line.contains(&h.phrase)) else {
            continue;
        };
        match (handler.check)(&line) {
            Ok(Verdict::Ready) => {
                let phrase = handler.phrase.clone();
                return Ok(report(WatchOutcome::Matched { phrase, line }, observed, lines));
            }
            Ok(Verdict::Continue) => {
                tracing::debug!(phrase = %handler.phrase, "progress phrase");
                observed.push(handler.phrase.clone());
            }
            Err(message) => {
                return Err(FatalPhrase { phrase: handler.phrase.clone(), line, message });
            }
        }
    }
}

fn report(outcome: WatchOutcome, observed: Vec<String>, lines: usize) -> WatchReport {
    WatchReport { outcome, observed, lines }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
