//! Turns raw engine status lines into progress and status callbacks.

use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use regex::Regex;

use crate::progress::{Callbacks, Progress};

/// Updates closer together than this are candidates for dropping.
pub const DEDUP_WINDOW: Duration = Duration::from_millis(30);

lazy_static! {
    /// `label(current/total)`, e.g. `Downloading data... (1024/4096)`.
    static ref PROGRESS_PATTERN: Regex =
        Regex::new(r"([^(]+)\((\d+(?:\.\d+)?)/(\d+)\)").expect("valid progress pattern");
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    Progress { label: String, progress: Progress },
    Message(String),
}

pub fn parse_progress(text: &str) -> Option<(String, Progress)> {
    let caps = PROGRESS_PATTERN.captures(text)?;
    let current: f64 = caps[2].parse().ok()?;
    let total: f64 = caps[3].parse().ok()?;
    Some((
        caps[1].trim().to_string(),
        Progress::determinate(current, total),
    ))
}

/// Drops an update when, within [`DEDUP_WINDOW`] of the last delivered one,
/// it repeats that text or is another progress tick.
#[derive(Debug)]
pub struct StatusThrottle {
    window: Duration,
    last: Option<(Instant, String)>,
}

impl Default for StatusThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusThrottle {
    pub fn new() -> Self {
        Self::with_window(DEDUP_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self { window, last: None }
    }

    pub fn accept(&mut self, text: &str, now: Instant) -> Option<StatusUpdate> {
        let parsed = parse_progress(text);
        if let Some((at, last_text)) = &self.last {
            let recent = now.saturating_duration_since(*at) < self.window;
            if recent && (last_text == text || parsed.is_some()) {
                return None;
            }
        }
        self.last = Some((now, text.to_string()));
        Some(match parsed {
            Some((label, progress)) => StatusUpdate::Progress { label, progress },
            None => StatusUpdate::Message(text.to_string()),
        })
    }

    /// Feeds one line through the throttle and fires the callbacks.
    /// Returns whether anything was delivered.
    pub fn deliver(&mut self, text: &str, now: Instant, callbacks: &mut Callbacks<'_>) -> bool {
        match self.accept(text, now) {
            Some(StatusUpdate::Progress { label, progress }) => {
                callbacks.progress(progress);
                callbacks.status(&label);
                true
            }
            Some(StatusUpdate::Message(message)) => {
                callbacks.progress(Progress::working());
                callbacks.status(&message);
                true
            }
            None => false,
        }
    }
}
