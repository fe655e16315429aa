//! Progress and status reporting shared by both backends.

/// One progress update. `current`/`total` are meaningless when
/// `indeterminate` is set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub indeterminate: bool,
    pub current: f64,
    pub total: f64,
}

impl Progress {
    pub fn determinate(current: f64, total: f64) -> Self {
        Self {
            indeterminate: false,
            current,
            total,
        }
    }

    pub fn working() -> Self {
        Self {
            indeterminate: true,
            current: 0.0,
            total: 0.0,
        }
    }

    /// `(current / total) * 100`, or `None` for indeterminate updates.
    pub fn percent(&self) -> Option<f64> {
        if self.indeterminate || self.total <= 0.0 {
            None
        } else {
            Some(self.current / self.total * 100.0)
        }
    }
}

type ProgressFn<'a> = Box<dyn FnMut(Progress) + Send + 'a>;
type StatusFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;

/// Typed callbacks handed to a single run. Never shared across requests.
#[derive(Default)]
pub struct Callbacks<'a> {
    on_progress: Option<ProgressFn<'a>>,
    on_status: Option<StatusFn<'a>>,
}

impl<'a> Callbacks<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl FnMut(Progress) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_status(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.on_status = Some(Box::new(f));
        self
    }

    pub fn progress(&mut self, progress: Progress) {
        if let Some(f) = self.on_progress.as_mut() {
            f(progress);
        }
    }

    pub fn status(&mut self, message: &str) {
        if let Some(f) = self.on_status.as_mut() {
            f(message);
        }
    }
}
