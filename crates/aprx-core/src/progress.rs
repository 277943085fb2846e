//! Callback-based progress reporting for long-running builds.
//!
//! The core never draws progress bars; callers install a callback and
//! render the events however they like.

#[derive(Debug, Clone)]
pub enum Progress {
    /// One cycle of the solvation buffer search.
    SolvationCycle {
        cycle: usize,
        buffer: f64,
        waters: usize,
        target: usize,
    },
    /// The buffer search converged.
    SolvationFinish { waters: usize },

    /// One window directory was prepared.
    WindowStart { label: String },
    WindowFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}
