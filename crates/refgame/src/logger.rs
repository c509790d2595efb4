//! Verbosity-gated logging for evaluation runs.
//!
//! [`EvalLogger`] reports the batch loop (start, per-batch progress, end)
//! through `tracing`. Progress events carry structured fields so a
//! subscriber can render them however it likes.

use std::time::Instant;

/// Verbosity level for evaluation output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// No output.
    #[default]
    Silent,
    /// Errors and warnings only.
    Warning,
    /// Progress and important information.
    Info,
    /// Detailed debugging information.
    Debug,
}

impl Verbosity {
    /// Map an integer verbosity option onto a level.
    ///
    /// `<= 0` is silent, `1` warnings, `2` info, anything higher debug.
    pub fn from_level(level: i32) -> Self {
        match level {
            i32::MIN..=0 => Self::Silent,
            1 => Self::Warning,
            2 => Self::Info,
            _ => Self::Debug,
        }
    }
}

/// Logger for the evaluation batch loop.
#[derive(Debug)]
pub struct EvalLogger {
    verbosity: Verbosity,
    task: Option<Task>,
}

#[derive(Debug)]
struct Task {
    name: &'static str,
    total: usize,
    started: Instant,
}

impl EvalLogger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            task: None,
        }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Log an informational message.
    pub fn info(&self, message: &str) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!("{message}");
        }
    }

    /// Log a debugging message.
    pub fn debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Debug {
            tracing::debug!("{message}");
        }
    }

    /// Start a task with a known number of steps.
    pub fn start_task(&mut self, name: &'static str, total: usize) {
        if self.verbosity >= Verbosity::Info {
            tracing::info!(task = name, total, "starting");
        }
        self.task = Some(Task {
            name,
            total,
            started: Instant::now(),
        });
    }

    /// Report that `done` steps of the current task have completed.
    pub fn progress(&self, done: usize) {
        if self.verbosity < Verbosity::Debug {
            return;
        }
        if let Some(task) = &self.task {
            tracing::debug!(task = task.name, done, total = task.total, "progress");
        }
    }

    /// Finish the current task.
    pub fn end_task(&mut self) {
        if let Some(task) = self.task.take() {
            if self.verbosity >= Verbosity::Info {
                tracing::info!(
                    task = task.name,
                    total = task.total,
                    elapsed_ms = task.started.elapsed().as_millis() as u64,
                    "finished"
                );
            }
        }
    }
}
