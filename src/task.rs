use std::sync::atomic::{
    AtomicBool,
    AtomicU64,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
};

use log::{
    error,
    info,
    warn,
};
use rayon::prelude::*;

use crate::errors::Result;
use crate::utils::{
    ContextTimer,
    LogLevel,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Waiting,
    Processing,
    Finished,
    Canceled,
    Error(String),
}

/// What the long running algorithms poll while they work.
///
/// `is_canceled` is checked once per unit of work (scan or frame) and
/// `set_progress` receives values in [0, 1].
pub trait ProgressMonitor: Sync {
    fn is_canceled(&self) -> bool;
    fn set_progress(
        &self,
        progress: f64,
    );
}

/// Monitor that never cancels and drops progress updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl ProgressMonitor for NoopMonitor {
    fn is_canceled(&self) -> bool {
        false
    }

    fn set_progress(
        &self,
        _progress: f64,
    ) {
    }
}

/// Shared cancel flag and progress of one task.
///
/// Clones share the same state, so a clone can be handed to whoever
/// needs to cancel or watch the task from another thread.
#[derive(Debug, Clone, Default)]
pub struct TaskHandle {
    canceled: Arc<AtomicBool>,
    // f64 bits
    progress: Arc<AtomicU64>,
}

impl TaskHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn progress(&self) -> f64 {
        f64::from_bits(self.progress.load(Ordering::Relaxed))
    }
}

impl ProgressMonitor for TaskHandle {
    fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    fn set_progress(
        &self,
        progress: f64,
    ) {
        let progress = progress.clamp(0.0, 1.0);
        self.progress.store(progress.to_bits(), Ordering::Relaxed);
    }
}

/// One unit of work that can be scheduled as a task, eg. processing a file.
pub trait ProcessingStep: Send {
    type Output: Send;

    fn name(&self) -> String;
    fn run(
        &mut self,
        handle: &TaskHandle,
    ) -> Result<Self::Output>;
}

/// Runs a [ProcessingStep] and keeps track of how it went.
pub struct ProcessingTask<S: ProcessingStep> {
    step: S,
    handle: TaskHandle,
    status: Arc<Mutex<TaskStatus>>,
}

impl<S: ProcessingStep> ProcessingTask<S> {
    pub fn new(step: S) -> Self {
        ProcessingTask {
            step,
            handle: TaskHandle::new(),
            status: Arc::new(Mutex::new(TaskStatus::Waiting)),
        }
    }

    pub fn handle(&self) -> TaskHandle {
        self.handle.clone()
    }

    pub fn status(&self) -> TaskStatus {
        match self.status.lock() {
            Ok(x) => x.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn set_status(
        &self,
        status: TaskStatus,
    ) {
        match self.status.lock() {
            Ok(mut x) => *x = status,
            Err(poisoned) => *poisoned.into_inner() = status,
        }
    }

    /// Runs the step once.
    ///
    /// Returns `None` when the step failed or was canceled, the reason is
    /// kept in [ProcessingTask::status]. Results of a canceled run are
    /// discarded even if the step returned some.
    pub fn run(&mut self) -> Option<S::Output> {
        let name = self.step.name();
        if self.handle.is_canceled() {
            self.set_status(TaskStatus::Canceled);
            return None;
        }
        self.set_status(TaskStatus::Processing);
        let mut timer = ContextTimer::new(&name, true, LogLevel::INFO);
        let out = self.step.run(&self.handle);
        timer.stop(true);

        match out {
            _ if self.handle.is_canceled() => {
                warn!("Task '{}' was canceled", name);
                self.set_status(TaskStatus::Canceled);
                None
            },
            Ok(out) => {
                self.handle.set_progress(1.0);
                info!("Task '{}' finished", name);
                self.set_status(TaskStatus::Finished);
                Some(out)
            },
            Err(e) => {
                error!("Task '{}' failed: {}", name, e);
                self.set_status(TaskStatus::Error(e.to_string()));
                None
            },
        }
    }
}

/// Runs independent tasks in parallel.
///
/// A failing task does not stop the others, every task reports
/// its own status afterwards.
pub fn run_all<S: ProcessingStep>(tasks: &mut [ProcessingTask<S>]) -> Vec<Option<S::Output>> {
    tasks.par_iter_mut().map(|task| task.run()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::IonStreamError;

    struct Countdown {
        name: String,
        steps: usize,
        fail: bool,
        cancel_at: Option<usize>,
    }

    impl ProcessingStep for Countdown {
        type Output = usize;

        fn name(&self) -> String {
            self.name.clone()
        }

        fn run(
            &mut self,
            handle: &TaskHandle,
        ) -> Result<usize> {
            for i in 0..self.steps {
                if Some(i) == self.cancel_at {
                    handle.cancel();
                }
                if handle.is_canceled() {
                    return Ok(i);
                }
                handle.set_progress(i as f64 / self.steps as f64);
            }
            if self.fail {
                return Err(IonStreamError::MissingPrerequisite("no mass list".into()));
            }
            Ok(self.steps)
        }
    }

    fn countdown(
        name: &str,
        fail: bool,
        cancel_at: Option<usize>,
    ) -> ProcessingTask<Countdown> {
        ProcessingTask::new(Countdown {
            name: name.to_string(),
            steps: 10,
            fail,
            cancel_at,
        })
    }

    #[test]
    fn test_task_finishes() {
        let mut task = countdown("ok", false, None);
        assert_eq!(task.status(), TaskStatus::Waiting);
        assert_eq!(task.run(), Some(10));
        assert_eq!(task.status(), TaskStatus::Finished);
        assert_eq!(task.handle().progress(), 1.0);
    }

    #[test]
    fn test_canceled_task_discards_output() {
        let mut task = countdown("cancel", false, Some(3));
        assert_eq!(task.run(), None);
        assert_eq!(task.status(), TaskStatus::Canceled);

        let mut task = countdown("cancel_before", false, None);
        task.handle().cancel();
        assert_eq!(task.run(), None);
        assert_eq!(task.status(), TaskStatus::Canceled);
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut tasks = vec![
            countdown("a", false, None),
            countdown("b", true, None),
            countdown("c", false, None),
        ];
        let out = run_all(&mut tasks);
        assert_eq!(out, vec![Some(10), None, Some(10)]);
        assert_eq!(tasks[0].status(), TaskStatus::Finished);
        assert!(matches!(tasks[1].status(), TaskStatus::Error(msg) if msg.contains("no mass list")));
        assert_eq!(tasks[2].status(), TaskStatus::Finished);
    }

    #[test]
    fn test_progress_is_clamped() {
        let handle = TaskHandle::new();
        handle.set_progress(1.5);
        assert_eq!(handle.progress(), 1.0);
        handle.set_progress(0.25);
        assert_eq!(handle.progress(), 0.25);
    }
}
