use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// Identifies a pending timer so it can be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

/// A deferred unit of work.
pub type Task = Box<dyn FnOnce()>;

/// How to run idle-time work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleOptions {
    /// Run no later than this even if the host never goes idle.
    pub timeout: Duration,
    /// Delay used when the host has no idle scheduling at all.
    pub fallback: Duration,
}

/// Timer and idle-callback capability of the host.
///
/// Injected into the preload scheduler and the hover-intent preloader so
/// neither depends on a global clock.
pub trait Scheduler {
    /// Run `task` once after `delay`.
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId;

    /// Cancel a timer. Unknown or already fired timers are ignored.
    fn clear_timeout(&self, id: TimerId);

    /// Run `task` when the host is idle, but no later than
    /// `options.timeout`.
    ///
    /// Hosts without idle scheduling keep this default, which runs the task
    /// on a plain `options.fallback` timer.
    fn request_idle(&self, options: IdleOptions, task: Task) {
        self.set_timeout(options.fallback, task);
    }
}

struct PendingTimer {
    id: TimerId,
    due: Duration,
    task: Task,
}

struct PendingIdle {
    deadline: Duration,
    task: Task,
}

#[derive(Default)]
struct ManualInner {
    now: Duration,
    next_id: u64,
    timers: Vec<PendingTimer>,
    idle: Vec<PendingIdle>,
    idle_unsupported: bool,
}

/// [`Scheduler`] driven by a virtual clock.
///
/// Nothing runs until the owner calls [`advance`](Self::advance) or
/// [`run_idle`](Self::run_idle). Used by the tests and by native hosts that
/// pump their own loop.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that has timers but no idle callbacks.
    pub fn without_idle() -> Self {
        let scheduler = Self::default();
        scheduler.inner.borrow_mut().idle_unsupported = true;
        scheduler
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Timers and idle callbacks that have not run yet.
    pub fn pending(&self) -> usize {
        let inner = self.inner.borrow();
        inner.timers.len() + inner.idle.len()
    }

    /// Move the clock forward, running every timer and idle callback that
    /// falls due, in due order. Tasks scheduled by those tasks run too if
    /// they fall inside the window.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        while let Some(task) = self.take_next_due(target) {
            task();
        }
        self.inner.borrow_mut().now = target;
    }

    /// Simulate an idle period: run every idle callback now.
    pub fn run_idle(&self) -> usize {
        let idle = std::mem::take(&mut self.inner.borrow_mut().idle);
        let count = idle.len();
        for pending in idle {
            (pending.task)();
        }
        count
    }

    fn take_next_due(&self, target: Duration) -> Option<Task> {
        let mut inner = self.inner.borrow_mut();

        let timer = inner
            .timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= target)
            .min_by_key(|(_, timer)| (timer.due, timer.id.0))
            .map(|(index, timer)| (index, timer.due));
        let idle = inner
            .idle
            .iter()
            .enumerate()
            .filter(|(_, idle)| idle.deadline <= target)
            .min_by_key(|(_, idle)| idle.deadline)
            .map(|(index, idle)| (index, idle.deadline));

        match (timer, idle) {
            (Some((_, timer_due)), Some((index, deadline))) if deadline < timer_due => {
                inner.now = deadline;
                Some(inner.idle.remove(index).task)
            }
            (Some((index, due)), _) => {
                inner.now = due;
                Some(inner.timers.remove(index).task)
            }
            (None, Some((index, deadline))) => {
                inner.now = deadline;
                Some(inner.idle.remove(index).task)
            }
            (None, None) => None,
        }
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, task: Task) -> TimerId {
        let mut inner = self.inner.borrow_mut();
        let id = TimerId(inner.next_id);
        inner.next_id += 1;
        let due = inner.now + delay;
        inner.timers.push(PendingTimer { id, due, task });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.inner.borrow_mut().timers.retain(|timer| timer.id != id);
    }

    fn request_idle(&self, options: IdleOptions, task: Task) {
        if self.inner.borrow().idle_unsupported {
            self.set_timeout(options.fallback, task);
            return;
        }
        let mut inner = self.inner.borrow_mut();
        let deadline = inner.now + options.timeout;
        inner.idle.push(PendingIdle { deadline, task });
    }
}
