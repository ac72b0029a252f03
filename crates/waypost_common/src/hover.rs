use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::schedule::{Scheduler, TimerId};

/// Debounced pointer-enter/leave handler that warms a route shortly before
/// the user likely clicks it.
///
/// Tracks a single timer: a new [`enter`](Self::enter) replaces any pending
/// one, [`leave`](Self::leave) cancels it. Dropping the handler cancels too.
/// A load that already started is not affected by either.
pub struct HoverIntent {
    scheduler: Rc<dyn Scheduler>,
    delay: Duration,
    pending: Rc<Cell<Option<TimerId>>>,
    on_intent: Rc<dyn Fn(&str)>,
}

impl HoverIntent {
    /// `on_intent` runs with the hovered path once the pointer stayed for
    /// `delay`.
    pub fn new(
        scheduler: Rc<dyn Scheduler>,
        delay: Duration,
        on_intent: impl Fn(&str) + 'static,
    ) -> Self {
        Self {
            scheduler,
            delay,
            pending: Rc::new(Cell::new(None)),
            on_intent: Rc::new(on_intent),
        }
    }

    /// Pointer entered an affordance leading to `path`.
    pub fn enter(&self, path: &str) {
        self.leave();

        let pending = Rc::clone(&self.pending);
        let on_intent = Rc::clone(&self.on_intent);
        let path = path.to_string();
        let id = self.scheduler.set_timeout(
            self.delay,
            Box::new(move || {
                pending.set(None);
                on_intent(&path);
            }),
        );
        self.pending.set(Some(id));
    }

    /// Pointer left before the delay expired.
    pub fn leave(&self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.clear_timeout(id);
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.get().is_some()
    }
}

impl Drop for HoverIntent {
    fn drop(&mut self) {
        self.leave();
    }
}
