//! Virtual time scheduler for deterministic tests of time based operators.
//!
//! Time only moves when the owner says so. Every scheduled action, even one
//! scheduled "now", waits in a [`PriorityQueue`] until the clock is driven
//! with [`advance_to`](VirtualTimeScheduler::advance_to),
//! [`advance_by`](VirtualTimeScheduler::advance_by) or
//! [`start`](VirtualTimeScheduler::start), and then runs in due-time order,
//! FIFO among equal due-times.
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxstream::prelude::*;
//!
//! let scheduler = VirtualTimeScheduler::new();
//! let log = Rc::new(RefCell::new(vec![]));
//! let c_log = log.clone();
//! scheduler.schedule_with_relative(Duration::from_millis(100), move || c_log.borrow_mut().push(1));
//!
//! scheduler.advance_by(Duration::from_millis(99));
//! assert!(log.borrow().is_empty());
//! scheduler.advance_by(Duration::from_millis(1));
//! assert_eq!(*log.borrow(), vec![1]);
//! ```

use std::{
  cell::RefCell,
  rc::{Rc, Weak},
};

use tracing::{trace, warn};

use super::{Action, Duration, PriorityQueue, ScheduledItem, Scheduler};
use crate::disposable::{Disposable, Subscription};

struct VirtualState {
  clock: Duration,
  queue: PriorityQueue<Duration>,
  running: bool,
}

/// A scheduler driven by a virtual clock starting at zero.
///
/// Clones share the same clock and queue.
#[derive(Clone)]
pub struct VirtualTimeScheduler(Rc<RefCell<VirtualState>>);

impl Default for VirtualTimeScheduler {
  fn default() -> Self { Self::new() }
}

struct RunningGuard<'a>(&'a VirtualTimeScheduler);

impl Drop for RunningGuard<'_> {
  fn drop(&mut self) { self.0 .0.borrow_mut().running = false; }
}

impl VirtualTimeScheduler {
  pub fn new() -> Self {
    Self(Rc::new(RefCell::new(VirtualState {
      clock: Duration::ZERO,
      queue: PriorityQueue::new(),
      running: false,
    })))
  }

  /// Current virtual time.
  pub fn clock(&self) -> Duration { self.0.borrow().clock }

  /// Whether a dispatch loop is currently running.
  pub fn is_running(&self) -> bool { self.0.borrow().running }

  /// Number of actions waiting to run. Cancelled actions are removed from
  /// the queue as soon as they are disposed, so they are not counted.
  pub fn pending_count(&self) -> usize { self.0.borrow().queue.len() }

  pub fn is_empty(&self) -> bool { self.pending_count() == 0 }

  /// Runs everything due up to and including `time`, then sets the clock to
  /// `time`.
  ///
  /// # Panics
  ///
  /// Panics if `time` is earlier than the current clock.
  pub fn advance_to(&self, time: Duration) {
    let clock = self.clock();
    assert!(time >= clock, "cannot move the virtual clock backwards from {clock:?} to {time:?}");
    self.dispatch(Some(time));
  }

  /// Runs everything due within the next `delta` of virtual time.
  pub fn advance_by(&self, delta: Duration) { self.advance_to(self.clock() + delta) }

  /// Moves the clock forward without running anything.
  pub fn sleep(&self, delta: Duration) {
    let mut state = self.0.borrow_mut();
    state.clock += delta;
  }

  /// Runs every pending action, including those scheduled while running,
  /// until the queue is empty or [`stop`](Self::stop) is called.
  pub fn start(&self) { self.dispatch(None) }

  /// Makes the running dispatch loop return after the current action.
  pub fn stop(&self) { self.0.borrow_mut().running = false; }

  fn dispatch(&self, limit: Option<Duration>) {
    {
      let mut state = self.0.borrow_mut();
      if state.running {
        warn!("virtual time scheduler is already running, nested dispatch ignored");
        return;
      }
      state.running = true;
    }
    let _guard = RunningGuard(self);
    trace!(?limit, "virtual clock dispatch started");

    loop {
      let next = {
        let mut state = self.0.borrow_mut();
        if !state.running {
          break;
        }
        let due = state.queue.peek().map(|item| item.due_time());
        match due {
          Some(due) if limit.map_or(true, |limit| due <= limit) => {
            if due > state.clock {
              state.clock = due;
            }
            state.queue.dequeue()
          }
          _ => {
            if let Some(limit) = limit {
              state.clock = limit;
            }
            None
          }
        }
      };
      match next {
        Some(item) => item.invoke(),
        None => break,
      }
    }
    trace!(clock = ?self.clock(), "virtual clock dispatch drained");
  }

  fn enqueue(&self, due: Duration, action: Action) -> Subscription {
    let item = Rc::new(ScheduledItem::new(due, action));
    self.0.borrow_mut().queue.enqueue(item.clone());

    let handle = item.handle();
    let state: Weak<RefCell<VirtualState>> = Rc::downgrade(&self.0);
    Subscription::from_fn(move || {
      handle.dispose();
      if let Some(state) = state.upgrade() {
        let removed = state.borrow_mut().queue.remove(&item);
        drop(removed);
      }
    })
  }
}

impl Scheduler for VirtualTimeScheduler {
  #[inline]
  fn now(&self) -> Duration { self.clock() }

  fn schedule_now(&self, action: Action) -> Subscription { self.enqueue(self.clock(), action) }

  fn schedule_at(&self, due: Duration, action: Action) -> Subscription { self.enqueue(due, action) }
}
