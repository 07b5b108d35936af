use std::{cell::RefCell, rc::Rc};

use tracing::trace;

use super::{
  immediate::sleep_until, wall_clock, Action, Duration, PriorityQueue, ScheduledItem, Scheduler,
  SchedulerExt,
};
use crate::disposable::Subscription;

thread_local! {
  /// `Some` while a trampoline is draining on this thread.
  static TRAMPOLINE: RefCell<Option<PriorityQueue<Duration>>> = const { RefCell::new(None) };
}

/// Queues work on a trampoline owned by the current thread.
///
/// The first `schedule*` call on a thread with no active trampoline sets one
/// up and drains it to completion before returning, so all work it
/// (recursively) schedules finishes before control goes back to the caller.
/// Calls made while the trampoline drains only enqueue, which keeps
/// execution order deterministic and never re-entrant.
#[derive(Clone, Copy, Default, Debug)]
pub struct CurrentThreadScheduler;

struct TrampolineGuard;

impl Drop for TrampolineGuard {
  fn drop(&mut self) { TRAMPOLINE.with(|q| *q.borrow_mut() = None); }
}

impl CurrentThreadScheduler {
  /// Whether scheduling from here would have to start a new trampoline.
  pub fn schedule_required() -> bool { TRAMPOLINE.with(|q| q.borrow().is_none()) }

  /// Runs `action` on the trampoline, starting one if needed. When a
  /// trampoline is already draining the action runs inline.
  pub fn ensure_trampoline(action: impl FnOnce() + 'static) {
    if Self::schedule_required() {
      CurrentThreadScheduler.schedule(action);
    } else {
      action();
    }
  }

  fn drain() {
    let _guard = TrampolineGuard;
    trace!("current thread trampoline started");
    loop {
      let next = TRAMPOLINE.with(|q| q.borrow_mut().as_mut().and_then(PriorityQueue::dequeue));
      let Some(item) = next else { break };
      if item.is_cancelled() {
        continue;
      }
      sleep_until(item.due_time());
      item.invoke();
    }
    trace!("current thread trampoline drained");
  }
}

impl Scheduler for CurrentThreadScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_now(&self, action: Action) -> Subscription { self.schedule_at(self.now(), action) }

  fn schedule_at(&self, due: Duration, action: Action) -> Subscription {
    let item = Rc::new(ScheduledItem::new(due, action));
    let handle = item.handle();
    let started = TRAMPOLINE.with(|q| {
      let mut q = q.borrow_mut();
      match q.as_mut() {
        Some(queue) => {
          queue.enqueue(item);
          false
        }
        None => {
          let mut queue = PriorityQueue::new();
          queue.enqueue(item);
          *q = Some(queue);
          true
        }
      }
    });
    if started {
      Self::drain();
    }
    handle
  }
}
