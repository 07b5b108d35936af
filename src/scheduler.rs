//! Schedulers decide when an action runs.
//!
//! A [`Scheduler`] only has to provide a clock and three primitives for
//! running a boxed [`Action`] now, at an absolute time or after a delay. All
//! the richer variants (state passing, recursive self-rescheduling, periodic
//! work, panic catching) are derived in [`SchedulerExt`] and are available on
//! every clonable scheduler.
//!
//! Time is a [`Duration`] measured from the scheduler's own epoch: process
//! start for the wall clock schedulers, zero for [`VirtualTimeScheduler`].
//!
//! Pre-built instances are exposed as [`IMMEDIATE`], [`CURRENT_THREAD`] and,
//! with the `tokio-scheduler` feature, [`TIMEOUT`].

use std::{any::Any, rc::Rc};

use once_cell::sync::Lazy;
#[cfg(not(target_arch = "wasm32"))]
pub use std::time::{Duration, Instant};
#[cfg(target_arch = "wasm32")]
pub use web_time::{Duration, Instant};

use crate::disposable::Subscription;

mod catch;
mod current_thread;
mod immediate;
mod priority_queue;
mod recursive;
mod scheduled_item;
#[cfg(feature = "tokio-scheduler")]
mod timeout;
mod virtual_time;

pub use catch::CatchScheduler;
pub use current_thread::CurrentThreadScheduler;
pub use immediate::ImmediateScheduler;
pub use priority_queue::PriorityQueue;
use recursive::{Recursion, When};
pub use scheduled_item::ScheduledItem;
#[cfg(feature = "tokio-scheduler")]
pub use timeout::TimeoutScheduler;
pub use virtual_time::VirtualTimeScheduler;

/// Unit of work handed to a scheduler. The returned subscription is kept
/// alive by the scheduled item and released when the item is disposed.
pub type Action = Box<dyn FnOnce() -> Subscription>;

/// Smallest period accepted by periodic scheduling.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Runs work synchronously on the calling stack.
pub const IMMEDIATE: ImmediateScheduler = ImmediateScheduler;

/// Queues work on a per-thread trampoline.
pub const CURRENT_THREAD: CurrentThreadScheduler = CurrentThreadScheduler;

/// Defers work to tokio timers on the current `LocalSet`.
#[cfg(feature = "tokio-scheduler")]
pub const TIMEOUT: TimeoutScheduler = TimeoutScheduler;

static EPOCH: Lazy<Instant> = Lazy::new(Instant::now);

/// Time elapsed since the wall clock epoch shared by the real-time
/// schedulers.
pub fn wall_clock() -> Duration { EPOCH.elapsed() }

/// Clamps a period so periodic work can never busy-loop.
#[inline]
pub fn normalize(period: Duration) -> Duration { period.max(MIN_PERIOD) }

/// A Scheduler is an object to order actions and schedule their execution.
pub trait Scheduler {
  /// The scheduler's notion of the current time.
  fn now(&self) -> Duration;

  /// Runs `action` as soon as the scheduler gets to it.
  fn schedule_now(&self, action: Action) -> Subscription;

  /// Runs `action` once the scheduler's clock reaches `due`.
  fn schedule_at(&self, due: Duration, action: Action) -> Subscription;

  /// Runs `action` once `delay` has elapsed.
  fn schedule_after(&self, delay: Duration, action: Action) -> Subscription {
    self.schedule_at(self.now() + delay, action)
  }
}

impl<S: Scheduler + ?Sized> Scheduler for Rc<S> {
  #[inline]
  fn now(&self) -> Duration { (**self).now() }

  #[inline]
  fn schedule_now(&self, action: Action) -> Subscription { (**self).schedule_now(action) }

  #[inline]
  fn schedule_at(&self, due: Duration, action: Action) -> Subscription {
    (**self).schedule_at(due, action)
  }

  #[inline]
  fn schedule_after(&self, delay: Duration, action: Action) -> Subscription {
    (**self).schedule_after(delay, action)
  }
}

/// The scheduling vocabulary built on top of [`Scheduler`].
///
/// Recursive variants hand the action a callback that reschedules it. The
/// reschedules are drained by an iterative loop, so an action that keeps
/// rescheduling itself on a synchronous scheduler never grows the stack.
/// Disposing the returned subscription stops the recursion and cancels the
/// pending reschedule.
pub trait SchedulerExt: Scheduler + Clone + 'static {
  fn schedule(&self, action: impl FnOnce() + 'static) -> Subscription {
    self.schedule_now(Box::new(move || {
      action();
      Subscription::empty()
    }))
  }

  fn schedule_with_state<S: 'static>(
    &self, state: S, action: impl FnOnce(&Self, S) -> Subscription + 'static,
  ) -> Subscription {
    let this = self.clone();
    self.schedule_now(Box::new(move || action(&this, state)))
  }

  fn schedule_with_absolute(
    &self, due: Duration, action: impl FnOnce() + 'static,
  ) -> Subscription {
    self.schedule_at(
      due,
      Box::new(move || {
        action();
        Subscription::empty()
      }),
    )
  }

  fn schedule_with_absolute_and_state<S: 'static>(
    &self, state: S, due: Duration, action: impl FnOnce(&Self, S) -> Subscription + 'static,
  ) -> Subscription {
    let this = self.clone();
    self.schedule_at(due, Box::new(move || action(&this, state)))
  }

  fn schedule_with_relative(
    &self, delay: Duration, action: impl FnOnce() + 'static,
  ) -> Subscription {
    self.schedule_after(
      delay,
      Box::new(move || {
        action();
        Subscription::empty()
      }),
    )
  }

  fn schedule_with_relative_and_state<S: 'static>(
    &self, state: S, delay: Duration, action: impl FnOnce(&Self, S) -> Subscription + 'static,
  ) -> Subscription {
    let this = self.clone();
    self.schedule_after(delay, Box::new(move || action(&this, state)))
  }

  fn schedule_recursive(&self, mut action: impl FnMut(&mut dyn FnMut()) + 'static) -> Subscription {
    self.schedule_recursive_with_state((), move |(), again| action(&mut || again(())))
  }

  fn schedule_recursive_with_state<S: 'static>(
    &self, state: S, mut action: impl FnMut(S, &mut dyn FnMut(S)) + 'static,
  ) -> Subscription {
    Recursion::start(self.clone(), When::Now, state, Duration::ZERO, move |state, again| {
      action(state, &mut |next| again(next, Duration::ZERO))
    })
  }

  fn schedule_recursive_with_absolute(
    &self, due: Duration, mut action: impl FnMut(&mut dyn FnMut(Duration)) + 'static,
  ) -> Subscription {
    self.schedule_recursive_with_absolute_and_state((), due, move |(), again| {
      action(&mut |due| again((), due))
    })
  }

  fn schedule_recursive_with_absolute_and_state<S: 'static>(
    &self, state: S, due: Duration, action: impl FnMut(S, &mut dyn FnMut(S, Duration)) + 'static,
  ) -> Subscription {
    Recursion::start(self.clone(), When::At, state, due, action)
  }

  fn schedule_recursive_with_relative(
    &self, delay: Duration, mut action: impl FnMut(&mut dyn FnMut(Duration)) + 'static,
  ) -> Subscription {
    self.schedule_recursive_with_relative_and_state((), delay, move |(), again| {
      action(&mut |delay| again((), delay))
    })
  }

  fn schedule_recursive_with_relative_and_state<S: 'static>(
    &self, state: S, delay: Duration, action: impl FnMut(S, &mut dyn FnMut(S, Duration)) + 'static,
  ) -> Subscription {
    Recursion::start(self.clone(), When::After, state, delay, action)
  }

  /// Runs `action` every `period`, the first time one period from now.
  fn schedule_periodic(&self, period: Duration, mut action: impl FnMut() + 'static) -> Subscription {
    self.schedule_periodic_with_state((), period, move |()| action())
  }

  /// Like [`schedule_periodic`](SchedulerExt::schedule_periodic), threading
  /// the value returned by each run into the next one.
  fn schedule_periodic_with_state<S: 'static>(
    &self, state: S, period: Duration, mut action: impl FnMut(S) -> S + 'static,
  ) -> Subscription {
    let period = normalize(period);
    self.schedule_recursive_with_relative_and_state(state, period, move |state, again| {
      again(action(state), period)
    })
  }

  /// Wraps this scheduler so panics escaping scheduled actions are offered
  /// to `handler` first. See [`CatchScheduler`].
  fn catch<H>(&self, handler: H) -> CatchScheduler<Self, H>
  where
    H: Fn(&(dyn Any + Send)) -> bool + 'static,
  {
    CatchScheduler::new(self.clone(), handler)
  }
}

impl<T: Scheduler + Clone + 'static> SchedulerExt for T {}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;

  use super::*;
  use crate::disposable::Disposable;

  #[rxstream_macro::test]
  fn normalize_clamps_period() {
    assert_eq!(normalize(Duration::ZERO), MIN_PERIOD);
    assert_eq!(normalize(Duration::from_millis(5)), Duration::from_millis(5));
  }

  #[rxstream_macro::test]
  fn state_is_threaded_through() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    IMMEDIATE.schedule_with_state(7, move |_, s| {
      c_seen.borrow_mut().push(s);
      Subscription::empty()
    });
    assert_eq!(*seen.borrow(), vec![7]);
  }

  #[rxstream_macro::test]
  fn recursive_state_on_current_thread() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    CURRENT_THREAD.schedule_recursive_with_state(0, move |n, again| {
      c_seen.borrow_mut().push(n);
      if n < 4 {
        again(n + 1);
      }
    });
    assert_eq!(*seen.borrow(), vec![0, 1, 2, 3, 4]);
  }

  #[rxstream_macro::test]
  fn recursive_on_immediate_does_not_grow_stack() {
    let count = Rc::new(RefCell::new(0));
    let c_count = count.clone();
    IMMEDIATE.schedule_recursive(move |again| {
      *c_count.borrow_mut() += 1;
      if *c_count.borrow() < 100_000 {
        again();
      }
    });
    assert_eq!(*count.borrow(), 100_000);
  }

  #[rxstream_macro::test]
  fn disposing_stops_recursion() {
    let scheduler = VirtualTimeScheduler::new();
    let count = Rc::new(RefCell::new(0));
    let c_count = count.clone();
    let sub = scheduler.schedule_recursive_with_relative(Duration::from_millis(10), move |again| {
      *c_count.borrow_mut() += 1;
      again(Duration::from_millis(10));
    });

    scheduler.advance_by(Duration::from_millis(35));
    assert_eq!(*count.borrow(), 3);
    sub.dispose();
    assert_eq!(scheduler.pending_count(), 0);
    scheduler.advance_by(Duration::from_millis(100));
    assert_eq!(*count.borrow(), 3);
  }

  #[rxstream_macro::test]
  fn periodic_fires_once_per_period() {
    let scheduler = VirtualTimeScheduler::new();
    let ticks = Rc::new(RefCell::new(vec![]));
    let c_ticks = ticks.clone();
    let c_scheduler = scheduler.clone();
    let sub = scheduler.schedule_periodic_with_state(0, Duration::from_millis(100), move |n| {
      c_ticks.borrow_mut().push((n, c_scheduler.now()));
      n + 1
    });

    scheduler.advance_to(Duration::from_millis(350));
    sub.dispose();
    scheduler.advance_to(Duration::from_millis(1000));

    assert_eq!(
      *ticks.borrow(),
      vec![
        (0, Duration::from_millis(100)),
        (1, Duration::from_millis(200)),
        (2, Duration::from_millis(300)),
      ]
    );
  }

  #[rxstream_macro::test]
  fn absolute_recursion_uses_due_times() {
    let scheduler = VirtualTimeScheduler::new();
    let at = Rc::new(RefCell::new(vec![]));
    let c_at = at.clone();
    let c_scheduler = scheduler.clone();
    scheduler.schedule_recursive_with_absolute(Duration::from_millis(5), move |again| {
      let now = c_scheduler.now();
      c_at.borrow_mut().push(now);
      if now < Duration::from_millis(20) {
        again(now + Duration::from_millis(10));
      }
    });
    scheduler.start();
    assert_eq!(
      *at.borrow(),
      vec![Duration::from_millis(5), Duration::from_millis(15), Duration::from_millis(25)]
    );
  }
}
