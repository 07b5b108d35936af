use super::{wall_clock, Action, Duration, Scheduler};
use crate::disposable::Subscription;

/// Runs every action synchronously on the caller's stack.
///
/// Delayed actions block the calling thread until they are due. Recursive
/// scheduling through [`SchedulerExt`](super::SchedulerExt) stays stack safe
/// because reschedules are drained iteratively.
#[derive(Clone, Copy, Default, Debug)]
pub struct ImmediateScheduler;

impl Scheduler for ImmediateScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  #[inline]
  fn schedule_now(&self, action: Action) -> Subscription { action() }

  fn schedule_at(&self, due: Duration, action: Action) -> Subscription {
    sleep_until(due);
    action()
  }
}

/// Blocks the current thread until the wall clock reaches `due`.
pub(crate) fn sleep_until(due: Duration) {
  let now = wall_clock();
  if due > now {
    #[cfg(not(target_arch = "wasm32"))]
    std::thread::sleep(due - now);
  }
}
