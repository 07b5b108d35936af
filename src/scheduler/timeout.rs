use futures::future::abortable;

use super::{wall_clock, Action, Duration, Scheduler};
use crate::disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription};

/// Defers every action to a tokio timer.
///
/// Actions are spawned with [`tokio::task::spawn_local`], so scheduling must
/// happen inside a [`tokio::task::LocalSet`]. Nothing ever runs inline:
/// even a zero delay waits for the next turn of the runtime. Disposing the
/// returned subscription aborts the pending timer, or releases the action's
/// result once it ran.
#[derive(Clone, Copy, Default, Debug)]
pub struct TimeoutScheduler;

impl Scheduler for TimeoutScheduler {
  #[inline]
  fn now(&self) -> Duration { wall_clock() }

  fn schedule_now(&self, action: Action) -> Subscription {
    self.schedule_after(Duration::ZERO, action)
  }

  fn schedule_at(&self, due: Duration, action: Action) -> Subscription {
    self.schedule_after(due.saturating_sub(self.now()), action)
  }

  fn schedule_after(&self, delay: Duration, action: Action) -> Subscription {
    let result = SingleAssignmentDisposable::new();
    let c_result = result.clone();
    let (task, handle) = abortable(async move {
      tokio::time::sleep(delay).await;
      if !c_result.is_disposed() {
        // The slot is only ever assigned here.
        let _ = c_result.set(action());
      }
    });
    tokio::task::spawn_local(task);

    let timer = Subscription::from_fn(move || handle.abort());
    CompositeDisposable::from_iter([timer, result.into()]).into()
  }
}
