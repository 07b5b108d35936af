use std::marker::PhantomData;

use crate::{
  disposable::Subscription,
  observable::Observable,
  observer::Observer,
  scheduler::{normalize, Duration, SchedulerExt},
};

/// Creates an observable which will fire at `period` time into the future,
/// and will repeat every `period` interval after. Emits the sequence numbers
/// `0, 1, 2, ...` and never completes.
///
/// Periods shorter than [`MIN_PERIOD`](crate::scheduler::MIN_PERIOD) are
/// clamped.
pub fn interval<S, Err>(period: Duration, scheduler: S) -> Interval<S, Err>
where
  S: SchedulerExt,
{
  Interval { period, scheduler, _err: PhantomData }
}

pub struct Interval<S, Err> {
  period: Duration,
  scheduler: S,
  _err: PhantomData<Err>,
}

impl<S: Clone, Err> Clone for Interval<S, Err> {
  fn clone(&self) -> Self {
    Self { period: self.period, scheduler: self.scheduler.clone(), _err: PhantomData }
  }
}

impl<S: SchedulerExt, Err: 'static> Observable for Interval<S, Err> {
  type Item = usize;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<usize, Err> + 'static,
  {
    let period = normalize(self.period);
    self.scheduler.schedule_recursive_with_relative_and_state(0, period, move |seq, again| {
      if observer.is_closed() {
        return;
      }
      observer.next(seq);
      // A synchronous scheduler runs the whole chain inside this call, so a
      // closed downstream must end it here.
      if !observer.is_closed() {
        again(seq + 1, period);
      }
    })
  }
}

/// Creates an observable that emits `0` once `delay` has elapsed, then
/// completes.
pub fn timer<S, Err>(delay: Duration, scheduler: S) -> Timer<S, Err>
where
  S: SchedulerExt,
{
  Timer { delay, scheduler, _err: PhantomData }
}

pub struct Timer<S, Err> {
  delay: Duration,
  scheduler: S,
  _err: PhantomData<Err>,
}

impl<S: Clone, Err> Clone for Timer<S, Err> {
  fn clone(&self) -> Self {
    Self { delay: self.delay, scheduler: self.scheduler.clone(), _err: PhantomData }
  }
}

impl<S: SchedulerExt, Err: 'static> Observable for Timer<S, Err> {
  type Item = usize;
  type Err = Err;

  fn actual_subscribe<O>(self, mut observer: O) -> Subscription
  where
    O: Observer<usize, Err> + 'static,
  {
    self.scheduler.schedule_with_relative(self.delay, move || {
      observer.next(0);
      observer.complete();
    })
  }
}
