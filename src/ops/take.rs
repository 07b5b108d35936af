use crate::{
  disposable::{Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Mirrors the first `count` values of the source, then completes and
/// disposes the upstream subscription.
///
/// The upstream is released from inside the `next` call that delivers the
/// last value, so a hot source loses this subscriber right away and a
/// synchronous one sees a closed observer and stops producing.
///
/// `take(0)` completes without subscribing. With
/// [`take_on`](crate::observable::ObservableExt::take_on) that completion is
/// scheduled instead of delivered inline.
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
///
/// use rxstream::prelude::*;
///
/// let seen = Rc::new(RefCell::new(vec![]));
/// let c_seen = seen.clone();
/// observable::from_iter(0..).take(3).subscribe(move |v| c_seen.borrow_mut().push(v));
/// assert_eq!(*seen.borrow(), vec![0, 1, 2]);
/// ```
#[derive(Clone)]
pub struct TakeOp<S, Sch> {
  source: S,
  count: usize,
  scheduler: Option<Sch>,
}

impl<S, Sch> TakeOp<S, Sch> {
  pub(crate) fn new(source: S, count: usize, scheduler: Option<Sch>) -> Self {
    Self { source, count, scheduler }
  }
}

impl<S, Sch> Observable for TakeOp<S, Sch>
where
  S: Observable,
  Sch: SchedulerExt,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    if self.count == 0 {
      return match self.scheduler {
        Some(scheduler) => scheduler.schedule(move || observer.complete()),
        None => {
          observer.complete();
          Subscription::empty()
        }
      };
    }

    let upstream = SingleAssignmentDisposable::new();
    let observer =
      TakeObserver { observer: Some(observer), remaining: self.count, upstream: upstream.clone() };
    let _ = upstream.set(self.source.actual_subscribe(observer));
    upstream.into()
  }
}

pub struct TakeObserver<O> {
  observer: Option<O>,
  remaining: usize,
  upstream: SingleAssignmentDisposable,
}

impl<Item, Err, O> Observer<Item, Err> for TakeObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.remaining == 0 {
      return;
    }
    self.remaining -= 1;
    if let Some(observer) = self.observer.as_mut() {
      observer.next(value);
    }
    if self.remaining == 0 {
      if let Some(observer) = self.observer.take() {
        observer.complete();
      }
      self.upstream.dispose();
    }
  }

  fn error(self, err: Err) { self.observer.error(err) }

  fn complete(self) { self.observer.complete() }

  fn is_closed(&self) -> bool { self.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::{
    disposable::Disposable,
    observable::{from_iter, ObservableExt},
    observer::Observer,
    scheduler::VirtualTimeScheduler,
    subject::Subject,
  };

  fn collect<S>(source: S) -> Rc<RefCell<Vec<String>>>
  where
    S: ObservableExt<Item = i32, Err = Infallible>,
  {
    let log = Rc::new(RefCell::new(vec![]));
    let (c1, c2) = (log.clone(), log.clone());
    source.subscribe_all(
      move |v| c1.borrow_mut().push(v.to_string()),
      |_| {},
      move || c2.borrow_mut().push("done".into()),
    );
    log
  }

  #[rxstream_macro::test]
  fn base_function() {
    let log = collect(from_iter(0..100).take(5));
    assert_eq!(*log.borrow(), vec!["0", "1", "2", "3", "4", "done"]);
  }

  #[rxstream_macro::test]
  fn take_more_than_available() {
    let log = collect(from_iter(0..2).take(5));
    assert_eq!(*log.borrow(), vec!["0", "1", "done"]);
  }

  #[rxstream_macro::test]
  fn take_zero_completes_right_away() {
    let log = collect(from_iter(0..2).take(0));
    assert_eq!(*log.borrow(), vec!["done"]);
  }

  #[rxstream_macro::test]
  fn take_zero_on_scheduler_completes_later() {
    let scheduler = VirtualTimeScheduler::new();
    let log = collect(from_iter(0..2).take_on(0, scheduler.clone()));
    assert!(log.borrow().is_empty());
    scheduler.start();
    assert_eq!(*log.borrow(), vec!["done"]);
  }

  #[rxstream_macro::test]
  fn unsubscribes_from_hot_source() {
    let subject = Subject::<i32, Infallible>::new();
    let log = collect(subject.clone().take(2));
    assert!(subject.has_observers());
    let mut emitter = subject.clone();
    emitter.next(1);
    emitter.next(2);
    assert!(!subject.has_observers());
    emitter.next(3);
    assert_eq!(*log.borrow(), vec!["1", "2", "done"]);
    assert!(!subject.is_disposed());
  }
}
