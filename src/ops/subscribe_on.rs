use crate::{
  disposable::{Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  scheduler::SchedulerExt,
};

/// Subscribes to the source from an action scheduled on `scheduler`.
///
/// Disposing the returned subscription cancels a subscription that has not
/// happened yet; an established one is disposed by another action on the
/// same scheduler.
#[derive(Clone)]
pub struct SubscribeOnOp<S, Sch> {
  source: S,
  scheduler: Sch,
}

impl<S, Sch> SubscribeOnOp<S, Sch> {
  pub(crate) fn new(source: S, scheduler: Sch) -> Self { Self { source, scheduler } }
}

impl<S, Sch> Observable for SubscribeOnOp<S, Sch>
where
  S: Observable + 'static,
  Sch: SchedulerExt,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let upstream = SingleAssignmentDisposable::new();
    let c_upstream = upstream.clone();
    let source = self.source;
    let pending = self.scheduler.schedule(move || {
      let _ = c_upstream.set(source.actual_subscribe(observer));
    });

    let scheduler = self.scheduler;
    Subscription::from_fn(move || {
      pending.dispose();
      if upstream.get().is_some() {
        scheduler.schedule(move || upstream.dispose());
      } else {
        upstream.dispose();
      }
    })
  }
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

  #[rxstream_macro::test]
  fn subscription_happens_on_scheduler() {
    let scheduler = VirtualTimeScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    from_iter::<_, Infallible>(0..3)
      .subscribe_on(scheduler.clone())
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    assert!(seen.borrow().is_empty());
    scheduler.start();
    assert_eq!(*seen.borrow(), vec![0, 1, 2]);
  }

  #[rxstream_macro::test]
  fn dispose_before_subscribing_cancels() {
    let scheduler = VirtualTimeScheduler::new();
    let source = Subject::<i32, ()>::new();
    let sub = source.clone().subscribe_on(scheduler.clone()).subscribe_all(|_| {}, |_| {}, || {});
    sub.dispose();
    scheduler.start();
    assert!(!source.has_observers());
  }

  #[rxstream_macro::test]
  fn unsubscription_happens_on_scheduler() {
    let scheduler = VirtualTimeScheduler::new();
    let source = Subject::<i32, ()>::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let sub = source
      .clone()
      .subscribe_on(scheduler.clone())
      .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});
    scheduler.start();
    assert!(source.has_observers());

    sub.dispose();
    assert!(source.has_observers());
    source.clone().next(1);
    scheduler.start();
    assert!(!source.has_observers());
    assert!(seen.borrow().is_empty());
  }
}
