use std::{cell::Cell, rc::Rc};

use crate::{
  disposable::{
    CompositeDisposable, Disposable, SerialDisposable, SingleAssignmentDisposable, Subscription,
  },
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// Mirrors the most recent inner observable emitted by the source.
///
/// Each new inner observable replaces the previous one, whose subscription is
/// disposed and whose late values are dropped. Completes once the source and
/// the latest inner observable have both completed.
#[derive(Clone)]
pub struct SwitchLatestOp<S> {
  source: S,
}

impl<S> SwitchLatestOp<S> {
  pub(crate) fn new(source: S) -> Self { Self { source } }
}

impl<S> Observable for SwitchLatestOp<S>
where
  S: Observable,
  S::Item: Observable<Err = S::Err>,
{
  type Item = <S::Item as Observable>::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let outer = SingleAssignmentDisposable::new();
    let inner = SerialDisposable::new();
    let group = CompositeDisposable::new();
    group.add(outer.clone());
    group.add(inner.clone());
    let shared = Rc::new(SwitchShared {
      observer: MutRc::own(Some(observer)),
      group: group.clone(),
      inner,
      latest: Cell::new(0),
      inner_active: Cell::new(false),
      outer_done: Cell::new(false),
    });
    let _ = outer.set(self.source.actual_subscribe(OuterObserver { shared }));
    group.into()
  }
}

struct SwitchShared<O> {
  observer: MutRc<Option<O>>,
  group: CompositeDisposable,
  inner: SerialDisposable,
  latest: Cell<usize>,
  inner_active: Cell<bool>,
  outer_done: Cell<bool>,
}

impl<O> SwitchShared<O> {
  fn error<Item, Err>(&self, err: Err)
  where
    O: Observer<Item, Err>,
  {
    let observer = self.observer.take();
    self.group.dispose();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete<Item, Err>(&self)
  where
    O: Observer<Item, Err>,
  {
    let observer = self.observer.take();
    self.group.dispose();
    if let Some(observer) = observer {
      observer.complete();
    }
  }
}

struct OuterObserver<O> {
  shared: Rc<SwitchShared<O>>,
}

impl<O, Inner> Observer<Inner, Inner::Err> for OuterObserver<O>
where
  Inner: Observable,
  O: Observer<Inner::Item, Inner::Err> + 'static,
{
  fn next(&mut self, inner: Inner) {
    let id = self.shared.latest.get() + 1;
    self.shared.latest.set(id);
    self.shared.inner_active.set(true);

    let slot = SingleAssignmentDisposable::new();
    self.shared.inner.set(slot.clone());
    let _ = slot.set(inner.actual_subscribe(InnerObserver { shared: self.shared.clone(), id }));
  }

  fn error(self, err: Inner::Err) { self.shared.error::<Inner::Item, _>(err) }

  fn complete(self) {
    self.shared.outer_done.set(true);
    if !self.shared.inner_active.get() {
      self.shared.complete::<Inner::Item, Inner::Err>();
    }
  }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}

struct InnerObserver<O> {
  shared: Rc<SwitchShared<O>>,
  id: usize,
}

impl<O> InnerObserver<O> {
  fn is_latest(&self) -> bool { self.shared.latest.get() == self.id }
}

impl<O, Item, Err> Observer<Item, Err> for InnerObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.is_latest() {
      self.shared.observer.clone().next(value);
    }
  }

  fn error(self, err: Err) {
    if self.is_latest() {
      self.shared.error(err);
    }
  }

  fn complete(self) {
    if !self.is_latest() {
      return;
    }
    self.shared.inner_active.set(false);
    if self.shared.outer_done.get() {
      self.shared.complete();
    }
  }

  fn is_closed(&self) -> bool { !self.is_latest() || self.shared.observer.is_closed() }
}

#[cfg(test)]
mod tests {
  use std::{cell::RefCell, convert::Infallible, rc::Rc};

  use crate::{
    disposable::Disposable,
    observable::{from_iter, interval, ObservableExt},
    observer::Observer,
    scheduler::{Duration, VirtualTimeScheduler},
    subject::Subject,
  };

  #[rxstream_macro::test]
  fn follows_latest_inner() {
    let outer = Subject::<Subject<i32, Infallible>, Infallible>::new();
    let first = Subject::new();
    let second = Subject::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    outer.clone().switch_latest().subscribe(move |v| c_seen.borrow_mut().push(v));

    outer.clone().next(first.clone());
    first.clone().next(1);
    outer.clone().next(second.clone());
    assert!(!first.has_observers());
    first.clone().next(2);
    second.clone().next(3);
    assert_eq!(*seen.borrow(), vec![1, 3]);
  }

  #[rxstream_macro::test]
  fn completes_after_outer_and_latest_inner() {
    let outer = Subject::<Subject<i32, ()>, ()>::new();
    let inner = Subject::new();
    let done = Rc::new(RefCell::new(false));
    let c_done = done.clone();
    outer
      .clone()
      .switch_latest()
      .subscribe_all(|_| {}, |_| {}, move || *c_done.borrow_mut() = true);

    outer.clone().next(inner.clone());
    outer.clone().complete();
    assert!(!*done.borrow());
    inner.clone().complete();
    assert!(*done.borrow());
  }

  #[rxstream_macro::test]
  fn inner_error_is_forwarded() {
    let outer = Subject::<Subject<i32, &str>, &str>::new();
    let inner = Subject::new();
    let err = Rc::new(RefCell::new(None));
    let c_err = err.clone();
    outer.clone().switch_latest().subscribe_all(
      |_| {},
      move |e| *c_err.borrow_mut() = Some(e),
      || {},
    );
    outer.clone().next(inner.clone());
    inner.clone().error("inner failed");
    assert_eq!(*err.borrow(), Some("inner failed"));
    assert!(!outer.has_observers());
  }

  #[rxstream_macro::test]
  fn switching_timers_on_virtual_time() {
    let scheduler = VirtualTimeScheduler::new();
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    let c_scheduler = scheduler.clone();
    let sub = interval::<_, ()>(Duration::from_millis(25), scheduler.clone())
      .take(2)
      .map(move |tag| interval(Duration::from_millis(10), c_scheduler.clone()).map(move |i| (tag, i)))
      .switch_latest()
      .subscribe_all(move |v| c_seen.borrow_mut().push(v), |_| {}, || {});

    scheduler.advance_to(Duration::from_millis(70));
    // The first inner starts at 25ms and is replaced at 50ms.
    assert_eq!(*seen.borrow(), vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
    sub.dispose();
    assert!(scheduler.is_empty());
  }

  #[rxstream_macro::test]
  fn synchronous_outer_keeps_last() {
    let seen = Rc::new(RefCell::new(vec![]));
    let c_seen = seen.clone();
    from_iter::<_, Infallible>(vec![from_iter(vec![1, 2]), from_iter(vec![3])])
      .switch_latest()
      .subscribe(move |v| c_seen.borrow_mut().push(v));
    assert_eq!(*seen.borrow(), vec![1, 2, 3]);
  }
}
