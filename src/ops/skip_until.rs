use std::{cell::Cell, marker::PhantomData, rc::Rc};

use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// Drops the source's values until `notifier` emits its first value, then
/// mirrors the source.
///
/// The notifier is unsubscribed after its first value. A notifier that
/// completes without emitting leaves the gate shut; a notifier error is
/// forwarded. The source's own completion is always forwarded.
#[derive(Clone)]
pub struct SkipUntilOp<S, N> {
  source: S,
  notifier: N,
}

impl<S, N> SkipUntilOp<S, N> {
  pub(crate) fn new(source: S, notifier: N) -> Self { Self { source, notifier } }
}

impl<S, N> Observable for SkipUntilOp<S, N>
where
  S: Observable,
  N: Observable<Err = S::Err>,
{
  type Item = S::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<S::Item, S::Err> + 'static,
  {
    let group = CompositeDisposable::new();
    let notifier = SingleAssignmentDisposable::new();
    group.add(notifier.clone());
    let shared = Rc::new(SkipUntilShared {
      observer: MutRc::own(Some(observer)),
      open: Cell::new(false),
      notifier: notifier.clone(),
      group: group.clone(),
    });

    let notifier_observer = NotifierObserver { shared: shared.clone(), _item: PhantomData };
    let _ = notifier.set(self.notifier.actual_subscribe(notifier_observer));

    if !shared.observer.is_closed() {
      let upstream = SingleAssignmentDisposable::new();
      group.add(upstream.clone());
      let _ = upstream.set(self.source.actual_subscribe(SourceObserver { shared }));
    }
    group.into()
  }
}

struct SkipUntilShared<O> {
  observer: MutRc<Option<O>>,
  open: Cell<bool>,
  notifier: SingleAssignmentDisposable,
  group: CompositeDisposable,
}

impl<O> SkipUntilShared<O> {
  fn take_and_dispose(&self) -> Option<O> {
    let observer = self.observer.take();
    self.group.dispose();
    observer
  }
}

struct SourceObserver<O> {
  shared: Rc<SkipUntilShared<O>>,
}

impl<O, Item, Err> Observer<Item, Err> for SourceObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) {
    if self.shared.open.get() {
      self.shared.observer.clone().next(value)
    }
  }

  fn error(self, err: Err) { self.shared.take_and_dispose().error(err) }

  fn complete(self) { self.shared.take_and_dispose().complete() }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}

struct NotifierObserver<O, Item> {
  shared: Rc<SkipUntilShared<O>>,
  _item: PhantomData<fn(Item)>,
}

impl<O, Item, Signal, Err> Observer<Signal, Err> for NotifierObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: Signal) {
    self.shared.open.set(true);
    self.shared.notifier.dispose();
  }

  fn error(self, err: Err) { self.shared.take_and_dispose().error(err) }

  fn complete(self) {}

  fn is_closed(&self) -> bool { self.shared.open.get() || self.shared.observer.is_closed() }
}
