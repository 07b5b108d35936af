use std::{marker::PhantomData, rc::Rc};

use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// Mirrors the source until `notifier` emits its first value, then
/// completes and unsubscribes from both.
///
/// A notifier that completes without emitting has no effect; a notifier
/// error is forwarded.
#[derive(Clone)]
pub struct TakeUntilOp<S, N> {
  source: S,
  notifier: N,
}

impl<S, N> TakeUntilOp<S, N> {
  pub(crate) fn new(source: S, notifier: N) -> Self { Self { source, notifier } }
}

impl<S, N> Observable for TakeUntilOp<S, N>
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
    let shared = Rc::new(TakeUntilShared { observer: MutRc::own(Some(observer)), group: group.clone() });

    let notifier = SingleAssignmentDisposable::new();
    group.add(notifier.clone());
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

struct TakeUntilShared<O> {
  observer: MutRc<Option<O>>,
  group: CompositeDisposable,
}

impl<O> TakeUntilShared<O> {
  fn take_and_dispose(&self) -> Option<O> {
    let observer = self.observer.take();
    self.group.dispose();
    observer
  }
}

struct SourceObserver<O> {
  shared: Rc<TakeUntilShared<O>>,
}

impl<O, Item, Err> Observer<Item, Err> for SourceObserver<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.shared.observer.clone().next(value) }

  fn error(self, err: Err) { self.shared.take_and_dispose().error(err) }

  fn complete(self) { self.shared.take_and_dispose().complete() }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}

struct NotifierObserver<O, Item> {
  shared: Rc<TakeUntilShared<O>>,
  _item: PhantomData<fn(Item)>,
}

impl<O, Item, Signal, Err> Observer<Signal, Err> for NotifierObserver<O, Item>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, _: Signal) { self.shared.take_and_dispose().complete() }

  fn error(self, err: Err) { self.shared.take_and_dispose().error(err) }

  fn complete(self) {}

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}
