use std::{cell::RefCell, collections::VecDeque, rc::Rc};

use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::Observable,
  observer::Observer,
  rc::MutRc,
};

/// Flattens an observable of observables.
///
/// At most `concurrent` inner observables are subscribed at a time; the
/// excess waits in a FIFO queue until a running one completes. The merge
/// completes once the outer observable and every inner one (queued ones
/// included) have completed. The first error from any of them tears down
/// every other subscription and is forwarded.
#[derive(Clone)]
pub struct MergeAllOp<S> {
  source: S,
  concurrent: usize,
}

impl<S> MergeAllOp<S> {
  pub(crate) fn new(source: S, concurrent: usize) -> Self {
    Self { source, concurrent: concurrent.max(1) }
  }
}

impl<S> Observable for MergeAllOp<S>
where
  S: Observable,
  S::Item: Observable<Err = S::Err> + 'static,
{
  type Item = <S::Item as Observable>::Item;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<Self::Item, Self::Err> + 'static,
  {
    let group = CompositeDisposable::new();
    let shared = Rc::new(MergeShared {
      observer: MutRc::own(Some(observer)),
      group: group.clone(),
      concurrent: self.concurrent,
      state: RefCell::new(MergeState { active: 0, outer_done: false, queue: VecDeque::new() }),
    });

    let outer = SingleAssignmentDisposable::new();
    let handle: Subscription = outer.clone().into();
    group.add(handle.clone());
    let _ = outer.set(self.source.actual_subscribe(OuterObserver { shared, handle }));
    group.into()
  }
}

struct MergeState<Inner> {
  active: usize,
  outer_done: bool,
  queue: VecDeque<Inner>,
}

struct MergeShared<O, Inner> {
  observer: MutRc<Option<O>>,
  group: CompositeDisposable,
  concurrent: usize,
  state: RefCell<MergeState<Inner>>,
}

impl<O, Inner> MergeShared<O, Inner>
where
  Inner: Observable + 'static,
  O: Observer<Inner::Item, Inner::Err> + 'static,
{
  fn subscribe_inner(self: &Rc<Self>, inner: Inner) {
    let slot = SingleAssignmentDisposable::new();
    let handle: Subscription = slot.clone().into();
    self.group.add(handle.clone());
    let _ = slot.set(inner.actual_subscribe(InnerObserver { shared: self.clone(), handle }));
  }

  fn error(&self, err: Inner::Err) {
    let observer = self.observer.take();
    self.group.dispose();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete_if_done(&self) {
    let done = {
      let state = self.state.borrow();
      state.outer_done && state.active == 0 && state.queue.is_empty()
    };
    if done {
      self.observer.clone().complete();
    }
  }
}

struct OuterObserver<O, Inner> {
  shared: Rc<MergeShared<O, Inner>>,
  handle: Subscription,
}

impl<O, Inner> Observer<Inner, Inner::Err> for OuterObserver<O, Inner>
where
  Inner: Observable + 'static,
  O: Observer<Inner::Item, Inner::Err> + 'static,
{
  fn next(&mut self, inner: Inner) {
    {
      let mut state = self.shared.state.borrow_mut();
      if state.active >= self.shared.concurrent {
        state.queue.push_back(inner);
        return;
      }
      state.active += 1;
    }
    self.shared.subscribe_inner(inner);
  }

  fn error(self, err: Inner::Err) { self.shared.error(err) }

  fn complete(self) {
    self.shared.state.borrow_mut().outer_done = true;
    self.shared.group.remove(&self.handle);
    self.shared.complete_if_done();
  }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}

struct InnerObserver<O, Inner> {
  shared: Rc<MergeShared<O, Inner>>,
  handle: Subscription,
}

impl<O, Inner> Observer<Inner::Item, Inner::Err> for InnerObserver<O, Inner>
where
  Inner: Observable + 'static,
  O: Observer<Inner::Item, Inner::Err> + 'static,
{
  fn next(&mut self, value: Inner::Item) { self.shared.observer.clone().next(value) }

  fn error(self, err: Inner::Err) { self.shared.error(err) }

  fn complete(self) {
    self.shared.group.remove(&self.handle);
    let queued = {
      let mut state = self.shared.state.borrow_mut();
      let queued = state.queue.pop_front();
      if queued.is_none() {
        state.active -= 1;
      }
      queued
    };
    match queued {
      Some(inner) => self.shared.subscribe_inner(inner),
      None => self.shared.complete_if_done(),
    }
  }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}
