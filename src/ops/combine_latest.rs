use std::{cell::RefCell, rc::Rc};

use super::CombineItem;
use crate::{
  disposable::{CompositeDisposable, Disposable, SingleAssignmentDisposable, Subscription},
  observable::{BoxedObservable, Observable, ObservableExt},
  observer::Observer,
  rc::MutRc,
};

/// Combines the latest values of every source whenever one of them emits,
/// once all of them have emitted at least once.
///
/// Completes when every source has completed, or right away when a source
/// completes without ever emitting, since no combination can form anymore.
/// The first error from any source is forwarded and tears down the others.
pub fn combine_latest_all<S, F, R>(
  sources: impl IntoIterator<Item = S>, selector: F,
) -> CombineLatestAll<S, F>
where
  S: Observable,
  S::Item: Clone,
  F: FnMut(Vec<S::Item>) -> R + 'static,
{
  CombineLatestAll { sources: sources.into_iter().collect(), selector }
}

#[derive(Clone)]
pub struct CombineLatestAll<S, F> {
  sources: Vec<S>,
  selector: F,
}

impl<S, F, R> Observable for CombineLatestAll<S, F>
where
  S: Observable,
  S::Item: Clone,
  F: FnMut(Vec<S::Item>) -> R + 'static,
  R: 'static,
{
  type Item = R;
  type Err = S::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<R, S::Err> + 'static,
  {
    let mut selector = self.selector;
    subscribe_sources(self.sources, move |values| Some(selector(values)), observer)
  }
}

/// Binary form of [`combine_latest_all`] with a heterogeneous selector.
#[derive(Clone)]
pub struct CombineLatestOp<A, B, F> {
  a: A,
  b: B,
  binary_op: F,
}

impl<A, B, F> CombineLatestOp<A, B, F> {
  pub(crate) fn new(a: A, b: B, binary_op: F) -> Self { Self { a, b, binary_op } }
}

impl<A, B, F, R> Observable for CombineLatestOp<A, B, F>
where
  A: Observable + 'static,
  B: Observable<Err = A::Err> + 'static,
  A::Item: Clone,
  B::Item: Clone,
  F: FnMut(A::Item, B::Item) -> R + 'static,
  R: 'static,
{
  type Item = R;
  type Err = A::Err;

  fn actual_subscribe<O>(self, observer: O) -> Subscription
  where
    O: Observer<R, A::Err> + 'static,
  {
    let sources: Vec<BoxedObservable<CombineItem<A::Item, B::Item>, A::Err>> =
      vec![self.a.map(CombineItem::ItemA).box_it(), self.b.map(CombineItem::ItemB).box_it()];
    let mut binary_op = self.binary_op;
    let selector = move |values: Vec<CombineItem<A::Item, B::Item>>| {
      let mut values = values.into_iter();
      match (values.next(), values.next()) {
        (Some(CombineItem::ItemA(a)), Some(CombineItem::ItemB(b))) => Some(binary_op(a, b)),
        _ => None,
      }
    };
    subscribe_sources(sources, selector, observer)
  }
}

struct CombineState<Item> {
  values: Vec<Option<Item>>,
  done: Vec<bool>,
}

struct CombineShared<O, Item, F> {
  observer: MutRc<Option<O>>,
  group: CompositeDisposable,
  state: RefCell<CombineState<Item>>,
  selector: RefCell<F>,
}

fn subscribe_sources<S, F, R, O>(sources: Vec<S>, selector: F, observer: O) -> Subscription
where
  S: Observable,
  S::Item: Clone,
  F: FnMut(Vec<S::Item>) -> Option<R> + 'static,
  R: 'static,
  O: Observer<R, S::Err> + 'static,
{
  let group = CompositeDisposable::new();
  if sources.is_empty() {
    observer.complete();
    return group.into();
  }

  let count = sources.len();
  let shared = Rc::new(CombineShared {
    observer: MutRc::own(Some(observer)),
    group: group.clone(),
    state: RefCell::new(CombineState {
      values: (0..count).map(|_| None).collect(),
      done: vec![false; count],
    }),
    selector: RefCell::new(selector),
  });

  for (index, source) in sources.into_iter().enumerate() {
    if shared.observer.is_closed() {
      break;
    }
    let slot = SingleAssignmentDisposable::new();
    group.add(slot.clone());
    let _ = slot.set(source.actual_subscribe(CombineObserver { shared: shared.clone(), index }));
  }
  group.into()
}

struct CombineObserver<O, Item, F> {
  shared: Rc<CombineShared<O, Item, F>>,
  index: usize,
}

impl<O, Item, Err, F, R> Observer<Item, Err> for CombineObserver<O, Item, F>
where
  Item: Clone,
  F: FnMut(Vec<Item>) -> Option<R>,
  O: Observer<R, Err>,
{
  fn next(&mut self, value: Item) {
    let snapshot = {
      let mut state = self.shared.state.borrow_mut();
      state.values[self.index] = Some(value);
      state.values.iter().cloned().collect::<Option<Vec<_>>>()
    };
    let Some(values) = snapshot else { return };
    let combined = {
      let mut selector = self.shared.selector.borrow_mut();
      (&mut *selector)(values)
    };
    if let Some(combined) = combined {
      self.shared.observer.clone().next(combined);
    }
  }

  fn error(self, err: Err) {
    let observer = self.shared.observer.take();
    self.shared.group.dispose();
    if let Some(observer) = observer {
      observer.error(err);
    }
  }

  fn complete(self) {
    let finished = {
      let mut state = self.shared.state.borrow_mut();
      state.done[self.index] = true;
      state.values[self.index].is_none() || state.done.iter().all(|d| *d)
    };
    if finished {
      let observer = self.shared.observer.take();
      self.shared.group.dispose();
      if let Some(observer) = observer {
        observer.complete();
      }
    }
  }

  fn is_closed(&self) -> bool { self.shared.observer.is_closed() }
}
